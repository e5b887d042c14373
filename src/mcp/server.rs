//! MCP stdio surface (spec §6, SPEC_FULL §4.M): a newline-delimited
//! JSON-RPC loop exposing the §4.H query contract only. Hand-rolled
//! rather than built on a full MCP framework, since transport framing is
//! explicitly out of scope — only the five read methods matter.

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use crate::db::connection::Store;
use crate::query::{self, ListTasksFilter};

/// Run the stdio loop until the input stream closes. Each line is parsed
/// as a JSON-RPC request `{id, method, params}`; the response is written
/// as a single JSON line. A malformed request or an unknown method
/// yields `{error: <string>}` rather than an abrupt disconnect, so a
/// client can render the problem inline (spec §6).
pub fn run(store: &Store, reader: impl BufRead, mut writer: impl Write) -> std::io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(store, &line);
        writeln!(writer, "{response}")?;
        writer.flush()?;
    }
    Ok(())
}

fn handle_line(store: &Store, line: &str) -> String {
    let request: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return json!({ "error": format!("malformed request: {e}") }).to_string(),
    };

    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    let result = dispatch(store, method, &params);
    match result {
        Ok(value) => json!({ "id": id, "result": value }).to_string(),
        Err(message) => json!({ "id": id, "error": message }).to_string(),
    }
}

fn dispatch(store: &Store, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "get_plan" => {
            let project_ref = str_param(params, "project_id")?;
            let plan_ref = str_param(params, "plan_id")?;
            let result = query::plan_with_progress(store, &plan_ref, &project_ref).map_err(|e| e.to_string())?;
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        "list_plans" => {
            let project_ref = str_param(params, "project_id")?;
            let status = params.get("status").and_then(Value::as_str).map(str::to_string);
            let result = query::list_plans(store, &project_ref, status.as_deref()).map_err(|e| e.to_string())?;
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        "get_task" => {
            let plan_ref = str_param(params, "plan_id")?;
            let task_ref = str_param(params, "task_id")?;
            let result = query::task_with_neighbours(store, &plan_ref, &task_ref).map_err(|e| e.to_string())?;
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        "list_tasks" => {
            let plan_ref = str_param(params, "plan_id")?;
            let filter = ListTasksFilter {
                status: params.get("status").and_then(Value::as_str).map(str::to_string),
                level: params.get("level").and_then(Value::as_i64).map(|l| l as i32),
            };
            let result = query::list_tasks(store, &plan_ref, &filter).map_err(|e| e.to_string())?;
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        "get_current_task" => {
            let branch_name = str_param(params, "branch_name")?;
            let result = query::current_task(store, &branch_name).map_err(|e| e.to_string())?;
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        other => Err(format!("unknown method: {other}")),
    }
}

fn str_param(params: &Value, key: &str) -> Result<String, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("missing required param: {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_returns_error_object() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::open(tmp.path().join("taskctl.db")).unwrap();
        let response = handle_line(&store, r#"{"id":1,"method":"bogus","params":{}}"#);
        let value: Value = serde_json::from_str(&response).unwrap();
        assert!(value.get("error").is_some());
    }

    #[test]
    fn malformed_json_is_reported_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::open(tmp.path().join("taskctl.db")).unwrap();
        let response = handle_line(&store, "not json");
        let value: Value = serde_json::from_str(&response).unwrap();
        assert!(value.get("error").is_some());
    }
}
