//! A scripted planner used by integration tests (spec §4.G's contract is
//! opaque to the backend, so tests script a fixed response rather than
//! mock an HTTP client).

use std::sync::Mutex;

use crate::error::{Error, Result};

use super::contract::{Planner, PlannerInput, PlannerOutput, RawPlannerResponse};

pub struct ScriptedPlanner {
    responses: Mutex<Vec<RawPlannerResponse>>,
}

impl ScriptedPlanner {
    pub fn new(responses: Vec<RawPlannerResponse>) -> Self {
        Self { responses: Mutex::new(responses) }
    }
}

impl Planner for ScriptedPlanner {
    fn plan(&self, _input: &PlannerInput) -> Result<PlannerOutput> {
        let mut responses = self.responses.lock().expect("scripted planner mutex poisoned");
        if responses.is_empty() {
            return Err(Error::Planner("scripted planner exhausted".into()));
        }
        let raw = responses.remove(0);
        super::contract::validate(raw)
    }
}
