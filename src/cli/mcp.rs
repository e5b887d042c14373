//! `mcp-serve` command (spec §4.M): runs the stdio JSON-RPC loop over
//! the process's own stdin/stdout until the input stream closes.

use crate::cli::context::open_store;

pub fn run() -> i32 {
    let store = match open_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {e}");
            return e.code().exit_code();
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    match crate::mcp::server::run(&store, stdin.lock(), stdout.lock()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("mcp-serve terminated: {e}");
            2
        }
    }
}
