//! Subprocess runner with a manual timeout (spec §4.C): `std::process::Child`
//! has no native deadline, so the calling thread polls `try_wait` against
//! the caller's timeout and kills the child on expiry; pipe reads run on a
//! dedicated thread so a full stdout/stderr buffer can't deadlock the poll.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Output buffers are capped well above the spec's 10 MiB floor.
const MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;

/// How often the main thread polls `try_wait` while a command is running.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// Run `program` with `args` in `cwd`, enforcing `timeout`. On timeout the
/// child is killed (and reaped) and [`Error::Timeout`] is returned; the
/// command's own non-zero exit is reported by `success = false` with
/// captured stderr rather than as an `Err`, leaving the caller to decide
/// what a failing invocation means (fallback, user error, ...).
pub fn run(program: &str, args: &[&str], cwd: Option<&std::path::Path>, timeout: Duration) -> Result<RunOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| {
        Error::git(format!("{program} {}", args.join(" ")), e.to_string())
    })?;

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    // Pipe reads happen on a dedicated thread since a full pipe buffer
    // would otherwise deadlock against the polling loop below; the child
    // itself stays owned by this thread so it can be killed on timeout.
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut stdout = String::new();
        let mut stderr = String::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.take(MAX_OUTPUT_BYTES as u64).read_to_string(&mut stdout);
        }
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.take(MAX_OUTPUT_BYTES as u64).read_to_string(&mut stderr);
        }
        let _ = tx.send((stdout, stderr));
    });

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().map_err(|e| Error::git(program, e.to_string()))? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Timeout(timeout));
        }
        std::thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(started.elapsed())));
    };

    let (stdout, stderr) = rx.recv().unwrap_or_default();
    Ok(RunOutput { stdout, stderr, success: status.success() })
}

/// Default timeout for local git operations (spec §5).
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(60);
/// Default timeout for network operations (`fetch`/`pull`/`push`).
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(300);
