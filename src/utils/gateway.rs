//! Calls into the appliance middleware through its `midclt` client.

use log::{debug, error};
use serde_json::Value;
use subprocess::{ExitStatus, Popen, PopenConfig, PopenError, Redirection};

/// Normalized reply of a single middleware call.
#[derive(Clone, Debug, PartialEq)]
pub enum CallResult {
    /// stdout decoded as JSON
    Value(Value),
    /// stdout that was not JSON, trimmed
    Text(String),
    /// the call failed; not the same as an empty success
    Absent,
}

impl CallResult {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            CallResult::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, CallResult::Absent)
    }
}

/// One middleware method call per logical operation.
pub trait Gateway {
    fn call(&self, method: &str, args: &[&str]) -> CallResult;
}

pub struct CmdResult {
    pub out: String,
    pub err: String,
    pub status: ExitStatus,
}

/// Runs `<program> call <method> <args...>` for every call.
pub struct Midclt {
    program: String,
}

impl Midclt {
    pub const DEFAULT_PROGRAM: &'static str = "midclt";

    pub fn new(program: &str) -> Midclt {
        Midclt {
            program: program.to_owned(),
        }
    }

    fn exec(&self, method: &str, args: &[&str]) -> Result<CmdResult, PopenError> {
        let mut cmd = vec![self.program.as_str(), "call", method];
        cmd.extend_from_slice(args);
        let mut p = Popen::create(
            &cmd[..],
            PopenConfig {
                stdout: Redirection::Pipe,
                stderr: Redirection::Pipe,
                ..Default::default()
            },
        )?;
        let (out, err) = p.communicate(None)?;
        let status = p.wait()?;
        Ok(CmdResult {
            out: out.unwrap_or_default(),
            err: err.unwrap_or_default(),
            status,
        })
    }
}

impl Gateway for Midclt {
    fn call(&self, method: &str, args: &[&str]) -> CallResult {
        debug!("midclt call {}", method);
        match self.exec(method, args) {
            Ok(res) => interpret(method, &res),
            Err(err) => {
                error!("[X] ERROR in midclt method: {}", method);
                error!("    Failed to run {}: {}", self.program, err);
                CallResult::Absent
            }
        }
    }
}

pub fn failure_message(method: &str, status: &ExitStatus, stderr: &str) -> String {
    format!(
        "[X] ERROR in midclt method: {}\n    Return Code: {}\n    Error Message: {}",
        method,
        return_code(status),
        stderr.trim()
    )
}

fn return_code(status: &ExitStatus) -> String {
    match status {
        ExitStatus::Exited(code) => code.to_string(),
        ExitStatus::Signaled(signal) => format!("signal {}", signal),
        ExitStatus::Other(code) => format!("other {}", code),
        ExitStatus::Undetermined => "undetermined".to_owned(),
    }
}

/// Turns a finished process into a [`CallResult`].
pub fn interpret(method: &str, res: &CmdResult) -> CallResult {
    if !res.status.success() {
        for line in failure_message(method, &res.status, &res.err).lines() {
            error!("{}", line);
        }
        return CallResult::Absent;
    }
    match serde_json::from_str(&res.out) {
        Ok(value) => CallResult::Value(value),
        Err(_) => CallResult::Text(res.out.trim().to_owned()),
    }
}
