use super::{CommandSpec, ProcessError, ProcessOutput, ProcessRunner};
use std::collections::VecDeque;
use std::sync::Mutex;

/// What a scripted command should do
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// Behave as if the program is not installed
    Missing,
}

impl ScriptedResponse {
    pub fn ok() -> Self {
        Self::exit(0, "")
    }

    pub fn exit(code: i32, stderr: &str) -> Self {
        ScriptedResponse::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Fake runner: records every command and answers from a script.
///
/// Responses are matched by program name first (see [`respond_to`]), then
/// taken from the default queue; with nothing scripted the command succeeds.
///
/// [`respond_to`]: ScriptedProcessRunner::respond_to
#[derive(Debug, Default)]
pub struct ScriptedProcessRunner {
    by_program: Mutex<Vec<(String, ScriptedResponse)>>,
    queue: Mutex<VecDeque<ScriptedResponse>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command whose program equals `program` gets `response`
    pub fn respond_to(self, program: &str, response: ScriptedResponse) -> Self {
        if let Ok(mut map) = self.by_program.lock() {
            map.push((program.to_string(), response));
        }
        self
    }

    /// Queue a response for the next unmatched command
    pub fn then(self, response: ScriptedResponse) -> Self {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(response);
        }
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Commands whose program or first argument equals `name`
    pub fn calls_to(&self, name: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == name || c.args.first().map(String::as_str) == Some(name))
            .collect()
    }
}

impl ProcessRunner for ScriptedProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.clone());
        }

        let matched = self.by_program.lock().ok().and_then(|map| {
            map.iter()
                .find(|(program, _)| *program == command.program)
                .map(|(_, r)| r.clone())
        });
        let response = matched
            .or_else(|| self.queue.lock().ok().and_then(|mut q| q.pop_front()))
            .unwrap_or_else(ScriptedResponse::ok);

        match response {
            ScriptedResponse::Exit {
                code,
                stdout,
                stderr,
            } => Ok(ProcessOutput {
                exit_code: Some(code),
                stdout,
                stderr,
            }),
            ScriptedResponse::Missing => Err(ProcessError::Spawn {
                program: command.program.clone(),
                reason: "No such file or directory (os error 2)".to_string(),
            }),
        }
    }
}
