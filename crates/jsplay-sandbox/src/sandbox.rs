//! The sandboxed evaluator: one snippet in, one [`RunResult`] out.

use std::rc::Rc;

use jsplay_eval::{EvalResult, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compile::compile;
use crate::config::SandboxConfig;
use crate::console::{ConsoleRedirect, HostConsole, LogBuffer};
use crate::context::{ExecutionContext, CONTEXT_NAMES};
use crate::timers::TimerHost;

/// Outcome of one run. Exactly one of output or error text exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    /// Captured log lines joined with `\n`, or the success placeholder.
    Succeeded(String),
    /// The error prefix followed by the error's message.
    Failed(String),
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Succeeded(_))
    }

    pub fn text(&self) -> &str {
        match self {
            RunResult::Succeeded(text) | RunResult::Failed(text) => text,
        }
    }

    pub fn output(&self) -> Option<&str> {
        match self {
            RunResult::Succeeded(output) => Some(output),
            RunResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RunResult::Failed(error) => Some(error),
            RunResult::Succeeded(_) => None,
        }
    }
}

/// Serializable form of a [`RunResult`], tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunReport {
    Succeeded { output: String },
    Failed { error: String },
}

impl From<&RunResult> for RunReport {
    fn from(result: &RunResult) -> Self {
        match result {
            RunResult::Succeeded(output) => RunReport::Succeeded {
                output: output.clone(),
            },
            RunResult::Failed(error) => RunReport::Failed {
                error: error.clone(),
            },
        }
    }
}

/// Runs snippets against a host console and timer host.
pub struct Sandbox {
    config: SandboxConfig,
    console: HostConsole,
    timers: Rc<dyn TimerHost>,
}

impl Sandbox {
    pub fn new(config: SandboxConfig, console: HostConsole, timers: Rc<dyn TimerHost>) -> Self {
        Self {
            config,
            console,
            timers,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn console(&self) -> &HostConsole {
        &self.console
    }

    /// Evaluate `text`.
    ///
    /// While the snippet runs, the host console writes into a fresh log
    /// buffer; the real console is back in place when this returns,
    /// whatever the outcome.
    pub fn run(&self, text: &str) -> RunResult {
        info!(bytes = text.len(), "run started");
        let log = LogBuffer::new();
        let outcome = {
            let _redirect = ConsoleRedirect::install(&self.console, Rc::new(log.clone()));
            self.execute(text, &log)
        };

        match outcome {
            Ok(()) => {
                info!(lines = log.len(), "run succeeded");
                // `console.log('')` leaves a line but no text.
                let text = log.joined();
                if text.is_empty() {
                    RunResult::Succeeded(self.config.success_placeholder.clone())
                } else {
                    RunResult::Succeeded(text)
                }
            }
            Err(err) => {
                info!(error = %err, "run failed");
                RunResult::Failed(format!("{}{}", self.config.error_prefix, err.message()))
            }
        }
    }

    fn execute(&self, text: &str, log: &LogBuffer) -> EvalResult<()> {
        let mut unit = compile(text, &CONTEXT_NAMES, self.config.limits())?;
        let context =
            ExecutionContext::build(unit.interpreter(), &self.console, &self.timers, log);
        let result = unit.invoke(&context.values())?;
        debug!(steps = unit.interpreter().steps_used(), "snippet returned");
        if !matches!(result, Value::Undefined) {
            let json = unit
                .interpreter_mut()
                .json_stringify(&result)?
                .unwrap_or_else(|| "undefined".to_string());
            log.push(format!("Return value: {json}"));
        }
        Ok(())
    }
}
