//! The editor session: code buffer, run state and the two result panes.

use std::rc::Rc;

use tracing::debug;

use crate::config::{EditorConfig, NOT_RUN_PLACEHOLDER};
use crate::console::HostConsole;
use crate::error::SandboxError;
use crate::sandbox::{RunResult, Sandbox};
use crate::timers::TimerHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

/// One editor instance.
pub struct EditorSession {
    config: EditorConfig,
    sandbox: Sandbox,
    code: String,
    output: String,
    error: String,
    state: SessionState,
}

impl EditorSession {
    pub fn new(config: EditorConfig, console: HostConsole, timers: Rc<dyn TimerHost>) -> Self {
        let sandbox = Sandbox::new(config.sandbox.clone(), console, timers);
        Self {
            code: config.initial_code.clone(),
            config,
            sandbox,
            output: String::new(),
            error: String::new(),
            state: SessionState::Idle,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// What the output pane shows: the last output, or a placeholder.
    pub fn output_pane(&self) -> &str {
        if self.output.is_empty() {
            NOT_RUN_PLACEHOLDER
        } else {
            &self.output
        }
    }

    /// Enter the running state and clear both panes. Returns the code to run.
    ///
    /// Hosts that evaluate asynchronously call this, run the snippet, then
    /// hand the result to [`finish_run`](Self::finish_run).
    pub fn begin_run(&mut self) -> Result<String, SandboxError> {
        if self.state == SessionState::Running {
            return Err(SandboxError::Busy);
        }
        self.state = SessionState::Running;
        self.output.clear();
        self.error.clear();
        Ok(self.code.clone())
    }

    /// Record a run's result and return to idle.
    pub fn finish_run(&mut self, result: &RunResult) {
        match result {
            RunResult::Succeeded(output) => self.output = output.clone(),
            RunResult::Failed(error) => self.error = error.clone(),
        }
        self.state = SessionState::Idle;
        debug!(success = result.is_success(), "run recorded");
    }

    /// Run the current code to completion.
    pub fn run(&mut self) -> Result<RunResult, SandboxError> {
        let code = self.begin_run()?;
        let result = self.sandbox.run(&code);
        self.finish_run(&result);
        Ok(result)
    }

    /// Restore the initial code and clear both panes.
    pub fn reset(&mut self) {
        self.code = self.config.initial_code.clone();
        self.output.clear();
        self.error.clear();
        debug!("session reset");
    }
}
