//! # jsplay-sandbox
//!
//! Runs short JavaScript snippets in a constrained context and captures
//! what they print.
//!
//! A run compiles the snippet as the body of a function whose parameters
//! are the [context names](CONTEXT_NAMES), calls it with the context
//! values, and turns whatever the snippet logged (or the error it threw)
//! into a [`RunResult`]. Console output is captured by temporarily
//! redirecting the host console; timers scheduled by the snippet fire
//! after the run, against the restored console.
//!
//! ```ignore
//! use jsplay_sandbox::{EditorConfig, EditorSession, HostConsole, TimerQueue};
//!
//! let console = HostConsole::stdio();
//! let timers = TimerQueue::new(console.clone(), Default::default());
//! let mut session = EditorSession::new(EditorConfig::default(), console, Rc::new(timers));
//! let result = session.run()?;
//! assert_eq!(result.text(), "Hello World!");
//! ```

pub mod compile;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod hooks;
pub mod samples;
pub mod sandbox;
pub mod session;
pub mod timers;

pub use compile::{compile, wrap_source, CompiledUnit};
pub use config::{EditorConfig, SandboxConfig};
pub use console::{
    ConsoleRedirect, ConsoleSink, HostConsole, LogBuffer, MemoryConsole, StdConsole,
};
pub use context::{ExecutionContext, CONTEXT_NAMES};
pub use error::SandboxError;
pub use samples::{Sample, SAMPLES};
pub use sandbox::{RunReport, RunResult, Sandbox};
pub use session::{EditorSession, SessionState};
pub use timers::{TimerHost, TimerId, TimerQueue, TimerTask};
