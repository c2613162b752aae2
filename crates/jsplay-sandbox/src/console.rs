//! Console capture.
//!
//! Scripts never hold the host console directly. The `console` object in the
//! execution context forwards to a [`HostConsole`], a swappable slot that
//! normally points at the real console and, while a run is in progress,
//! at the run's [`LogBuffer`]. [`ConsoleRedirect`] performs the swap and
//! puts the previous sink back when it is dropped, on every exit path.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

/// Prefix the capture buffer puts in front of `console.error` lines.
pub const ERROR_LINE_PREFIX: &str = "ERROR: ";

/// Where console lines go.
pub trait ConsoleSink {
    fn log(&self, line: &str);
    fn error(&self, line: &str);
}

// ══════════════════════════════════════════════════════════════════════════════
// LogBuffer
// ══════════════════════════════════════════════════════════════════════════════

/// The per-run log buffer. Cloning shares the underlying lines.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    lines: Rc<RefCell<Vec<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    /// All lines joined with `\n`.
    pub fn joined(&self) -> String {
        self.lines.borrow().join("\n")
    }
}

impl ConsoleSink for LogBuffer {
    fn log(&self, line: &str) {
        self.push(line);
    }

    fn error(&self, line: &str) {
        self.push(format!("{ERROR_LINE_PREFIX}{line}"));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Host consoles
// ══════════════════════════════════════════════════════════════════════════════

/// Standard output and standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsole;

impl ConsoleSink for StdConsole {
    fn log(&self, line: &str) {
        println!("{line}");
    }

    fn error(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// Which console method produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Log,
    Error,
}

/// A console that remembers everything written to it.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    entries: Rc<RefCell<Vec<(Channel, String)>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Channel, String)> {
        self.entries.borrow().clone()
    }

    /// Lines written through `log`.
    pub fn logs(&self) -> Vec<String> {
        self.lines_on(Channel::Log)
    }

    /// Lines written through `error`.
    pub fn errors(&self) -> Vec<String> {
        self.lines_on(Channel::Error)
    }

    fn lines_on(&self, channel: Channel) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl ConsoleSink for MemoryConsole {
    fn log(&self, line: &str) {
        self.entries.borrow_mut().push((Channel::Log, line.to_string()));
    }

    fn error(&self, line: &str) {
        self.entries
            .borrow_mut()
            .push((Channel::Error, line.to_string()));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// HostConsole
// ══════════════════════════════════════════════════════════════════════════════

/// The host's console slot. Cloning shares the slot.
#[derive(Clone)]
pub struct HostConsole {
    current: Rc<RefCell<Rc<dyn ConsoleSink>>>,
}

impl HostConsole {
    pub fn new(sink: Rc<dyn ConsoleSink>) -> Self {
        Self {
            current: Rc::new(RefCell::new(sink)),
        }
    }

    /// A host console backed by standard output and standard error.
    pub fn stdio() -> Self {
        Self::new(Rc::new(StdConsole))
    }

    pub fn log(&self, line: &str) {
        self.sink().log(line);
    }

    pub fn error(&self, line: &str) {
        self.sink().error(line);
    }

    /// The sink currently installed.
    pub fn sink(&self) -> Rc<dyn ConsoleSink> {
        self.current.borrow().clone()
    }

    /// True while `sink` is the installed sink.
    pub fn is_current(&self, sink: &Rc<dyn ConsoleSink>) -> bool {
        Rc::ptr_eq(&self.sink(), sink)
    }

    fn replace(&self, sink: Rc<dyn ConsoleSink>) -> Rc<dyn ConsoleSink> {
        std::mem::replace(&mut *self.current.borrow_mut(), sink)
    }
}

impl std::fmt::Debug for HostConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostConsole").finish_non_exhaustive()
    }
}

/// Redirects a [`HostConsole`] for as long as the guard lives.
pub struct ConsoleRedirect {
    host: HostConsole,
    previous: Option<Rc<dyn ConsoleSink>>,
}

impl ConsoleRedirect {
    pub fn install(host: &HostConsole, sink: Rc<dyn ConsoleSink>) -> Self {
        let previous = host.replace(sink);
        debug!("console redirected");
        Self {
            host: host.clone(),
            previous: Some(previous),
        }
    }
}

impl Drop for ConsoleRedirect {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.host.replace(previous);
            debug!("console restored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_prefixes_error_lines() {
        let buffer = LogBuffer::new();
        buffer.log("a");
        buffer.error("b");
        assert_eq!(buffer.lines(), vec!["a", "ERROR: b"]);
        assert_eq!(buffer.joined(), "a\nERROR: b");
    }

    #[test]
    fn redirect_restores_on_drop() {
        let memory = MemoryConsole::new();
        let real: Rc<dyn ConsoleSink> = Rc::new(memory.clone());
        let host = HostConsole::new(real.clone());
        let buffer = LogBuffer::new();
        {
            let _redirect = ConsoleRedirect::install(&host, Rc::new(buffer.clone()));
            host.log("captured");
            assert!(!host.is_current(&real));
        }
        host.log("after");
        assert!(host.is_current(&real));
        assert_eq!(buffer.lines(), vec!["captured"]);
        assert_eq!(memory.logs(), vec!["after"]);
    }

    #[test]
    fn redirect_restores_during_unwind() {
        let memory = MemoryConsole::new();
        let real: Rc<dyn ConsoleSink> = Rc::new(memory.clone());
        let host = HostConsole::new(real.clone());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _redirect = ConsoleRedirect::install(&host, Rc::new(LogBuffer::new()));
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(host.is_current(&real));
    }

    #[test]
    fn nested_redirects_unwind_in_order() {
        let host = HostConsole::new(Rc::new(MemoryConsole::new()));
        let original = host.sink();
        let outer = LogBuffer::new();
        let inner = LogBuffer::new();
        {
            let _a = ConsoleRedirect::install(&host, Rc::new(outer.clone()));
            {
                let _b = ConsoleRedirect::install(&host, Rc::new(inner.clone()));
                host.error("inner");
            }
            host.log("outer");
        }
        assert!(host.is_current(&original));
        assert_eq!(inner.lines(), vec!["ERROR: inner"]);
        assert_eq!(outer.lines(), vec!["outer"]);
    }
}
