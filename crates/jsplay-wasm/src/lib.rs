//! The jsplay sandbox as a WASM module for browser environments.
//!
//! Snippets print to the page's real `console` outside a run, and timers
//! they schedule go to the browser's own `setTimeout`/`setInterval`.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { Editor, run } from 'jsplay-wasm';
//!
//! await init();
//!
//! console.log(JSON.parse(run("console.log(1 + 1)")));
//! // { status: "succeeded", output: "2" }
//!
//! const editor = new Editor(JSON.stringify({ title: "useEffect" }));
//! editor.set_code("throw new Error('x')");
//! editor.run();
//! editor.error(); // "실행 오류: x"
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use jsplay_eval::Limits;
use jsplay_sandbox::timers::uncaught_line;
use jsplay_sandbox::{
    ConsoleSink, EditorConfig, EditorSession, HostConsole, RunReport, Sandbox, SandboxConfig,
    SessionState, TimerHost, TimerId, TimerTask, SAMPLES,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(line: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(line: &str);

    #[wasm_bindgen(js_name = setTimeout)]
    fn set_timeout(handler: &JsValue, timeout: i32) -> i32;

    #[wasm_bindgen(js_name = setInterval)]
    fn set_interval(handler: &JsValue, timeout: i32) -> i32;

    #[wasm_bindgen(js_name = clearTimeout)]
    fn clear_timeout(id: i32);
}

// ══════════════════════════════════════════════════════════════════════════════
// Browser hosts
// ══════════════════════════════════════════════════════════════════════════════

struct BrowserConsole;

impl ConsoleSink for BrowserConsole {
    fn log(&self, line: &str) {
        console_log(line);
    }

    fn error(&self, line: &str) {
        console_error(line);
    }
}

/// Timers backed by the browser. Interval closures stay alive until
/// cleared; timeout closures free themselves after firing.
struct BrowserTimers {
    console: HostConsole,
    limits: Limits,
    intervals: Rc<RefCell<HashMap<TimerId, Closure<dyn FnMut()>>>>,
}

impl BrowserTimers {
    fn new(console: HostConsole, limits: Limits) -> Self {
        Self {
            console,
            limits,
            intervals: Rc::default(),
        }
    }
}

impl TimerHost for BrowserTimers {
    fn schedule(&self, task: TimerTask, delay_ms: f64, repeat: bool) -> TimerId {
        let console = self.console.clone();
        let limits = self.limits;
        let fire = move || {
            if let Err(err) = task.fire(limits) {
                console.error(&uncaught_line(&err));
            }
        };
        let delay = delay_ms.min(f64::from(i32::MAX)) as i32;
        if repeat {
            let closure = Closure::<dyn FnMut()>::new(fire);
            let id = set_interval(closure.as_ref(), delay) as TimerId;
            self.intervals.borrow_mut().insert(id, closure);
            id
        } else {
            set_timeout(&Closure::once_into_js(fire), delay) as TimerId
        }
    }

    fn cancel(&self, id: TimerId) {
        // Timeout and interval ids share one pool in browsers.
        clear_timeout(id as i32);
        self.intervals.borrow_mut().remove(&id);
    }
}

fn browser_hosts(limits: Limits) -> (HostConsole, Rc<dyn TimerHost>) {
    let console = HostConsole::new(Rc::new(BrowserConsole));
    let timers: Rc<dyn TimerHost> = Rc::new(BrowserTimers::new(console.clone(), limits));
    (console, timers)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(
            r#"{{"status":"failed","error":"Serialization error: {}"}}"#,
            e.to_string().replace('"', "'")
        )
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Free functions
// ══════════════════════════════════════════════════════════════════════════════

/// Run a snippet with the default configuration.
///
/// Returns a JSON `RunReport`:
/// ```json
/// { "status": "succeeded", "output": "Hello World!" }
/// { "status": "failed", "error": "실행 오류: x is not defined" }
/// ```
#[wasm_bindgen]
pub fn run(code: &str) -> String {
    let config = SandboxConfig::default();
    let (console, timers) = browser_hosts(config.limits());
    let result = Sandbox::new(config, console, timers).run(code);
    to_json(&RunReport::from(&result))
}

/// The built-in samples as a JSON array of `{ title, description, code }`.
#[wasm_bindgen]
pub fn samples() -> String {
    #[derive(Serialize)]
    struct SampleJson<'a> {
        title: &'a str,
        description: &'a str,
        code: &'a str,
    }
    let samples: Vec<SampleJson<'_>> = SAMPLES
        .iter()
        .map(|s| SampleJson {
            title: s.title,
            description: s.description,
            code: s.code,
        })
        .collect();
    to_json(&samples)
}

/// Return the package version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ══════════════════════════════════════════════════════════════════════════════
// Editor
// ══════════════════════════════════════════════════════════════════════════════

/// One code editor: code buffer, run state and result panes.
#[wasm_bindgen]
pub struct Editor {
    session: EditorSession,
}

#[wasm_bindgen]
impl Editor {
    /// `config` is an optional JSON `EditorConfig`; missing fields take
    /// their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<Editor, JsError> {
        let config = match config {
            Some(json) => EditorConfig::from_json(&json)?,
            None => EditorConfig::default(),
        };
        let (console, timers) = browser_hosts(config.sandbox.limits());
        Ok(Editor {
            session: EditorSession::new(config, console, timers),
        })
    }

    /// Build an editor from a plain JS object instead of a JSON string.
    pub fn from_object(config: JsValue) -> Result<Editor, JsError> {
        let config: EditorConfig = serde_wasm_bindgen::from_value(config)?;
        let (console, timers) = browser_hosts(config.sandbox.limits());
        Ok(Editor {
            session: EditorSession::new(config, console, timers),
        })
    }

    pub fn title(&self) -> String {
        self.session.title().to_string()
    }

    pub fn language(&self) -> String {
        self.session.language().to_string()
    }

    pub fn code(&self) -> String {
        self.session.code().to_string()
    }

    pub fn set_code(&mut self, code: &str) {
        self.session.set_code(code);
    }

    /// Run the current code; returns a JSON `RunReport`.
    pub fn run(&mut self) -> Result<String, JsError> {
        let result = self.session.run()?;
        Ok(to_json(&RunReport::from(&result)))
    }

    /// The run report as a JS object.
    pub fn run_object(&mut self) -> Result<JsValue, JsError> {
        let result = self.session.run()?;
        Ok(serde_wasm_bindgen::to_value(&RunReport::from(&result))?)
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn is_running(&self) -> bool {
        self.session.state() == SessionState::Running
    }

    pub fn output(&self) -> String {
        self.session.output().to_string()
    }

    /// Output pane text, with the not-yet-run placeholder.
    pub fn output_pane(&self) -> String {
        self.session.output_pane().to_string()
    }

    pub fn error(&self) -> String {
        self.session.error().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_the_package() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn samples_serialize_as_an_array() {
        let json: serde_json::Value = serde_json::from_str(&samples()).unwrap();
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), SAMPLES.len());
        assert_eq!(list[0]["title"], "기본 useEffect");
    }
}
