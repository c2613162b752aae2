//! End-to-end runs through the sandbox: capture, restore, hooks, timers,
//! failures and the editor session.

use std::rc::Rc;

use jsplay_sandbox::config::{ERROR_PREFIX, NOT_RUN_PLACEHOLDER, SUCCESS_PLACEHOLDER};
use jsplay_sandbox::samples::{self, SAMPLES};
use jsplay_sandbox::{
    ConsoleSink, EditorConfig, EditorSession, HostConsole, MemoryConsole, RunReport, RunResult,
    Sandbox, SandboxConfig, SandboxError, SessionState, TimerHost, TimerQueue,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

struct Fixture {
    sandbox: Sandbox,
    real: MemoryConsole,
    real_sink: Rc<dyn ConsoleSink>,
    timers: TimerQueue,
}

fn fixture_with(config: SandboxConfig) -> Fixture {
    let real = MemoryConsole::new();
    let real_sink: Rc<dyn ConsoleSink> = Rc::new(real.clone());
    let console = HostConsole::new(real_sink.clone());
    let timers = TimerQueue::new(console.clone(), config.limits());
    let host: Rc<dyn TimerHost> = Rc::new(timers.clone());
    Fixture {
        sandbox: Sandbox::new(config, console, host),
        real,
        real_sink,
        timers,
    }
}

fn fixture() -> Fixture {
    fixture_with(SandboxConfig::default())
}

fn output(code: &str) -> String {
    match fixture().sandbox.run(code) {
        RunResult::Succeeded(output) => output,
        RunResult::Failed(error) => panic!("run failed: {error}"),
    }
}

fn failure(code: &str) -> String {
    match fixture().sandbox.run(code) {
        RunResult::Failed(error) => error,
        RunResult::Succeeded(output) => panic!("run succeeded with: {output}"),
    }
}

fn session() -> (EditorSession, MemoryConsole) {
    let real = MemoryConsole::new();
    let console = HostConsole::new(Rc::new(real.clone()));
    let timers = TimerQueue::new(console.clone(), Default::default());
    let session = EditorSession::new(EditorConfig::default(), console, Rc::new(timers));
    (session, real)
}

// ══════════════════════════════════════════════════════════════════════════════
// Output capture
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn two_logs_become_two_lines() {
    assert_eq!(output("console.log('hi'); console.log('bye');"), "hi\nbye");
}

#[test]
fn expression_statement_without_output_uses_the_placeholder() {
    assert_eq!(output("1 + 1;"), SUCCESS_PLACEHOLDER);
}

#[test]
fn log_lines_join_with_newlines() {
    assert_eq!(output("console.log('a'); console.log('b', 1, true);"), "a\nb 1 true");
}

#[test]
fn error_lines_are_prefixed() {
    assert_eq!(
        output("console.log('ok'); console.error('bad', 2);"),
        "ok\nERROR: bad 2"
    );
}

#[test]
fn console_arguments_stringify_like_array_join() {
    assert_eq!(
        output("console.log([1, [2, 3]], {a: 1}, null, undefined, 'end');"),
        "1,2,3 [object Object]   end"
    );
}

#[test]
fn silent_run_reports_the_placeholder() {
    assert_eq!(output("let x = 1 + 1;"), SUCCESS_PLACEHOLDER);
    assert_eq!(output(""), SUCCESS_PLACEHOLDER);
}

#[test]
fn logging_only_empty_text_reports_the_placeholder() {
    assert_eq!(output("console.log('');"), SUCCESS_PLACEHOLDER);
    assert_eq!(output("console.log();"), SUCCESS_PLACEHOLDER);
    assert_eq!(output("console.log(''); console.log('x');"), "\nx");
}

#[test]
fn return_value_is_logged_as_json() {
    assert_eq!(output("return {a: [1, 2], b: 'x'};"), r#"Return value: {"a":[1,2],"b":"x"}"#);
    assert_eq!(output("console.log('hi'); return 42;"), "hi\nReturn value: 42");
    assert_eq!(output("return null;"), "Return value: null");
}

#[test]
fn undefined_return_is_not_logged() {
    assert_eq!(output("return undefined;"), SUCCESS_PLACEHOLDER);
    assert_eq!(output("return;"), SUCCESS_PLACEHOLDER);
}

#[test]
fn unserializable_return_prints_undefined() {
    assert_eq!(output("return function () {};"), "Return value: undefined");
}

#[test]
fn captured_lines_never_reach_the_real_console() {
    let fx = fixture();
    fx.sandbox.run("console.log('inside'); console.error('oops');");
    assert!(fx.real.entries().is_empty());
}

#[test]
fn runs_do_not_share_state() {
    let fx = fixture();
    assert_eq!(fx.sandbox.run("var shared = 1; console.log(shared);").text(), "1");
    assert_eq!(fx.sandbox.run("console.log(typeof shared);").text(), "undefined");
}

// ══════════════════════════════════════════════════════════════════════════════
// Console restore
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn console_is_restored_after_success() {
    let fx = fixture();
    fx.sandbox.run("console.log('x');");
    assert!(fx.sandbox.console().is_current(&fx.real_sink));
    fx.sandbox.console().log("host line");
    assert_eq!(fx.real.logs(), vec!["host line"]);
}

#[test]
fn console_is_restored_after_runtime_error() {
    let fx = fixture();
    let result = fx.sandbox.run("console.log('before'); null.x;");
    assert!(!result.is_success());
    assert!(fx.sandbox.console().is_current(&fx.real_sink));
}

#[test]
fn console_is_restored_after_syntax_error() {
    let fx = fixture();
    let result = fx.sandbox.run("let = ;");
    assert!(!result.is_success());
    assert!(fx.sandbox.console().is_current(&fx.real_sink));
}

#[test]
fn console_is_restored_after_step_limit() {
    let fx = fixture_with(SandboxConfig {
        gas_limit: 5_000,
        ..SandboxConfig::default()
    });
    let result = fx.sandbox.run("while (true) {}");
    assert_eq!(result.error(), Some("실행 오류: execution step limit exceeded"));
    assert!(fx.sandbox.console().is_current(&fx.real_sink));
}

// ══════════════════════════════════════════════════════════════════════════════
// Failures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn runtime_errors_use_the_error_message() {
    assert_eq!(failure("undefinedFn();"), "실행 오류: undefinedFn is not defined");
    assert_eq!(
        failure("throw new Error('custom failure');"),
        "실행 오류: custom failure"
    );
}

#[test]
fn failure_discards_captured_output() {
    let fx = fixture();
    let result = fx.sandbox.run("console.log('lost'); throw new TypeError('bad');");
    assert_eq!(result, RunResult::Failed(format!("{ERROR_PREFIX}bad")));
    assert_eq!(result.output(), None);
}

#[test]
fn thrown_primitives_have_no_message() {
    assert_eq!(failure("throw 'plain string';"), "실행 오류: undefined");
}

#[test]
fn syntax_errors_fail_without_running() {
    let fx = fixture();
    let result = fx.sandbox.run("console.log('never');\nlet = ;");
    assert!(!result.is_success());
    assert!(result.text().starts_with(ERROR_PREFIX));
    assert!(fx.real.entries().is_empty());
}

#[test]
fn unreachable_globals_are_reference_errors() {
    assert_eq!(failure("document.title;"), "실행 오류: document is not defined");
    assert_eq!(failure("window.alert(1);"), "실행 오류: window is not defined");
}

#[test]
fn unserializable_return_value_fails_the_run() {
    let error = failure("const a = {}; a.self = a; return a;");
    assert!(error.starts_with(ERROR_PREFIX));
    assert!(error.contains("circular"), "{error}");
}

#[test]
fn custom_prefix_and_placeholder() {
    let fx = fixture_with(SandboxConfig {
        success_placeholder: "done".into(),
        error_prefix: "error: ".into(),
        ..SandboxConfig::default()
    });
    assert_eq!(fx.sandbox.run("1;").text(), "done");
    assert_eq!(fx.sandbox.run("nope;").text(), "error: nope is not defined");
}

// ══════════════════════════════════════════════════════════════════════════════
// Deep data
// ══════════════════════════════════════════════════════════════════════════════

fn roomy() -> Fixture {
    fixture_with(SandboxConfig {
        gas_limit: 20_000_000,
        ..SandboxConfig::default()
    })
}

#[test]
fn long_linked_lists_are_freed_without_crashing() {
    let fx = roomy();
    let result = fx.sandbox.run(
        "let n = null;\n\
         for (let i = 0; i < 50000; i++) n = { v: i, next: n };\n\
         console.log(n.v);",
    );
    assert_eq!(result, RunResult::Succeeded("49999".into()));
}

#[test]
fn stringifying_deep_nesting_is_a_catchable_range_error() {
    let fx = roomy();
    let result = fx.sandbox.run(
        "let a = [];\n\
         for (let i = 0; i < 5000; i++) a = [a];\n\
         try { JSON.stringify(a); } catch (e) { console.log(e instanceof RangeError, e.message); }",
    );
    assert_eq!(
        result.text(),
        "true Maximum call stack size exceeded"
    );
}

#[test]
fn logging_a_deep_array_fails_the_run() {
    let fx = roomy();
    let result = fx.sandbox.run(
        "let a = [];\n\
         for (let i = 0; i < 50000; i++) a = [a];\n\
         console.log(a);",
    );
    assert_eq!(
        result,
        RunResult::Failed(format!("{ERROR_PREFIX}Maximum call stack size exceeded"))
    );
}

#[test]
fn returning_deep_nesting_fails_the_run() {
    let fx = roomy();
    let result = fx.sandbox.run(
        "let o = {};\n\
         for (let i = 0; i < 5000; i++) o = { o };\n\
         return o;",
    );
    assert_eq!(
        result,
        RunResult::Failed(format!("{ERROR_PREFIX}Maximum call stack size exceeded"))
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Hooks
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn use_state_setter_logs_json() {
    assert_eq!(
        output("const [v, setV] = useState(1); console.log(v); setV({n: [v]}); setV('s');"),
        "1\nState updated: {\"n\":[1]}\nState updated: \"s\""
    );
}

#[test]
fn use_state_setter_changes_nothing() {
    assert_eq!(
        output(
            "const [a, setA] = useState(1); setA(2);\n\
             const [b] = useState(1); console.log(a, b);"
        ),
        "State updated: 2\n1 1"
    );
}

#[test]
fn use_state_setter_with_function_logs_undefined() {
    assert_eq!(
        output("const [, set] = useState(0); set(x => x + 1);"),
        "State updated: undefined"
    );
}

#[test]
fn use_effect_runs_immediately_and_notes_cleanup() {
    assert_eq!(
        output("useEffect(() => { console.log('effect'); return () => {}; }, [1, 'a']);"),
        "useEffect called with deps: [1,\"a\"]\neffect\nCleanup function returned"
    );
}

#[test]
fn use_effect_without_deps() {
    assert_eq!(
        output("useEffect(() => {});"),
        "useEffect called with deps: undefined"
    );
}

#[test]
fn use_effect_errors_are_logged_not_thrown() {
    assert_eq!(
        output("useEffect(() => { missing(); }, []); console.log('still running');"),
        "useEffect called with deps: []\nuseEffect error: missing is not defined\nstill running"
    );
}

#[test]
fn use_effect_step_limit_still_aborts() {
    let fx = fixture_with(SandboxConfig {
        gas_limit: 5_000,
        ..SandboxConfig::default()
    });
    let result = fx.sandbox.run("useEffect(() => { for (;;) {} }, []);");
    assert_eq!(result.error(), Some("실행 오류: execution step limit exceeded"));
}

#[test]
fn use_ref_callback_and_memo() {
    assert_eq!(
        output(
            "const r = useRef(5); r.current++; console.log(r.current);\n\
             const f = useCallback(() => 'cb', []); console.log(f());\n\
             const m = useMemo(() => 6 * 7, [r]); console.log(m);"
        ),
        "6\nuseCallback called with deps: []\ncb\nuseMemo called with deps: [{\"current\":6}]\n42"
    );
}

#[test]
fn react_namespace_carries_the_hooks() {
    assert_eq!(
        output("console.log(React.useState === useState, typeof React.useMemo);"),
        "true function"
    );
}

#[test]
fn use_memo_requires_a_function() {
    assert_eq!(failure("useMemo(1, []);"), "실행 오류: factory is not a function");
}

// ══════════════════════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn timeouts_fire_after_the_run_on_the_real_console() {
    let fx = fixture();
    let result = fx.sandbox.run("setTimeout(() => console.log('later'), 100); console.log('now');");
    assert_eq!(result.text(), "now");
    assert!(fx.real.logs().is_empty());

    assert_eq!(fx.timers.advance(99.0), 0);
    assert_eq!(fx.timers.advance(1.0), 1);
    assert_eq!(fx.real.logs(), vec!["later"]);
    assert_eq!(fx.timers.pending(), 0);
}

#[test]
fn timers_fire_in_due_order() {
    let fx = fixture();
    fx.sandbox.run(
        "setTimeout(() => console.log('b'), 20);\n\
         setTimeout(() => console.log('a'), 10);\n\
         setTimeout(() => console.log('c'), 20);\n\
         setTimeout((x, y) => console.log(x + y), 5, 2, 3);",
    );
    fx.timers.advance(50.0);
    assert_eq!(fx.real.logs(), vec!["5", "a", "b", "c"]);
}

#[test]
fn cleared_timers_never_fire() {
    let fx = fixture();
    fx.sandbox.run("const id = setTimeout(() => console.log('no'), 10); clearTimeout(id); clearTimeout(undefined);");
    assert_eq!(fx.timers.pending(), 0);
    fx.timers.advance(100.0);
    assert!(fx.real.entries().is_empty());
}

#[test]
fn intervals_repeat_until_cleared() {
    let fx = fixture();
    fx.sandbox.run(
        "let n = 0;\n\
         const id = setInterval(() => { n++; console.log('tick ' + n); if (n === 3) clearInterval(id); }, 10);",
    );
    fx.timers.advance(100.0);
    assert_eq!(fx.real.logs(), vec!["tick 1", "tick 2", "tick 3"]);
    assert_eq!(fx.timers.pending(), 0);
}

#[test]
fn failing_callbacks_report_uncaught_errors() {
    let fx = fixture();
    fx.sandbox.run("setTimeout(() => { throw new Error('late'); }, 0);");
    fx.timers.advance(0.0);
    assert_eq!(fx.real.errors(), vec!["Uncaught Error: late"]);
}

#[test]
fn callbacks_see_the_same_builtins_as_the_run() {
    let fx = fixture();
    let check = "console.log([] instanceof Array, ({}).constructor === Object, [].constructor === Array)";
    let result = fx.sandbox.run(&format!("{check}; setTimeout(() => {check}, 5);"));
    assert_eq!(result.text(), "true true true");
    fx.timers.advance(10.0);
    assert_eq!(fx.real.logs(), vec!["true true true"]);
}

#[test]
fn undeclared_assignments_in_callbacks_stay_with_their_run() {
    let fx = fixture();
    fx.sandbox.run("setTimeout(() => { late = 1; }, 1); setTimeout(() => console.log(late), 2);");
    fx.timers.advance(5.0);
    assert_eq!(fx.real.logs(), vec!["1"]);
    assert_eq!(fx.sandbox.run("console.log(typeof late);").text(), "undefined");
}

#[test]
fn scheduling_a_non_function_fails() {
    let error = failure("setTimeout('console.log(1)', 10);");
    assert!(error.contains("is not a function"), "{error}");
}

#[test]
fn timer_ids_are_distinct_numbers() {
    assert_eq!(
        output("const a = setTimeout(() => {}, 1); const b = setInterval(() => {}, 1); console.log(typeof a, a !== b);"),
        "number true"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Samples
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn basic_effect_sample() {
    assert_eq!(
        output(SAMPLES[0].code),
        "useEffect called with deps: []\n컴포넌트가 마운트되었습니다!\n현재 count: 0"
    );
}

#[test]
fn dependency_array_sample() {
    assert_eq!(
        output(SAMPLES[1].code),
        "useEffect called with deps: [0]\n\
         count가 변경되었습니다: 0\n\
         State updated: 1\n\
         State updated: 3\n\
         State updated: 5\n\
         State updated: \"Vue\""
    );
}

#[test]
fn cleanup_sample_leaves_an_interval_behind() {
    let fx = fixture();
    let result = fx.sandbox.run(SAMPLES[2].code);
    assert_eq!(
        result.text(),
        "useEffect called with deps: []\n\
         타이머를 시작합니다\n\
         Cleanup function returned\n\
         현재 seconds: 0"
    );
    assert_eq!(fx.timers.pending(), 1);
    fx.timers.advance(2_000.0);
    assert_eq!(fx.real.logs(), vec!["1초가 지났습니다", "1초가 지났습니다"]);
}

#[test]
fn multiple_effects_sample() {
    let fx = fixture();
    let result = fx.sandbox.run(SAMPLES[3].code);
    assert_eq!(
        result.text(),
        "useEffect called with deps: [{\"id\":1,\"name\":\"Alice\"}]\n\
         사용자 정보가 변경되었습니다: Alice\n\
         사용자 ID: 1\n\
         useEffect called with deps: [\"light\"]\n\
         테마가 변경되었습니다: light\n\
         useEffect error: document is not defined\n\
         useEffect called with deps: []\n\
         초기 데이터를 로딩합니다...\n\
         State updated: {\"id\":2,\"name\":\"Bob\"}\n\
         State updated: \"dark\""
    );
    fx.timers.advance(1_000.0);
    assert_eq!(fx.real.logs(), vec!["데이터 로딩 완료!"]);
}

#[test]
fn common_mistakes_sample() {
    assert_eq!(
        output(SAMPLES[4].code),
        "useEffect called with deps: [0]\n\
         count 변경: 0\n\
         useEffect called with deps: [0,[]]\n\
         현재 count: 0\n\
         items 길이: 0\n\
         컴포넌트 렌더링 완료"
    );
}

#[test]
fn samples_are_found_by_index_or_title() {
    assert_eq!(samples::find("1"), Some(&SAMPLES[1]));
    assert_eq!(samples::find("기본 useEffect"), Some(&SAMPLES[0]));
    assert_eq!(samples::find("9"), None);
}

// ══════════════════════════════════════════════════════════════════════════════
// Session
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn session_starts_with_defaults() {
    let (session, _) = session();
    assert_eq!(session.title(), "코드 편집기");
    assert_eq!(session.language(), "javascript");
    assert_eq!(session.code(), "// 여기에 코드를 작성하세요\nconsole.log('Hello World!');");
    assert_eq!(session.output_pane(), NOT_RUN_PLACEHOLDER);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn session_runs_the_initial_code() {
    let (mut session, real) = session();
    let result = session.run().unwrap();
    assert_eq!(result, RunResult::Succeeded("Hello World!".into()));
    assert_eq!(session.output(), "Hello World!");
    assert_eq!(session.output_pane(), "Hello World!");
    assert_eq!(session.error(), "");
    assert!(real.entries().is_empty());
}

#[test]
fn blank_output_still_counts_as_a_run() {
    let (mut session, _) = session();
    session.set_code("console.log('');");
    let result = session.run().unwrap();
    assert_eq!(result, RunResult::Succeeded(SUCCESS_PLACEHOLDER.into()));
    assert_eq!(session.output_pane(), SUCCESS_PLACEHOLDER);
}

#[test]
fn output_and_error_are_never_both_set() {
    let (mut session, _) = session();
    session.run().unwrap();
    session.set_code("throw new Error('nope');");
    session.run().unwrap();
    assert_eq!(session.output(), "");
    assert_eq!(session.error(), "실행 오류: nope");
    assert_eq!(session.output_pane(), NOT_RUN_PLACEHOLDER);

    session.set_code("console.log('fine');");
    session.run().unwrap();
    assert_eq!(session.output(), "fine");
    assert_eq!(session.error(), "");
}

#[test]
fn a_second_run_while_running_is_rejected() {
    let (mut session, _) = session();
    let code = session.begin_run().unwrap();
    assert_eq!(session.state(), SessionState::Running);
    assert!(matches!(session.begin_run(), Err(SandboxError::Busy)));
    assert!(matches!(session.run(), Err(SandboxError::Busy)));

    session.finish_run(&RunResult::Succeeded(code));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.run().is_ok());
}

#[test]
fn reset_restores_the_initial_code() {
    let (mut session, _) = session();
    session.set_code("console.log(1);");
    session.run().unwrap();
    session.reset();
    assert_eq!(session.code(), EditorConfig::default().initial_code);
    assert_eq!(session.output(), "");
    assert_eq!(session.error(), "");
}

#[test]
fn reports_serialize_with_a_status_tag() {
    let ok = RunReport::from(&RunResult::Succeeded("out".into()));
    assert_eq!(
        serde_json::to_string(&ok).unwrap(),
        r#"{"status":"succeeded","output":"out"}"#
    );
    let failed = RunReport::from(&RunResult::Failed("bad".into()));
    assert_eq!(
        serde_json::to_string(&failed).unwrap(),
        r#"{"status":"failed","error":"bad"}"#
    );
}

#[test]
fn runs_are_deterministic() {
    let code = "const xs = [3, 1, 2].sort(); console.log(xs.join('-'));\n\
                const [s, set] = useState({k: xs}); set(s);\n\
                return xs.map(x => x * 2);";
    let first = output(code);
    for _ in 0..100 {
        assert_eq!(output(code), first);
    }
}
