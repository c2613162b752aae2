//! Timer scheduling.
//!
//! `setTimeout`/`setInterval` in the execution context hand their callbacks
//! to a [`TimerHost`]. A browser host wires this to the real timer API; the
//! [`TimerQueue`] here is a virtual clock that fires callbacks when the host
//! advances it. Either way a callback runs after the run that scheduled it
//! has finished, so anything it prints reaches the real console.

use std::cell::RefCell;
use std::rc::Rc;

use jsplay_eval::{Environment, EvalError, EvalResult, Interpreter, Limits, Value};
use tracing::{debug, warn};

use crate::console::HostConsole;

pub type TimerId = u32;

/// A scheduled call: the callback, its extra arguments, and the globals of
/// the run that scheduled it.
#[derive(Clone)]
pub struct TimerTask {
    callback: Value,
    args: Vec<Value>,
    globals: Environment,
}

impl TimerTask {
    pub fn new(callback: Value, args: Vec<Value>, globals: Environment) -> Self {
        Self {
            callback,
            args,
            globals,
        }
    }

    /// Call the callback on a fresh interpreter that shares the scheduling
    /// run's built-ins, so `({}).constructor === Object` holds either way.
    pub fn fire(&self, limits: Limits) -> EvalResult<Value> {
        let mut interp = Interpreter::with_globals(self.globals.clone(), limits);
        interp.call(&self.callback, Value::Undefined, &self.args)
    }
}

/// Something that can run a callback later.
pub trait TimerHost {
    /// Schedule `task` after `delay_ms`; with `repeat` it keeps firing
    /// every `delay_ms` until cancelled.
    fn schedule(&self, task: TimerTask, delay_ms: f64, repeat: bool) -> TimerId;

    /// Cancel a timer. Unknown ids are ignored.
    fn cancel(&self, id: TimerId);
}

// ══════════════════════════════════════════════════════════════════════════════
// Script bindings
// ══════════════════════════════════════════════════════════════════════════════

/// `setTimeout`, `setInterval`, `clearTimeout` and `clearInterval`, bound to
/// `host`.
pub fn timer_bindings(host: &Rc<dyn TimerHost>) -> [(&'static str, Value); 4] {
    [
        ("setTimeout", schedule_fn("setTimeout", host.clone(), false)),
        ("setInterval", schedule_fn("setInterval", host.clone(), true)),
        ("clearTimeout", cancel_fn("clearTimeout", host.clone())),
        ("clearInterval", cancel_fn("clearInterval", host.clone())),
    ]
}

fn schedule_fn(name: &'static str, host: Rc<dyn TimerHost>, repeat: bool) -> Value {
    Value::native(name, move |interp, _this, args| {
        let callback = args.first().cloned().unwrap_or_default();
        if !callback.is_function() {
            return Err(EvalError::type_error(format!(
                "{name}: callback {} is not a function",
                interp.to_string(&callback)?
            )));
        }
        let delay = match args.get(1) {
            Some(value) => delay_ms(interp.to_number(value)?),
            None => 0.0,
        };
        let extra = args.iter().skip(2).cloned().collect();
        let task = TimerTask::new(callback, extra, interp.globals().clone());
        let id = host.schedule(task, delay, repeat);
        Ok(Value::Number(f64::from(id)))
    })
}

fn cancel_fn(name: &'static str, host: Rc<dyn TimerHost>) -> Value {
    Value::native(name, move |interp, _this, args| {
        if let Some(id) = args.first() {
            if let Some(id) = timer_id(interp.to_number(id)?) {
                host.cancel(id);
            }
        }
        Ok(Value::Undefined)
    })
}

/// Negative and non-numeric delays mean "as soon as possible".
fn delay_ms(n: f64) -> f64 {
    if n.is_nan() || n < 0.0 {
        0.0
    } else {
        n
    }
}

fn timer_id(n: f64) -> Option<TimerId> {
    (n.is_finite() && n >= 1.0 && n <= f64::from(TimerId::MAX)).then(|| n as TimerId)
}

/// The console line for a callback that failed after its run finished.
pub fn uncaught_line(err: &EvalError) -> String {
    match err {
        EvalError::Thrown(_) => err.to_string(),
        EvalError::StepLimit => format!("Uncaught {err}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// TimerQueue
// ══════════════════════════════════════════════════════════════════════════════

struct Timer {
    id: TimerId,
    due: f64,
    /// Scheduling order; breaks ties between timers due at the same time.
    seq: u64,
    interval: Option<f64>,
    task: TimerTask,
}

#[derive(Default)]
struct QueueState {
    now: f64,
    next_id: TimerId,
    next_seq: u64,
    pending: Vec<Timer>,
}

impl QueueState {
    fn push(&mut self, id: TimerId, due: f64, interval: Option<f64>, task: TimerTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Timer {
            id,
            due,
            seq,
            interval,
            task,
        });
    }

    /// Remove and return the earliest timer due at or before `until`.
    fn pop_due(&mut self, until: f64) -> Option<Timer> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)?;
        Some(self.pending.remove(index))
    }
}

/// A virtual-clock timer host. Cloning shares the queue.
#[derive(Clone)]
pub struct TimerQueue {
    state: Rc<RefCell<QueueState>>,
    console: HostConsole,
    limits: Limits,
}

impl TimerQueue {
    /// Callbacks run with `limits` and report failures to `console`.
    pub fn new(console: HostConsole, limits: Limits) -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState {
                next_id: 1,
                ..QueueState::default()
            })),
            console,
            limits,
        }
    }

    /// Milliseconds elapsed on the virtual clock.
    pub fn now(&self) -> f64 {
        self.state.borrow().now
    }

    /// Number of timers still waiting to fire.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Move the clock forward by `ms`, firing every callback that comes due,
    /// in due order. Returns how many callbacks ran.
    pub fn advance(&self, ms: f64) -> usize {
        let until = self.now() + ms.max(0.0);
        let mut fired = 0;
        loop {
            let timer = {
                let mut state = self.state.borrow_mut();
                let Some(timer) = state.pop_due(until) else {
                    break;
                };
                state.now = timer.due;
                if let Some(interval) = timer.interval {
                    let task = timer.task.clone();
                    state.push(timer.id, timer.due + interval, Some(interval), task);
                }
                timer
            };
            self.fire(&timer);
            fired += 1;
        }
        self.state.borrow_mut().now = until;
        fired
    }

    fn fire(&self, timer: &Timer) {
        debug!(timer = timer.id, at = timer.due, "timer fired");
        if let Err(err) = timer.task.fire(self.limits) {
            let line = uncaught_line(&err);
            warn!(timer = timer.id, %line, "timer callback failed");
            self.console.error(&line);
        }
    }
}

impl TimerHost for TimerQueue {
    fn schedule(&self, task: TimerTask, delay_ms: f64, repeat: bool) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id = state.next_id.wrapping_add(1).max(1);
        let due = state.now + delay_ms;
        let interval = repeat.then(|| delay_ms.max(1.0));
        state.push(id, due, interval, task);
        debug!(timer = id, due, repeat, "timer scheduled");
        id
    }

    fn cancel(&self, id: TimerId) {
        self.state.borrow_mut().pending.retain(|t| t.id != id);
    }
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.now())
            .field("pending", &self.pending())
            .finish()
    }
}
