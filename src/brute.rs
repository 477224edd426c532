use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use miette::IntoDiagnostic;

use crate::eval::Context;
use crate::parse::{Statement, parse_expr};
use crate::series::Series;
use crate::uncertain::Uncertain;

/// A named search dimension with its ordered candidate values.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    values: Vec<Uncertain>,
}

impl Parameter {
    /// A single fixed value parsed from `text`, its literal tolerance
    /// credited to the parameter's own name.
    pub fn fixed(name: impl Into<String>, text: &str) -> miette::Result<Self> {
        let name = name.into();
        let expr = parse_expr(text)?;
        let mut value = expr.eval(&Context::new()).into_diagnostic()?;
        value.attribute_static(name.as_str());
        Ok(Parameter {
            name,
            values: vec![value],
        })
    }

    /// All values of `series` between two parsed bound expressions.
    pub fn swept(
        name: impl Into<String>,
        series: &Series,
        low: &str,
        high: &str,
    ) -> miette::Result<Self> {
        let low = parse_expr(low)?.eval(&Context::new()).into_diagnostic()?;
        let high = parse_expr(high)?.eval(&Context::new()).into_diagnostic()?;
        let values = series
            .expand(low.value(), high.value())
            .into_diagnostic()?;
        Ok(Parameter {
            name: name.into(),
            values,
        })
    }

    pub fn from_values(name: impl Into<String>, values: Vec<Uncertain>) -> Self {
        Parameter {
            name: name.into(),
            values,
        }
    }

    pub fn values(&self) -> &[Uncertain] {
        &self.values
    }
}

/// Sets the cancellation flag from outside the engine; observed only at
/// slice boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub context: Vec<(String, Uncertain)>,
    pub cost: f64,
    pub info: Vec<(&'static str, Uncertain)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    Done,
    Cancelled,
}

/// Brute-force search over the Cartesian product of parameter candidates,
/// executed in time-bounded cooperative slices.
pub struct Bruter<'de> {
    statement: Statement<'de>,
    params: Vec<Parameter>,
    slice_budget: Duration,
    progress_fn: Box<dyn FnMut(u64, u64) + 'de>,
    done_fn: Box<dyn FnMut() + 'de>,
    odometer: Vec<usize>,
    steps: u64,
    total_steps: u64,
    results: Vec<SearchResult>,
    state: State,
    cancel: CancelHandle,
}

const BATCH: usize = 1000;

impl<'de> Bruter<'de> {
    pub fn new(statement: Statement<'de>, params: Vec<Parameter>, slice_budget: Duration) -> Self {
        let total_steps = params.iter().map(|p| p.values.len() as u64).product();
        let odometer = vec![0; params.len()];
        Bruter {
            statement,
            params,
            slice_budget,
            progress_fn: Box::new(|_, _| {}),
            done_fn: Box::new(|| {}),
            odometer,
            steps: 0,
            total_steps,
            results: Vec::new(),
            state: if total_steps == 0 {
                State::Done
            } else {
                State::Idle
            },
            cancel: CancelHandle::default(),
        }
    }

    pub fn on_progress(mut self, f: impl FnMut(u64, u64) + 'de) -> Self {
        self.progress_fn = Box::new(f);
        self
    }

    pub fn on_done(mut self, f: impl FnMut() + 'de) -> Self {
        self.done_fn = Box::new(f);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Results so far, ascending by cost after each slice.
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    fn step_once(&mut self) {
        if self.state == State::Done {
            return;
        }

        let mut ctx = Context::new();
        for (param, &idx) in self.params.iter().zip(&self.odometer) {
            ctx.insert(param.name.as_str(), param.values[idx].clone());
        }

        // a combination referencing an unbound variable is skipped,
        // the sweep continues
        if let Ok(outcome) = self.statement.check(&ctx) {
            let context = ctx
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            self.results.push(SearchResult {
                context,
                cost: outcome.cost,
                info: outcome.info,
            });
        }

        self.steps += 1;

        for digit in (0..self.params.len()).rev() {
            self.odometer[digit] += 1;
            if self.odometer[digit] < self.params[digit].values.len() {
                return;
            }
            self.odometer[digit] = 0;
        }
        self.state = State::Done;
    }

    /// One scheduling slice: batches of steps until the budget elapses, then
    /// a re-sort of the log and a progress report. Returns `Running` when
    /// there is more to do and the host should call again.
    pub fn run_slice(&mut self) -> State {
        if self.state == State::Done {
            (self.done_fn)();
            return State::Done;
        }
        self.state = State::Running;

        let deadline = Instant::now() + self.slice_budget;
        'slice: loop {
            for _ in 0..BATCH {
                if self.state == State::Done {
                    break 'slice;
                }
                self.step_once();
            }
            // the deadline is only checked between batches, so a slice may
            // overrun by up to one batch
            if Instant::now() > deadline {
                break;
            }
        }

        self.results.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        (self.progress_fn)(self.steps, self.total_steps);

        if self.cancel.take() {
            self.state = State::Cancelled;
            (self.done_fn)();
            return State::Cancelled;
        }
        if self.state == State::Done {
            (self.done_fn)();
            return State::Done;
        }
        State::Running
    }

    /// Drive slices to completion on this thread, yielding between slices.
    pub fn run(&mut self) -> State {
        loop {
            match self.run_slice() {
                State::Running => std::thread::yield_now(),
                state => return state,
            }
        }
    }
}
