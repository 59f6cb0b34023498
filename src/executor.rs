use std::fmt;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use tracing::Level;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::config::Config;
use crate::error::ExecutorError;
use crate::io::{PROGRESS_STYLE, as_overhead};
use crate::ops::Context;
use crate::output::Writer;
use crate::pipeline::Pipeline;

/// Progress of a single run. Runs move strictly forward:
/// `Pending → Running(0) → … → Running(n-1) → Done`, or stop at `Failed(i)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running(usize),
    Done,
    Failed(usize),
}

impl RunState {
    fn start(self, total: usize) -> Self {
        match self {
            RunState::Pending if total > 0 => RunState::Running(0),
            RunState::Running(i) if i + 1 < total => RunState::Running(i + 1),
            RunState::Pending | RunState::Running(_) => RunState::Done,
            done => done,
        }
    }

    fn fail(self) -> Self {
        match self {
            RunState::Running(i) => RunState::Failed(i),
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskExecution {
    pub name: String,
    pub start: Instant,
    pub duration: Duration,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct Report {
    pub target: String,
    pub state: RunState,
    pub executions: Vec<TaskExecution>,
}

impl Report {
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.executions.iter().map(|e| e.name.as_str())
    }

    pub fn duration(&self) -> Duration {
        self.executions.iter().map(|e| e.duration).sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.executions.iter().map(|e| e.name.len()).max().unwrap_or(0);

        for e in &self.executions {
            writeln!(f, "{:width$}  {:>6}ms", e.name, e.duration.as_millis())?;
        }

        write!(f, "{:width$}  {:>6}ms", "total", self.duration().as_millis())
    }
}

/// Runs tasks and aliases of a pipeline one after another. The first failing
/// task stops the run, nothing is rolled back.
pub struct Executor<'a> {
    pipeline: &'a Pipeline,
    root: &'a Utf8Path,
    writer: Writer,
}

impl<'a> Executor<'a> {
    pub fn new(pipeline: &'a Pipeline, config: &'a Config) -> Self {
        Self {
            pipeline,
            root: config.root(),
            writer: Writer::new(config.line_ending()),
        }
    }

    pub fn run(&self, name: &str) -> Result<Report, ExecutorError> {
        let plan = self.pipeline.expand(name)?;
        let total = plan.len();

        let span = tracing::span!(Level::INFO, "run", task = name);
        span.pb_set_style(&PROGRESS_STYLE);
        span.pb_set_length(total as u64);
        span.pb_set_message(name);
        let _enter = span.enter();

        let mut state = RunState::Pending;
        let mut executions = Vec::with_capacity(total);

        for (i, &step) in plan.iter().enumerate() {
            state = state.start(total);
            debug_assert_eq!(state, RunState::Running(i));

            let task = self.pipeline.registry().get(step)?;
            tracing::info!("Running \"{step}\" ({}) task", task.kind());

            let cx = Context {
                root: self.root,
                writer: self.writer,
                executor: self,
            };

            let start = Instant::now();
            if let Err(source) = task.run(&cx) {
                state = state.fail();
                tracing::error!("Task \"{step}\" failed, aborting {name} ({state:?})");

                return Err(ExecutorError::Task {
                    name: step.to_string(),
                    step: i + 1,
                    total,
                    source,
                });
            }

            tracing::debug!("Finished \"{step}\" {}", as_overhead(start));
            executions.push(TaskExecution {
                name: step.to_string(),
                start,
                duration: start.elapsed(),
            });
            span.pb_inc(1);
        }

        state = state.start(total);

        Ok(Report {
            target: name.to_string(),
            state,
            executions,
        })
    }
}
