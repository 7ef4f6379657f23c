//! Named, ordered sequence of command steps.
//!
//! An [`Executor`] is built by name, steps are appended in order and then run
//! one after another. The first failing step stops the run; later steps are
//! reported as skipped.

use crate::domain::errors::ExecutorError;
use crate::domain::models::{PlanReport, RunReport, StepReport, StepStatus};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

/// One command line run as a single child process.
#[derive(Clone, PartialEq, Eq)]
pub struct Step {
    program: String,
    args: Vec<String>,
    display: String,
    stdin: Option<String>,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("command", &self.display)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Step {
    /// Splits a command line on whitespace. Returns `None` for blank input.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        let args: Vec<String> = parts.collect();
        let display = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        Some(Self {
            program,
            args,
            display,
            stdin: None,
        })
    }

    /// Exact argv, for arguments that may contain whitespace.
    pub fn argv(program: &str, args: Vec<String>) -> Self {
        let display = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            program: program.to_string(),
            args,
            display,
            stdin: None,
        }
    }

    /// Feeds `input` to the child's stdin. Never shown in logs or reports.
    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn command(&self) -> &str {
        &self.display
    }

    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepExit {
    pub success: bool,
    pub code: Option<i32>,
}

pub trait StepRunner {
    fn announce(&mut self, step: &Step);
    fn run_step(&mut self, step: &Step) -> std::io::Result<StepExit>;
}

/// Spawns steps as real child processes.
///
/// With `json` set, the `==>` banner and the child's stdout are sent to
/// stderr so stdout carries only the JSON document.
pub struct SystemRunner {
    json: bool,
}

impl SystemRunner {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl StepRunner for SystemRunner {
    fn announce(&mut self, step: &Step) {
        let line = format!("==> {}", step.command());
        if self.json {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
            let _ = std::io::stdout().flush();
        }
    }

    fn run_step(&mut self, step: &Step) -> std::io::Result<StepExit> {
        let mut cmd = Command::new(step.program());
        cmd.args(step.args());
        if self.json {
            cmd.stdout(Stdio::from(std::io::stderr()));
        }
        let status = match step.stdin() {
            Some(input) => {
                let mut child = cmd.stdin(Stdio::piped()).spawn()?;
                let written = match child.stdin.take() {
                    Some(mut pipe) => pipe.write_all(input.as_bytes()),
                    None => Ok(()),
                };
                let status = child.wait()?;
                written?;
                status
            }
            None => cmd.stdin(Stdio::inherit()).status()?,
        };
        Ok(StepExit {
            success: status.success(),
            code: status.code(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Executor {
    name: String,
    steps: Vec<Step>,
}

impl Executor {
    pub fn create(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
        }
    }

    pub fn add(self, line: &str) -> Result<Self, ExecutorError> {
        match Step::parse(line) {
            Some(step) => Ok(self.add_step(step)),
            None => Err(ExecutorError::EmptyStep {
                executor: self.name,
            }),
        }
    }

    pub fn add_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn plan(&self) -> PlanReport {
        PlanReport {
            executor: self.name.clone(),
            steps: self.steps().iter().map(|s| s.command().to_string()).collect(),
        }
    }

    pub fn run(&self, runner: &mut dyn StepRunner) -> Result<RunReport, ExecutorError> {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(self.steps.len());
        let mut failure: Option<(String, Option<i32>)> = None;

        for step in &self.steps {
            if failure.is_some() {
                reports.push(StepReport::skipped(step.command()));
                continue;
            }

            runner.announce(step);
            tracing::info!(executor = %self.name, step = %step.command(), "running step");
            let step_started = Instant::now();
            let exit = runner
                .run_step(step)
                .map_err(|source| ExecutorError::Spawn {
                    executor: self.name.clone(),
                    step: step.command().to_string(),
                    source,
                })?;
            let duration_ms = step_started.elapsed().as_millis() as u64;

            let status = if exit.success {
                StepStatus::Ok
            } else {
                tracing::warn!(
                    executor = %self.name,
                    step = %step.command(),
                    code = ?exit.code,
                    "step failed"
                );
                failure = Some((step.command().to_string(), exit.code));
                StepStatus::Failed
            };
            reports.push(StepReport {
                step: step.command().to_string(),
                status,
                exit_code: exit.code,
                duration_ms,
            });
        }

        let report = RunReport {
            executor: self.name.clone(),
            overall: if failure.is_some() { "failed" } else { "ok" }.to_string(),
            steps: reports,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        match failure {
            Some((step, code)) => Err(ExecutorError::StepFailed {
                executor: self.name.clone(),
                step,
                code,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }
}
