use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::domain::models::RunReport;
use crate::executor::{Executor, SystemRunner};
use crate::services::output::print_one;
use crate::services::storage::{audit, AuditAction};

/// Executor for `release`: the configured name and steps, in order.
pub fn release_executor(config: &Config) -> anyhow::Result<Executor> {
    let mut executor = Executor::create(&config.release.name);
    for step in &config.release.steps {
        executor = executor.add(step)?;
    }
    Ok(executor)
}

fn adhoc_executor(name: &str, steps: &[String]) -> anyhow::Result<Executor> {
    let mut executor = Executor::create(name);
    for step in steps {
        executor = executor.add(step)?;
    }
    Ok(executor)
}

fn summary(r: &RunReport) -> String {
    format!(
        "executor {}: {} steps {} in {}ms",
        r.executor,
        r.steps.len(),
        r.overall,
        r.duration_ms
    )
}

fn execute(cli: &Cli, action: AuditAction, executor: &Executor, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        return print_one(cli.json, executor.plan(), |p| {
            let mut lines = vec![format!("executor {}", p.executor)];
            lines.extend(p.steps.iter().map(|s| format!("  {}", s)));
            lines.join("\n")
        });
    }

    let mut runner = SystemRunner::new(cli.json);
    let outcome = executor.run(&mut runner);
    audit(
        action,
        serde_json::json!({
            "executor": executor.name(),
            "steps": executor.plan().steps,
            "ok": outcome.is_ok(),
        }),
    );
    let report = outcome?;
    print_one(cli.json, report, summary)
}

pub fn handle_release_commands(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Release { dry_run } => {
            let executor = release_executor(config)?;
            execute(cli, AuditAction::Release, &executor, *dry_run)
        }
        Commands::Run {
            name,
            steps,
            dry_run,
        } => {
            let executor = adhoc_executor(name, steps)?;
            execute(cli, AuditAction::Run, &executor, *dry_run)
        }
        _ => unreachable!("ops commands are dispatched to handle_ops_commands"),
    }
}
