use anyhow::Result;
use pyship_core::{GlobalOptions, RunRequest, Task, TaskRequest};

use crate::cli::{CommandCli, EnvArgs, PackageArgs, PublishArgs, RunArgs};
use crate::style::Style;

/// Runs the selected command and returns the exit code to terminate with.
pub fn dispatch_command(
    global: &GlobalOptions,
    command: Option<&CommandCli>,
    style: &Style,
) -> Result<i32> {
    match command {
        Some(CommandCli::Run(args)) => dispatch_run(global, args),
        Some(CommandCli::Package(args)) => dispatch_package(global, args, style),
        None => dispatch_package(global, &PackageArgs::default_target()?, style),
        Some(CommandCli::Publish(args)) => dispatch_publish(global, args, style),
        Some(CommandCli::Env(args)) => dispatch_env(args, style),
    }
}

fn dispatch_run(global: &GlobalOptions, args: &RunArgs) -> Result<i32> {
    let request = RunRequest {
        base: args.base.clone(),
        command: args.command.clone(),
    };
    pyship_core::run(global, &request)
}

fn dispatch_package(global: &GlobalOptions, args: &PackageArgs, style: &Style) -> Result<i32> {
    let request = TaskRequest {
        task: Task::Package,
        base: args.target.base.clone(),
        repository: None,
    };
    run_task(global, &request, style)
}

fn dispatch_publish(global: &GlobalOptions, args: &PublishArgs, style: &Style) -> Result<i32> {
    let request = TaskRequest {
        task: Task::Publish,
        base: args.target.base.clone(),
        repository: args.repository.clone(),
    };
    run_task(global, &request, style)
}

fn run_task(global: &GlobalOptions, request: &TaskRequest, style: &Style) -> Result<i32> {
    let report = pyship_core::run_task(global, request)?;
    if !global.quiet {
        let message = format!(
            "pyship {}: {} step(s) finished in {}",
            report.task,
            report.steps.len(),
            report.base.display()
        );
        println!("{}", style.success(&message));
    }
    Ok(0)
}

fn dispatch_env(args: &EnvArgs, style: &Style) -> Result<i32> {
    let summary = pyship_core::describe(&args.base)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(0);
    }
    println!("{}={}", style.key("cwd"), summary.cwd);
    for (key, value) in &summary.set {
        println!("{}={value}", style.key(key));
    }
    for key in &summary.unset {
        println!("unset {}", style.key(key));
    }
    Ok(0)
}
