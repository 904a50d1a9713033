use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{GlobalOptions, Settings};
use crate::layout::ProjectLayout;
use crate::runner::{prepare, run_step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// sdist (gztar) and wheel
    Package,
    /// `package`, then build and upload the wheel
    Publish,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Task::Package => "package",
            Task::Publish => "publish",
        })
    }
}

#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub task: Task,
    pub base: PathBuf,
    pub repository: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub task: Task,
    pub argv: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: Task,
    pub base: PathBuf,
    pub steps: Vec<Step>,
}

/// The steps a task runs, in order. `publish` always starts with every
/// `package` step; nothing is skipped for artifacts already on disk.
#[must_use]
pub fn plan_steps(task: Task, settings: &Settings, repository: Option<&str>) -> Vec<Step> {
    let package = Step {
        task: Task::Package,
        argv: settings.package_command.clone(),
    };
    match task {
        Task::Package => vec![package],
        Task::Publish => {
            let repository = repository.unwrap_or(&settings.repository);
            vec![
                package,
                Step {
                    task: Task::Publish,
                    argv: settings.publish_command_for(repository),
                },
            ]
        }
    }
}

/// Runs a task's steps, each in a freshly provisioned environment, stopping
/// at the first failing step.
///
/// # Errors
///
/// Returns an error when the base directory or settings are invalid, or any
/// provisioning or step command fails; step failures carry the step's exit
/// code.
pub fn run_task(global: &GlobalOptions, request: &TaskRequest) -> Result<TaskReport> {
    let layout = ProjectLayout::discover(&request.base)?;
    let settings = Settings::load(global, layout.base())?;
    let steps = plan_steps(request.task, &settings, request.repository.as_deref());
    info!(task = %request.task, base = %layout.base().display(), steps = steps.len(), "starting task");
    for step in &steps {
        let (_, launch_env) = prepare(global, layout.base())?;
        run_step(&step.task.to_string(), &step.argv, &launch_env)
            .with_context(|| format!("{} failed", request.task))?;
    }
    Ok(TaskReport {
        task: request.task,
        base: layout.base().to_path_buf(),
        steps,
    })
}
