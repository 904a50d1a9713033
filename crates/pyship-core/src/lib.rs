#![deny(clippy::all)]

//! Provision a Python project's virtualenv and run commands inside it.

pub mod config;
pub mod error;
pub mod launch;
pub mod layout;
pub mod process;
pub mod provision;
pub mod python;
pub mod runner;
pub mod tasks;
pub mod version;

#[cfg(all(test, unix))]
mod test_support;

pub use crate::config::{
    EnvCreator, EnvSnapshot, GlobalOptions, Settings, CONFIG_FILE, DEFAULT_BASE,
    DEFAULT_PYTHON, DEFAULT_REPOSITORY,
};
pub use crate::error::{exit_code_for, PyshipError};
pub use crate::launch::{LaunchEnv, LaunchSummary};
pub use crate::layout::ProjectLayout;
pub use crate::provision::{ensure_environment, Environment};
pub use crate::runner::{describe, run, RunRequest};
pub use crate::tasks::{plan_steps, run_task, Step, Task, TaskReport, TaskRequest};
