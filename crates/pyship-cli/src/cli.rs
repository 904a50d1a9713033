use std::path::PathBuf;

use clap::{value_parser, ArgAction, Args, Command, FromArgMatches, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Provision a project virtualenv and package it",
    long_about = "Creates <BASE>/ve on first use, installs <BASE>/requirements.txt into it, \
                  and runs packaging commands inside the activated environment.",
    after_help = "Examples:\n  pyship\n  pyship publish --repository testpypi\n  pyship run ./python python -m pytest\n"
)]
pub struct PyshipCli {
    #[arg(
        short,
        long,
        help = "Only log warnings and errors; skip the task summary",
        global = true
    )]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)", global = true)]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q", global = true)]
    pub trace: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[arg(
        long,
        env = "PYSHIP_PYTHON",
        value_name = "PYTHON",
        help = "Interpreter used to create the environment (name on PATH or path)",
        global = true
    )]
    pub python: Option<String>,
    #[arg(
        long,
        env = "PYSHIP_CONFIG",
        value_parser = value_parser!(PathBuf),
        help = "Settings file (defaults to <BASE>/pyship.toml when present)",
        global = true
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<CommandCli>,
}

#[derive(Subcommand, Debug)]
pub enum CommandCli {
    #[command(
        about = "Run a command inside the project environment.",
        override_usage = "pyship run <BASE> [CMD]...",
        after_help = "Examples:\n  pyship run ./python python setup.py --version\n  pyship run ./python\n"
    )]
    Run(RunArgs),
    #[command(
        about = "Build a gzip sdist and a wheel (default command).",
        override_usage = "pyship package [--base DIR]",
        after_help = "Examples:\n  pyship package\n  pyship package --base ./lib\n"
    )]
    Package(PackageArgs),
    #[command(
        about = "Package, then build and upload the wheel to a repository.",
        override_usage = "pyship publish [--base DIR] [--repository NAME]",
        after_help = "Examples:\n  pyship publish\n  PYSHIP_REPOSITORY=internal pyship publish\n"
    )]
    Publish(PublishArgs),
    #[command(
        about = "Show the environment commands run with, without provisioning.",
        override_usage = "pyship env <BASE> [--json]",
        after_help = "Examples:\n  pyship env ./python\n  pyship env ./python --json\n"
    )]
    Env(EnvArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(value_name = "BASE", help = "Project base directory")]
    pub base: PathBuf,
    #[arg(
        value_name = "CMD",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Command and arguments to exec inside the environment"
    )]
    pub command: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct BaseArgs {
    #[arg(
        long,
        env = "PYSHIP_BASE",
        value_parser = value_parser!(PathBuf),
        default_value = pyship_core::DEFAULT_BASE,
        help = "Project base directory"
    )]
    pub base: PathBuf,
}

#[derive(Args, Debug)]
pub struct PackageArgs {
    #[command(flatten)]
    pub target: BaseArgs,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub target: BaseArgs,
    #[arg(
        long,
        env = "PYSHIP_REPOSITORY",
        value_name = "NAME",
        help = "Repository name passed to the upload command"
    )]
    pub repository: Option<String>,
}

#[derive(Args, Debug)]
pub struct EnvArgs {
    #[arg(value_name = "BASE", help = "Project base directory")]
    pub base: PathBuf,
    #[arg(long, help = "Print the environment as JSON")]
    pub json: bool,
}

impl PackageArgs {
    /// Arguments for a bare `pyship` invocation, resolved by clap as if
    /// `pyship package` had been typed.
    pub fn default_target() -> Result<Self, clap::Error> {
        let command = Self::augment_args(Command::new("package"));
        let matches = command.try_get_matches_from(["package"])?;
        Self::from_arg_matches(&matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_targets_the_package_base() {
        let parsed = PyshipCli::try_parse_from(["pyship", "package"]).expect("parse");
        let Some(CommandCli::Package(explicit)) = parsed.command else {
            panic!("expected package");
        };
        let implicit = PackageArgs::default_target().expect("default target");
        assert_eq!(implicit.target.base, explicit.target.base);
    }

    #[test]
    fn run_keeps_hyphenated_command_words() {
        let parsed =
            PyshipCli::try_parse_from(["pyship", "run", "./python", "python", "-m", "pytest", "-x"])
                .expect("parse");
        let Some(CommandCli::Run(args)) = parsed.command else {
            panic!("expected run");
        };
        assert_eq!(args.command, ["python", "-m", "pytest", "-x"]);
    }
}
