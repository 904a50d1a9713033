use std::collections::HashMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use toml_edit::{DocumentMut, Item};
use tracing::debug;

use crate::error::PyshipError;

pub const CONFIG_FILE: &str = "pyship.toml";
pub const DEFAULT_BASE: &str = "./python";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_REPOSITORY: &str = "pypi";
pub const REPOSITORY_TOKEN: &str = "{repository}";

/// Options shared by every subcommand, already merged with their
/// `PYSHIP_*` environment fallbacks by the CLI.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub python: Option<String>,
    pub config: Option<PathBuf>,
}

/// Read-only view of the process environment, captured once per command so
/// launch environments can be derived without touching global state.
#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, OsString>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars_os()
                .filter_map(|(key, value)| key.into_string().ok().map(|key| (key, value)))
                .collect(),
        }
    }

    #[must_use]
    pub fn var_os(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(key).map(OsString::as_os_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), OsString::from(v)))
            .collect();
        Self { vars }
    }
}

/// How a missing environment directory gets created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvCreator {
    /// `<python> -m venv <dir>`
    #[default]
    Venv,
    /// `virtualenv --python <python> --quiet <dir>`
    Virtualenv,
}

impl FromStr for EnvCreator {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "venv" => Ok(Self::Venv),
            "virtualenv" => Ok(Self::Virtualenv),
            other => Err(format!(
                "unknown creator `{other}` (expected `venv` or `virtualenv`)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub python: String,
    pub creator: EnvCreator,
    pub helpers: Vec<String>,
    pub repository: String,
    pub package_command: Vec<String>,
    pub publish_command: Vec<String>,
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            python: DEFAULT_PYTHON.to_string(),
            creator: EnvCreator::default(),
            helpers: vec!["wheel".to_string()],
            repository: DEFAULT_REPOSITORY.to_string(),
            package_command: to_strings(&[
                "python",
                "setup.py",
                "sdist",
                "--formats=gztar",
                "bdist_wheel",
            ]),
            publish_command: to_strings(&[
                "python",
                "setup.py",
                "bdist_wheel",
                "upload",
                "-r",
                REPOSITORY_TOKEN,
            ]),
            source: None,
        }
    }
}

impl Settings {
    /// Resolves settings for a project rooted at `base`.
    ///
    /// The config file is `global.config` when given, otherwise
    /// `<base>/pyship.toml` if it exists. `global.python` wins over the file.
    ///
    /// # Errors
    /// Returns an error when an explicit config file is missing or any config
    /// file cannot be read or contains invalid values.
    pub fn load(global: &GlobalOptions, base: &Path) -> Result<Self> {
        let mut settings = Self::default();
        let file = match &global.config {
            Some(path) => {
                if !path.is_file() {
                    return Err(PyshipError::config(path, "file not found").into());
                }
                Some(path.clone())
            }
            None => {
                let candidate = base.join(CONFIG_FILE);
                candidate.is_file().then_some(candidate)
            }
        };
        if let Some(path) = file {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            settings.apply_toml(&contents, &path)?;
            debug!(config = %path.display(), "loaded settings");
            settings.source = Some(path);
        }
        if let Some(python) = global.python.as_ref().filter(|value| !value.is_empty()) {
            settings.python.clone_from(python);
        }
        Ok(settings)
    }

    pub(crate) fn apply_toml(&mut self, contents: &str, path: &Path) -> Result<(), PyshipError> {
        let doc: DocumentMut = contents
            .parse()
            .map_err(|err: toml_edit::TomlError| PyshipError::config(path, err.message()))?;
        self.apply_document(&doc)
            .map_err(|message| PyshipError::config(path, message))
    }

    fn apply_document(&mut self, doc: &DocumentMut) -> Result<(), String> {
        if let Some(item) = doc.get("environment") {
            let table = item
                .as_table_like()
                .ok_or("`environment` must be a table")?;
            if let Some(value) = table.get("python") {
                self.python = string_value(value, "environment.python")?;
            }
            if let Some(value) = table.get("creator") {
                self.creator = string_value(value, "environment.creator")?.parse()?;
            }
            if let Some(value) = table.get("helpers") {
                self.helpers = string_array(value, "environment.helpers")?;
            }
        }
        if let Some(item) = doc.get("publish") {
            let table = item.as_table_like().ok_or("`publish` must be a table")?;
            if let Some(value) = table.get("repository") {
                self.repository = string_value(value, "publish.repository")?;
            }
        }
        if let Some(item) = doc.get("tasks") {
            let table = item.as_table_like().ok_or("`tasks` must be a table")?;
            if let Some(value) = table.get("package") {
                self.package_command = command_value(value, "tasks.package")?;
            }
            if let Some(value) = table.get("publish") {
                self.publish_command = command_value(value, "tasks.publish")?;
            }
        }
        Ok(())
    }

    /// The publish command line with the repository token substituted.
    #[must_use]
    pub fn publish_command_for(&self, repository: &str) -> Vec<String> {
        self.publish_command
            .iter()
            .map(|word| word.replace(REPOSITORY_TOKEN, repository))
            .collect()
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(ToString::to_string).collect()
}

fn string_value(item: &Item, key: &str) -> Result<String, String> {
    item.as_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| format!("`{key}` must be a string"))
}

fn string_array(item: &Item, key: &str) -> Result<Vec<String>, String> {
    let array = item
        .as_array()
        .ok_or_else(|| format!("`{key}` must be an array of strings"))?;
    array
        .iter()
        .map(|value| {
            value
                .as_str()
                .map(ToOwned::to_owned)
                .ok_or_else(|| format!("`{key}` must be an array of strings"))
        })
        .collect()
}

fn command_value(item: &Item, key: &str) -> Result<Vec<String>, String> {
    let words = string_array(item, key)?;
    if words.is_empty() {
        return Err(format!("`{key}` must not be empty"));
    }
    Ok(words)
}
