#![allow(dead_code)]

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tempfile::TempDir;

/// A project directory plus a fake interpreter whose `-m venv` creates a
/// logging `pip` and `python` in `ve/bin`.
pub struct Fixture {
    pub temp: TempDir,
    pub base: PathBuf,
    pub interpreter: PathBuf,
    pub log: PathBuf,
}

impl Fixture {
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(ToString::to_string)
            .collect()
    }

    pub fn python_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|line| line.starts_with("python "))
            .collect()
    }
}

pub fn prepare_fixture(prefix: &str) -> Fixture {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let base = temp.path().join("python");
    fs::create_dir(&base).expect("base dir");
    fs::create_dir(base.join("build")).expect("build dir");
    fs::write(base.join("requirements.txt"), "six\n").expect("requirements");
    let log = temp.path().join("calls.log");
    let interpreter = temp.path().join("fake-python");
    write_executable(&interpreter, &fake_interpreter(&log));
    Fixture {
        temp,
        base,
        interpreter,
        log,
    }
}

/// Writes a script the fixture can execute.
pub fn write_executable(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }
}

pub fn require_online() -> bool {
    if let Some("1") = env::var("PYSHIP_ONLINE_TESTS").ok().as_deref() {
        true
    } else {
        eprintln!("skipping online test (PYSHIP_ONLINE_TESTS!=1)");
        false
    }
}

pub fn find_python() -> Option<String> {
    let candidates = [
        env::var("PYTHON").ok(),
        Some("python3".to_string()),
        Some("python".to_string()),
    ];
    for candidate in candidates.into_iter().flatten() {
        let status = Command::new(&candidate)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if matches!(status, Ok(code) if code.success()) {
            return Some(candidate);
        }
    }
    None
}

fn fake_interpreter(log: &Path) -> String {
    let log = log.display();
    format!(
        r#"#!/bin/sh
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
  echo "venv $3" >> "{log}"
  mkdir -p "$3/bin"
  cat > "$3/bin/pip" <<'EOF'
#!/bin/sh
echo "pip $*" >> "{log}"
if grep -q FAIL "$3"; then exit 9; fi
EOF
  cat > "$3/bin/python" <<'EOF'
#!/bin/sh
echo "python $*" >> "{log}"
case "$1" in fail-*) exit "${{1#fail-}}";; esac
exit 0
EOF
  chmod +x "$3/bin/pip" "$3/bin/python"
  exit 0
fi
exit 2
"#
    )
}
