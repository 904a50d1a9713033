//! A stand-in interpreter for exercising provisioning without Python.
//!
//! `fake-python -m venv DIR` creates `DIR/bin/pip` and `DIR/bin/python`.
//! Every invocation appends one line to `log`. The fake pip fails with 9 when
//! the requirements file contains `FAIL`; the fake python exits with `N` when
//! its first argument is `fail-N`.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub(crate) struct FakePython {
    _temp: TempDir,
    pub(crate) base: PathBuf,
    pub(crate) interpreter: PathBuf,
    pub(crate) log: PathBuf,
}

pub(crate) fn fake_python() -> FakePython {
    let temp = tempfile::Builder::new()
        .prefix("pyship-fake")
        .tempdir()
        .expect("tempdir");
    let base = temp.path().join("python");
    fs::create_dir(&base).expect("base dir");
    fs::write(base.join("requirements.txt"), "six\n").expect("requirements");
    let log = temp.path().join("calls.log");
    let interpreter = temp.path().join("fake-python");
    write_script(&interpreter, &interpreter_script(&log));
    FakePython {
        _temp: temp,
        base,
        interpreter,
        log,
    }
}

pub(crate) fn read_log(fake: &FakePython) -> Vec<String> {
    fs::read_to_string(&fake.log)
        .unwrap_or_default()
        .lines()
        .map(ToString::to_string)
        .collect()
}

fn interpreter_script(log: &Path) -> String {
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

fn write_script(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
}
