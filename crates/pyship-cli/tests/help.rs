use assert_cmd::cargo::cargo_bin_cmd;

fn help_output(args: &[&str]) -> String {
    let assert = cargo_bin_cmd!("pyship").args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 help")
}

#[test]
fn top_level_help_lists_commands() {
    let output = help_output(&["--help"]);
    for command in ["run", "package", "publish", "env"] {
        assert!(output.contains(command), "{command} missing: {output}");
    }
}

#[test]
fn run_help_shows_usage() {
    let output = help_output(&["run", "--help"]);
    assert!(
        output.contains("pyship run <BASE> [CMD]..."),
        "run usage missing: {output}"
    );
}

#[test]
fn publish_help_mentions_repository() {
    let output = help_output(&["publish", "--help"]);
    assert!(output.contains("--repository"), "{output}");
    assert!(output.contains("PYSHIP_REPOSITORY"), "{output}");
}

#[test]
fn unknown_subcommand_exits_one() {
    cargo_bin_cmd!("pyship").arg("deploy").assert().code(1);
}
