use std::io::{Read, Write};
use std::process::{Command, Stdio};

/// Write every line, then close stdin (end-of-input) and collect output.
fn run_shell(lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_yash"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn yash");

    {
        let mut stdin = child.stdin.take().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        // Drop the owned handle (not just a borrow of it) so the child
        // actually sees end-of-input; there is no `exit` builtin to ask
        // for instead.
    }
    child.wait_with_output().expect("wait output")
}

#[test]
fn redirected_pipeline_runs_to_completion_and_exits() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_path = dir.path().join("out.txt");

    let output = run_shell(&[&format!("echo hello > {}", out_path.display())]);

    assert!(output.status.success(), "status was: {:?}", output.status);
    let mut contents = String::new();
    std::fs::File::open(&out_path)
        .expect("output file exists")
        .read_to_string(&mut contents)
        .expect("read output file");
    assert_eq!(contents, "hello\n");
}

#[test]
fn background_job_appears_in_listing() {
    let output = run_shell(&["sleep 2 &", "jobs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("[1]+  Running         sleep 2 &"),
        "stdout was: {stdout}"
    );
}

#[test]
fn two_stage_pipeline_with_redirections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let in_path = dir.path().join("in.txt");
    let out_path = dir.path().join("out.txt");
    std::fs::write(&in_path, "a\nb\nc\n").expect("write input file");

    let output = run_shell(&[&format!(
        "cat < {} | wc -l > {}",
        in_path.display(),
        out_path.display()
    )]);

    assert!(output.status.success());
    let mut contents = String::new();
    std::fs::File::open(&out_path)
        .expect("output file exists")
        .read_to_string(&mut contents)
        .expect("read output file");
    assert_eq!(contents.trim(), "3");
}

#[test]
fn exec_failure_is_not_fatal_to_the_shell() {
    let output = run_shell(&["nosuchprog123abc", "echo still-alive"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "status was: {:?}", output.status);
    assert!(stdout.contains("still-alive"), "stdout was: {stdout}");
}

#[test]
fn jobs_listing_is_idempotent_with_no_intervening_input() {
    let output = run_shell(&["sleep 2 &", "jobs", "jobs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout
        .lines()
        .filter(|l| l.starts_with('['))
        .collect();
    assert_eq!(lines.len(), 2, "stdout was: {stdout}");
    assert_eq!(lines[0], lines[1]);
}
