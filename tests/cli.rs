#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn minishell(args: &[&str], script: &str, cwd: &Path) -> Output {
    let home = cwd.join("home");
    let _ = std::fs::create_dir_all(&home);
    let mut child = Command::new(env!("CARGO_BIN_EXE_minishell"))
        .args(args)
        .current_dir(cwd)
        .env("HOME", &home)
        .env("MINISHELL_HISTORY", home.join("history"))
        .env("MINISHELL_LOG_DIR", home.join("logs"))
        .env_remove("MINISHELL_LOG_STDERR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn run(script: &str) -> Output {
    let dir = tempfile::tempdir().unwrap();
    minishell(&[], script, dir.path())
}

fn stdout_of(script: &str) -> String {
    String::from_utf8_lossy(&run(script).stdout).into_owned()
}

macro_rules! stdout_test {
    ($name:ident, $script:expr, $expected:expr) => {
        #[test]
        fn $name() {
            assert_eq!(stdout_of($script), $expected, "script: {:?}", $script);
        }
    };
}

// ── Pipelines and logical operators ──

stdout_test!(status_of_last_stage, "true | false | true\necho $?\n", "0\n");
stdout_test!(status_of_failing_last_stage, "true | true | false\necho $?\n", "1\n");
stdout_test!(and_short_circuit, "false && echo hi\necho $?\n", "1\n");
stdout_test!(or_short_circuit, "true || echo hi\necho $?\n", "0\n");
stdout_test!(and_runs_on_success, "true && echo hi\n", "hi\n");
stdout_test!(or_runs_on_failure, "false || echo hi\n", "hi\n");
stdout_test!(short_circuit_ends_line, "false && echo a || echo b\n", "");
stdout_test!(pipeline_data, "echo hello | tr a-z A-Z | cat\n", "HELLO\n");

// ── Expansion ──

stdout_test!(status_expansion, "sh -c 'exit 42'\necho $?\necho $?\n", "42\n0\n");
stdout_test!(status_seen_after_or, "false || echo $?\n", "1\n");
stdout_test!(single_quotes_are_literal, "echo '$HOME and $?'\n", "$HOME and $?\n");
stdout_test!(double_quotes_expand, "export NAME=world\necho \"hi $NAME\"\n", "hi world\n");
stdout_test!(unset_variable_vanishes, "echo a $NOPE_NOT_SET b\n", "a b\n");
stdout_test!(empty_quotes_stay, "echo a \"\" b\n", "a  b\n");
stdout_test!(lone_ampersand_is_a_word, "echo a&b\n", "a&b\n");

// ── Continuation lines ──

stdout_test!(unclosed_quote_joins_with_newline, "echo \"abc\ndef\"\n", "abc\ndef\n");
stdout_test!(backslash_joins_without_separator, "echo ab\\\ncd\n", "abcd\n");

// ── Builtins ──

stdout_test!(echo_n, "echo -n -nn hi\n", "hi");
stdout_test!(export_then_env_in_child, "export ZZ_TEST=1\nenv | grep ZZ_TEST\n", "ZZ_TEST=1\n");
stdout_test!(unset_removes, "export ZZ_TEST=1\nunset ZZ_TEST\necho [$ZZ_TEST]\n", "[]\n");
stdout_test!(exit_stops_script, "echo before\nexit 0\necho after\n", "before\n");
stdout_test!(heredoc, "export W=there\ncat << EOF\nhi $W\nEOF\n", "hi there\n");
stdout_test!(quoted_heredoc, "cat << 'EOF'\nhi $W\nEOF\n", "hi $W\n");

#[test]
fn redirection_last_wins() {
    let dir = tempfile::tempdir().unwrap();
    let output = minishell(&[], "echo hi > a.txt > b.txt\n", dir.path());
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "");
    assert_eq!(std::fs::read_to_string(dir.path().join("b.txt")).unwrap(), "hi\n");
}

#[test]
fn append_and_input_redirection() {
    let dir = tempfile::tempdir().unwrap();
    let script = "echo one > f\necho two >> f\ncat < f\n";
    let output = minishell(&[], script, dir.path());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "one\ntwo\n");
}

#[test]
fn missing_input_file() {
    let output = run("cat < /no/such/file\necho $?\n");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("minishell: /no/such/file: No such file or directory"));
}

#[test]
fn command_not_found() {
    let output = run("no-such-program-xyz\n");
    assert_eq!(output.status.code(), Some(127));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no-such-program-xyz"), "stderr: {}", stderr);
    assert!(stderr.contains("command not found"), "stderr: {}", stderr);
}

#[test]
fn not_executable() {
    let output = run("/\n");
    assert_eq!(output.status.code(), Some(126));
}

// ── Syntax errors ──

#[test]
fn syntax_error_discards_line() {
    let output = run("echo a | | echo b\necho $?\n");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "258\n");
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("minishell: syntax error near unexpected token `|'"));
}

#[test]
fn syntax_error_at_end_of_line() {
    let output = run("echo a >\n");
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("syntax error near unexpected token `newline'"));
    // 258 只能以低 8 位作为进程退出码
    assert_eq!(output.status.code(), Some(258 & 0xff));
}

#[test]
fn semicolon_is_rejected() {
    let output = run("echo a ; echo b\n");
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("syntax error near unexpected token `;'"));
}

#[test]
fn eof_inside_quote() {
    let output = run("echo 'abc\n");
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("unexpected EOF while looking for matching `''"));
}

// ── Process-level behaviour ──

#[test]
fn exit_status_wraps() {
    assert_eq!(run("exit 300\n").status.code(), Some(44));
    assert_eq!(run("exit abc\n").status.code(), Some(255));
}

#[test]
fn command_string() {
    let dir = tempfile::tempdir().unwrap();
    let output = minishell(&["-c", "echo hi && false"], "", dir.path());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hi\n");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn script_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("script.sh"), "echo from file\nexit 3\n").unwrap();
    let output = minishell(&["script.sh"], "", dir.path());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "from file\n");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn shlvl_is_incremented() {
    let dir = tempfile::tempdir().unwrap();
    let mut command = Command::new(env!("CARGO_BIN_EXE_minishell"));
    let output = command
        .args(["-c", "echo $SHLVL"])
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("MINISHELL_LOG_DIR", dir.path().join("logs"))
        .env("SHLVL", "3")
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "4\n");
}

// ── Heredocs on skipped pipelines ──

#[test]
fn skipped_heredoc_body_is_not_run() {
    let output = run("false && cat << EOF\necho LEAKED\nEOF\necho after\n");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "after\n");
    assert!(output.stderr.is_empty(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let output = run("true || cat << EOF\necho LEAKED\nEOF\n");
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn ambiguous_redirect() {
    let output = run("echo hi > $NOPE_NOT_SET\necho $?\n");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("minishell: $NOPE_NOT_SET: ambiguous redirect"));
}
