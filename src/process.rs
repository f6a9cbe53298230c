//! Portable execution of one external command with separated output streams.
//!
//! stdout and stderr are captured into two files inside a scoped temporary
//! directory instead of pipes, so the streams never interleave and nothing
//! depends on the platform multiplexing them. The directory is removed when
//! the guard drops, on every exit path.
use crate::error::ProcessError;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Commands the shell resolves itself; they never live on `PATH`.
const SHELL_BUILTINS: &[&str] = &[
    ".", ":", "[", "call", "cd", "copy", "del", "dir", "echo", "eval", "exec", "exit", "export",
    "false", "for", "if", "set", "source", "start", "test", "true", "type", "while",
];

/// Program words containing these expand in the shell, so they cannot be
/// checked before launch.
const SHELL_EXPANSIONS: &[char] = &['$', '~', '`', '%'];

/// Outcome of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Monotonic id source for temporary artifact names.
///
/// Clones share the same sequence, so plugin instances running on different
/// threads never hand out the same id.
#[derive(Debug, Clone, Default)]
pub struct TempNameCounter(Arc<AtomicU64>);

impl TempNameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    counter: TempNameCounter,
    temp_root: Option<PathBuf>,
}

impl ProcessExecutor {
    pub fn new(counter: TempNameCounter) -> Self {
        Self {
            counter,
            temp_root: None,
        }
    }

    /// Create capture directories under `dir` instead of the system temp dir.
    pub fn with_temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(dir.into());
        self
    }

    pub fn counter(&self) -> &TempNameCounter {
        &self.counter
    }

    /// Run `command` through the platform shell in `working_dir`.
    ///
    /// When `redirect_to` is set, captured stdout is also appended there.
    pub fn exec(
        &self,
        command: &str,
        working_dir: &Path,
        redirect_to: Option<&Path>,
    ) -> Result<ExecutionResult, ProcessError> {
        if command.trim().is_empty() {
            tracing::error!("refusing to run an empty command");
            return Err(ProcessError::EmptyCommand);
        }
        resolve_program(command, working_dir)?;

        let id = self.counter.next_id();
        let prefix = format!("ProcessExecutor_{id}_");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let capture_dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|source| ProcessError::Capture {
                context: "create capture directory".to_string(),
                source,
            })?;
        let stdout_path = capture_dir.path().join(format!("stdout_{id}.txt"));
        let stderr_path = capture_dir.path().join(format!("stderr_{id}.txt"));
        tracing::debug!(dir = %capture_dir.path().display(), "created capture directory");

        if command.contains('>') {
            tracing::warn!(
                "found user provided redirections in `{command}`; output is captured internally to {}",
                capture_dir.path().display()
            );
        }

        let stdout_file = create_capture_file(&stdout_path)?;
        let stderr_file = create_capture_file(&stderr_path)?;

        tracing::debug!(command, cwd = %working_dir.display(), "executing");
        let started = Instant::now();
        let status = shell_command(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::from(stderr_file))
            .status()
            .map_err(|source| ProcessError::Spawn {
                command: command.to_string(),
                source,
            })?;
        let elapsed_ms = started.elapsed().as_millis();

        let stdout = read_capture(&stdout_path)?;
        let stderr = read_capture(&stderr_path)?;
        // Signals carry no exit code.
        let code = status.code().unwrap_or(-1);
        tracing::debug!(elapsed_ms, exit_code = code, "process finished");

        if !stderr.is_empty() {
            tracing::warn!("{}", stderr.join("\n"));
        }
        match redirect_to {
            Some(path) => append_lines(path, &stdout)?,
            None => tracing::debug!("execution output:\n{}", stdout.join("\n")),
        }

        Ok(ExecutionResult {
            code,
            stdout,
            stderr,
        })
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn command_words(command: &str) -> Result<Vec<String>, ProcessError> {
    Ok(split_cmd_words(command))
}

#[cfg(not(windows))]
fn command_words(command: &str) -> Result<Vec<String>, ProcessError> {
    shell_words::split(command).map_err(|err| ProcessError::MalformedCommand {
        command: command.to_string(),
        message: err.to_string(),
    })
}

/// Split the way `cmd` sees words: whitespace separated, double quotes
/// group, backslashes are literal.
#[cfg_attr(not(windows), allow(dead_code))]
fn split_cmd_words(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_word = false;
    for ch in command.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            ch if ch.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            ch => {
                current.push(ch);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Fail fast when the program named by `command` cannot be launched.
fn resolve_program(command: &str, working_dir: &Path) -> Result<(), ProcessError> {
    let words = command_words(command)?;
    let Some(program) = words
        .iter()
        .find(|word| !is_env_assignment(word))
        .map(String::as_str)
    else {
        return Ok(());
    };
    if SHELL_BUILTINS.contains(&program) || program.starts_with('(') {
        return Ok(());
    }
    if program.contains(SHELL_EXPANSIONS) {
        tracing::debug!(program, "program expands in the shell; skipping lookup");
        return Ok(());
    }

    if program.contains('/') || program.contains('\\') {
        let candidate = if Path::new(program).is_absolute() {
            PathBuf::from(program)
        } else {
            working_dir.join(program)
        };
        if candidate.exists() {
            return Ok(());
        }
        return Err(ProcessError::ExecutableNotFound {
            program: program.to_string(),
            message: format!("{} does not exist", candidate.display()),
        });
    }

    which::which(program)
        .map(|_| ())
        .map_err(|err| ProcessError::ExecutableNotFound {
            program: program.to_string(),
            message: err.to_string(),
        })
}

fn is_env_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        None => false,
    }
}

fn create_capture_file(path: &Path) -> Result<File, ProcessError> {
    File::create(path).map_err(|source| ProcessError::Capture {
        context: format!("create {}", path.display()),
        source,
    })
}

fn append_lines(path: &Path, lines: &[String]) -> Result<(), ProcessError> {
    let context = || format!("redirect stdout to {}", path.display());
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ProcessError::Capture {
            context: context(),
            source,
        })?;
    for line in lines {
        writeln!(file, "{line}").map_err(|source| ProcessError::Capture {
            context: context(),
            source,
        })?;
    }
    Ok(())
}

fn read_capture(path: &Path) -> Result<Vec<String>, ProcessError> {
    let bytes = fs::read(path).map_err(|source| ProcessError::Capture {
        context: format!("read {}", path.display()),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn executor() -> ProcessExecutor {
        ProcessExecutor::new(TempNameCounter::new())
    }

    #[test]
    fn rejects_blank_command_without_spawning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = executor().exec("   ", dir.path(), None).unwrap_err();
        assert!(matches!(err, ProcessError::EmptyCommand));
    }

    #[test]
    fn missing_executable_is_a_launch_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = executor()
            .exec("definitely-not-a-real-tool-4821 --flag", dir.path(), None)
            .unwrap_err();
        assert!(matches!(err, ProcessError::ExecutableNotFound { .. }));
    }

    #[test]
    fn missing_relative_executable_is_a_launch_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = executor()
            .exec("./nope.sh file.txt", dir.path(), None)
            .unwrap_err();
        assert!(matches!(err, ProcessError::ExecutableNotFound { .. }));
    }

    #[test]
    fn shell_expanded_programs_are_left_to_the_shell() {
        let dir = tempfile::tempdir().expect("tempdir");
        for command in [
            "$SAVE_TOOL_HOME/lint.sh a.kt",
            "~/bin/not-installed-tool a.kt",
            "\"$HOME\"/not-installed-tool",
            "`which tool` a.kt",
        ] {
            resolve_program(command, dir.path())
                .unwrap_or_else(|err| panic!("{command}: {err}"));
        }
    }

    #[test]
    fn cmd_words_keep_backslashes_and_quoted_spaces() {
        assert_eq!(
            split_cmd_words(r#""C:\Program Files\ktlint.exe" -F C:\src\Main.kt"#),
            vec![r"C:\Program Files\ktlint.exe", "-F", r"C:\src\Main.kt"]
        );
        assert_eq!(split_cmd_words(r"C:\tools\diktat.cmd"), vec![r"C:\tools\diktat.cmd"]);
        assert_eq!(split_cmd_words(r#"tool """#), vec!["tool", ""]);
        assert!(split_cmd_words("   ").is_empty());
    }

    #[test]
    fn env_assignments_are_skipped_when_resolving() {
        assert!(is_env_assignment("RUST_LOG=debug"));
        assert!(!is_env_assignment("--flag=value"));
        assert!(!is_env_assignment("=x"));
    }

    #[test]
    fn counter_is_unique_across_threads() {
        let counter = TempNameCounter::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || (0..100).map(|_| counter.next_id()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = BTreeSet::new();
        for handle in handles {
            for id in handle.join().expect("join") {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 400);
    }

    #[cfg(unix)]
    #[test]
    fn separates_stdout_and_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = executor()
            .exec("echo out; echo err 1>&2; echo out2", dir.path(), None)
            .expect("exec");
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout, vec!["out", "out2"]);
        assert_eq!(result.stderr, vec!["err"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_normal_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = executor().exec("exit 3", dir.path(), None).expect("exec");
        assert_eq!(result.code, 3);
        assert!(result.stdout.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn capture_directory_is_removed_on_non_zero_exit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let captures = tempfile::tempdir().expect("capture root");
        let result = executor()
            .with_temp_root(captures.path())
            .exec("echo partial; exit 3", dir.path(), None)
            .expect("exec");
        assert_eq!(result.code, 3);
        assert_eq!(result.stdout, vec!["partial"]);
        let leftovers: Vec<_> = fs::read_dir(captures.path()).expect("read_dir").collect();
        assert!(leftovers.is_empty(), "leftover capture artifacts: {leftovers:?}");
    }

    #[cfg(unix)]
    #[test]
    fn capture_directory_is_removed_when_spawn_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let captures = tempfile::tempdir().expect("capture root");
        let err = executor()
            .with_temp_root(captures.path())
            .exec("true", &dir.path().join("missing"), None)
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
        let leftovers: Vec<_> = fs::read_dir(captures.path()).expect("read_dir").collect();
        assert!(leftovers.is_empty(), "leftover capture artifacts: {leftovers:?}");
    }

    #[cfg(unix)]
    #[derive(Clone, Default)]
    struct SharedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    #[cfg(unix)]
    impl Write for SharedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(unix)]
    #[test]
    fn user_redirection_raises_an_advisory_and_capture_still_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = SharedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || {
            executor().exec("echo kept; echo lost > user.txt", dir.path(), None)
        })
        .expect("exec");
        assert_eq!(result.stdout, vec!["kept"]);
        let logged = String::from_utf8(log.0.lock().expect("log lock").clone()).expect("utf8");
        assert!(
            logged.contains("found user provided redirections"),
            "missing advisory in: {logged}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn program_behind_a_variable_runs() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let tool = dir.path().join("tool.sh");
        fs::write(&tool, "#!/bin/sh\necho hi\n").expect("write tool");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod");
        let result = executor()
            .exec("\"$(pwd)\"/tool.sh", dir.path(), None)
            .expect("exec");
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout, vec!["hi"]);
    }

    #[cfg(unix)]
    #[test]
    fn redirect_target_accumulates_across_executions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let redirect = dir.path().join("out.log");
        let executor = executor();
        executor
            .exec("echo first", dir.path(), Some(&redirect))
            .expect("first exec");
        executor
            .exec("echo second", dir.path(), Some(&redirect))
            .expect("second exec");
        let written = fs::read_to_string(&redirect).expect("read redirect");
        assert_eq!(written, "first\nsecond\n");
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_working_directory_and_redirects() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("marker.txt"), "x").expect("write marker");
        let redirect = dir.path().join("out.log");
        let result = executor()
            .exec("ls", dir.path(), Some(&redirect))
            .expect("exec");
        assert!(result.stdout.iter().any(|line| line == "marker.txt"));
        let written = fs::read_to_string(&redirect).expect("read redirect");
        assert!(written.contains("marker.txt"));
    }
}
