use super::{CommandSpec, OutputMode, ProcessError, ProcessOutput, ProcessRunner};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Runs commands on the host, blocking until they exit.
///
/// In `OutputMode::Stream` each pipe is drained by a helper thread that echoes
/// lines to the operator as they arrive and keeps a copy for the result.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Clone, Copy)]
enum Echo {
    None,
    Stdout,
    Stderr,
}

fn pump<R: Read + Send + 'static>(source: R, echo: Echo) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut captured = String::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    match echo {
                        Echo::Stdout => {
                            let mut out = io::stdout().lock();
                            let _ = out.write_all(&line);
                            let _ = out.flush();
                        }
                        Echo::Stderr => {
                            let mut err = io::stderr().lock();
                            let _ = err.write_all(&line);
                            let _ = err.flush();
                        }
                        Echo::None => {}
                    }
                    captured.push_str(&String::from_utf8_lossy(&line));
                }
            }
        }
        captured
    })
}

/// `db_dump.sql` -> `db_dump.sql.tmp`, next to the target
fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        debug!(command = %command, "Running external command");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::inherit());
        for (key, value) in &command.env {
            cmd.env(key, value);
        }
        if let Some(ref dir) = command.cwd {
            cmd.current_dir(dir);
        }

        let redirect = match command.output {
            OutputMode::StdoutToFile(ref path) => {
                let staging = staging_path(path);
                let file = File::create(&staging).map_err(|e| ProcessError::Io {
                    program: command.program.clone(),
                    reason: format!("cannot create {}: {}", staging.display(), e),
                })?;
                cmd.stdout(Stdio::from(file));
                Some((staging, path.clone()))
            }
            _ => {
                cmd.stdout(Stdio::piped());
                None
            }
        };
        cmd.stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                if let Some((staging, _)) = &redirect {
                    let _ = fs::remove_file(staging);
                }
                return Err(ProcessError::Spawn {
                    program: command.program.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let streaming = command.output == OutputMode::Stream;
        let stdout_pump = child.stdout.take().map(|out| {
            pump(out, if streaming { Echo::Stdout } else { Echo::None })
        });
        let stderr_pump = child.stderr.take().map(|err| {
            pump(err, if streaming { Echo::Stderr } else { Echo::None })
        });

        let status = child.wait().map_err(|e| {
            if let Some((staging, _)) = &redirect {
                let _ = fs::remove_file(staging);
            }
            ProcessError::Io {
                program: command.program.clone(),
                reason: e.to_string(),
            }
        })?;

        // the target is only replaced by a complete, successful run
        if let Some((staging, target)) = &redirect {
            if status.success() {
                fs::rename(staging, target).map_err(|e| {
                    let _ = fs::remove_file(staging);
                    ProcessError::Io {
                        program: command.program.clone(),
                        reason: format!("cannot move output to {}: {}", target.display(), e),
                    }
                })?;
            } else {
                let _ = fs::remove_file(staging);
            }
        }

        let collect = |handle: Option<JoinHandle<String>>| {
            handle
                .map(|h| h.join().unwrap_or_default())
                .unwrap_or_default()
        };

        let output = ProcessOutput {
            exit_code: status.code(),
            stdout: collect(stdout_pump),
            stderr: collect(stderr_pump),
        };
        debug!(exit_code = ?output.exit_code, "External command finished");
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_captures_exit_code_and_streams() {
        let runner = SystemProcessRunner::new();
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .output(OutputMode::Capture);

        let output = runner.run(&spec).unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[test]
    fn test_stdout_redirected_to_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("db_dump.sql");
        let runner = SystemProcessRunner::new();
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo 'CREATE TABLE t();'"])
            .output(OutputMode::StdoutToFile(target.clone()));

        let output = runner.run(&spec).unwrap();

        assert!(output.success());
        assert!(output.stdout.is_empty());
        assert_eq!(fs::read_to_string(target).unwrap(), "CREATE TABLE t();\n");
    }

    #[test]
    fn test_missing_program_keeps_existing_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("db_dump.sql");
        fs::write(&target, "-- yesterday\n").unwrap();
        let runner = SystemProcessRunner::new();
        let spec = CommandSpec::new("dockhand-definitely-missing-tool")
            .output(OutputMode::StdoutToFile(target.clone()));

        let err = runner.run(&spec).unwrap_err();

        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "-- yesterday\n");
        assert!(!temp.path().join("db_dump.sql.tmp").exists());
    }

    #[test]
    fn test_failed_run_keeps_existing_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("db_dump.sql");
        fs::write(&target, "-- yesterday\n").unwrap();
        let runner = SystemProcessRunner::new();
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo partial; echo 'connection refused' >&2; exit 1"])
            .output(OutputMode::StdoutToFile(target.clone()));

        let output = runner.run(&spec).unwrap();

        assert_eq!(output.exit_code, Some(1));
        assert_eq!(fs::read_to_string(&target).unwrap(), "-- yesterday\n");
        assert!(!temp.path().join("db_dump.sql.tmp").exists());
    }

    #[test]
    fn test_successful_run_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("db_dump.sql");
        fs::write(&target, "-- yesterday\n").unwrap();
        let runner = SystemProcessRunner::new();
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo '-- today'"])
            .output(OutputMode::StdoutToFile(target.clone()));

        assert!(runner.run(&spec).unwrap().success());
        assert_eq!(fs::read_to_string(&target).unwrap(), "-- today\n");
    }

    #[test]
    fn test_staging_path_is_sibling() {
        assert_eq!(
            staging_path(Path::new("/srv/shop/db_dump.sql")),
            PathBuf::from("/srv/shop/db_dump.sql.tmp")
        );
    }

    #[test]
    fn test_env_and_cwd_are_applied() {
        let temp = TempDir::new().unwrap();
        let runner = SystemProcessRunner::new();
        let spec = CommandSpec::new("sh")
            .args(["-c", "printf '%s' \"$APP_IMAGE\"; pwd >&2"])
            .env("APP_IMAGE", "ghcr.io/acme/shop:2")
            .current_dir(temp.path())
            .output(OutputMode::Capture);

        let output = runner.run(&spec).unwrap();

        assert_eq!(output.stdout, "ghcr.io/acme/shop:2");
        let canonical = temp.path().canonicalize().unwrap();
        assert_eq!(output.stderr.trim(), canonical.display().to_string());
    }
}
