//! Pager child process
//!
//! Runs the configured pager with its stdin connected to a pipe the bundle
//! writes through. The pager inherits the bundle's output and error streams;
//! in-memory streams are fed by pump threads instead.

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::streams::{OutputStream, SharedBuffer};

/// Variable that selects the pager; removed from the pager's own environment
pub const PAGER_ENV: &str = "PAGER";

/// Defaults for pager behavior variables, applied only when unset:
/// `less` in raw-control-char mode that quits on short output and keeps the
/// screen on exit, and `lv` without reverse-video control chars
pub const PAGER_ENV_DEFAULTS: &[(&str, &str)] = &[("LESS", "FRX"), ("LV", "-c")];

/// Commands that mean "no pager"
pub fn is_passthrough(command: &str) -> bool {
    let command = command.trim();
    command.is_empty() || command == "cat"
}

/// Split a pager command respecting shell quoting
pub fn tokenize(command: &str) -> Result<Vec<String>> {
    let args = shell_words::split(command).map_err(|source| Error::Tokenize {
        command: command.to_string(),
        source,
    })?;
    if args.is_empty() {
        return Err(Error::EmptyCommand {
            command: command.to_string(),
        });
    }
    Ok(args)
}

/// Behavior variables to add to the pager's environment, given a lookup of
/// the current environment
pub fn env_defaults(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, &'static str)> {
    PAGER_ENV_DEFAULTS
        .iter()
        .filter(|&&(name, _)| lookup(name).is_none())
        .copied()
        .collect()
}

/// A running pager
#[derive(Debug)]
pub struct PagerProcess {
    child: Child,
    program: PathBuf,
    pumps: Vec<JoinHandle<()>>,
}

impl PagerProcess {
    /// Launch `command` with stdout/stderr wired to `out`/`err_out`.
    ///
    /// Returns the write end of the pager's stdin alongside the process.
    pub fn spawn(
        command: &str,
        out: &OutputStream,
        err_out: &OutputStream,
    ) -> Result<(ChildStdin, Self)> {
        let args = tokenize(command)?;
        let program = which::which(&args[0]).map_err(|source| Error::ExecutableNotFound {
            program: args[0].clone(),
            source,
        })?;

        let (stdout, stdout_sink) = stdio_for(out);
        let (stderr, stderr_sink) = stdio_for(err_out);

        let mut cmd = Command::new(&program);
        cmd.args(&args[1..])
            .env_remove(PAGER_ENV)
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(stderr);
        for (name, value) in env_defaults(|name| env::var(name).ok()) {
            cmd.env(name, value);
        }

        let child = cmd.spawn().map_err(|source| Error::ProcessStart {
            program: program.clone(),
            source,
        })?;

        let mut process = Self {
            child,
            program,
            pumps: Vec::new(),
        };

        let stdin = match process.child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                process.abort();
                return Err(Error::PipeCreation {
                    source: io::Error::new(io::ErrorKind::BrokenPipe, "pager stdin unavailable"),
                });
            }
        };

        if let Some(sink) = stdout_sink {
            if let Some(pipe) = process.child.stdout.take() {
                process.pump("pager-stdout", pipe, sink)?;
            }
        }
        if let Some(sink) = stderr_sink {
            if let Some(pipe) = process.child.stderr.take() {
                process.pump("pager-stderr", pipe, sink)?;
            }
        }

        debug!(program = %process.program.display(), pid = process.child.id(), "pager started");
        Ok((stdin, process))
    }

    fn pump(
        &mut self,
        name: &str,
        mut pipe: impl io::Read + Send + 'static,
        mut sink: SharedBuffer,
    ) -> Result<()> {
        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if let Err(err) = io::copy(&mut pipe, &mut sink) {
                    debug!(error = %err, "pager output pump stopped");
                }
            });
        match spawned {
            Ok(handle) => {
                self.pumps.push(handle);
                Ok(())
            }
            Err(source) => {
                self.abort();
                Err(Error::PipeCreation { source })
            }
        }
    }

    /// Kill a pager that never became usable
    fn abort(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        for pump in self.pumps.drain(..) {
            let _ = pump.join();
        }
    }

    /// Wait for the pager to exit. The caller must have closed the stdin
    /// pipe first or this blocks until the user quits the pager.
    pub fn wait(mut self) {
        match self.child.wait() {
            Ok(status) => debug!(%status, "pager exited"),
            Err(err) => warn!(error = %err, "failed waiting for pager"),
        }
        for pump in self.pumps.drain(..) {
            let _ = pump.join();
        }
    }
}

/// How a pager's output stream is wired to one of the bundle's streams
fn stdio_for(stream: &OutputStream) -> (Stdio, Option<SharedBuffer>) {
    match stream {
        OutputStream::Stdout(_) => (Stdio::from(io::stdout()), None),
        OutputStream::Stderr(_) => (Stdio::from(io::stderr()), None),
        OutputStream::Buffer(buffer) => (Stdio::piped(), Some(buffer.clone())),
        OutputStream::Pager(_) | OutputStream::Closed => (Stdio::null(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_commands() {
        assert!(is_passthrough(""));
        assert!(is_passthrough("cat"));
        assert!(is_passthrough("  cat "));
        assert!(!is_passthrough("less"));
        assert!(!is_passthrough("cat -n"));
    }

    #[test]
    fn test_tokenize_respects_quotes() {
        let args = tokenize(r#"less -R --prompt "page %d""#).unwrap();
        assert_eq!(args, vec!["less", "-R", "--prompt", "page %d"]);
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        let err = tokenize("less 'oops").unwrap_err();
        assert!(matches!(err, Error::Tokenize { .. }));
    }

    #[test]
    fn test_tokenize_blank() {
        assert!(matches!(tokenize("   ").unwrap_err(), Error::EmptyCommand { .. }));
    }

    #[test]
    fn test_env_defaults_only_when_unset() {
        let all = env_defaults(|_| None);
        assert_eq!(all, vec![("LESS", "FRX"), ("LV", "-c")]);

        let user_less = env_defaults(|name| (name == "LESS").then(|| "-S".to_string()));
        assert_eq!(user_less, vec![("LV", "-c")]);

        let both = env_defaults(|_| Some(String::new()));
        assert!(both.is_empty());
    }

    #[test]
    fn test_missing_executable() {
        let out = OutputStream::Buffer(SharedBuffer::new());
        let err = PagerProcess::spawn("definitely-not-a-pager-xyz", &out, &out).unwrap_err();
        assert!(matches!(err, Error::ExecutableNotFound { ref program, .. } if program == "definitely-not-a-pager-xyz"));
    }
}
