//! Terminal capability probes
//!
//! Classification and width detection are best-effort: every probe either
//! answers or steps aside, and the caller falls through to the next one.
//! Width detection ends at a fixed default and never fails.

use std::env;
use std::io::IsTerminal;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};
use crate::streams::OutputStream;

/// Width assumed when no probe can tell
pub const DEFAULT_WIDTH: usize = 80;

/// Width probes, tried in order until one answers
const WIDTH_PROBES: &[(&str, fn(&OutputStream) -> Option<usize>)] = &[
    ("window-size", window_size_probe),
    ("tput", tput_probe),
];

/// Whether an OS handle is attached to a terminal.
///
/// On Windows the standard library also recognises MSYS2/Cygwin pty pipes,
/// so emulated terminals classify as terminals here.
pub fn is_terminal<T: IsTerminal>(handle: &T) -> bool {
    handle.is_terminal()
}

/// A Windows terminal run by a Cygwin-style emulator such as mintty. These
/// export `TERM`, which native consoles leave unset, and cannot report a
/// console size.
pub fn is_emulated_terminal(out: &OutputStream) -> bool {
    looks_emulated(cfg!(windows), out.is_terminal(), env::var("TERM").ok().as_deref())
}

fn looks_emulated(is_windows: bool, is_terminal: bool, term: Option<&str>) -> bool {
    is_windows && is_terminal && term.is_some_and(|t| !t.is_empty() && t != "dumb")
}

/// Column count of `out`, falling back to [`DEFAULT_WIDTH`]
pub fn terminal_width(out: &OutputStream) -> usize {
    WIDTH_PROBES
        .iter()
        .find_map(|(name, probe)| {
            let width = probe(out);
            if let Some(cols) = width {
                debug!(probe = *name, cols, "terminal width detected");
            }
            width
        })
        .unwrap_or(DEFAULT_WIDTH)
}

fn window_size_probe(out: &OutputStream) -> Option<usize> {
    if !matches!(out, OutputStream::Stdout(_) | OutputStream::Stderr(_)) || !out.is_terminal() {
        return None;
    }
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => Some(cols as usize),
        Ok(_) => None,
        Err(err) => {
            debug!(error = %err, "window size query failed");
            None
        }
    }
}

fn tput_probe(out: &OutputStream) -> Option<usize> {
    if !is_emulated_terminal(out) {
        return None;
    }
    match tput_cols() {
        Ok(cols) => Some(cols),
        Err(err) => {
            debug!(error = %err, "tput width fallback failed");
            None
        }
    }
}

/// Ask `tput cols` against the process's own stdin
fn tput_cols() -> Result<usize> {
    let tput = which::which("tput").map_err(|source| Error::ExecutableNotFound {
        program: "tput".to_string(),
        source,
    })?;
    let output = Command::new(&tput)
        .arg("cols")
        .stdin(Stdio::inherit())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| Error::ProcessStart {
            program: tput.clone(),
            source,
        })?;
    parse_columns(&String::from_utf8_lossy(&output.stdout))
}

/// Parse a column count as printed by `tput cols`
pub fn parse_columns(output: &str) -> Result<usize> {
    let trimmed = output.trim();
    trimmed.parse().map_err(|source| Error::SizeParse {
        output: trimmed.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::SharedBuffer;

    #[test]
    fn test_parse_columns() {
        assert_eq!(parse_columns("132\n").unwrap(), 132);
        assert_eq!(parse_columns("  80 ").unwrap(), 80);
    }

    #[test]
    fn test_parse_columns_rejects_garbage() {
        let err = parse_columns("tput: unknown terminal\n").unwrap_err();
        assert!(matches!(err, Error::SizeParse { ref output, .. } if output == "tput: unknown terminal"));
    }

    #[test]
    fn test_buffer_width_falls_back_to_default() {
        let out = OutputStream::Buffer(SharedBuffer::new());
        assert_eq!(terminal_width(&out), DEFAULT_WIDTH);
        assert!(!is_emulated_terminal(&out));
    }

    #[test]
    fn test_only_windows_emulators_count_as_emulated() {
        assert!(looks_emulated(true, true, Some("xterm-256color")));
        // Native console: no TERM
        assert!(!looks_emulated(true, true, None));
        assert!(!looks_emulated(true, true, Some("")));
        assert!(!looks_emulated(true, true, Some("dumb")));
        assert!(!looks_emulated(true, false, Some("xterm")));
        assert!(!looks_emulated(false, true, Some("xterm")));
    }

    #[test]
    fn test_closed_stream_width_falls_back_to_default() {
        assert_eq!(terminal_width(&OutputStream::Closed), DEFAULT_WIDTH);
    }
}
