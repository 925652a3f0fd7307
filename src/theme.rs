//! Terminal background detection
//!
//! Classifies the terminal background as light or dark so callers can pick
//! legible palettes. Detection tries, in order:
//! 1. The `COLORFGBG` hint exported by rxvt, Konsole and friends
//! 2. An OSC 11 query against the controlling terminal (unix only)
//!
//! and assumes a dark background when neither answers.

use std::env;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// How long to wait for the terminal to answer the background query
pub const QUERY_TIMEOUT: Duration = Duration::from_millis(300);

/// Detected background classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalTheme {
    /// Detection skipped: no color, paged output, or an explicit style
    None,
    Light,
    Dark,
}

impl TerminalTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for TerminalTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An explicit `GLAMOUR_STYLE` other than `auto` pins the style, so there
/// is nothing to detect
pub fn style_overridden(style: Option<&str>) -> bool {
    matches!(style, Some(s) if !s.is_empty() && s != "auto")
}

/// Probe the terminal background. `can_query` gates the terminal round trip,
/// which is only safe when both stdin and stdout are terminals.
pub fn detect_background(can_query: bool) -> TerminalTheme {
    if let Some(theme) = env::var("COLORFGBG").ok().as_deref().and_then(theme_from_colorfgbg) {
        debug!(%theme, "background from COLORFGBG");
        return theme;
    }

    if can_query {
        if let Some(theme) = query::background(QUERY_TIMEOUT) {
            debug!(%theme, "background from OSC 11");
            return theme;
        }
    }

    TerminalTheme::Dark
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`); the last field is the
/// background palette index
pub fn theme_from_colorfgbg(value: &str) -> Option<TerminalTheme> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match bg {
        0..=6 | 8 => Some(TerminalTheme::Dark),
        7 | 9..=15 => Some(TerminalTheme::Light),
        _ => None,
    }
}

/// Classify an RGB color (components in 0.0..=1.0) by relative luminance
pub fn theme_from_rgb(r: f64, g: f64, b: f64) -> TerminalTheme {
    let luminance = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    if luminance < 0.5 {
        TerminalTheme::Dark
    } else {
        TerminalTheme::Light
    }
}

/// Parse an OSC 11 reply: `ESC ] 11 ; rgb:RRRR/GGGG/BBBB` terminated by BEL
/// or ST. Components may have 1 to 4 hex digits.
pub fn parse_background_reply(reply: &[u8]) -> Option<TerminalTheme> {
    let text = String::from_utf8_lossy(reply);
    let start = text.find("]11;")? + 4;
    let body = &text[start..];
    let end = body.find(['\x07', '\x1b']).unwrap_or(body.len());
    let spec = body[..end].strip_prefix("rgb:")?;

    let mut channels = spec.split('/').map(hex_channel);
    let r = channels.next()??;
    let g = channels.next()??;
    let b = channels.next()??;
    if channels.next().is_some() {
        return None;
    }
    Some(theme_from_rgb(r, g, b))
}

fn hex_channel(digits: &str) -> Option<f64> {
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    let max = (1u32 << (4 * digits.len())) - 1;
    Some(f64::from(value) / f64::from(max))
}

#[cfg(unix)]
mod query {
    use std::fs::OpenOptions;
    use std::io::{self, Read, Write};
    use std::os::fd::AsRawFd;
    use std::time::{Duration, Instant};

    use tracing::debug;

    use super::{parse_background_reply, TerminalTheme};
    use crate::color::escape::{QUERY_BACKGROUND, QUERY_CURSOR_POSITION};

    /// Upper bound on reply bytes collected before giving up
    const MAX_REPLY: usize = 256;

    /// Send OSC 11 followed by a cursor position request and collect
    /// everything up to the cursor report's terminating `R`.
    pub fn background(timeout: Duration) -> Option<TerminalTheme> {
        let mut tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .ok()?;

        if let Err(err) = crossterm::terminal::enable_raw_mode() {
            debug!(error = %err, "raw mode unavailable, skipping background query");
            return None;
        }

        let reply = tty
            .write_all(QUERY_BACKGROUND.as_bytes())
            .and_then(|()| tty.write_all(QUERY_CURSOR_POSITION.as_bytes()))
            .and_then(|()| tty.flush())
            .ok()
            .and_then(|()| read_reply(&mut tty, timeout));

        let _ = crossterm::terminal::disable_raw_mode();
        parse_background_reply(&reply?)
    }

    /// Read one byte at a time until `R` or the deadline. Nothing is read
    /// once this returns, so later keystrokes stay with the user.
    fn read_reply<R: Read + AsRawFd>(source: &mut R, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut reply = Vec::with_capacity(64);
        let mut byte = [0u8; 1];

        while reply.len() < MAX_REPLY {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            if !wait_readable(source.as_raw_fd(), remaining) {
                debug!(received = reply.len(), "terminal did not answer background query");
                return None;
            }
            match source.read(&mut byte) {
                Ok(1) => {
                    reply.push(byte[0]);
                    if byte[0] == b'R' {
                        break;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                _ => break,
            }
        }
        Some(reply)
    }

    fn wait_readable(fd: std::os::fd::RawFd, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let millis = remaining.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
            let mut pfd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };
            // SAFETY: `pfd` is a single valid pollfd that outlives the call
            let ready = unsafe { libc::poll(&mut pfd, 1, millis) };
            if ready > 0 {
                return pfd.revents & libc::POLLIN != 0;
            }
            if ready == 0 || io::Error::last_os_error().kind() != io::ErrorKind::Interrupted {
                return false;
            }
        }
    }

}

#[cfg(not(unix))]
mod query {
    use std::time::Duration;

    use super::TerminalTheme;

    pub fn background(_timeout: Duration) -> Option<TerminalTheme> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_override() {
        assert!(!style_overridden(None));
        assert!(!style_overridden(Some("")));
        assert!(!style_overridden(Some("auto")));
        assert!(style_overridden(Some("dracula")));
        assert!(style_overridden(Some("light")));
    }

    #[test]
    fn test_colorfgbg() {
        assert_eq!(theme_from_colorfgbg("15;0"), Some(TerminalTheme::Dark));
        assert_eq!(theme_from_colorfgbg("0;15"), Some(TerminalTheme::Light));
        assert_eq!(theme_from_colorfgbg("0;default;7"), Some(TerminalTheme::Light));
        assert_eq!(theme_from_colorfgbg("7;8"), Some(TerminalTheme::Dark));
        assert_eq!(theme_from_colorfgbg("garbage"), None);
        assert_eq!(theme_from_colorfgbg("0;200"), None);
    }

    #[test]
    fn test_osc_reply_dark() {
        let reply = b"\x1b]11;rgb:1e1e/1e1e/1e1e\x07\x1b[24;1R";
        assert_eq!(parse_background_reply(reply), Some(TerminalTheme::Dark));
    }

    #[test]
    fn test_osc_reply_light_with_st() {
        let reply = b"\x1b]11;rgb:ffff/ffff/f0f0\x1b\\\x1b[1;1R";
        assert_eq!(parse_background_reply(reply), Some(TerminalTheme::Light));
    }

    #[test]
    fn test_osc_reply_short_components() {
        assert_eq!(parse_background_reply(b"\x1b]11;rgb:f/f/f\x07"), Some(TerminalTheme::Light));
        assert_eq!(parse_background_reply(b"\x1b]11;rgb:00/00/00\x07"), Some(TerminalTheme::Dark));
    }

    #[test]
    fn test_osc_reply_missing() {
        // Terminal ignored OSC 11 and only answered the cursor query
        assert_eq!(parse_background_reply(b"\x1b[12;40R"), None);
        assert_eq!(parse_background_reply(b"\x1b]11;rgb:zz/00/00\x07"), None);
        assert_eq!(parse_background_reply(b"\x1b]11;rgb:00/00\x07"), None);
    }

    #[test]
    fn test_theme_strings() {
        assert_eq!(TerminalTheme::None.to_string(), "none");
        assert_eq!(TerminalTheme::Light.as_str(), "light");
        assert_eq!(TerminalTheme::Dark.as_str(), "dark");
    }
}
