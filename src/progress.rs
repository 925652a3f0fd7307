//! Progress indicator
//!
//! An animated spinner on the error stream. The animation ticks on its own
//! thread; stopping joins that thread so no frame lands after `stop` returns.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle, TermLike};
use tracing::debug;

use crate::streams::OutputStream;
use crate::tty;

/// Interval between animation frames
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Braille spinner frames; the trailing entry is the finished state
const FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷", ""];

const TEMPLATE: &str = "{prefix}{spinner}";

/// Append `ch` unless `msg` already ends with it
pub fn append_missing(msg: &str, ch: char) -> String {
    if msg.ends_with(ch) {
        msg.to_string()
    } else {
        format!("{msg}{ch}")
    }
}

/// Spinner prefix: the message followed by whitespace
pub fn prefix_for(msg: &str) -> String {
    if msg.ends_with(char::is_whitespace) {
        msg.to_string()
    } else {
        format!("{msg} ")
    }
}

/// A running spinner
pub struct ProgressIndicator {
    bar: ProgressBar,
}

impl fmt::Debug for ProgressIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressIndicator")
            .field("prefix", &self.bar.prefix())
            .finish()
    }
}

impl ProgressIndicator {
    /// Start animating on `err_out` with `msg` as the prefix.
    ///
    /// Returns `None` when the stream cannot be shared with the ticker thread.
    pub fn start(err_out: &OutputStream, msg: &str) -> Option<Self> {
        let target = match err_out {
            OutputStream::Stderr(_) => ProgressDrawTarget::stderr(),
            other => ProgressDrawTarget::term_like(Box::new(StreamTerm::new(other.try_clone()?))),
        };

        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_error| ProgressStyle::default_spinner())
            .tick_strings(FRAMES);

        let bar = ProgressBar::with_draw_target(None, target)
            .with_style(style)
            .with_prefix(prefix_for(msg));
        bar.enable_steady_tick(TICK_INTERVAL);
        debug!(prefix = %bar.prefix(), "progress indicator started");

        Some(Self { bar })
    }

    /// Replace the prefix without restarting the animation
    pub fn set_message(&self, msg: &str) {
        self.bar.set_prefix(prefix_for(msg));
    }

    /// Stop the animation and erase the spinner line. The ticker thread has
    /// exited by the time this returns.
    pub fn stop(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
        debug!("progress indicator stopped");
    }
}

/// Draw target for non-stderr streams (in-memory error output)
struct StreamTerm {
    stream: Mutex<OutputStream>,
}

impl StreamTerm {
    fn new(stream: OutputStream) -> Self {
        Self {
            stream: Mutex::new(stream),
        }
    }

    fn emit(&self, s: &str) -> io::Result<()> {
        let mut stream = self.stream.lock().unwrap_or_else(|p| p.into_inner());
        stream.write_all(s.as_bytes())
    }
}

impl fmt::Debug for StreamTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamTerm").finish_non_exhaustive()
    }
}

impl TermLike for StreamTerm {
    fn width(&self) -> u16 {
        let stream = self.stream.lock().unwrap_or_else(|p| p.into_inner());
        tty::terminal_width(&stream).min(u16::MAX as usize) as u16
    }

    fn move_cursor_up(&self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.emit(&format!("\x1b[{n}A"))
    }

    fn move_cursor_down(&self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.emit(&format!("\x1b[{n}B"))
    }

    fn move_cursor_right(&self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.emit(&format!("\x1b[{n}C"))
    }

    fn move_cursor_left(&self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.emit(&format!("\x1b[{n}D"))
    }

    fn write_line(&self, s: &str) -> io::Result<()> {
        self.emit(&format!("{s}\n"))
    }

    fn write_str(&self, s: &str) -> io::Result<()> {
        self.emit(s)
    }

    fn clear_line(&self) -> io::Result<()> {
        self.emit("\r\x1b[2K")
    }

    fn flush(&self) -> io::Result<()> {
        let mut stream = self.stream.lock().unwrap_or_else(|p| p.into_inner());
        stream.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::SharedBuffer;

    #[test]
    fn test_append_missing() {
        assert_eq!(append_missing("done", '\n'), "done\n");
        assert_eq!(append_missing("done\n", '\n'), "done\n");
        assert_eq!(append_missing("", '\n'), "\n");
    }

    #[test]
    fn test_prefix_for() {
        assert_eq!(prefix_for("Loading"), "Loading ");
        assert_eq!(prefix_for("Loading "), "Loading ");
        assert_eq!(prefix_for("Loading\t"), "Loading\t");
        assert_eq!(prefix_for(""), " ");
    }

    #[test]
    fn test_template_is_valid() {
        assert!(ProgressStyle::with_template(TEMPLATE).is_ok());
    }

    #[test]
    fn test_start_and_stop_on_buffer() {
        let buf = SharedBuffer::new();
        let err_out = OutputStream::Buffer(buf.clone());

        let indicator = ProgressIndicator::start(&err_out, "Working").unwrap();
        indicator.set_message("Still working");
        indicator.stop();

        // Nothing is drawn once stop has returned
        let len = buf.len();
        std::thread::sleep(TICK_INTERVAL * 2);
        assert_eq!(buf.len(), len);
    }

    #[test]
    fn test_closed_stream_cannot_host_indicator() {
        assert!(ProgressIndicator::start(&OutputStream::Closed, "x").is_none());
    }
}
