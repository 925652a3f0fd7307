//! The stream bundle
//!
//! `IoStreams` owns stdin/stdout/stderr (or in-memory stand-ins) together
//! with everything needed to decide how output should behave: TTY status,
//! color support, terminal theme, paging, progress feedback and width.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut io = IoStreams::system();
//! io.start_pager()?;
//! writeln!(io.out(), "lots of output")?;
//! io.stop_pager();
//! ```
//!
//! Tests use [`IoStreams::test`], which returns buffers standing in for the
//! three streams and never classifies anything as a terminal.

mod buffer;
mod handle;

use std::env;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use buffer::SharedBuffer;
pub use handle::{InputStream, OutputStream, RawStreamHandle};

use crate::color::{ColorEnv, ColorPreference, ColorScheme};
use crate::error::{Error, Result};
use crate::pager::{self, PagerProcess};
use crate::progress::{append_missing, ProgressIndicator};
use crate::theme::{self, TerminalTheme};
use crate::tty;

/// Variable that pins the rendering style and disables theme detection
pub const STYLE_ENV: &str = "GLAMOUR_STYLE";

/// Buffers backing a test bundle
#[derive(Clone, Debug, Default)]
pub struct TestBuffers {
    pub input: SharedBuffer,
    pub out: SharedBuffer,
    pub err_out: SharedBuffer,
}

/// A temporary file created for the caller. The file is not removed when
/// the handle is dropped.
#[derive(Debug)]
pub struct TempFile {
    pub file: File,
    pub path: PathBuf,
}

impl TempFile {
    fn try_clone(&self) -> std::io::Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
        })
    }
}

/// Standard streams plus terminal capability state
#[derive(Debug)]
pub struct IoStreams {
    input: InputStream,
    out: OutputStream,
    err_out: OutputStream,

    /// Output as it was before any pager took over; used for width probing
    original_out: OutputStream,
    color_enabled: bool,
    color_256_enabled: bool,
    terminal_theme: Option<TerminalTheme>,

    progress_indicator_enabled: bool,
    progress_indicator: Option<ProgressIndicator>,

    stdin_tty_override: Option<bool>,
    stdout_tty_override: Option<bool>,
    stderr_tty_override: Option<bool>,

    pager_command: String,
    pager: Option<PagerProcess>,

    never_prompt: bool,

    temp_file_override: Option<TempFile>,
}

impl IoStreams {
    /// Bind to the process's real streams, honoring color environment variables
    pub fn system() -> Self {
        Self::system_with(ColorPreference::Auto)
    }

    /// Bind to the process's real streams with an explicit color preference
    pub fn system_with(color: ColorPreference) -> Self {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let stdout_is_tty = tty::is_terminal(&stdout);
        let stderr_is_tty = tty::is_terminal(&stderr);

        let color_env = ColorEnv::from_env();
        let color_enabled = color.resolve(&color_env, stdout_is_tty);

        debug!(
            stdout_is_tty,
            stderr_is_tty, color_enabled, "bound to process streams"
        );

        Self {
            input: InputStream::Stdin(std::io::stdin()),
            out: OutputStream::Stdout(stdout),
            err_out: OutputStream::Stderr(stderr),
            original_out: OutputStream::Stdout(std::io::stdout()),
            color_enabled,
            color_256_enabled: color_env.supports_256(),
            terminal_theme: None,
            progress_indicator_enabled: stdout_is_tty && stderr_is_tty,
            progress_indicator: None,
            stdin_tty_override: None,
            // Answer known now; skip repeated probes
            stdout_tty_override: Some(stdout_is_tty),
            stderr_tty_override: Some(stderr_is_tty),
            pager_command: env::var(pager::PAGER_ENV).unwrap_or_default(),
            pager: None,
            never_prompt: false,
            temp_file_override: None,
        }
    }

    /// In-memory bundle for tests: no TTYs, no color, no progress indicator
    pub fn test() -> (Self, TestBuffers) {
        let buffers = TestBuffers::default();
        let io = Self {
            input: InputStream::Buffer(buffers.input.clone()),
            out: OutputStream::Buffer(buffers.out.clone()),
            err_out: OutputStream::Buffer(buffers.err_out.clone()),
            original_out: OutputStream::Buffer(buffers.out.clone()),
            color_enabled: false,
            color_256_enabled: false,
            terminal_theme: None,
            progress_indicator_enabled: false,
            progress_indicator: None,
            stdin_tty_override: None,
            stdout_tty_override: None,
            stderr_tty_override: None,
            pager_command: String::new(),
            pager: None,
            never_prompt: false,
            temp_file_override: None,
        };
        (io, buffers)
    }

    /// Construction-time switch for the progress indicator gate
    pub fn with_progress_indicator(mut self, enabled: bool) -> Self {
        self.progress_indicator_enabled = enabled;
        self
    }

    /// Construction-time color decision, for bundles not built by `system`
    pub fn with_color(mut self, enabled: bool, is_256: bool) -> Self {
        self.color_enabled = enabled;
        self.color_256_enabled = is_256;
        self
    }

    // === Streams ===

    pub fn input(&mut self) -> &mut InputStream {
        &mut self.input
    }

    /// Current output: the pager pipe while a pager runs
    pub fn out(&mut self) -> &mut OutputStream {
        &mut self.out
    }

    pub fn err_out(&mut self) -> &mut OutputStream {
        &mut self.err_out
    }

    pub fn stdout_fd(&self) -> Option<RawStreamHandle> {
        self.out.raw_handle()
    }

    pub fn stderr_fd(&self) -> Option<RawStreamHandle> {
        self.err_out.raw_handle()
    }

    // === TTY classification ===

    pub fn set_stdin_tty(&mut self, is_tty: bool) {
        self.stdin_tty_override = Some(is_tty);
    }

    pub fn is_stdin_tty(&self) -> bool {
        self.stdin_tty_override
            .unwrap_or_else(|| self.input.is_terminal())
    }

    pub fn set_stdout_tty(&mut self, is_tty: bool) {
        self.stdout_tty_override = Some(is_tty);
    }

    pub fn is_stdout_tty(&self) -> bool {
        self.stdout_tty_override
            .unwrap_or_else(|| self.out.is_terminal())
    }

    pub fn set_stderr_tty(&mut self, is_tty: bool) {
        self.stderr_tty_override = Some(is_tty);
    }

    pub fn is_stderr_tty(&self) -> bool {
        self.stderr_tty_override
            .unwrap_or_else(|| self.err_out.is_terminal())
    }

    /// Both input and output are terminals
    pub fn is_interactive(&self) -> bool {
        self.is_stdin_tty() && self.is_stdout_tty()
    }

    pub fn set_never_prompt(&mut self, never: bool) {
        self.never_prompt = never;
    }

    /// Whether it is acceptable to ask the user a question
    pub fn can_prompt(&self) -> bool {
        if self.never_prompt {
            return false;
        }
        self.is_interactive()
    }

    // === Color and theme ===

    pub fn color_enabled(&self) -> bool {
        self.color_enabled
    }

    pub fn color_support_256(&self) -> bool {
        self.color_256_enabled
    }

    pub fn color_scheme(&self) -> ColorScheme {
        ColorScheme::new(self.color_enabled, self.color_256_enabled)
    }

    /// Detect the background. A light/dark answer is cached for the
    /// bundle's lifetime; conditions that rule detection out are rechecked
    /// on every call.
    pub fn detect_terminal_theme(&mut self) -> TerminalTheme {
        let style = env::var(STYLE_ENV).ok();
        if !self.color_enabled || self.pager.is_some() || theme::style_overridden(style.as_deref()) {
            self.terminal_theme = Some(TerminalTheme::None);
            return TerminalTheme::None;
        }

        if let Some(theme @ (TerminalTheme::Light | TerminalTheme::Dark)) = self.terminal_theme {
            return theme;
        }

        // Query only real terminals, never overridden buffers
        let can_query = self.input.is_terminal() && self.original_out.is_terminal();
        let theme = theme::detect_background(can_query);
        self.terminal_theme = Some(theme);
        theme
    }

    /// Cached theme, `None` when detection never ran
    pub fn terminal_theme(&self) -> TerminalTheme {
        self.terminal_theme.unwrap_or(TerminalTheme::None)
    }

    // === Pager ===

    pub fn set_pager(&mut self, command: impl Into<String>) {
        self.pager_command = command.into();
    }

    pub fn pager_command(&self) -> &str {
        &self.pager_command
    }

    /// Whether a pager currently owns the output stream
    pub fn is_paging(&self) -> bool {
        self.pager.is_some()
    }

    /// Route output through the configured pager.
    ///
    /// Does nothing when no pager is configured, the pager is `cat`, output
    /// is not a terminal, or a pager is already running. On failure the
    /// output stream is left untouched.
    ///
    /// Output closed by an earlier [`IoStreams::stop_pager`] is not reopened;
    /// it keeps rejecting writes instead of feeding a pager with nowhere to
    /// print.
    pub fn start_pager(&mut self) -> Result<()> {
        if pager::is_passthrough(&self.pager_command) || !self.is_stdout_tty() || self.pager.is_some()
        {
            return Ok(());
        }
        if matches!(self.out, OutputStream::Closed) {
            debug!("output already closed by a previous pager, not paging");
            return Ok(());
        }

        let (pipe, process) = PagerProcess::spawn(&self.pager_command, &self.out, &self.err_out)?;
        self.out = OutputStream::Pager(pipe);
        self.pager = Some(process);
        Ok(())
    }

    /// Close the pager's input and wait for it to exit.
    ///
    /// Output is not restored: it stays pointed at the closed pipe, so
    /// nothing may be written to `out` after this call.
    pub fn stop_pager(&mut self) {
        let Some(process) = self.pager.take() else {
            return;
        };
        // Dropping the pipe signals end of input
        drop(std::mem::replace(&mut self.out, OutputStream::Closed));
        process.wait();
    }

    // === Progress indicator ===

    pub fn start_progress_indicator(&mut self) {
        self.start_progress_indicator_msg("");
    }

    /// Start a spinner on the error stream with `msg` as its prefix.
    /// A spinner that is already running is replaced.
    pub fn start_progress_indicator_msg(&mut self, msg: &str) {
        if !self.progress_indicator_enabled {
            return;
        }
        if let Some(previous) = self.progress_indicator.take() {
            previous.stop();
        }
        self.progress_indicator = ProgressIndicator::start(&self.err_out, msg);
    }

    pub fn stop_progress_indicator(&mut self) {
        self.stop_progress_indicator_msg("");
    }

    /// Stop the spinner and print `msg` (newline-terminated) in its place
    pub fn stop_progress_indicator_msg(&mut self, msg: &str) {
        let Some(indicator) = self.progress_indicator.take() else {
            return;
        };
        indicator.stop();

        let final_msg = append_missing(msg, '\n');
        if let Err(err) = self
            .err_out
            .write_all(final_msg.as_bytes())
            .and_then(|()| self.err_out.flush())
        {
            warn!(error = %err, "failed to write progress indicator message");
        }
    }

    pub fn change_progress_indicator_msg(&mut self, msg: &str) {
        if let Some(indicator) = &self.progress_indicator {
            indicator.set_message(msg);
        }
    }

    pub fn is_progress_indicator_running(&self) -> bool {
        self.progress_indicator.is_some()
    }

    // === Width and files ===

    /// Display width of the real terminal, even while paging
    pub fn terminal_width(&self) -> usize {
        tty::terminal_width(&self.original_out)
    }

    /// Read a whole file, or the input stream when `name` is `-`
    pub fn read_user_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        if name == "-" {
            let result = self.input.read_to_end(&mut data);
            self.input.close();
            result.map_err(|source| Error::Read {
                path: PathBuf::from(name),
                source,
            })?;
            return Ok(data);
        }

        let path = Path::new(name);
        let mut file = File::open(path).map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        file.read_to_end(&mut data).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(data)
    }

    /// Preset the file returned by [`IoStreams::temp_file`]
    pub fn set_temp_file_override(&mut self, file: TempFile) {
        self.temp_file_override = Some(file);
    }

    /// Create a uniquely named file in `dir` (the system temp dir when empty).
    /// The last `*` in `pattern` is replaced by the random part; without one
    /// the random part is appended.
    pub fn temp_file(&self, dir: impl AsRef<Path>, pattern: &str) -> Result<TempFile> {
        let dir = dir.as_ref();
        let dir = if dir.as_os_str().is_empty() {
            env::temp_dir()
        } else {
            dir.to_path_buf()
        };

        if let Some(preset) = &self.temp_file_override {
            return preset.try_clone().map_err(|source| Error::TempFile { dir, source });
        }

        let (prefix, suffix) = pattern.rsplit_once('*').unwrap_or((pattern, ""));
        let named = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&dir)
            .map_err(|source| Error::TempFile {
                dir: dir.clone(),
                source,
            })?;
        let (file, path) = named.keep().map_err(|err| Error::TempFile {
            dir,
            source: err.error,
        })?;
        Ok(TempFile { file, path })
    }
}

impl Drop for IoStreams {
    fn drop(&mut self) {
        self.stop_progress_indicator_msg("");
        self.stop_pager();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_probe() {
        let (mut io, _) = IoStreams::test();
        assert!(!io.is_stdout_tty());
        io.set_stdout_tty(true);
        assert!(io.is_stdout_tty());
        io.set_stdout_tty(false);
        assert!(!io.is_stdout_tty());
    }

    #[test]
    fn test_indicator_gate_disabled_in_tests() {
        let (mut io, bufs) = IoStreams::test();
        io.start_progress_indicator_msg("Loading");
        assert!(!io.is_progress_indicator_running());
        io.stop_progress_indicator_msg("done");
        assert!(bufs.err_out.is_empty());
    }

    #[test]
    fn test_indicator_final_message() {
        let (io, bufs) = IoStreams::test();
        let mut io = io.with_progress_indicator(true);

        io.start_progress_indicator_msg("Loading");
        assert!(io.is_progress_indicator_running());
        io.change_progress_indicator_msg("Still loading");
        io.stop_progress_indicator_msg("Loaded");

        assert!(!io.is_progress_indicator_running());
        assert!(bufs.err_out.to_string_lossy().ends_with("Loaded\n"));
    }

    #[test]
    fn test_indicator_restart_replaces() {
        let (io, bufs) = IoStreams::test();
        let mut io = io.with_progress_indicator(true);

        io.start_progress_indicator_msg("first");
        io.start_progress_indicator_msg("second");
        io.stop_progress_indicator();
        assert!(!io.is_progress_indicator_running());
        assert!(bufs.err_out.to_string_lossy().ends_with('\n'));
    }

    #[test]
    fn test_theme_cached() {
        let (io, _) = IoStreams::test();
        let mut io = io.with_color(false, false);
        assert_eq!(io.terminal_theme(), TerminalTheme::None);
        assert_eq!(io.detect_terminal_theme(), TerminalTheme::None);
        assert_eq!(io.terminal_theme(), TerminalTheme::None);
    }

    #[test]
    fn test_stop_pager_without_pager_keeps_output() {
        let (mut io, bufs) = IoStreams::test();
        io.stop_pager();
        writeln!(io.out(), "still here").unwrap();
        assert_eq!(bufs.out.to_string_lossy(), "still here\n");
    }

    #[test]
    fn test_fds_absent_for_buffers() {
        let (io, _) = IoStreams::test();
        assert!(io.stdout_fd().is_none());
        assert!(io.stderr_fd().is_none());
    }
}
