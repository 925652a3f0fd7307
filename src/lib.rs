//! Terminal-aware standard streams
//!
//! [`IoStreams`] bundles stdin, stdout and stderr with the policy for how
//! output should behave on them: whether each stream is a terminal, whether
//! color is usable, whether to page output, how wide the display is and
//! whether a progress spinner may be shown.

pub mod color;
pub mod config;
pub mod error;
pub mod pager;
pub mod progress;
pub mod streams;
pub mod theme;
pub mod tty;

pub use color::{ColorPreference, ColorScheme};
pub use config::Config;
pub use error::{Error, Result};
pub use streams::{InputStream, IoStreams, OutputStream, SharedBuffer, TempFile, TestBuffers};
pub use theme::TerminalTheme;
