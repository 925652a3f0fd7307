//! ANSI escape sequence constants and helpers
//!
//! Centralizes the raw SGR codes used by the color scheme and the
//! terminal queries, providing readable names for raw control codes.

// === Text Styles ===

/// Bold text
pub const BOLD: &str = "\x1b[1m";

/// Reset all text attributes
pub const RESET: &str = "\x1b[0m";

// === Basic Foreground Colors (16-color palette) ===

pub const FG_RED: &str = "\x1b[31m";
pub const FG_GREEN: &str = "\x1b[32m";
pub const FG_YELLOW: &str = "\x1b[33m";
pub const FG_BLUE: &str = "\x1b[34m";
pub const FG_MAGENTA: &str = "\x1b[35m";
pub const FG_CYAN: &str = "\x1b[36m";

/// Bright black, the 16-color stand-in for gray
pub const FG_BRIGHT_BLACK: &str = "\x1b[90m";

// === Color Helpers ===

/// Set foreground color using 256-color palette
#[inline]
pub fn fg(color: u8) -> String {
    format!("\x1b[38;5;{}m", color)
}

/// Gray (242) in the 256-color palette
pub const GRAY_256: u8 = 242;

// === Terminal Queries ===

/// OSC 11: ask the terminal for its background color
pub const QUERY_BACKGROUND: &str = "\x1b]11;?\x07";

/// DSR: ask for the cursor position. Every terminal answers this one,
/// so it marks the end of the reply stream.
pub const QUERY_CURSOR_POSITION: &str = "\x1b[6n";
