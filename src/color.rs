//! Color negotiation
//!
//! Decides whether ANSI color (and 256-color) output is appropriate from the
//! environment and the output stream, and renders text with a `ColorScheme`.
//!
//! Precedence for enabling color:
//! 1. `CLICOLOR_FORCE` set to anything but `0` forces color, even when piped
//! 2. A non-empty `NO_COLOR` or `CLICOLOR=0` disables it
//! 3. Otherwise color follows whether stdout is a terminal

pub mod escape;

use std::env;

use serde::{Deserialize, Serialize};

use escape::{
    fg, BOLD, FG_BLUE, FG_BRIGHT_BLACK, FG_CYAN, FG_GREEN, FG_MAGENTA, FG_RED, FG_YELLOW,
    GRAY_256, RESET,
};

/// Snapshot of the color-related environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorEnv {
    pub clicolor_force: Option<String>,
    pub no_color: Option<String>,
    pub clicolor: Option<String>,
    pub term: Option<String>,
    pub colorterm: Option<String>,
}

impl ColorEnv {
    pub fn from_env() -> Self {
        Self {
            clicolor_force: env::var("CLICOLOR_FORCE").ok(),
            no_color: env::var("NO_COLOR").ok(),
            clicolor: env::var("CLICOLOR").ok(),
            term: env::var("TERM").ok(),
            colorterm: env::var("COLORTERM").ok(),
        }
    }

    /// `CLICOLOR_FORCE` is set, non-empty and not `0`
    pub fn forced(&self) -> bool {
        matches!(self.clicolor_force.as_deref(), Some(v) if !v.is_empty() && v != "0")
    }

    /// `NO_COLOR` is non-empty, or `CLICOLOR` is `0`
    pub fn disabled(&self) -> bool {
        matches!(self.no_color.as_deref(), Some(v) if !v.is_empty())
            || self.clicolor.as_deref() == Some("0")
    }

    /// Terminal advertises 256 or true color
    pub fn supports_256(&self) -> bool {
        self.term.as_deref().is_some_and(|t| t.contains("256"))
            || self
                .colorterm
                .as_deref()
                .is_some_and(|c| c.contains("24bit") || c.contains("truecolor"))
    }
}

/// User preference from the config file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPreference {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorPreference {
    /// Whether color should be on, given the environment and stdout's TTY status
    pub fn resolve(self, env: &ColorEnv, stdout_is_tty: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => env.forced() || (!env.disabled() && stdout_is_tty),
        }
    }
}

/// Text styling bound to one color decision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorScheme {
    pub enabled: bool,
    pub is_256: bool,
}

impl ColorScheme {
    pub fn new(enabled: bool, is_256: bool) -> Self {
        Self { enabled, is_256 }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        format!("{code}{text}{RESET}")
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(FG_RED, text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(FG_YELLOW, text)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(FG_GREEN, text)
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint(FG_BLUE, text)
    }

    pub fn magenta(&self, text: &str) -> String {
        self.paint(FG_MAGENTA, text)
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint(FG_CYAN, text)
    }

    /// Gray uses the 256-color palette when available
    pub fn gray(&self, text: &str) -> String {
        if self.is_256 {
            self.paint(&fg(GRAY_256), text)
        } else {
            self.paint(FG_BRIGHT_BLACK, text)
        }
    }

    pub fn success_icon(&self) -> String {
        self.green("✓")
    }

    pub fn warning_icon(&self) -> String {
        self.yellow("!")
    }

    pub fn failure_icon(&self) -> String {
        self.red("X")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(f: impl FnOnce(&mut ColorEnv)) -> ColorEnv {
        let mut env = ColorEnv::default();
        f(&mut env);
        env
    }

    #[test]
    fn test_force_overrides_non_tty() {
        let env = env_with(|e| e.clicolor_force = Some("1".into()));
        assert!(env.forced());
        assert!(ColorPreference::Auto.resolve(&env, false));
    }

    #[test]
    fn test_force_zero_is_not_forced() {
        let env = env_with(|e| e.clicolor_force = Some("0".into()));
        assert!(!env.forced());
        let env = env_with(|e| e.clicolor_force = Some(String::new()));
        assert!(!env.forced());
    }

    #[test]
    fn test_force_beats_no_color() {
        let env = env_with(|e| {
            e.clicolor_force = Some("1".into());
            e.no_color = Some("1".into());
        });
        assert!(ColorPreference::Auto.resolve(&env, false));
    }

    #[test]
    fn test_disabled_signals() {
        assert!(env_with(|e| e.no_color = Some("yes".into())).disabled());
        assert!(env_with(|e| e.clicolor = Some("0".into())).disabled());
        assert!(!env_with(|e| e.no_color = Some(String::new())).disabled());
        assert!(!env_with(|e| e.clicolor = Some("1".into())).disabled());
    }

    #[test]
    fn test_auto_follows_tty() {
        let env = ColorEnv::default();
        assert!(ColorPreference::Auto.resolve(&env, true));
        assert!(!ColorPreference::Auto.resolve(&env, false));

        let no_color = env_with(|e| e.no_color = Some("1".into()));
        assert!(!ColorPreference::Auto.resolve(&no_color, true));
    }

    #[test]
    fn test_explicit_preferences() {
        let env = env_with(|e| e.no_color = Some("1".into()));
        assert!(ColorPreference::Always.resolve(&env, false));
        assert!(!ColorPreference::Never.resolve(&ColorEnv::default(), true));
    }

    #[test]
    fn test_256_detection() {
        assert!(env_with(|e| e.term = Some("xterm-256color".into())).supports_256());
        assert!(env_with(|e| e.colorterm = Some("truecolor".into())).supports_256());
        assert!(env_with(|e| e.colorterm = Some("24bit".into())).supports_256());
        assert!(!env_with(|e| e.term = Some("xterm".into())).supports_256());
        assert!(!ColorEnv::default().supports_256());
    }

    #[test]
    fn test_disabled_scheme_is_plain() {
        let cs = ColorScheme::new(false, true);
        assert_eq!(cs.red("error"), "error");
        assert_eq!(cs.gray("dim"), "dim");
        assert_eq!(cs.success_icon(), "✓");
    }

    #[test]
    fn test_enabled_scheme_wraps_text() {
        let cs = ColorScheme::new(true, false);
        assert_eq!(cs.bold("hi"), "\x1b[1mhi\x1b[0m");
        assert_eq!(cs.gray("dim"), "\x1b[90mdim\x1b[0m");

        let cs256 = ColorScheme::new(true, true);
        assert_eq!(cs256.gray("dim"), "\x1b[38;5;242mdim\x1b[0m");
    }
}
