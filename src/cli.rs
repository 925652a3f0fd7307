//! CLI argument parsing
//!
//! Hand-rolled parsing for the three demo subcommands.

use std::env;
use std::time::Duration;

/// Subcommand to run
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Command {
    /// Print what the bundle detected about the terminal
    #[default]
    Probe,
    /// Show a file (or stdin with `-`) through the pager
    Page { file: String },
    /// Show a spinner for a while
    Wait { duration: Duration, message: String },
    Help,
}

/// Parsed command-line arguments
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Args {
    pub command: Command,
    /// Machine-readable output for `probe`
    pub json: bool,
    /// Override the pager for this run
    pub pager: Option<String>,
    /// Disable interactive prompts
    pub no_prompt: bool,
}

pub const USAGE: &str = "\
Usage: iostreams [OPTIONS] [COMMAND]

Commands:
  probe              Report terminal capabilities (default)
  page <FILE|->      Show a file through the pager
  wait <SECS> [MSG]  Show a progress indicator for SECS seconds

Options:
  --json             Print probe results as JSON
  --pager <CMD>      Pager command for this run
  --no-prompt        Never prompt
  -h, --help         Show this help
";

/// Parse command-line arguments
pub fn parse_args() -> Result<Args, String> {
    parse_args_from(env::args().skip(1)) // Skip the binary name
}

pub fn parse_args_from(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut positional = Vec::new();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => parsed.json = true,
            "--no-prompt" => parsed.no_prompt = true,
            "--pager" => {
                let value = iter.next().ok_or("--pager needs a command")?;
                parsed.pager = Some(value);
            }
            "-h" | "--help" => {
                parsed.command = Command::Help;
                return Ok(parsed);
            }
            // `-` is the stdin file name, not a flag
            _ if arg.starts_with('-') && arg != "-" => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    parsed.command = match positional.next().as_deref() {
        None | Some("probe") => Command::Probe,
        Some("page") => Command::Page {
            file: positional.next().unwrap_or_else(|| "-".to_string()),
        },
        Some("wait") => {
            let secs = positional.next().ok_or("wait needs a duration in seconds")?;
            let secs: f64 = secs
                .parse()
                .map_err(|_| format!("Invalid duration: {}", secs))?;
            let duration = Duration::try_from_secs_f64(secs)
                .map_err(|_| format!("Invalid duration: {}", secs))?;
            let message = positional.collect::<Vec<_>>().join(" ");
            Command::Wait {
                duration,
                message: if message.is_empty() {
                    "Working".to_string()
                } else {
                    message
                },
            }
        }
        Some(other) => return Err(format!("Unknown command: {}", other)),
    };

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        parse_args_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_default_is_probe() {
        assert_eq!(parse(&[]).unwrap().command, Command::Probe);
        let args = parse(&["probe", "--json"]).unwrap();
        assert_eq!(args.command, Command::Probe);
        assert!(args.json);
    }

    #[test]
    fn test_page_defaults_to_stdin() {
        assert_eq!(
            parse(&["page"]).unwrap().command,
            Command::Page { file: "-".to_string() }
        );
        assert_eq!(
            parse(&["page", "-"]).unwrap().command,
            Command::Page { file: "-".to_string() }
        );
        assert_eq!(
            parse(&["page", "notes.txt"]).unwrap().command,
            Command::Page { file: "notes.txt".to_string() }
        );
    }

    #[test]
    fn test_wait_with_message() {
        let args = parse(&["wait", "1.5", "Deploying", "app"]).unwrap();
        assert_eq!(
            args.command,
            Command::Wait {
                duration: Duration::from_millis(1500),
                message: "Deploying app".to_string(),
            }
        );
    }

    #[test]
    fn test_wait_rejects_bad_duration() {
        assert!(parse(&["wait"]).is_err());
        assert!(parse(&["wait", "soon"]).is_err());
        assert!(parse(&["wait", "-1"]).is_err());
        assert!(parse(&["wait", "NaN"]).is_err());
        assert!(parse(&["wait", "1e300"]).is_err());
    }

    #[test]
    fn test_pager_option() {
        let args = parse(&["--pager", "less -R", "page", "x"]).unwrap();
        assert_eq!(args.pager.as_deref(), Some("less -R"));
        assert!(parse(&["--pager"]).is_err());
    }

    #[test]
    fn test_unknown_input() {
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
        assert_eq!(parse(&["-h"]).unwrap().command, Command::Help);
    }
}
