mod cli;
mod telemetry;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use iostreams::{Config, IoStreams, TerminalTheme};

use crate::cli::{Args, Command, USAGE};

/// Capabilities reported by `probe`
#[derive(Serialize)]
struct ProbeReport {
    stdin_tty: bool,
    stdout_tty: bool,
    stderr_tty: bool,
    interactive: bool,
    can_prompt: bool,
    color: bool,
    color_256: bool,
    theme: TerminalTheme,
    width: usize,
    pager: String,
}

impl ProbeReport {
    fn collect(io: &mut IoStreams) -> Self {
        Self {
            stdin_tty: io.is_stdin_tty(),
            stdout_tty: io.is_stdout_tty(),
            stderr_tty: io.is_stderr_tty(),
            interactive: io.is_interactive(),
            can_prompt: io.can_prompt(),
            color: io.color_enabled(),
            color_256: io.color_support_256(),
            theme: io.detect_terminal_theme(),
            width: io.terminal_width(),
            pager: io.pager_command().to_string(),
        }
    }
}

fn run_probe(io: &mut IoStreams, json: bool) -> Result<()> {
    let report = ProbeReport::collect(io);
    let cs = io.color_scheme();
    let out = io.out();

    if json {
        serde_json::to_writer_pretty(&mut *out, &report).context("Failed to encode report")?;
        writeln!(out)?;
        return Ok(());
    }

    let yes_no = |v: bool| if v { cs.green("yes") } else { cs.gray("no") };
    writeln!(out, "{}", cs.bold("Streams"))?;
    writeln!(out, "  stdin tty     {}", yes_no(report.stdin_tty))?;
    writeln!(out, "  stdout tty    {}", yes_no(report.stdout_tty))?;
    writeln!(out, "  stderr tty    {}", yes_no(report.stderr_tty))?;
    writeln!(out, "  interactive   {}", yes_no(report.interactive))?;
    writeln!(out, "  can prompt    {}", yes_no(report.can_prompt))?;
    writeln!(out, "{}", cs.bold("Display"))?;
    writeln!(out, "  color         {}", yes_no(report.color))?;
    writeln!(out, "  256 colors    {}", yes_no(report.color_256))?;
    writeln!(out, "  theme         {}", cs.cyan(report.theme.as_str()))?;
    writeln!(out, "  width         {}", report.width)?;
    let pager = if report.pager.is_empty() {
        cs.gray("(none)")
    } else {
        report.pager.clone()
    };
    writeln!(out, "  pager         {}", pager)?;
    Ok(())
}

fn run_page(io: &mut IoStreams, file: &str) -> Result<()> {
    let data = io.read_user_file(file)?;

    if let Err(err) = io.start_pager() {
        let cs = io.color_scheme();
        writeln!(io.err_out(), "{} {:#}", cs.warning_icon(), anyhow::Error::from(err))?;
    }

    match io.out().write_all(&data) {
        // The user quit the pager early
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
        other => other.context("Failed to write output")?,
    }
    io.stop_pager();
    Ok(())
}

async fn run_wait(io: &mut IoStreams, duration: std::time::Duration, message: &str) -> Result<()> {
    io.start_progress_indicator_msg(message);
    tokio::time::sleep(duration / 2).await;
    io.change_progress_indicator_msg(&format!("{message} (almost done)"));
    tokio::time::sleep(duration - duration / 2).await;

    let cs = io.color_scheme();
    if io.is_progress_indicator_running() {
        io.stop_progress_indicator_msg(&format!("{} {message}", cs.success_icon()));
    } else {
        writeln!(io.err_out(), "{} {message}", cs.success_icon())?;
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load().unwrap_or_else(|err| {
        warn!(error = %format!("{err:#}"), "ignoring unreadable config");
        Config::default()
    });

    let mut io = IoStreams::system_with(config.color);
    config.apply(&mut io);
    if let Some(pager) = args.pager {
        io.set_pager(pager);
    }
    if args.no_prompt {
        io.set_never_prompt(true);
    }

    let result = match args.command {
        Command::Probe => run_probe(&mut io, args.json),
        Command::Page { file } => run_page(&mut io, &file),
        Command::Wait { duration, message } => run_wait(&mut io, duration, &message).await,
        Command::Help => {
            write!(io.out(), "{}", USAGE)?;
            Ok(())
        }
    };

    // Tear down on every path before reporting the outcome
    io.stop_progress_indicator();
    io.stop_pager();
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{}\n\n{}", err, USAGE);
            return ExitCode::from(2);
        }
    };

    if let Err(err) = telemetry::init_logging() {
        eprintln!("Warning: {err:#}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
