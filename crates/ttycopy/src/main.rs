#![forbid(unsafe_code)]

//! `tty-copy`: copy to the system clipboard through the terminal (OSC 52).
//!
//! Exit status: 0 on success, 1 on a general error (including an
//! unsupported terminal in `--probe` mode), 10 on wrong usage, 11 on an I/O
//! error.
//!
//! Set `TTY_COPY_LOG` (e.g. `TTY_COPY_LOG=debug`) to trace the transfer on
//! stderr.

mod cli;
mod detect;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::process::ExitCode;

use ttycopy_core::config::{OSC52_SAFE_LIMIT, TransferConfig};
use ttycopy_core::error::{Error, ErrorClass, Result};
use ttycopy_core::input::join_arguments;
use ttycopy_core::transfer::{TransferEngine, TransferReport};
use ttycopy_tty::{CONTROLLING_TTY, ProbeConfig, ProbeOutcome, TerminalProbe, TtyDevice};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::detect::DetectInputs;

const PROGNAME: &str = "tty-copy";
const LOG_ENV: &str = "TTY_COPY_LOG";

fn main() -> ExitCode {
    let cli = match Cli::from_args(std::env::args_os()) {
        Ok(Some(cli)) => cli,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => return report_error(&err),
    };

    init_logging();

    match run(&cli) {
        Ok(code) => code,
        Err(err) => report_error(&err),
    }
}

fn report_error(err: &Error) -> ExitCode {
    eprintln!("{PROGNAME}: {err}");
    ExitCode::from(err.class().exit_code())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.transfer_config(&DetectInputs::from_env());
    tracing::debug!(?config, "resolved configuration");

    if cli.probe {
        return probe(cli, &config);
    }

    let output_path = output_path(cli);
    let engine =
        TransferEngine::new(config).output_label(format!("{}: write error", output_path.display()));

    if cli.clear {
        let mut out = open_output(output_path)?;
        engine.clear(&mut out)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut report = TransferReport::default();
    let result = if cli.text.is_empty() {
        let mut out = open_output(output_path)?;
        let mut input = io::stdin().lock();
        engine
            .input_label("/dev/stdin: read error")
            .transfer_tracked(&mut input, &mut out, &mut report)
    } else {
        // Validate before the destination is opened: nothing is written
        // when the arguments are too long.
        let mut input = join_arguments(cli.text.iter().map(|arg| arg.as_encoded_bytes()))?;
        let mut out = open_output(output_path)?;
        engine
            .input_label("command line: read error")
            .transfer_tracked(&mut input, &mut out, &mut report)
    };

    warn_if_oversize(&report);
    result?;
    Ok(ExitCode::SUCCESS)
}

fn output_path(cli: &Cli) -> &Path {
    cli.output
        .as_deref()
        .unwrap_or_else(|| Path::new(CONTROLLING_TTY))
}

fn open_output(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::io(format!("Failed to open {} for writing", path.display()), e))
}

fn warn_if_oversize(report: &TransferReport) {
    if report.exceeds_safe_limit() {
        eprintln!(
            "{PROGNAME}: warning: Input size ({} kiB) exceeded {} kiB, it may be truncated by some terminals",
            report.bytes_read / 1024,
            OSC52_SAFE_LIMIT / 1024
        );
    }
}

fn probe(cli: &Cli, config: &TransferConfig) -> Result<ExitCode> {
    let path = output_path(cli);
    let mut device = TtyDevice::open(path)
        .map_err(|e| Error::io(format!("Failed to open {}", path.display()), e))?;

    let report = TerminalProbe::new(config, ProbeConfig::default())
        .device_label(path.display().to_string())
        .run(&mut device)?;

    match report.outcome {
        ProbeOutcome::Supported | ProbeOutcome::Unsupported => {
            println!("{}", report.outcome);
            if report.supported() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(ErrorClass::General.exit_code()))
            }
        }
        ProbeOutcome::Indeterminate => Err(Error::Protocol(format!(
            "{}: no cursor position report, cannot tell whether OSC 52 is supported",
            path.display()
        ))),
    }
}
