//! recfile - command line access to fixed-size record files
//!
//! Each invocation opens one record file, runs a single operation on it,
//! and closes it again.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use recfile_engine::{RecordError, RecordStore};

mod codec;
mod config;

use codec::{Encoding, RecordCodec};
use config::Config;

/// recfile - read and modify fixed-size binary record files
#[derive(Parser, Debug)]
#[command(name = "recfile")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Record file to operate on (created if missing)
    file: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Size of every record in bytes
    #[arg(short, long)]
    record_size: Option<usize>,

    /// Only flush when the file is closed
    #[arg(long)]
    no_auto_flush: bool,

    /// How values are converted to and from record bytes
    #[arg(short, long, value_enum)]
    encoding: Option<Encoding>,

    /// Zero-pad values shorter than the record size
    #[arg(long)]
    pad: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the number of records
    Len,
    /// Print the record at INDEX
    Get { index: u64 },
    /// Write the record at INDEX, extending the file if needed
    Set { index: u64, value: String },
    /// Append one record per VALUE
    Append {
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Remove the record at INDEX, shifting later records down
    Delete { index: u64 },
    /// Print every record with its index
    Dump,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    init_logging(args.log_level.as_deref().or(config.log_level.as_deref()))?;

    let options = config.store_options(args.record_size, args.no_auto_flush)?;
    let codec = RecordCodec {
        encoding: args.encoding.or(config.encoding).unwrap_or_default(),
        record_size: options.record_size,
        pad: args.pad,
    };

    let mut store = RecordStore::open_with(&args.file, options)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    info!(
        file = %args.file.display(),
        record_size = options.record_size,
        auto_flush = options.auto_flush,
        "opened record file"
    );

    let mut stdout = io::stdout().lock();
    let outcome = run(&mut store, &args.command, &codec, &mut stdout);
    let closed = store.close();

    finish(outcome, closed)
}

/// Combine the command result with the final close
///
/// The command's own error is reported ahead of a close failure. Running
/// past the end is a normal "no record" answer with a failure exit code.
fn finish(outcome: Result<()>, closed: Result<(), RecordError>) -> Result<ExitCode> {
    match outcome {
        Ok(()) => {
            closed?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "failed to close record file");
            }
            match e.downcast_ref::<RecordError>() {
                Some(err) if err.is_out_of_range() => {
                    eprintln!("{}", err);
                    Ok(ExitCode::FAILURE)
                }
                _ => Err(e),
            }
        }
    }
}

/// Install the global subscriber
///
/// An explicit level wins; otherwise `RUST_LOG` is honored, falling back
/// to `info`.
fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level: {}", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Run one command against an open store, writing results to `out`
fn run(
    store: &mut RecordStore,
    command: &Command,
    codec: &RecordCodec,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Len => {
            writeln!(out, "{}", store.len()?)?;
        }
        Command::Get { index } => {
            let record = store.get(*index)?;
            writeln!(out, "{}", codec.decode(&record)?)?;
        }
        Command::Set { index, value } => {
            let record = codec.encode(value)?;
            store.set(*index, &record)?;
            debug!(index, "set record");
        }
        Command::Append { values } => {
            // Encode everything first so a bad value appends nothing
            let records = values
                .iter()
                .map(|value| codec.encode(value))
                .collect::<Result<Vec<_>>>()?;
            for record in &records {
                let index = store.append(record)?;
                writeln!(out, "{}", index)?;
            }
        }
        Command::Delete { index } => {
            store.delete(*index)?;
            debug!(index, "deleted record");
        }
        Command::Dump => {
            for (index, record) in store.records().enumerate() {
                writeln!(out, "{}\t{}", index, codec.decode(&record?)?)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn text_codec(record_size: usize) -> RecordCodec {
        RecordCodec {
            encoding: Encoding::Text,
            record_size,
            pad: true,
        }
    }

    fn run_to_string(store: &mut RecordStore, command: Command, codec: &RecordCodec) -> Result<String> {
        let mut out = Vec::new();
        run(store, &command, codec, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_append_dump_delete() {
        let dir = tempdir().unwrap();
        let mut store = RecordStore::open(dir.path().join("cli.rec"), 4).unwrap();
        let codec = text_codec(4);

        let appended = run_to_string(
            &mut store,
            Command::Append {
                values: vec!["aaaa".into(), "bb".into(), "cccc".into()],
            },
            &codec,
        )
        .unwrap();
        assert_eq!(appended, "0\n1\n2\n");

        run_to_string(&mut store, Command::Delete { index: 0 }, &codec).unwrap();
        let dump = run_to_string(&mut store, Command::Dump, &codec).unwrap();
        assert_eq!(dump, "0\tbb\n1\tcccc\n");

        let len = run_to_string(&mut store, Command::Len, &codec).unwrap();
        assert_eq!(len, "2\n");
    }

    #[test]
    fn test_bad_value_appends_nothing() {
        let dir = tempdir().unwrap();
        let mut store = RecordStore::open(dir.path().join("cli.rec"), 4).unwrap();
        let codec = text_codec(4);

        let result = run_to_string(
            &mut store,
            Command::Append {
                values: vec!["aaaa".into(), "too long".into()],
            },
            &codec,
        );
        assert!(result.is_err());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_get_past_end_is_out_of_range() {
        let dir = tempdir().unwrap();
        let mut store = RecordStore::open(dir.path().join("cli.rec"), 8).unwrap();
        let codec = RecordCodec {
            encoding: Encoding::U64,
            record_size: 8,
            pad: false,
        };

        run_to_string(
            &mut store,
            Command::Set {
                index: 1,
                value: "42".into(),
            },
            &codec,
        )
        .unwrap();
        assert_eq!(
            run_to_string(&mut store, Command::Get { index: 0 }, &codec).unwrap(),
            "0\n"
        );
        assert_eq!(
            run_to_string(&mut store, Command::Get { index: 1 }, &codec).unwrap(),
            "42\n"
        );

        let err = run_to_string(&mut store, Command::Get { index: 2 }, &codec).unwrap_err();
        let err = err.downcast_ref::<RecordError>().unwrap();
        assert!(err.is_out_of_range());
    }

    fn exit_code(result: Result<ExitCode>) -> String {
        format!("{:?}", result.unwrap())
    }

    fn closed_error() -> RecordError {
        RecordError::Closed {
            path: PathBuf::from("cli.rec"),
        }
    }

    #[test]
    fn test_command_error_reported_before_close_error() {
        let outcome = Err(anyhow::anyhow!("bad value"));
        let err = finish(outcome, Err(closed_error())).unwrap_err();
        assert_eq!(err.to_string(), "bad value");
    }

    #[test]
    fn test_close_error_reported_after_success() {
        let err = finish(Ok(()), Err(closed_error())).unwrap_err();
        assert!(err.downcast_ref::<RecordError>().is_some());
        assert_eq!(exit_code(finish(Ok(()), Ok(()))), exit_code(Ok(ExitCode::SUCCESS)));
    }

    #[test]
    fn test_out_of_range_exits_with_failure() {
        let outcome = Err(RecordError::IndexOutOfRange { index: 3, length: 1 }.into());
        assert_eq!(
            exit_code(finish(outcome, Err(closed_error()))),
            exit_code(Ok(ExitCode::FAILURE))
        );
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "recfile",
            "--record-size",
            "8",
            "--encoding",
            "u64",
            "data.rec",
            "append",
            "1",
            "2",
        ])
        .unwrap();
        assert_eq!(args.record_size, Some(8));
        assert_eq!(args.encoding, Some(Encoding::U64));
        assert!(matches!(args.command, Command::Append { ref values } if values.len() == 2));

        assert!(Args::try_parse_from(["recfile", "data.rec", "append"]).is_err());
    }
}
