//! audiobatch - simulated batch audio conversion
//!
//! Queues audio files, assigns per-file output settings, and runs a batch
//! "conversion" on a bounded worker pool. The conversion itself is a
//! stand-in (delay plus byte copy); the interesting part is the
//! orchestration: fan-out, progress aggregation, and per-job failure
//! reporting.

mod conversion;
mod core;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use conversion::{
    default_worker_count, run_batch, BatchOutcome, ChannelSink, ConversionEvent,
    SimulatedTransform,
};
use core::{quality_presets, AudioFormat, Channels, JobStore, SampleRate};

const USAGE: &str = "Usage: audiobatch [options] <output-dir> <input>...

Queues the given audio files (directories are scanned recursively) and runs
a simulated batch conversion into <output-dir>.

Options:
  -f, --format <mp3|wav|m4a|flac>   target format for every job (default mp3)
  -j, --jobs <n>                    worker pool size (default: CPU-based)
      --list-formats                show formats, quality tiers and rates
  -h, --help                        show this help";

fn print_format_table() {
    println!("Supported output formats:");
    for format in AudioFormat::ALL {
        let tiers: Vec<String> = quality_presets(format)
            .iter()
            .map(|p| format!("{}. {} ({})", p.ordinal, p.label, p.value))
            .collect();
        println!("  {:<6}{}", format.to_string(), tiers.join(", "));
    }
    let rates: Vec<String> = SampleRate::ALL.iter().map(|r| r.to_string()).collect();
    println!("Sample rates: {}", rates.join(", "));
    let channels: Vec<String> = Channels::ALL.iter().map(|c| c.to_string()).collect();
    println!("Channels: {}", channels.join(", "));
}

#[derive(Debug, PartialEq)]
struct CliArgs {
    output_dir: PathBuf,
    inputs: Vec<PathBuf>,
    format: Option<String>,
    workers: Option<usize>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut format = None;
    let mut workers = None;
    let mut positional: Vec<PathBuf> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-f" | "--format" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "missing value for --format".to_string())?;
                format = Some(value.clone());
            }
            "-j" | "--jobs" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "missing value for --jobs".to_string())?;
                let count: usize = value
                    .parse()
                    .map_err(|_| format!("invalid worker count: {}", value))?;
                if count == 0 {
                    return Err("worker count must be at least 1".to_string());
                }
                workers = Some(count);
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown option: {}", other));
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    if positional.len() < 2 {
        return Err("expected an output directory and at least one input".to_string());
    }
    let output_dir = positional.remove(0);
    Ok(CliArgs {
        output_dir,
        inputs: positional,
        format,
        workers,
    })
}

async fn run(args: CliArgs) -> i32 {
    let mut store = JobStore::new();
    for input in &args.inputs {
        let result = if input.is_dir() {
            store.add_dir(input).map(|added| {
                if added == 0 {
                    eprintln!("Warning: no audio files found under {}", input.display());
                }
            })
        } else {
            store.add(input).map(|_| ())
        };
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    if store.is_empty() {
        eprintln!("Error: no input files to convert");
        return 1;
    }
    println!("Queued {} file(s) for conversion", store.len());

    if let Some(format) = &args.format {
        let paths: Vec<PathBuf> = store
            .snapshot()
            .iter()
            .map(|job| job.input_path().to_path_buf())
            .collect();
        for path in paths {
            if let Err(e) = store.update(&path, Some(format), None, None, None) {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }

    // Events stream over a channel; a plain thread renders them so the
    // workers never wait on the terminal.
    let (sink, events) = ChannelSink::new();
    let printer = thread::spawn(move || {
        for event in events {
            match event {
                ConversionEvent::Status(message) => println!("==> {}", message),
                ConversionEvent::Log(message) => println!("{}", message),
                ConversionEvent::Progress(fraction) => {
                    println!("[{:>3.0}%]", fraction * 100.0)
                }
            }
        }
    });

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received - finishing in-flight conversions");
            cancel_on_signal.store(true, Ordering::SeqCst);
        }
    });

    let worker_count = args.workers.unwrap_or_else(default_worker_count);
    let outcome = run_batch(
        store.snapshot(),
        &args.output_dir,
        Arc::new(SimulatedTransform),
        Arc::new(sink),
        cancel,
        worker_count,
    )
    .await;

    // All senders are gone once run_batch returns; the printer drains and exits
    let _ = printer.join();

    match outcome {
        Err(e) => {
            eprintln!("Error: {}", e);
            log::error!("batch aborted: {}", e);
            1
        }
        Ok(BatchOutcome::AllSucceeded { completed }) => {
            println!(
                "Converted {} file(s) into {}",
                completed,
                args.output_dir.display()
            );
            0
        }
        Ok(BatchOutcome::PartialFailure {
            completed,
            failures,
        }) => {
            eprintln!("{} file(s) converted, {} failed:", completed, failures.len());
            for failure in &failures {
                eprintln!("  {}: {}", failure.job.input_name(), failure.error);
            }
            1
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }
    if args.iter().any(|a| a == "--list-formats") {
        print_format_table();
        return ExitCode::SUCCESS;
    }

    let parsed = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    logging::init_logging();
    ExitCode::from(run(parsed).await as u8)
}
