//! rfolderd - Folder telemetry collector daemon.
//!
//! Re-resolves the configured folder patterns on every interval, reads every
//! file found in the matched folders and writes the parsed records to stdout
//! as JSON lines. Logs go to stderr.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::io::{self, StdoutLock};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use rfolder::collector::{CycleStats, FolderCollector, RealFs};
use rfolder::config::FolderConfig;
use rfolder::parser::RecordJsonParser;
use rfolder::sink::JsonLinesSink;

/// Folder telemetry collector daemon.
#[derive(Parser)]
#[command(name = "rfolderd", about = "Folder telemetry collector daemon", version)]
struct Args {
    /// Folder glob pattern; repeat for several folders.
    /// `**` matches any number of directory levels.
    #[arg(
        short,
        long = "folder",
        value_name = "PATTERN",
        required_unless_present = "sample_config"
    )]
    folders: Vec<String>,

    /// Data format of the files in the folders.
    #[arg(long, default_value = RecordJsonParser::DATA_FORMAT)]
    data_format: String,

    /// Collection interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Run a single collection cycle and exit with its result.
    #[arg(long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,

    /// Print an annotated sample configuration and exit.
    #[arg(long)]
    sample_config: bool,
}

/// Formats bytes as human-readable size string.
fn format_size(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;

    if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["rfolderd", "rfolder"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn describe_cycle(stats: &CycleStats) -> String {
    format!(
        "{} records from {} files in {} folders ({}, {:?})",
        stats.records,
        stats.files,
        stats.folders,
        format_size(stats.bytes),
        stats.duration
    )
}

/// Runs one cycle, logs its outcome and flushes the sink.
fn run_cycle(
    collector: &mut FolderCollector<RealFs>,
    sink: &mut JsonLinesSink<StdoutLock<'static>>,
    cycle: u64,
) -> bool {
    let ok = match collector.gather(sink) {
        Ok(stats) => {
            info!("Cycle #{}: {}", cycle, describe_cycle(&stats));
            true
        }
        Err(e) => {
            error!("Cycle #{} failed: {}", cycle, e);
            false
        }
    };
    sink.flush();
    if sink.failed() > 0 {
        warn!("{} records could not be written so far", sink.failed());
    }
    ok
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.sample_config {
        println!("# {}", FolderConfig::description());
        print!("{}", FolderConfig::sample_config());
        return ExitCode::SUCCESS;
    }

    init_logging(args.verbose, args.quiet);

    let config = FolderConfig::new(args.folders).with_data_format(args.data_format);
    let mut collector = match FolderCollector::from_config(RealFs::new(), &config) {
        Ok(collector) => collector,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("rfolderd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}s, data_format={}, folders={:?}",
        args.interval, config.data_format, config.folders
    );

    let mut sink = JsonLinesSink::new(io::stdout().lock());

    if args.once {
        return if run_cycle(&mut collector, &mut sink, 1) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let interval = Duration::from_secs(args.interval);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop");

    let mut cycle: u64 = 0;
    let mut failed_cycles: u64 = 0;

    while running.load(Ordering::SeqCst) {
        cycle += 1;
        if !run_cycle(&mut collector, &mut sink, cycle) {
            failed_cycles += 1;
        }
        debug!(
            "Last resolution: {} folders, {} files",
            collector.last_folders().len(),
            collector.last_files().len()
        );

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!(
        "Shutting down after {} cycles ({} failed, {} records written)",
        cycle,
        failed_cycles,
        sink.written()
    );
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(2048), "2.0K");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0M");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0G");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "rfolderd",
            "-f",
            "/var/log/app",
            "--folder",
            "/data/**",
            "--once",
        ])
        .unwrap();
        assert_eq!(args.folders, vec!["/var/log/app", "/data/**"]);
        assert_eq!(args.data_format, "records_json");
        assert_eq!(args.interval, 10);
        assert!(args.once);
    }

    #[test]
    fn test_args_require_folder() {
        assert!(Args::try_parse_from(["rfolderd"]).is_err());
    }

    #[test]
    fn test_sample_config_needs_no_folder() {
        let args = Args::try_parse_from(["rfolderd", "--sample-config"]).unwrap();
        assert!(args.sample_config);
        assert!(args.folders.is_empty());
    }
}
