//! blocktop - "top"-style demo dashboard for synthetic database servers.
//!
//! Usage:
//!   blocktop                      # refresh every 2 seconds
//!   blocktop 5                    # refresh every 5 seconds
//!   blocktop -s 6                 # six fake servers
//!   blocktop --log-file top.log   # write logs to a file (-v for debug)
//!
//! Keys: `q` quit, `p` pause until the next key, `n` add a note.
//! Ctrl-C while a note prompt is open takes effect once the line is entered.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use blocktop::demo::{
    Dashboard, DemoSource, KeyAction, handle_key, pause_until_key, refresh_interval,
};

/// Live-updating demo dashboard.
#[derive(Parser)]
#[command(name = "blocktop", about = "Top-style terminal dashboard demo", version)]
struct Args {
    /// Refresh interval in seconds.
    #[arg(value_name = "INTERVAL", default_value = "2")]
    interval: f64,

    /// Number of fake servers to show.
    #[arg(short, long, default_value = "3")]
    servers: usize,

    /// Seed for the synthetic data.
    #[arg(long, default_value = "20120601")]
    seed: u64,

    /// Write logs to this file. Without it nothing is logged, since stdout
    /// belongs to the dashboard.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only log errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber writing to `path`.
fn init_logging(path: &Path, verbose: u8, quiet: bool) -> std::io::Result<()> {
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
    match format!("blocktop={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Warning: invalid log directive: {}", e),
    }

    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

/// How often a pause checks for Ctrl-C.
#[cfg(unix)]
const PAUSE_STEP: Duration = Duration::from_millis(100);

#[cfg(unix)]
fn run(args: &Args, interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
    use blocktop::Console;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mut source = DemoSource::new(args.servers, args.seed);
    let mut dashboard = Dashboard::new();
    let mut console = Console::new();
    let mut raw = console.raw_mode();
    info!(servers = args.servers, ?interval, "dashboard started");

    while running.load(Ordering::SeqCst) {
        source.advance();
        dashboard.update(&source);
        raw.refresh(dashboard.blocks())?;

        let Some(key) = raw.check_button(interval)? else {
            if raw.input_closed() {
                info!("input closed");
                break;
            }
            continue;
        };
        match handle_key(key) {
            KeyAction::Quit => break,
            KeyAction::Pause => {
                debug!("paused");
                pause_until_key(&mut *raw, &running, PAUSE_STEP)?;
            }
            KeyAction::AddNote => {
                let answers = raw.ask_for_input(&["Server", "Note"])?;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if dashboard.add_note(&answers) {
                    info!(server = %answers[0], "note added");
                }
            }
            KeyAction::None => {}
        }
    }

    info!("dashboard stopped");
    Ok(())
}

#[cfg(not(unix))]
fn run(_args: &Args, _interval: Duration) -> Result<(), Box<dyn std::error::Error>> {
    Err("blocktop needs a Unix terminal".into())
}

fn main() {
    let args = Args::parse();

    let Some(interval) = refresh_interval(args.interval) else {
        eprintln!("Error: interval must be a positive number of seconds");
        std::process::exit(1);
    };

    if let Some(ref path) = args.log_file
        && let Err(e) = init_logging(path, args.verbose, args.quiet)
    {
        eprintln!("Error opening log file '{}': {}", path.display(), e);
        std::process::exit(1);
    }

    if let Err(e) = run(&args, interval) {
        error!("{}", e);
        eprintln!("Error running dashboard: {}", e);
        std::process::exit(1);
    }
}
