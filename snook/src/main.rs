//! snook: play colored balls as MIDI.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ball_midi::{live, MidiNoteSink, NullOutput, PerformanceLog};
use snook::app::run;
use snook::config::SessionConfig;
use snook::pointer::PointerSource;
use snook::source::{CentroidSource, ReplaySource};

#[derive(Parser)]
#[command(name = "snook")]
#[command(version)]
#[command(about = "Turn the strokes of tracked balls into MIDI notes", long_about = None)]
struct Cli {
    /// Session config (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay centroids from a text file instead of opening the pointer window
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Where to write the performance log
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Substring of the MIDI output port to use
    #[arg(long)]
    midi_port: Option<String>,

    /// Don't open a live MIDI port
    #[arg(long)]
    no_midi: bool,

    /// Pace replay to this many frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Print the effective config and exit
    #[arg(long)]
    print_config: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut cfg = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(path) = cli.log_file {
        cfg.log.path = path;
    }
    if let Some(port) = cli.midi_port {
        cfg.midi.port = Some(port);
    }
    if cli.no_midi {
        cfg.midi.enabled = false;
    }

    if cli.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    let out: Box<dyn live::LiveOutput> = if cfg.midi.enabled {
        live::open_live_output_or_null(cfg.midi.port.as_deref())
    } else {
        info!("live MIDI disabled");
        Box::new(NullOutput)
    };
    let sink = MidiNoteSink::new(out)
        .with_log(PerformanceLog::new(&cfg.log.path), &cfg.recorded_channels());

    let (mut source, pace) = match &cli.replay {
        Some(path) => {
            let src = ReplaySource::from_path(path)?;
            info!(path = %path.display(), frames = src.remaining(), "replaying");
            let pace = cli.fps.filter(|&f| f > 0).map(|f| Duration::from_secs(1) / f);
            (Box::new(src) as Box<dyn CentroidSource>, pace)
        }
        None => {
            let labels = cfg.objects.iter().map(|o| o.label.clone()).collect();
            let src = PointerSource::new(labels, cfg.window.width, cfg.window.height)?;
            (Box::new(src) as Box<dyn CentroidSource>, None)
        }
    };

    let summary = run(&cfg, source.as_mut(), sink, pace)?;

    println!();
    println!("  Frames:        {}", summary.frames);
    println!("  Note events:   {}", summary.events);
    println!("  Object errors: {}", summary.object_errors);
    println!("  Clamped notes: {}", summary.pitch_warnings);
    println!("  Logged:        {}  → {}", summary.logged, cfg.log.path.display());
    Ok(())
}
