// src/main.rs
// Replays a tracked droplet trajectory (`frame,y` CSV) through an analysis
// session and prints every charge estimate as one JSON line.
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use millikan::analysis::{
    render_histogram_png, render_trace_png, CsvSource, PlotStyle, Replay,
};
use millikan::{AnalysisSession, SessionConfig};
#[derive(Parser, Debug)]
#[command(name = "millikan-replay")]
#[command(about = "Replay a tracked droplet trajectory and estimate its charge")]
#[command(version)]
struct Args {
    /// `frame,y` CSV of tracked positions.
    observations: PathBuf,
    /// JSON session configuration; omitted fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory to write trace.png and multiples.png into.
    #[arg(long)]
    plot_dir: Option<PathBuf>,
}
fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    SessionConfig::from_json_str(&text).with_context(|| format!("parsing config {}", path.display()))
}
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let file = File::open(&args.observations)
        .with_context(|| format!("opening {}", args.observations.display()))?;
    let session = AnalysisSession::new(config)?;
    let mut replay = Replay::new(CsvSource::new(BufReader::new(file)), session);
    for estimate in replay.run_to_end()? {
        println!("{}", serde_json::to_string(&estimate)?);
    }
    let session = replay.into_session();
    info!(
        "{} observations, {} estimates, electron count {:?}",
        session.observation_count(),
        session.history().len(),
        session.history().electron_count()
    );
    if let Some(dir) = args.plot_dir {
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let style = PlotStyle::default();
        let trace = render_trace_png(&session.extrema(), &style)?;
        fs::write(dir.join("trace.png"), trace)?;
        if let Some(histogram) = session.history().histogram() {
            fs::write(dir.join("multiples.png"), render_histogram_png(&histogram, &style)?)?;
        }
        info!("charts written to {}", dir.display());
    }
    Ok(())
}
