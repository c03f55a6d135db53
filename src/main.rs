// Single-shot runner: capture one frame, analyze it against the persisted
// state, print the command document to stdout, and save state for the next
// invocation. The external loop decides when and how often to call this.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use lumizone::capture::{self, FrameSource, ImageFileSource};
use lumizone::config::Settings;
use lumizone::core_modules::color_state::ColorState;
use lumizone::core_modules::zones::ZoneTable;
use lumizone::pipeline::ZonePipeline;

const SETTINGS_FILE: &str = "settings.json";
const ZONE_FILE: &str = "segments.json";
const COLOR_FILE: &str = "prev_colors.txt";
const SNAPSHOT_FILE: &str = "prev_frame.png";

#[derive(Parser)]
#[command(
    name = "lumizone",
    about = "Analyzes one captured frame and emits light-zone commands"
)]
struct Args {
    /// Image file standing in for the captured frame.
    frame: PathBuf,
    /// Directory holding settings, zone geometry, and persisted run state.
    #[arg(long, default_value = ".")]
    state_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lumizone: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let settings = Settings::load_or_default(&args.state_dir.join(SETTINGS_FILE));
    let zones = ZoneTable::load(&args.state_dir.join(ZONE_FILE));
    let state = ColorState::load(&args.state_dir.join(COLOR_FILE));
    let snapshot = capture::load_snapshot(&args.state_dir.join(SNAPSHOT_FILE));

    let mut source = ImageFileSource::new(&args.frame);
    let frame = source.capture().context("screen capture failed")?;

    let mut pipeline = ZonePipeline::new(settings, zones, state, snapshot);
    let report = pipeline.process(frame).await;
    println!("{}", serde_json::to_string(&report).context("report serialization failed")?);

    pipeline
        .persist_state(
            &args.state_dir.join(COLOR_FILE),
            &args.state_dir.join(SNAPSHOT_FILE),
        )
        .context("failed to persist run state")?;
    Ok(())
}
