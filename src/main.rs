use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fieldwatch::data::time::relative_time;
use fieldwatch::data::{format_value, Timeframe};
use fieldwatch::export::SensorSpec;
use fieldwatch::{
    DataSource, DirectorySink, ExportRequest, Exporter, FileSource, PayloadDocument, SensorBoard,
    SensorId, SeriesSet, Settings,
};

#[derive(Parser, Debug)]
#[command(name = "fieldwatch")]
#[command(about = "Classify and export environmental sensor telemetry")]
struct Args {
    /// Path to the upstream payload JSON
    #[arg(short, long, default_value = "payload.json")]
    file: PathBuf,

    /// Settings file (TOML, YAML or JSON) layered over the built-in catalog
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep polling the payload file and reprint the board when it changes
    #[arg(short, long, conflicts_with = "export")]
    watch: bool,

    /// Poll interval in seconds (only used with --watch)
    #[arg(short, long, default_value = "5")]
    refresh: u64,

    /// Write an export artifact into this directory and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Export format: csv, json or excel
    #[arg(long, default_value = "csv", requires = "export")]
    format: String,

    /// Sensor to export, repeatable. Defaults to every sensor with data
    #[arg(short, long = "sensor", requires = "export")]
    sensors: Vec<String>,

    /// First day of the export range (YYYY-MM-DD)
    #[arg(long, requires = "export")]
    start: Option<NaiveDate>,

    /// Last day of the export range (YYYY-MM-DD)
    #[arg(long, requires = "export")]
    end: Option<NaiveDate>,

    /// Window used for a missing start or end: 24h, 7d or 30d
    #[arg(short, long, requires = "export")]
    timeframe: Option<Timeframe>,

    /// Leading segment of the export filename
    #[arg(long, requires = "export")]
    data_type: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "fieldwatch=debug"
    } else {
        "fieldwatch=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;

    if let Some(ref dir) = args.export {
        return export_to_dir(&args, &settings, dir);
    }

    if args.watch {
        return watch_file(&args.file, &settings, Duration::from_secs(args.refresh));
    }

    let document = FileSource::load(&args.file)
        .with_context(|| format!("Failed to read payload {}", args.file.display()))?;
    print_board(&SensorBoard::from_document(&document, &settings)?, &settings)
}

/// Poll the payload file and reprint the board on every change.
fn watch_file(path: &Path, settings: &Settings, refresh: Duration) -> Result<()> {
    let mut source = FileSource::new(path);
    tracing::info!(source = source.description(), "Watching payload");

    loop {
        match source.poll() {
            Ok(Some(document)) => print_document(&document, settings)?,
            Ok(None) => {}
            Err(e) if source.latest().is_some() => {
                eprintln!("{}: {} (showing last good payload)", source.description(), e);
            }
            Err(e) => eprintln!("{}: {}", source.description(), e),
        }
        thread::sleep(refresh);
    }
}

fn print_document(document: &PayloadDocument, settings: &Settings) -> Result<()> {
    let board = SensorBoard::from_document(document, settings)?;
    print_board(&board, settings)
}

fn print_board(board: &SensorBoard, settings: &Settings) -> Result<()> {
    let zone = settings.zone()?;
    let now = Utc::now();

    for state in &board.sensors {
        let sensor = &state.sensor;
        let updated = sensor
            .latest()
            .map(|r| relative_time(r.time, now, zone))
            .unwrap_or_else(|| "no data".to_string());
        let score = state
            .score
            .map(|s| format!("{:>3}", s))
            .unwrap_or_else(|| "  -".to_string());

        println!(
            "{} {:<20} {:>10} {:<6} {} {:>3}  {}",
            state.status().symbol(),
            state.name,
            format_value(sensor.value, 1),
            sensor.unit,
            sensor.trend.symbol(),
            score,
            updated
        );
    }

    println!();
    println!(
        "System: {}  Health: {}%  Outlook: {}",
        board.system, board.health, board.prediction
    );
    Ok(())
}

fn export_to_dir(args: &Args, settings: &Settings, dir: &Path) -> Result<()> {
    let document = FileSource::load(&args.file)
        .with_context(|| format!("Failed to read payload {}", args.file.display()))?;
    let board = SensorBoard::from_document(&document, settings)?;

    let mut data = SeriesSet::new();
    for state in board.sensors.iter().filter(|s| s.has_data()) {
        data.insert(SensorId::new(state.id.as_str())?, state.sensor.readings());
    }

    let mut request = ExportRequest::new(args.format.as_str());
    request.sensors = args.sensors.iter().map(|id| SensorSpec::from(id.as_str())).collect();
    request.start = args.start;
    request.end = args.end;
    request.timeframe = args.timeframe;
    request.data_type = args.data_type.clone();

    let mut sink = DirectorySink::new(dir);
    let artifact = Exporter::new(settings).export_to(&request, &data, Utc::now(), &mut sink)?;

    println!(
        "Exported {} ({} bytes) to: {}",
        artifact.format,
        artifact.body.len(),
        sink.path_for(&artifact).display()
    );
    Ok(())
}
