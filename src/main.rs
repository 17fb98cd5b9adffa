use pairing_engine::config::Settings;
use pairing_engine::services::load_participants;
use pairing_engine::{EngineError, PairingEngine, PairingRun};
use std::io::{Error, ErrorKind};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(settings: Option<&Settings>) {
    let log_level = std::env::var("PAIRING_LOG_LEVEL")
        .ok()
        .or_else(|| settings.map(|s| s.logging.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let log_format = std::env::var("PAIRING_LOG_FORMAT")
        .ok()
        .or_else(|| settings.map(|s| s.logging.format.clone()))
        .unwrap_or_default();

    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn render(run: &PairingRun, format: &str) -> Result<String, Error> {
    match format {
        "json" => serde_json::to_string_pretty(run).map_err(|e| Error::new(ErrorKind::Other, e)),
        _ => {
            let mut text = run.report.to_string();
            for notice in &run.notices {
                text.push_str(&format!("\nnotice: {}", serde_json::to_string(notice).unwrap_or_default()));
            }
            Ok(text)
        }
    }
}

fn to_io(err: EngineError) -> Error {
    let kind = match err {
        EngineError::Data(_) | EngineError::InvalidConfig(_) => ErrorKind::InvalidData,
        EngineError::Cancelled => ErrorKind::Interrupted,
        EngineError::Worker(_) => ErrorKind::Other,
    };
    Error::new(kind, err)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration; logging falls back to env vars if this fails
    let settings = Settings::load();
    init_logging(settings.as_ref().ok());

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        Error::new(ErrorKind::InvalidInput, e)
    })?;
    info!("Configuration loaded successfully");

    let config = settings.engine_config().map_err(|e| {
        error!("Invalid engine configuration: {}", e);
        to_io(e)
    })?;

    let path = std::env::args()
        .nth(1)
        .or_else(|| settings.input.participants_path.clone())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                "usage: pairing-engine <participants.json> (or set input.participants_path)",
            )
        })?;

    let participants = load_participants(&path).await.map_err(|e| {
        error!("{}", e);
        Error::new(ErrorKind::InvalidData, e)
    })?;

    let engine = PairingEngine::new(config).map_err(to_io)?;
    info!(
        "Engine initialized (strategy: {}, quality weight: {:.2})",
        engine.config().similarity_strategy,
        engine.config().quality_weight
    );

    let run = engine.run_parallel(participants).await.map_err(|e| {
        error!("Pairing run failed: {}", e);
        to_io(e)
    })?;

    if !run.notices.is_empty() {
        warn!("Run {} finished with {} notices", run.run_id, run.notices.len());
    }

    println!("{}", render(&run, settings.input.output_format.as_str())?);
    Ok(())
}
