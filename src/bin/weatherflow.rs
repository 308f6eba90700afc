//! weatherflow - live chart of per-category weather averages
//!
//! Usage:
//!   WEATHER_SOURCE=file WEATHER_INPUT_PATH=data/weather.jsonl cargo run --bin weatherflow
//!   producer | cargo run --bin weatherflow
//!
//! Environment variables (also read from .env):
//!   WEATHER_TOPIC / WEATHER_CONSUMER_GROUP_ID - Kafka topic and group (defaults: unknown_topic / default_group)
//!   WEATHER_SOURCE - stdin | file | kafka (default: stdin)
//!   WEATHER_CHART_STYLE - grouped | dual (default: grouped)
//!   WEATHER_LOG_FILE - send logs to a file instead of stderr

use {
    dotenv::dotenv,
    log::{error, info, warn},
    std::{fs::OpenOptions, path::Path},
    weatherflow::{
        config::{Config, SourceKind},
        source::{StdinSource, StreamError, StreamSource, TailSource},
        ui::{terminal, ChartOptions},
        AggregationStore, ControlLoop, Decoder, IngestEngine, ShutdownReason,
    },
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let config = Config::from_env()?;
    init_logging(&config.rust_log, config.log_file.as_deref())?;
    for warning in &config.warnings {
        warn!("{}", warning);
    }

    info!("START consumer.");
    info!("   Topic: {}", config.topic);
    info!("   Consumer group id: {}", config.group_id);
    info!("   Source: {:?}", config.source);
    info!(
        "   Fields: category={} a={} b={}",
        config.fields.category, config.fields.metric_a, config.fields.metric_b
    );
    info!("   Chart style: {}", config.chart_style.as_str());
    if let Some(limit) = config.max_categories {
        info!("   Category limit: {}", limit);
    }

    let source = build_source(&config)?;

    let store = match config.max_categories {
        Some(limit) => AggregationStore::with_category_limit(limit),
        None => AggregationStore::new(),
    };
    let engine = IngestEngine::new(Decoder::new(config.fields.clone()), store);

    let options = ChartOptions {
        style: config.chart_style,
        metric_a_label: config.metric_a_label.clone(),
        metric_b_label: config.metric_b_label.clone(),
        ..ChartOptions::default()
    };
    let renderer = terminal::enter(options, config.render_pause)?;

    let report = ControlLoop::new(source, renderer, engine)
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    // Last frame stays up for inspection until the user dismisses it
    let mut renderer = report.renderer;
    let held = terminal::hold_until_quit(&mut renderer);
    terminal::restore()?;
    held?;

    if let ShutdownReason::StreamFailed(e) = &report.reason {
        error!("Consumer stopped on stream error: {}", e);
    }
    info!(
        "Final averages: {}",
        serde_json::to_string(&report.store.snapshot())?
    );
    info!("Consumer for topic '{}' closed.", config.topic);
    Ok(())
}

fn init_logging(default_filter: &str, log_file: Option<&Path>) -> std::io::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        // Stderr sits behind the alternate screen while the chart is up
        None => {
            builder.target(env_logger::Target::Stderr);
        }
    }

    builder.init();
    Ok(())
}

fn build_source(config: &Config) -> Result<Box<dyn StreamSource>, StreamError> {
    match config.source {
        SourceKind::Stdin => Ok(Box::new(StdinSource::new())),
        SourceKind::File => {
            // Config guarantees a path for the file source
            let path = config.input_path.clone().unwrap_or_default();
            let source = if config.input_from_start {
                TailSource::from_start(path)
            } else {
                TailSource::new(path)
            };
            Ok(Box::new(source))
        }
        SourceKind::Kafka => kafka_source(config),
    }
}

#[cfg(feature = "kafka")]
fn kafka_source(config: &Config) -> Result<Box<dyn StreamSource>, StreamError> {
    let source = weatherflow::source::KafkaSource::connect(
        &config.broker_address,
        &config.topic,
        &config.group_id,
    )?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "kafka"))]
fn kafka_source(_config: &Config) -> Result<Box<dyn StreamSource>, StreamError> {
    Err(StreamError::Broker(
        "weatherflow was built without the 'kafka' feature".to_string(),
    ))
}
