use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use kafka_intake::{server, Config, ProducerCell, Result, TransportMode};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "kafka-intake")]
#[command(about = "HTTP produce gateway for Kafka", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[arg(short, long, help = "Enable JSON output for logs")]
    json_logs: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,

    #[arg(long, help = "Publish to an in-memory transport instead of Kafka")]
    mock: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, args.verbose);

    info!("Starting kafka-intake");
    info!("Loading configuration from {:?}", args.config);

    let config = match Config::from_file(&args.config) {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let mode = if args.mock {
        TransportMode::Mock
    } else {
        TransportMode::Kafka
    };

    info!(
        kafka_brokers = ?config.kafka.brokers,
        listen_addr = %config.server.bind_addr(),
        mode = ?mode,
        "Configuration summary"
    );

    let cell = Arc::new(ProducerCell::new());
    cell.get_or_init(&config.kafka, mode)?;
    info!("Producer initialized");

    server::serve(Arc::clone(&cell), &config.server.bind_addr()).await?;

    if let Some(producer) = cell.get() {
        info!("Flushing in-flight records before shutdown");
        if let Err(e) = producer.flush(SHUTDOWN_FLUSH_TIMEOUT) {
            warn!("Flush before shutdown failed: {}", e);
        }
        producer.close();
    }
    info!("Shutdown complete");

    Ok(())
}

fn init_logging(json: bool, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("kafka_intake=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("kafka_intake=info,warn"))
    };

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
