use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tradesmart::datasource::{QuoteSource, TwelveDataSource};
use tradesmart::engine::{AdmissionFilter, PaperTradingEngine, PositionMonitor};
use tradesmart::notify::{Notifier, WebhookNotifier};
use tradesmart::oracle::{AnthropicOracle, VerdictOracle};
use tradesmart::orchestration::AnalysisOrchestrator;
use tradesmart::{api, Config, StatePersistor};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Wire up components
    let persistor = StatePersistor::new(
        config.paper_trading.state_file_path.clone(),
        config.paper_trading.initial_balance,
    );
    let engine = Arc::new(PaperTradingEngine::new(
        config.paper_trading.clone(),
        persistor,
    ));
    let quotes: Arc<dyn QuoteSource> = Arc::new(TwelveDataSource::new(
        config.quotes.base_url.clone(),
        config.quotes.api_key.clone(),
    ));
    let oracle: Arc<dyn VerdictOracle> = Arc::new(AnthropicOracle::new(config.oracle.clone()));
    let notifier: Arc<dyn Notifier> =
        Arc::new(WebhookNotifier::new(config.notify_webhook_url.clone()));
    let admission = Arc::new(AdmissionFilter::new(
        config.paper_trading.clone(),
        Arc::clone(&engine),
        Arc::clone(&notifier),
    ));
    let orchestrator = AnalysisOrchestrator::new(
        Arc::clone(&quotes),
        oracle,
        Arc::clone(&notifier),
        admission,
        config.analysis_timeframes.clone(),
    );

    // Start the exit monitor
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if config.paper_trading.enabled {
        let monitor = PositionMonitor::new(
            Arc::clone(&engine),
            Arc::clone(&quotes),
            Arc::clone(&notifier),
            config.paper_trading.monitor_interval,
            shutdown_rx,
        );
        tokio::spawn(monitor.run());
    } else {
        tracing::info!("Paper trading disabled; position monitor not started");
    }

    // Create router
    let app = api::create_router(api::AppState {
        orchestrator,
        engine,
        webhook_secret: config.webhook_secret.clone(),
    });

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server; ctrl-c stops both the server and the monitor
    let shutdown = async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
