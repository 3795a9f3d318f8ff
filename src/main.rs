use pricewatch::config::AppConfig;
use pricewatch::db::{init_db, Database, FallbackSnapshotStore, SqliteReportSink, SqliteSnapshotStore};
use pricewatch::insight::{GeminiClient, InsightGate, InsightProvider};
use pricewatch::pricing::{HttpPageFetcher, HttpRenderClient, PageRenderer};
use pricewatch::responses::error_to_response;
use pricewatch::router::handle;
use pricewatch::scan::ScanService;
use astra::Server;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pricewatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ configuration error: {e}");
            std::process::exit(1);
        }
    };

    let db = Database::new(config.db_path.clone());
    if let Err(e) = init_db(&db) {
        error!("❌ database initialization failed: {e}");
        std::process::exit(1);
    }

    let fetcher = match HttpPageFetcher::new(&config.fetch) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!("❌ page fetcher setup failed: {e}");
            std::process::exit(1);
        }
    };
    info!(strategies = ?fetcher.strategy_names(), "page fetcher ready");

    let provider: Option<Box<dyn InsightProvider>> = match config.gemini.as_ref().map(GeminiClient::new) {
        Some(Ok(client)) => Some(Box::new(client)),
        Some(Err(e)) => {
            warn!("insight provider disabled: {e}");
            None
        }
        None => {
            warn!("GEMINI_API_KEY not set, significant changes get a placeholder insight");
            None
        }
    };

    let renderer: Option<Box<dyn PageRenderer>> = match config.render.as_ref().map(HttpRenderClient::new) {
        Some(Ok(client)) => Some(Box::new(client)),
        Some(Err(e)) => {
            warn!("render collaborator disabled: {e}");
            None
        }
        None => None,
    };

    let mut scans = ScanService::new(
        db.clone(),
        Box::new(fetcher),
        Box::new(FallbackSnapshotStore::new(SqliteSnapshotStore::new(db.clone()))),
        Box::new(SqliteReportSink::new(db)),
        InsightGate::new(provider),
    );
    if let Some(renderer) = renderer {
        scans = scans.with_renderer(renderer);
    }

    let addr = config.addr;
    info!(%addr, workers = config.max_workers, "🚀 starting server");

    let server = Server::bind(&addr).max_workers(config.max_workers);
    let result = server.serve(move |req, _info| match handle(req, &scans) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        error!("server ended with error: {e}");
    }

    info!("server shut down cleanly");
}
