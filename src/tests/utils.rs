use crate::db::competitors::create_competitor;
use crate::db::connection::{init_db, Database};
use crate::db::{MemorySnapshotStore, ReportSink, SnapshotStore, SqliteReportSink};
use crate::domain::changes::Delta;
use crate::domain::report::Report;
use crate::domain::randomness::DisplayRandom;
use crate::errors::{FetchError, InsightError, ServerError};
use crate::insight::{InsightGate, InsightProvider};
use crate::pricing::{Navigation, PageRenderer, PageSource, Snapshot};
use crate::scan::ScanService;
use astra::Response;
use chrono::Utc;
use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

pub const THREE_TIER_PAGE: &str = r#"
    <html><body>
      <div class="pricing-grid">
        <div class="pricing-card"><h3>Starter</h3><span class="price">$29</span><p>For individuals</p></div>
        <div class="pricing-card"><h3>Pro</h3><span class="price">$79</span><p>Most popular</p></div>
        <div class="pricing-card"><h3>Enterprise</h3><span class="price">$249</span><p>For large orgs</p></div>
      </div>
    </body></html>
"#;

pub const REPRICED_PAGE: &str = r#"
    <html><body>
      <div class="pricing-grid">
        <div class="pricing-card"><h3>Starter</h3><span class="price">$29</span><p>For individuals</p></div>
        <div class="pricing-card"><h3>Pro</h3><span class="price">$99</span><p>Most popular</p></div>
        <div class="pricing-card"><h3>Enterprise</h3><span class="price">$249</span><p>For large orgs</p></div>
      </div>
    </body></html>
"#;

pub const NO_PRICING_PAGE: &str = r#"
    <html><body><main><h1>Acme</h1><p>We build rockets. Talk to sales.</p></main></body></html>
"#;

/// Fresh SQLite file under the temp dir with the production schema applied.
pub fn temp_db(name: &str) -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("pricewatch_{name}_{nanos}.sqlite"));
    let db = Database::new(path.to_string_lossy().into_owned());
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub fn seed_competitor(db: &Database, user_id: &str, url: &str) -> i64 {
    db.with_conn(|conn| create_competitor(conn, user_id, "Acme", url, Utc::now()))
        .unwrap()
        .id
}

pub fn report_count(db: &Database, user_id: &str) -> i64 {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT COUNT(*) FROM reports WHERE user_id = ?1",
            [user_id],
            |r| r.get(0),
        )
        .map_err(|e| ServerError::DbError(e.to_string()))
    })
    .unwrap()
}

pub fn body_string(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

/// Serves canned markup per URL. Pages can be swapped between scans.
#[derive(Clone, Default)]
pub struct FakePages {
    pages: Arc<Mutex<HashMap<String, String>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl FakePages {
    pub fn with(self, url: &str, html: &str) -> Self {
        self.set(url, html);
        self
    }

    pub fn set(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl PageSource for FakePages {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Exhausted(format!("direct attempt 1: no page for {url}")))
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    pub navigation: Option<Navigation>,
    pub rendered: Option<String>,
}

impl PageRenderer for FakeRenderer {
    fn render(&self, _url: &str) -> Option<String> {
        self.rendered.clone()
    }

    fn navigate(&self, _start_url: &str) -> Option<Navigation> {
        self.navigation.clone()
    }
}

pub struct CountingProvider {
    pub reply: String,
    pub calls: Arc<AtomicUsize>,
}

impl CountingProvider {
    pub fn new(reply: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                reply: reply.to_string(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl InsightProvider for CountingProvider {
    fn analyze(&self, _delta: &Delta) -> Result<String, InsightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub const PROVIDER_REPLY: &str = r#"Here is the analysis:
{"insight": "Acme pushed Pro up 25%.", "classification": "Aggressive Expansion", "confidence": 93, "impact": "Critical"}"#;

/// Service wired to fakes, an in-memory snapshot store and a real report table.
pub fn service(db: &Database, pages: FakePages, provider: Option<Box<dyn InsightProvider>>) -> ScanService {
    ScanService::new(
        db.clone(),
        Box::new(pages),
        Box::new(MemorySnapshotStore::new()),
        Box::new(SqliteReportSink::new(db.clone())),
        InsightGate::new(provider),
    )
    .with_random(Arc::new(DisplayRandom::seeded(7)))
}

/// Lets a test keep a handle on the store the service writes to.
pub struct SharedStore(pub Arc<MemorySnapshotStore>);

impl SnapshotStore for SharedStore {
    fn latest(&self, user_id: &str) -> Result<Option<Snapshot>, ServerError> {
        self.0.latest(user_id)
    }

    fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<(), ServerError> {
        self.0.save(user_id, snapshot)
    }
}

pub struct UnreachableStore;

impl SnapshotStore for UnreachableStore {
    fn latest(&self, _user_id: &str) -> Result<Option<Snapshot>, ServerError> {
        Err(ServerError::DbError("store unreachable".into()))
    }

    fn save(&self, _user_id: &str, _snapshot: &Snapshot) -> Result<(), ServerError> {
        Err(ServerError::DbError("store unreachable".into()))
    }
}

pub struct FailingSink;

impl ReportSink for FailingSink {
    fn save(&self, _report: &Report) -> Result<i64, ServerError> {
        Err(ServerError::DbError("disk I/O error".into()))
    }
}
