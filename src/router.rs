use crate::db::competitors::{
    create_competitor, get_competitor_for_user, update_competitor, validate_competitor_input,
};
use crate::db::reports::get_latest_report;
use crate::errors::ServerError;
use crate::responses::{json_response, success_response, ResultResp};
use crate::scan::ScanService;
use astra::Request;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use tracing::info;

const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Deserialize)]
struct CompetitorInput {
    name: Option<String>,
    url: Option<String>,
}

pub fn handle(mut req: Request, scans: &ScanService) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let db = scans.db();

    match (method.as_str(), path.as_str()) {
        ("GET", "/health") => json_response(200, &serde_json::json!({ "status": "ok" })),

        ("POST", "/scan") => {
            let user_id = user_id(&req)?;
            let response = scans.run_scan(&user_id)?;
            json_response(200, &response)
        }

        ("GET", "/competitor") => {
            let user_id = user_id(&req)?;
            let competitor = db
                .with_conn(|conn| get_competitor_for_user(conn, &user_id))?
                .ok_or(ServerError::NoCompetitor)?;
            success_response(200, &competitor)
        }

        ("POST", "/competitor") => {
            let user_id = user_id(&req)?;
            let input: CompetitorInput = read_json(&mut req)?;
            let (name, url) =
                validate_competitor_input(input.name.as_deref(), input.url.as_deref())?;
            let competitor = db.with_conn(|conn| {
                create_competitor(conn, &user_id, &name, &url, Utc::now())
            })?;
            info!(user_id, competitor_id = competitor.id, "competitor created");
            success_response(201, &competitor)
        }

        ("PUT", p) if p.starts_with("/competitor/") => {
            let user_id = user_id(&req)?;
            let id: i64 = p["/competitor/".len()..]
                .parse()
                .map_err(|_| ServerError::NotFound)?;
            let input: CompetitorInput = read_json(&mut req)?;
            let (name, url) =
                validate_competitor_input(input.name.as_deref(), input.url.as_deref())?;
            let competitor =
                db.with_conn(|conn| update_competitor(conn, &user_id, id, &name, &url))?;
            info!(user_id, competitor_id = id, "competitor updated");
            success_response(200, &competitor)
        }

        ("GET", "/reports/latest") => {
            let user_id = user_id(&req)?;
            let report = db
                .with_conn(|conn| get_latest_report(conn, &user_id))?
                .ok_or(ServerError::NoReport)?;
            success_response(200, &report)
        }

        _ => Err(ServerError::NotFound),
    }
}

/// The caller's id, from `?user_id=` or the `X-User-Id` header.
fn user_id(req: &Request) -> Result<String, ServerError> {
    let from_query = parse_query(req).remove("user_id");
    let from_header = || {
        req.headers()
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    from_query
        .or_else(from_header)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Missing user id".into()))
}

fn read_json<T: for<'de> Deserialize<'de>>(req: &mut Request) -> Result<T, ServerError> {
    let mut raw = String::new();
    req.body_mut()
        .reader()
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut raw)
        .map_err(|e| ServerError::BadRequest(format!("Unreadable body: {e}")))?;

    serde_json::from_str(&raw).map_err(|_| ServerError::BadRequest("Invalid JSON body".into()))
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
