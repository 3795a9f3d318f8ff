// src/db/competitors.rs
use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Competitor {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Competitor {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            url: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, user_id, name, url, created_at FROM competitors";

pub fn get_competitor_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<Competitor>, ServerError> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE user_id = ?1"),
        params![user_id],
        Competitor::from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

/// Each user may track exactly one competitor.
pub fn create_competitor(
    conn: &Connection,
    user_id: &str,
    name: &str,
    url: &str,
    now: DateTime<Utc>,
) -> Result<Competitor, ServerError> {
    if get_competitor_for_user(conn, user_id)?.is_some() {
        return Err(ServerError::Forbidden(
            "Limit reached: Single competitor only.".into(),
        ));
    }

    conn.execute(
        "INSERT INTO competitors (user_id, name, url, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name, url, now],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;

    Ok(Competitor {
        id: conn.last_insert_rowid(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        created_at: now,
    })
}

/// Updates only a competitor owned by `user_id`; anything else is `NotFound`.
pub fn update_competitor(
    conn: &Connection,
    user_id: &str,
    competitor_id: i64,
    name: &str,
    url: &str,
) -> Result<Competitor, ServerError> {
    let updated = conn
        .execute(
            "UPDATE competitors SET name = ?1, url = ?2 WHERE id = ?3 AND user_id = ?4",
            params![name, url, competitor_id, user_id],
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    if updated == 0 {
        return Err(ServerError::NotFound);
    }
    get_competitor_for_user(conn, user_id)?.ok_or(ServerError::NotFound)
}

/// Trims both fields and requires an absolute http(s) URL.
pub fn validate_competitor_input(
    name: Option<&str>,
    url: Option<&str>,
) -> Result<(String, String), ServerError> {
    let name = name.map(str::trim).unwrap_or_default();
    let url = url.map(str::trim).unwrap_or_default();
    if name.is_empty() || url.is_empty() {
        return Err(ServerError::BadRequest("Name and url are required".into()));
    }

    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            Ok((name.to_string(), url.to_string()))
        }
        _ => Err(ServerError::BadRequest("Valid URL is required".into())),
    }
}
