use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde_json::json;

pub type HandlerResult<T> = Result<T, serde_json::Value>;

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> HandlerResult<&'a Connection> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> HandlerResult<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Trimmed and required to be non-empty.
pub fn required_text(req: &Request, key: &str) -> HandlerResult<String> {
    let v = required_str(req, key)?.trim().to_string();
    if v.is_empty() {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must not be empty", key),
            None,
        ));
    }
    Ok(v)
}

pub fn optional_str(req: &Request, key: &str) -> HandlerResult<Option<String>> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => match v.as_str() {
            Some(s) => Ok(Some(s.trim().to_string()).filter(|s| !s.is_empty())),
            None => Err(err(
                &req.id,
                "bad_params",
                format!("{} must be a string", key),
                None,
            )),
        },
    }
}

pub fn optional_i64(req: &Request, key: &str) -> HandlerResult<Option<i64>> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be an integer", key),
                None,
            )
        }),
    }
}

pub fn optional_bool(req: &Request, key: &str) -> HandlerResult<Option<bool>> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_bool().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a boolean", key),
                None,
            )
        }),
    }
}

pub fn db_failed(req: &Request, code: &str, e: impl std::fmt::Display) -> serde_json::Value {
    err(&req.id, code, e.to_string(), None)
}

pub fn to_result<T: Serialize>(req: &Request, value: &T) -> HandlerResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| err(&req.id, "serialize_failed", e.to_string(), None))
}

/// Confirms `id` exists in `table` under `class_id`.
pub fn ensure_in_class(
    conn: &Connection,
    req: &Request,
    table: &str,
    id: &str,
    class_id: &str,
    what: &str,
) -> HandlerResult<()> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ? AND class_id = ?", table);
    let found: Option<i64> = conn
        .query_row(&sql, (id, class_id), |r| r.get(0))
        .optional()
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    if found.is_none() {
        return Err(err(
            &req.id,
            "not_found",
            format!("{} not found", what),
            Some(json!({ "id": id })),
        ));
    }
    Ok(())
}

pub fn ensure_class(conn: &Connection, req: &Request, class_id: &str) -> HandlerResult<()> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM classes WHERE id = ?", [class_id], |r| {
            r.get(0)
        })
        .optional()
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    if found.is_none() {
        return Err(err(&req.id, "not_found", "class not found", None));
    }
    Ok(())
}

/// Class owning the exam, or a not_found response.
pub fn exam_class_id(conn: &Connection, req: &Request, exam_id: &str) -> HandlerResult<String> {
    conn.query_row(
        "SELECT class_id FROM exams WHERE id = ?",
        [exam_id],
        |r| r.get::<_, String>(0),
    )
    .optional()
    .map_err(|e| db_failed(req, "db_query_failed", e))?
    .ok_or_else(|| err(&req.id, "not_found", "exam not found", None))
}

/// Collapses a handler body that short-circuits with an error response.
pub fn respond(id: &str, out: HandlerResult<serde_json::Value>) -> serde_json::Value {
    match out {
        Ok(result) => crate::ipc::error::ok(id, result),
        Err(resp) => resp,
    }
}
