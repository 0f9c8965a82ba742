use crate::ipc::error::err;
use crate::ipc::helpers::{
    db_conn, db_failed, ensure_class, optional_bool, required_str, required_text, respond,
    HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use rusqlite::{ErrorCode, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation
    )
}

fn write_failed(req: &Request, e: rusqlite::Error, code: &str) -> serde_json::Value {
    if is_unique_violation(&e) {
        return err(
            &req.id,
            "conflict",
            "a subject with this code already exists in the class",
            None,
        );
    }
    db_failed(req, code, e)
}

fn subjects_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let class_id = required_str(req, "classId")?;

    let mut stmt = conn
        .prepare(
            "SELECT id, code, name, is_principal, sort_order
             FROM subjects
             WHERE class_id = ?
             ORDER BY sort_order, code",
        )
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    let subjects = stmt
        .query_map([&class_id], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "code": r.get::<_, String>(1)?,
                "name": r.get::<_, String>(2)?,
                "isPrincipal": r.get::<_, i64>(3)? != 0,
                "sortOrder": r.get::<_, i64>(4)?
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| db_failed(req, "db_query_failed", e))?;

    Ok(json!({ "subjects": subjects }))
}

fn subjects_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let class_id = required_str(req, "classId")?;
    ensure_class(conn, req, &class_id)?;
    let code = required_text(req, "code")?.to_ascii_uppercase();
    let name = required_text(req, "name")?;
    let is_principal = optional_bool(req, "isPrincipal")?.unwrap_or(true);

    let next_sort: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM subjects WHERE class_id = ?",
            [&class_id],
            |r| r.get(0),
        )
        .map_err(|e| db_failed(req, "db_query_failed", e))?;

    let subject_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO subjects(id, class_id, code, name, is_principal, sort_order)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &subject_id,
            &class_id,
            &code,
            &name,
            is_principal as i64,
            next_sort,
        ),
    )
    .map_err(|e| write_failed(req, e, "db_insert_failed"))?;

    Ok(json!({
        "subjectId": subject_id,
        "code": code,
        "isPrincipal": is_principal,
        "sortOrder": next_sort
    }))
}

fn subjects_update(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let subject_id = required_str(req, "subjectId")?;
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return Err(err(&req.id, "bad_params", "missing patch", None));
    };

    let current: Option<(String, String, i64, i64)> = conn
        .query_row(
            "SELECT code, name, is_principal, sort_order FROM subjects WHERE id = ?",
            [&subject_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    let Some((mut code, mut name, mut is_principal, mut sort_order)) = current else {
        return Err(err(&req.id, "not_found", "subject not found", None));
    };

    let bad = |msg: &str| err(&req.id, "bad_params", msg.to_string(), None);
    if let Some(v) = patch.get("code") {
        code = v
            .as_str()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| bad("patch.code must be a non-empty string"))?;
    }
    if let Some(v) = patch.get("name") {
        name = v
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| bad("patch.name must be a non-empty string"))?;
    }
    if let Some(v) = patch.get("isPrincipal") {
        is_principal = v
            .as_bool()
            .ok_or_else(|| bad("patch.isPrincipal must be a boolean"))? as i64;
    }
    if let Some(v) = patch.get("sortOrder") {
        sort_order = v
            .as_i64()
            .ok_or_else(|| bad("patch.sortOrder must be an integer"))?;
    }

    conn.execute(
        "UPDATE subjects SET code = ?, name = ?, is_principal = ?, sort_order = ? WHERE id = ?",
        (&code, &name, is_principal, sort_order, &subject_id),
    )
    .map_err(|e| write_failed(req, e, "db_update_failed"))?;

    Ok(json!({ "ok": true }))
}

fn subjects_delete(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let subject_id = required_str(req, "subjectId")?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| db_failed(req, "db_tx_failed", e))?;
    let marks_deleted = tx
        .execute("DELETE FROM marks WHERE subject_id = ?", [&subject_id])
        .map_err(|e| db_failed(req, "db_delete_failed", e))?;
    let n = tx
        .execute("DELETE FROM subjects WHERE id = ?", [&subject_id])
        .map_err(|e| db_failed(req, "db_delete_failed", e))?;
    if n == 0 {
        let _ = tx.rollback();
        return Err(err(&req.id, "not_found", "subject not found", None));
    }
    tx.commit()
        .map_err(|e| db_failed(req, "db_commit_failed", e))?;

    Ok(json!({ "ok": true, "marksDeleted": marks_deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "subjects.list" => subjects_list(state, req),
        "subjects.create" => subjects_create(state, req),
        "subjects.update" => subjects_update(state, req),
        "subjects.delete" => subjects_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
