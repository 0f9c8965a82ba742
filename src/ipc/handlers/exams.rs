use crate::db::now_timestamp;
use crate::ipc::error::err;
use crate::ipc::helpers::{
    db_conn, db_failed, ensure_class, optional_i64, required_str, required_text, respond,
    HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use uuid::Uuid;

fn exams_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let class_id = required_str(req, "classId")?;

    let mut stmt = conn
        .prepare(
            "SELECT
               e.id, e.name, e.term, e.year, e.created_at,
               (SELECT COUNT(*) FROM marks m WHERE m.exam_id = e.id AND m.marks IS NOT NULL)
             FROM exams e
             WHERE e.class_id = ?
             ORDER BY e.year, e.term, e.created_at",
        )
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    let exams = stmt
        .query_map([&class_id], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "name": r.get::<_, String>(1)?,
                "term": r.get::<_, Option<i64>>(2)?,
                "year": r.get::<_, Option<i64>>(3)?,
                "createdAt": r.get::<_, String>(4)?,
                "enteredMarks": r.get::<_, i64>(5)?
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| db_failed(req, "db_query_failed", e))?;

    Ok(json!({ "exams": exams }))
}

fn exams_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let class_id = required_str(req, "classId")?;
    ensure_class(conn, req, &class_id)?;
    let name = required_text(req, "name")?;
    let term = optional_i64(req, "term")?;
    let year = optional_i64(req, "year")?;
    if let Some(t) = term {
        if !(1..=4).contains(&t) {
            return Err(err(
                &req.id,
                "bad_params",
                "term must be between 1 and 4",
                Some(json!({ "term": t })),
            ));
        }
    }

    let exam_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO exams(id, class_id, name, term, year, created_at) VALUES(?, ?, ?, ?, ?, ?)",
        (&exam_id, &class_id, &name, term, year, now_timestamp()),
    )
    .map_err(|e| {
        err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "exams" })),
        )
    })?;

    Ok(json!({ "examId": exam_id, "name": name }))
}

fn exams_delete(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let exam_id = required_str(req, "examId")?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| db_failed(req, "db_tx_failed", e))?;
    tx.execute("DELETE FROM marks WHERE exam_id = ?", [&exam_id])
        .map_err(|e| db_failed(req, "db_delete_failed", e))?;
    let n = tx
        .execute("DELETE FROM exams WHERE id = ?", [&exam_id])
        .map_err(|e| db_failed(req, "db_delete_failed", e))?;
    if n == 0 {
        let _ = tx.rollback();
        return Err(err(&req.id, "not_found", "exam not found", None));
    }
    tx.commit()
        .map_err(|e| db_failed(req, "db_commit_failed", e))?;

    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "exams.list" => exams_list(state, req),
        "exams.create" => exams_create(state, req),
        "exams.delete" => exams_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
