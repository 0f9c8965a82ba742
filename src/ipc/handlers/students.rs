use crate::db::now_timestamp;
use crate::ipc::error::err;
use crate::ipc::helpers::{
    db_conn, db_failed, ensure_class, optional_bool, optional_str, required_str, required_text,
    respond, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use rusqlite::OptionalExtension;
use serde_json::json;
use uuid::Uuid;

fn students_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let class_id = required_str(req, "classId")?;

    let mut stmt = conn
        .prepare(
            "SELECT id, last_name, first_name, admission_no, combination, active, sort_order
             FROM students
             WHERE class_id = ?
             ORDER BY sort_order",
        )
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    let students = stmt
        .query_map([&class_id], |r| {
            let last: String = r.get(1)?;
            let first: String = r.get(2)?;
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "lastName": last,
                "firstName": first,
                "displayName": format!("{}, {}", last, first),
                "admissionNo": r.get::<_, Option<String>>(3)?,
                "combination": r.get::<_, Option<String>>(4)?,
                "active": r.get::<_, i64>(5)? != 0,
                "sortOrder": r.get::<_, i64>(6)?
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| db_failed(req, "db_query_failed", e))?;

    Ok(json!({ "students": students }))
}

fn students_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let class_id = required_str(req, "classId")?;
    ensure_class(conn, req, &class_id)?;
    let last_name = required_text(req, "lastName")?;
    let first_name = required_text(req, "firstName")?;
    let admission_no = optional_str(req, "admissionNo")?;
    let combination = optional_str(req, "combination")?.map(|c| c.to_ascii_uppercase());
    let active = optional_bool(req, "active")?.unwrap_or(true);

    let next_sort: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM students WHERE class_id = ?",
            [&class_id],
            |r| r.get(0),
        )
        .map_err(|e| db_failed(req, "db_query_failed", e))?;

    let student_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(
           id, class_id, last_name, first_name, admission_no, combination, active, sort_order,
           updated_at
         )
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &student_id,
            &class_id,
            &last_name,
            &first_name,
            &admission_no,
            &combination,
            active as i64,
            next_sort,
            now_timestamp(),
        ),
    )
    .map_err(|e| {
        err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "students" })),
        )
    })?;

    Ok(json!({ "studentId": student_id, "sortOrder": next_sort }))
}

fn students_update(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let student_id = required_str(req, "studentId")?;
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return Err(err(&req.id, "bad_params", "missing patch", None));
    };

    let current: Option<(String, String, Option<String>, Option<String>, i64)> = conn
        .query_row(
            "SELECT last_name, first_name, admission_no, combination, active
             FROM students WHERE id = ?",
            [&student_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    let Some((mut last, mut first, mut admission_no, mut combination, mut active)) = current else {
        return Err(err(&req.id, "not_found", "student not found", None));
    };

    let text = |key: &str| -> HandlerResult<Option<String>> {
        match patch.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(|s| Some(s.trim().to_string()))
                .ok_or_else(|| {
                    err(
                        &req.id,
                        "bad_params",
                        format!("patch.{} must be a string", key),
                        None,
                    )
                }),
        }
    };
    if let Some(v) = text("lastName")? {
        if v.is_empty() {
            return Err(err(&req.id, "bad_params", "lastName must not be empty", None));
        }
        last = v;
    }
    if let Some(v) = text("firstName")? {
        if v.is_empty() {
            return Err(err(&req.id, "bad_params", "firstName must not be empty", None));
        }
        first = v;
    }
    if patch.contains_key("admissionNo") {
        admission_no = text("admissionNo")?.filter(|s| !s.is_empty());
    }
    if patch.contains_key("combination") {
        combination = text("combination")?
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_uppercase());
    }
    if let Some(v) = patch.get("active") {
        let Some(b) = v.as_bool() else {
            return Err(err(&req.id, "bad_params", "patch.active must be a boolean", None));
        };
        active = b as i64;
    }

    conn.execute(
        "UPDATE students
         SET last_name = ?, first_name = ?, admission_no = ?, combination = ?, active = ?,
             updated_at = ?
         WHERE id = ?",
        (
            &last,
            &first,
            &admission_no,
            &combination,
            active,
            now_timestamp(),
            &student_id,
        ),
    )
    .map_err(|e| db_failed(req, "db_update_failed", e))?;

    Ok(json!({ "ok": true }))
}

fn students_delete(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let student_id = required_str(req, "studentId")?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| db_failed(req, "db_tx_failed", e))?;
    tx.execute("DELETE FROM marks WHERE student_id = ?", [&student_id])
        .map_err(|e| db_failed(req, "db_delete_failed", e))?;
    let n = tx
        .execute("DELETE FROM students WHERE id = ?", [&student_id])
        .map_err(|e| db_failed(req, "db_delete_failed", e))?;
    if n == 0 {
        let _ = tx.rollback();
        return Err(err(&req.id, "not_found", "student not found", None));
    }
    tx.commit()
        .map_err(|e| db_failed(req, "db_commit_failed", e))?;

    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "students.list" => students_list(state, req),
        "students.create" => students_create(state, req),
        "students.update" => students_update(state, req),
        "students.delete" => students_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
