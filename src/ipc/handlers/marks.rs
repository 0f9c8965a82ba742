use crate::db::now_timestamp;
use crate::grading::{grade_for, parse_marks, MarkEntry};
use crate::ipc::error::err;
use crate::ipc::helpers::{
    db_conn, db_failed, ensure_in_class, exam_class_id, required_str, respond, HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

const MARKS_BULK_MAX_EDITS: usize = 5000;

/// Principal override on an edit: absent keeps the stored value, null
/// clears it back to the subject default.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PrincipalEdit {
    Keep,
    Set(Option<bool>),
}

/// Marks on an edit: absent keeps the stored value, null or "" clears it.
#[derive(Debug, Clone, Copy, PartialEq)]
enum MarksEdit {
    Keep,
    Set(Option<f64>),
}

struct EditErr {
    code: &'static str,
    message: String,
}

fn parse_principal_edit(obj: &serde_json::Value) -> Result<PrincipalEdit, EditErr> {
    match obj.get("isPrincipal") {
        None => Ok(PrincipalEdit::Keep),
        Some(v) if v.is_null() => Ok(PrincipalEdit::Set(None)),
        Some(v) => v
            .as_bool()
            .map(|b| PrincipalEdit::Set(Some(b)))
            .ok_or_else(|| EditErr {
                code: "bad_params",
                message: "isPrincipal must be a boolean or null".to_string(),
            }),
    }
}

/// Marks must be empty (not entered) or a number in [0,100].
fn resolve_marks(raw: Option<&serde_json::Value>) -> Result<MarksEdit, EditErr> {
    let Some(raw) = raw else {
        return Ok(MarksEdit::Keep);
    };
    let entry = parse_marks(raw);
    match entry {
        MarkEntry::NotEntered => Ok(MarksEdit::Set(None)),
        MarkEntry::Invalid => Err(EditErr {
            code: "bad_params",
            message: "marks must be numeric".to_string(),
        }),
        MarkEntry::Value(v) => entry
            .marks()
            .map(|m| MarksEdit::Set(Some(m)))
            .ok_or_else(|| EditErr {
                code: "bad_params",
                message: format!("marks must be between 0 and 100, got {}", v),
            }),
    }
}

fn upsert_mark(
    conn: &Connection,
    exam_id: &str,
    student_id: &str,
    subject_id: &str,
    marks: MarksEdit,
    principal: PrincipalEdit,
) -> rusqlite::Result<()> {
    let (marks_value, apply_marks) = match marks {
        MarksEdit::Keep => (None, false),
        MarksEdit::Set(v) => (v, true),
    };
    let (override_value, apply_override) = match principal {
        PrincipalEdit::Keep => (None, false),
        PrincipalEdit::Set(v) => (v.map(|b| b as i64), true),
    };
    conn.execute(
        "INSERT INTO marks(id, exam_id, student_id, subject_id, marks, is_principal, updated_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(exam_id, student_id, subject_id) DO UPDATE SET
           marks = CASE WHEN ?9 THEN excluded.marks ELSE marks.marks END,
           is_principal = CASE WHEN ?8 THEN excluded.is_principal ELSE marks.is_principal END,
           updated_at = excluded.updated_at",
        (
            Uuid::new_v4().to_string(),
            exam_id,
            student_id,
            subject_id,
            marks_value,
            override_value,
            now_timestamp(),
            apply_override,
            apply_marks,
        ),
    )?;
    Ok(())
}

fn cell_json(marks: Option<f64>) -> serde_json::Value {
    let outcome = grade_for(marks);
    json!({
        "marks": marks,
        "grade": outcome.grade(),
        "gradeLabel": outcome.label(),
        "points": outcome.points(),
        "status": outcome.status()
    })
}

fn marks_get(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let exam_id = required_str(req, "examId")?;
    let class_id = exam_class_id(conn, req, &exam_id)?;

    let mut stmt = conn
        .prepare(
            "SELECT m.student_id, m.subject_id, m.marks, m.is_principal, sj.is_principal
             FROM marks m
             JOIN subjects sj ON sj.id = m.subject_id
             JOIN students st ON st.id = m.student_id
             WHERE m.exam_id = ?
             ORDER BY st.sort_order, sj.sort_order, sj.code",
        )
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    let rows = stmt
        .query_map([&exam_id], |r| {
            let student_id: String = r.get(0)?;
            let subject_id: String = r.get(1)?;
            let marks: Option<f64> = r.get(2)?;
            let override_principal: Option<i64> = r.get(3)?;
            let default_principal: i64 = r.get(4)?;
            Ok((student_id, subject_id, marks, override_principal, default_principal))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| db_failed(req, "db_query_failed", e))?;

    let mut order: Vec<String> = Vec::new();
    let mut by_student: HashMap<String, Vec<serde_json::Value>> = HashMap::new();
    for (student_id, subject_id, marks, override_principal, default_principal) in rows {
        let mut cell = cell_json(marks);
        cell["subjectId"] = json!(subject_id);
        cell["isPrincipal"] = json!(override_principal.unwrap_or(default_principal) != 0);
        cell["principalOverridden"] = json!(override_principal.is_some());
        if !by_student.contains_key(&student_id) {
            order.push(student_id.clone());
        }
        by_student.entry(student_id).or_default().push(cell);
    }

    let students: Vec<serde_json::Value> = order
        .into_iter()
        .map(|sid| {
            let cells = by_student.remove(&sid).unwrap_or_default();
            json!({ "studentId": sid, "cells": cells })
        })
        .collect();

    Ok(json!({ "examId": exam_id, "classId": class_id, "students": students }))
}

fn marks_upsert(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let exam_id = required_str(req, "examId")?;
    let student_id = required_str(req, "studentId")?;
    let subject_id = required_str(req, "subjectId")?;
    let class_id = exam_class_id(conn, req, &exam_id)?;
    ensure_in_class(conn, req, "students", &student_id, &class_id, "student")?;
    ensure_in_class(conn, req, "subjects", &subject_id, &class_id, "subject")?;

    let to_resp = |e: EditErr| err(&req.id, e.code, e.message, None);
    let marks = resolve_marks(req.params.get("marks")).map_err(to_resp)?;
    let principal = parse_principal_edit(&req.params).map_err(to_resp)?;

    upsert_mark(conn, &exam_id, &student_id, &subject_id, marks, principal).map_err(|e| {
        err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "marks" })),
        )
    })?;
    debug!(exam_id = %exam_id, student_id = %student_id, subject_id = %subject_id, "mark saved");

    // Report what is stored; an edit without marks keeps the old value.
    let stored: Option<f64> = conn
        .query_row(
            "SELECT marks FROM marks WHERE exam_id = ? AND student_id = ? AND subject_id = ?",
            (&exam_id, &student_id, &subject_id),
            |r| r.get(0),
        )
        .map_err(|e| db_failed(req, "db_query_failed", e))?;
    Ok(cell_json(stored))
}

fn class_ids(conn: &Connection, table: &str, class_id: &str) -> rusqlite::Result<HashSet<String>> {
    let sql = format!("SELECT id FROM {} WHERE class_id = ?", table);
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map([class_id], |r| r.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(ids)
}

fn check_edit<'a>(
    edit: &'a serde_json::Value,
    students: &HashSet<String>,
    subjects: &HashSet<String>,
) -> Result<(&'a str, &'a str, MarksEdit, PrincipalEdit), EditErr> {
    let student_id = edit
        .get("studentId")
        .and_then(|v| v.as_str())
        .filter(|id| students.contains(*id))
        .ok_or_else(|| EditErr {
            code: "not_found",
            message: "unknown studentId".to_string(),
        })?;
    let subject_id = edit
        .get("subjectId")
        .and_then(|v| v.as_str())
        .filter(|id| subjects.contains(*id))
        .ok_or_else(|| EditErr {
            code: "not_found",
            message: "unknown subjectId".to_string(),
        })?;
    let marks = resolve_marks(edit.get("marks"))?;
    let principal = parse_principal_edit(edit)?;
    Ok((student_id, subject_id, marks, principal))
}

/// Batch submission: valid edits are applied in one transaction, invalid
/// ones are reported back by index and skipped.
fn marks_bulk_upsert(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let exam_id = required_str(req, "examId")?;
    let class_id = exam_class_id(conn, req, &exam_id)?;
    let Some(edits) = req.params.get("edits").and_then(|v| v.as_array()) else {
        return Err(err(&req.id, "bad_params", "missing edits", None));
    };
    if edits.len() > MARKS_BULK_MAX_EDITS {
        return Err(err(
            &req.id,
            "bad_params",
            format!("too many edits (max {})", MARKS_BULK_MAX_EDITS),
            Some(json!({ "count": edits.len(), "max": MARKS_BULK_MAX_EDITS })),
        ));
    }

    let students =
        class_ids(conn, "students", &class_id).map_err(|e| db_failed(req, "db_query_failed", e))?;
    let subjects =
        class_ids(conn, "subjects", &class_id).map_err(|e| db_failed(req, "db_query_failed", e))?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| db_failed(req, "db_tx_failed", e))?;
    let mut updated = 0usize;
    let mut rejected: Vec<serde_json::Value> = Vec::new();
    for (index, edit) in edits.iter().enumerate() {
        let checked = check_edit(edit, &students, &subjects);

        match checked {
            Ok((student_id, subject_id, marks, principal)) => {
                let saved = upsert_mark(&tx, &exam_id, student_id, subject_id, marks, principal);
                if let Err(e) = saved {
                    let _ = tx.rollback();
                    return Err(err(
                        &req.id,
                        "db_insert_failed",
                        e.to_string(),
                        Some(json!({ "table": "marks", "index": index })),
                    ));
                }
                updated += 1;
            }
            Err(e) => rejected.push(json!({
                "index": index,
                "code": e.code,
                "message": e.message
            })),
        }
    }
    tx.commit()
        .map_err(|e| db_failed(req, "db_commit_failed", e))?;

    info!(
        exam_id = %exam_id,
        updated,
        rejected = rejected.len(),
        "bulk marks submission"
    );
    Ok(json!({ "updated": updated, "rejected": rejected }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "marks.get" => marks_get(state, req),
        "marks.upsert" => marks_upsert(state, req),
        "marks.bulkUpsert" => marks_bulk_upsert(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
