use crate::ipc::error::err;
use crate::ipc::helpers::{
    db_conn, db_failed, ensure_class, optional_str, required_str, required_text, respond,
    HandlerResult,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

const SUPPORTED_LEVELS: [&str; 1] = ["A"];

fn classes_list(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let Some(conn) = state.db.as_ref() else {
        return Ok(json!({ "classes": [] }));
    };

    // Correlated subqueries avoid double-counting from joins.
    let mut stmt = conn
        .prepare(
            "SELECT
               c.id,
               c.name,
               c.level,
               (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count,
               (SELECT COUNT(*) FROM subjects sj WHERE sj.class_id = c.id) AS subject_count,
               (SELECT COUNT(*) FROM exams e WHERE e.class_id = c.id) AS exam_count
             FROM classes c
             ORDER BY c.name",
        )
        .map_err(|e| db_failed(req, "db_query_failed", e))?;

    let classes = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let level: String = row.get(2)?;
            let student_count: i64 = row.get(3)?;
            let subject_count: i64 = row.get(4)?;
            let exam_count: i64 = row.get(5)?;
            Ok(json!({
                "id": id,
                "name": name,
                "level": level,
                "studentCount": student_count,
                "subjectCount": subject_count,
                "examCount": exam_count
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| db_failed(req, "db_query_failed", e))?;

    Ok(json!({ "classes": classes }))
}

fn classes_create(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let name = required_text(req, "name")?;
    let level = optional_str(req, "level")?
        .map(|s| s.to_ascii_uppercase())
        .unwrap_or_else(|| "A".to_string());
    if !SUPPORTED_LEVELS.contains(&level.as_str()) {
        return Err(err(
            &req.id,
            "bad_params",
            "only A-Level classes are supported",
            Some(json!({ "level": level })),
        ));
    }

    let class_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO classes(id, name, level) VALUES(?, ?, ?)",
        (&class_id, &name, &level),
    )
    .map_err(|e| {
        err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "classes" })),
        )
    })?;

    info!(class_id = %class_id, "class created");
    Ok(json!({ "classId": class_id, "name": name, "level": level }))
}

fn classes_delete(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let class_id = required_str(req, "classId")?;
    ensure_class(conn, req, &class_id)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| err(&req.id, "db_tx_failed", e.to_string(), None))?;

    // Dependency order; there is no ON DELETE CASCADE.
    let steps: [(&str, &str); 5] = [
        (
            "marks",
            "DELETE FROM marks WHERE exam_id IN (SELECT id FROM exams WHERE class_id = ?)",
        ),
        ("exams", "DELETE FROM exams WHERE class_id = ?"),
        ("subjects", "DELETE FROM subjects WHERE class_id = ?"),
        ("students", "DELETE FROM students WHERE class_id = ?"),
        ("classes", "DELETE FROM classes WHERE id = ?"),
    ];
    for (table, sql) in steps {
        if let Err(e) = tx.execute(sql, [&class_id]) {
            let _ = tx.rollback();
            return Err(err(
                &req.id,
                "db_delete_failed",
                e.to_string(),
                Some(json!({ "table": table })),
            ));
        }
    }
    tx.commit()
        .map_err(|e| err(&req.id, "db_commit_failed", e.to_string(), None))?;

    info!(class_id = %class_id, "class deleted");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "classes.list" => classes_list(state, req),
        "classes.create" => classes_create(state, req),
        "classes.delete" => classes_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
