use crate::config;
use crate::ipc::error::results_err;
use crate::ipc::helpers::{db_conn, optional_bool, required_str, respond, to_result, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::results;

fn results_student(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let exam_id = required_str(req, "examId")?;
    let student_id = required_str(req, "studentId")?;

    let ctx = results::load_exam_context(conn, &exam_id).map_err(|e| results_err(&req.id, e))?;
    let grading = config::load_grading(conn);
    let result =
        results::student_result(&ctx, &student_id, &grading).map_err(|e| results_err(&req.id, e))?;

    let mut out = to_result(req, &result)?;
    out["exam"] = to_result(req, &ctx.exam)?;
    Ok(out)
}

fn results_class(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let exam_id = required_str(req, "examId")?;
    let include_inactive = optional_bool(req, "includeInactive")?.unwrap_or(false);

    let ctx = results::load_exam_context(conn, &exam_id).map_err(|e| results_err(&req.id, e))?;
    let grading = config::load_grading(conn);
    to_result(req, &results::class_results(&ctx, &grading, include_inactive))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "results.student" => results_student(state, req),
        "results.class" => results_class(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
