use crate::config;
use crate::ipc::error::results_err;
use crate::ipc::helpers::{db_conn, required_str, respond, to_result, HandlerResult};
use crate::ipc::types::{AppState, Request};
use crate::results;

fn reports_subject_distribution(
    state: &AppState,
    req: &Request,
) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let exam_id = required_str(req, "examId")?;
    let subject_id = required_str(req, "subjectId")?;

    let ctx = results::load_exam_context(conn, &exam_id).map_err(|e| results_err(&req.id, e))?;
    let report = results::subject_report(&ctx, &subject_id).map_err(|e| results_err(&req.id, e))?;
    to_result(req, &report)
}

fn reports_exam_summary(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let exam_id = required_str(req, "examId")?;

    let ctx = results::load_exam_context(conn, &exam_id).map_err(|e| results_err(&req.id, e))?;
    let grading = config::load_grading(conn);
    to_result(req, &results::exam_summary(&ctx, &grading))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "reports.subjectDistribution" => reports_subject_distribution(state, req),
        "reports.examSummary" => reports_exam_summary(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
