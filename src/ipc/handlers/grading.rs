use crate::config;
use crate::grading::{division_for, parse_marks, points_for};
use crate::ipc::error::err;
use crate::ipc::helpers::{respond, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const PREVIEW_MAX_VALUES: usize = 1000;

/// Grading table in effect: the workspace override if one is open,
/// otherwise the defaults.
fn resolved(state: &AppState) -> config::ResolvedGrading {
    match state.db.as_ref() {
        Some(conn) => config::load_grading(conn),
        None => config::ResolvedGrading {
            config: config::GradingConfig::default(),
            table: Default::default(),
            overridden: false,
        },
    }
}

/// Raw marks in, grade and points out. Bad values come back with a status
/// instead of failing the request.
fn grading_preview(_state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let Some(values) = req.params.get("marks").and_then(|v| v.as_array()) else {
        return Err(err(&req.id, "bad_params", "marks must be an array", None));
    };
    if values.len() > PREVIEW_MAX_VALUES {
        return Err(err(
            &req.id,
            "bad_params",
            format!("too many values (max {})", PREVIEW_MAX_VALUES),
            None,
        ));
    }

    let rows: Vec<serde_json::Value> = values
        .iter()
        .map(|raw| {
            let entry = parse_marks(raw);
            let outcome = entry.grade();
            json!({
                "input": raw,
                "marks": entry.marks(),
                "grade": outcome.grade(),
                "gradeLabel": outcome.label(),
                "points": outcome.points(),
                "status": outcome.status()
            })
        })
        .collect();
    Ok(json!({ "results": rows }))
}

fn grading_division(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let grading = resolved(state);

    // Either summed points, or grade letters to sum here.
    let points: Option<i64> = if let Some(letters) = req.params.get("grades") {
        let Some(letters) = letters.as_array() else {
            return Err(err(&req.id, "bad_params", "grades must be an array", None));
        };
        let letters: Option<Vec<&str>> = letters.iter().map(|v| v.as_str()).collect();
        let Some(letters) = letters else {
            return Err(err(
                &req.id,
                "bad_params",
                "grades must contain only strings",
                None,
            ));
        };
        if letters.len() < 3 {
            None
        } else {
            let mut pts: Vec<i64> = letters.iter().map(|l| i64::from(points_for(l))).collect();
            pts.sort_unstable();
            Some(pts.iter().take(3).sum())
        }
    } else {
        match req.params.get("points") {
            None => return Err(err(&req.id, "bad_params", "missing points", None)),
            Some(v) if v.is_null() => None,
            Some(v) => Some(v.as_i64().ok_or_else(|| {
                err(&req.id, "bad_params", "points must be an integer or null", None)
            })?),
        }
    };

    let outcome = division_for(points, &grading.table);
    Ok(json!({
        "bestThreePoints": points,
        "division": outcome,
        "divisionLabel": outcome.label(),
        "incomplete": outcome.division().is_none()
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "grading.preview" => grading_preview(state, req),
        "grading.division" => grading_division(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
