use crate::config::{self, GradingConfig};
use crate::ipc::error::err;
use crate::ipc::helpers::{db_conn, respond, HandlerResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::info;

fn grading_get(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let grading = config::load_grading(conn);
    Ok(json!({
        "config": grading.config,
        "overridden": grading.overridden,
        "defaults": GradingConfig::default()
    }))
}

fn grading_set(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let Some(raw) = req.params.get("config") else {
        return Err(err(&req.id, "bad_params", "missing config", None));
    };
    let cfg = GradingConfig::from_json(raw).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid grading config: {}", e),
            None,
        )
    })?;
    config::save_grading(conn, &cfg)
        .map_err(|e| err(&req.id, "db_update_failed", e.to_string(), None))?;

    info!(
        policy = ?cfg.principal_policy,
        bands = cfg.division_bands.len(),
        "grading config overridden"
    );
    Ok(json!({ "config": cfg, "overridden": true }))
}

fn grading_clear(state: &AppState, req: &Request) -> HandlerResult<serde_json::Value> {
    let conn = db_conn(state, req)?;
    let cleared = config::clear_grading(conn)
        .map_err(|e| err(&req.id, "db_delete_failed", e.to_string(), None))?;
    if cleared {
        info!("grading config reset to defaults");
    }
    Ok(json!({ "cleared": cleared }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let out = match req.method.as_str() {
        "settings.grading.get" => grading_get(state, req),
        "settings.grading.set" => grading_set(state, req),
        "settings.grading.clear" => grading_clear(state, req),
        _ => return None,
    };
    Some(respond(&req.id, out))
}
