use crate::db;
use crate::grading::{DivisionBand, DivisionTable, PrincipalPolicy};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

pub const GRADING_CONFIG_KEY: &str = "grading.config";

const LOG_ENV: &str = "RESULTSD_LOG";
const WORKSPACE_ENV: &str = "RESULTSD_WORKSPACE";

/// Process-level settings read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_filter: String,
    pub workspace: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let log_filter = std::env::var(LOG_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());
        let workspace = std::env::var_os(WORKSPACE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            log_filter,
            workspace,
        }
    }
}

/// Per-workspace grading settings, stored as JSON under `grading.config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingConfig {
    #[serde(default = "default_bands")]
    pub division_bands: Vec<DivisionBand>,
    #[serde(default)]
    pub principal_policy: PrincipalPolicy,
}

fn default_bands() -> Vec<DivisionBand> {
    DivisionTable::default().bands().to_vec()
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            division_bands: default_bands(),
            principal_policy: PrincipalPolicy::default(),
        }
    }
}

impl GradingConfig {
    pub fn division_table(&self) -> anyhow::Result<DivisionTable> {
        DivisionTable::new(self.division_bands.clone())
    }

    pub fn from_json(value: &serde_json::Value) -> anyhow::Result<Self> {
        let cfg: GradingConfig = serde_json::from_value(value.clone())?;
        cfg.division_table()?;
        Ok(cfg)
    }
}

/// Loaded config plus whether it came from the workspace or the defaults.
#[derive(Debug, Clone)]
pub struct ResolvedGrading {
    pub config: GradingConfig,
    pub table: DivisionTable,
    pub overridden: bool,
}

/// Never fails: unreadable or invalid stored settings fall back to defaults.
pub fn load_grading(conn: &Connection) -> ResolvedGrading {
    let stored = match db::settings_get_json(conn, GRADING_CONFIG_KEY) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "failed to read grading config; using defaults");
            None
        }
    };
    if let Some(raw) = stored {
        match GradingConfig::from_json(&raw).and_then(|c| Ok((c.division_table()?, c))) {
            Ok((table, config)) => {
                return ResolvedGrading {
                    config,
                    table,
                    overridden: true,
                }
            }
            Err(e) => warn!(error = %e, "stored grading config is invalid; using defaults"),
        }
    }
    ResolvedGrading {
        config: GradingConfig::default(),
        table: DivisionTable::default(),
        overridden: false,
    }
}

pub fn save_grading(conn: &Connection, cfg: &GradingConfig) -> anyhow::Result<()> {
    cfg.division_table()?;
    db::settings_set_json(conn, GRADING_CONFIG_KEY, &serde_json::to_value(cfg)?)
}

pub fn clear_grading(conn: &Connection) -> anyhow::Result<bool> {
    db::settings_delete(conn, GRADING_CONFIG_KEY)
}
