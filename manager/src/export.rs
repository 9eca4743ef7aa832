use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use crisis::{GameReport, GameResult, GameState};

#[derive(serde::Serialize)]
struct ExportData<'a> {
    game_state: &'a GameState,
    game_result: &'a GameResult,
    export_timestamp: DateTime<Utc>,
}

pub fn file_name(report: &GameReport) -> String {
    let id = report.state.game_id.simple().to_string();
    format!("emergency_response_{}.json", &id[..8])
}

/// Writes the finished game to `<dir>/emergency_response_<id8>.json`.
pub fn save(dir: impl AsRef<Path>, report: &GameReport) -> anyhow::Result<PathBuf> {
    let path = dir.as_ref().join(file_name(report));
    let export_data = ExportData {
        game_state: &report.state,
        game_result: &report.result,
        export_timestamp: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&export_data)?;
    std::fs::write(&path, json)?;
    Ok(path)
}
