use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Split a comma-separated CLI value, dropping blanks.
pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Read and parse a JSON override file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftline_game::EngineConfig;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" random, ,greedy,  steward ");
        assert_eq!(parts, vec!["random", "greedy", "steward"]);
    }

    #[test]
    fn load_json_reports_the_path() {
        let dir = std::env::temp_dir().join(format!("driftline-util-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("engine.json");
        std::fs::write(&good, r#"{"drift_chance": 0.5}"#).unwrap();
        let cfg: EngineConfig = load_json(&good).unwrap();
        assert!((cfg.drift_chance - 0.5).abs() < f64::EPSILON);

        let missing = dir.join("missing.json");
        let err = load_json::<EngineConfig>(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.json"));

        let bad = dir.join("bad.json");
        std::fs::write(&bad, "{ nope").unwrap();
        let err = load_json::<EngineConfig>(&bad).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
