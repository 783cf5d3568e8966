use crate::config::EnforcerConfig;
use crate::learning::LearningStore;
use anyhow::Result;
use std::io::{self, Write};
use std::path::PathBuf;

pub fn handle_learn(config: &EnforcerConfig, store: Option<PathBuf>, json: bool) -> Result<()> {
    let path = store.unwrap_or_else(|| config.learning.store_path.clone());
    let store = LearningStore::open(&path)?;
    let stats = store.category_stats();

    let mut out = io::stdout().lock();
    if json {
        let rows: Vec<serde_json::Value> = stats
            .iter()
            .map(|(category, s)| {
                serde_json::json!({
                    "category": category,
                    "successes": s.successes,
                    "failures": s.failures,
                    "success_rate": s.success_rate(),
                    "tier": s.tier(),
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    if stats.is_empty() {
        writeln!(out, "No learning records in {}", path.display())?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<32} {:>9} {:>9} {:>7}  tier",
        "category", "successes", "failures", "rate"
    )?;
    for (category, s) in &stats {
        writeln!(
            out,
            "{:<32} {:>9} {:>9} {:>6.0}%  {}",
            category,
            s.successes,
            s.failures,
            s.success_rate() * 100.0,
            s.tier()
        )?;
    }
    Ok(())
}
