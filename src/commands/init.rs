use crate::config::CONFIG_FILE_NAME;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub(crate) const DEFAULT_CONFIG: &str = r#"# Enforcer configuration

[thresholds]
max_method_lines = 50
max_file_lines = 300
max_params = 5
max_nesting = 4
max_public_methods = 20
max_line_length = 120

# Extra literal rules on top of the built-in catalog
# [[rules]]
# name = "no-puts"
# pattern = "\\bputs\\b"
# principle = "CLARITY"
# severity = "info"
# message = "Use the logger instead of puts"

[smells.fixes]
god_class = "Split the class along its responsibilities"

[conceptual]
sample_size = 3
seed = 0

[ignore]
patterns = [
    "vendor/**",
    "db/schema.rb",
    "tmp/**",
]

[learning]
store_path = ".enforcer/learnings.jsonl"
"#;

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {CONFIG_FILE_NAME} configuration file");

    Ok(())
}
