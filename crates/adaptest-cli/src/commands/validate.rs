//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::bank::{load_bank_file, validate_bank};
use adaptest_core::config::load_config_from;

pub fn execute(bank_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let ladder = config.ladder()?;
    let bank = load_bank_file(&bank_path, &ladder)?;

    println!(
        "Question bank: {} ({} questions)",
        bank_path.display(),
        bank.len()
    );
    for (level, count) in bank.level_counts(&ladder) {
        println!("  {level}: {count}");
    }

    let warnings = validate_bank(&bank, &ladder);
    for w in &warnings {
        let prefix = w
            .level
            .as_ref()
            .map(|level| format!("  [{level}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All question banks valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
