//! The `adaptest summary` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::config::load_config_from;
use adaptest_core::record::SessionLog;
use adaptest_core::statistics::SessionStats;

pub fn execute(log_path: PathBuf, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let ladder = load_config_from(config_path.as_deref())?.ladder()?;
    let log = SessionLog::load_json(&log_path)?;
    let stats = SessionStats::from_log(&log, Some(&ladder));

    match format.as_str() {
        "markdown" | "md" => println!("{}", to_markdown(&log, &stats)),
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        "text" => print_text(&log, &stats),
        other => anyhow::bail!("unknown summary format: '{other}' (expected text, json, markdown)"),
    }

    Ok(())
}

fn print_text(log: &SessionLog, stats: &SessionStats) {
    let who = log.participant.as_deref().unwrap_or("anonymous");
    println!(
        "Session {} ({who}): {} of {} questions",
        log.id, stats.questions, log.quota
    );
    println!(
        "Final score {} at level {}",
        log.final_score, log.final_level
    );
    println!(
        "First-try correct: {} ({:.1}%)",
        stats.first_try_correct,
        stats.first_try_rate * 100.0
    );
    println!(
        "Help taken: {} (hint {}, example {}), correct after help {}, timeouts {}",
        stats.help_taken,
        stats.hint_count,
        stats.example_count,
        stats.correct_after_help,
        stats.help_timeouts
    );
    if let Some(t) = stats.mean_initial_time {
        println!("Mean first-answer time: {t:.1}s");
    }
    if let Some(peak) = &stats.peak_level {
        println!("Peak level: {peak}");
    }
    if !stats.per_level.is_empty() {
        println!("\nQuestions per level:");
        for (level, count) in &stats.per_level {
            println!("  {level}: {count}");
        }
    }
}

fn to_markdown(log: &SessionLog, stats: &SessionStats) -> String {
    let mut md = String::new();
    md.push_str("## Session Summary\n\n");
    md.push_str(&format!(
        "**Final score:** {} | **Final level:** {} | **Questions:** {}/{}\n\n",
        log.final_score, log.final_level, stats.questions, log.quota
    ));
    md.push_str("| Metric | Value |\n|---|---|\n");
    md.push_str(&format!(
        "| First-try correct | {} ({:.1}%) |\n",
        stats.first_try_correct,
        stats.first_try_rate * 100.0
    ));
    md.push_str(&format!("| Hints | {} |\n", stats.hint_count));
    md.push_str(&format!("| Examples | {} |\n", stats.example_count));
    md.push_str(&format!(
        "| Correct after help | {} |\n",
        stats.correct_after_help
    ));
    md.push_str(&format!("| Help timeouts | {} |\n", stats.help_timeouts));
    if let Some(peak) = &stats.peak_level {
        md.push_str(&format!("| Peak level | {peak} |\n"));
    }

    if !log.records.is_empty() {
        md.push_str("\n| # | Level | Outcome | Score |\n|---|---|---|---|\n");
        for r in &log.records {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                r.number, r.level, r.outcome, r.score_after
            ));
        }
    }
    md
}
