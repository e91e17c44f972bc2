//! HTML summary page.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::Result;
use std::path::Path;

use adaptest_core::record::SessionLog;
use adaptest_core::statistics::SessionStats;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

/// Generate an HTML summary from a session log.
pub fn generate_html(log: &SessionLog) -> String {
    let stats = SessionStats::from_log(log, None);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let title = log.participant.as_deref().unwrap_or("anonymous");
    html.push_str(&format!(
        "<title>adaptest results: {}</title>\n",
        html_escape(title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>adaptest results</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Participant: <strong>{}</strong> | {} of {} questions | {}</p>\n",
        html_escape(title),
        log.records.len(),
        log.quota,
        log.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n<tbody>\n");
    let rows = [
        ("Final score", log.final_score.to_string()),
        ("Final level", html_escape(log.final_level.as_str())),
        (
            "First-try correct",
            format!(
                "{} ({:.1}%)",
                stats.first_try_correct,
                stats.first_try_rate * 100.0
            ),
        ),
        (
            "Help taken",
            format!(
                "{} (hint {}, example {})",
                stats.help_taken, stats.hint_count, stats.example_count
            ),
        ),
        ("Correct after help", stats.correct_after_help.to_string()),
        ("Help timeouts", stats.help_timeouts.to_string()),
        (
            "Mean first-answer time",
            stats
                .mean_initial_time
                .map(|t| format!("{t:.1}s"))
                .unwrap_or_else(|| "-".into()),
        ),
    ];
    for (label, value) in rows {
        html.push_str(&format!("<tr><th>{label}</th><td>{value}</td></tr>\n"));
    }
    html.push_str("</tbody></table>\n");

    if !stats.score_trajectory.is_empty() {
        html.push_str(&generate_score_chart(&stats.score_trajectory));
    }
    html.push_str("</section>\n");

    // Per-question records
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\">\n");
    html.push_str("<thead><tr><th>#</th><th>Question</th><th>Level</th><th>First answer</th><th>Confidence</th><th>Time</th><th>Help</th><th>Second answer</th><th>Outcome</th><th>Score</th><th>Level after</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for r in &log.records {
        let class = if r.outcome.is_correct() { "pass" } else { "fail" };
        let help = match (r.hint_binary, r.example_binary) {
            (1, _) => "hint",
            (_, 1) => "example",
            _ => "-",
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            r.number,
            html_escape(&r.question),
            html_escape(r.level.as_str()),
            html_escape(&or_dash(r.initial_answer.as_deref())),
            or_dash(r.confidence),
            or_dash(r.initial_time.map(|t| format!("{t:.2}s"))),
            help,
            html_escape(&or_dash(r.second_answer.as_deref())),
            r.outcome,
            r.score_after,
            html_escape(r.level_after.as_str()),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML summary to a file.
pub fn write_html_report(log: &SessionLog, path: &Path) -> Result<()> {
    let html = generate_html(log);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// One bar per question, above or below a zero line.
fn generate_score_chart(scores: &[i32]) -> String {
    let bar_width = 24;
    let gap = 6;
    let unit = 4;

    let max = scores.iter().copied().max().unwrap_or(0).max(0);
    let min = scores.iter().copied().min().unwrap_or(0).min(0);
    let zero_y = (max * unit) as usize + 20;
    let height = ((max - min) * unit) as usize + 40;
    let width = scores.len() * (bar_width + gap) + gap;

    let mut svg = format!(
        "<svg width=\"{width}\" height=\"{height}\" xmlns=\"http://www.w3.org/2000/svg\">\n"
    );
    svg.push_str(&format!(
        "  <line x1=\"0\" y1=\"{zero_y}\" x2=\"{width}\" y2=\"{zero_y}\" stroke=\"currentColor\"/>\n"
    ));

    for (i, score) in scores.iter().enumerate() {
        let x = i * (bar_width + gap) + gap;
        let h = (score.unsigned_abs() as usize) * unit as usize;
        let (y, color) = if *score >= 0 {
            (zero_y - h, "#22c55e")
        } else {
            (zero_y, "#ef4444")
        };
        svg.push_str(&format!(
            "  <rect x=\"{x}\" y=\"{y}\" width=\"{bar_width}\" height=\"{h}\" fill=\"{color}\" rx=\"3\"><title>Q{}: {score}</title></rect>\n",
            i + 1
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
table.summary { width: auto; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
svg { margin: 1rem 0; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::ladder::Level;
    use adaptest_core::model::Confidence;
    use adaptest_core::policy::Outcome;
    use adaptest_core::record::QuestionRecord;

    fn make_log() -> SessionLog {
        SessionLog {
            id: uuid::Uuid::nil(),
            participant: Some("Grace <Hopper>".into()),
            started_at: chrono::Utc::now(),
            finished_at: chrono::Utc::now(),
            quota: 2,
            final_score: 3,
            final_level: Level::new("B1"),
            records: vec![
                QuestionRecord {
                    number: 1,
                    question: "Which is <b>bold</b>?".into(),
                    level: Level::new("B1"),
                    initial_answer: Some("cat".into()),
                    confidence: Some(Confidence::Low),
                    initial_time: Some(4.2),
                    hint_binary: 0,
                    example_binary: 0,
                    second_answer: None,
                    second_time: None,
                    outcome: Outcome::CorrectFirstTry,
                    score_after: 5,
                    level_after: Level::new("B2"),
                },
                QuestionRecord {
                    number: 2,
                    question: "Second".into(),
                    level: Level::new("B2"),
                    initial_answer: Some("dog".into()),
                    confidence: Some(Confidence::High),
                    initial_time: Some(30.0),
                    hint_binary: 0,
                    example_binary: 1,
                    second_answer: Some("dog".into()),
                    second_time: Some(12.0),
                    outcome: Outcome::WrongAfterExample,
                    score_after: 3,
                    level_after: Level::new("B1"),
                },
            ],
            duration_ms: 1000,
        }
    }

    #[test]
    fn html_contains_required_elements() {
        let html = generate_html(&make_log());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Grace &lt;Hopper&gt;"));
        assert!(html.contains("Which is &lt;b&gt;bold&lt;/b&gt;?"));
        assert!(html.contains("wrong with example"));
        assert!(html.contains("<svg"));
        assert!(!html.contains("<b>bold"));
    }

    #[test]
    fn chart_handles_negative_scores() {
        let svg = generate_score_chart(&[-2, -4, 1]);
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("#ef4444"));
    }

    #[test]
    fn html_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.html");

        write_html_report(&make_log(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
