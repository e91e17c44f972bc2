//! The `adaptest run` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use adaptest_core::bank::{load_bank_file, validate_bank};
use adaptest_core::clock::SystemClock;
use adaptest_core::config::load_config_from;
use adaptest_core::driver::{SessionDriver, SessionOptions};
use adaptest_core::engine::StageEngine;
use adaptest_core::model::{
    Confidence, EscalationReason, HelpModality, SessionEvent, StageView, Transition,
};
use adaptest_core::record::{QuestionRecord, SessionLog};
use adaptest_core::traits::{ExportSink, Presenter, ProgressReporter};
use adaptest_core::AssessError;
use adaptest_report::{ExportFormat, FileExportSink};

/// Command-line overrides for the loaded config.
pub struct RunArgs {
    pub bank: Option<PathBuf>,
    pub quota: Option<u32>,
    pub name: Option<String>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(bank) = args.bank {
        config.bank = Some(bank);
    }
    if let Some(quota) = args.quota {
        config.quota = quota;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if let Some(format) = &args.format {
        config.formats = format.split(',').map(|s| s.trim().to_string()).collect();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    // Fail on bad formats before the session, not after it
    let formats = ExportFormat::parse_list(config.formats.as_slice())?;

    let bank_path = config
        .bank
        .clone()
        .context("no question bank given; pass --bank or set `bank` in adaptest.toml")?;
    let ladder = config.ladder()?;
    let bank = load_bank_file(&bank_path, &ladder)?;
    for w in validate_bank(&bank, &ladder) {
        tracing::warn!(level = ?w.level, "{}", w.message);
    }

    let start_level = config.start_level()?;
    let engine = StageEngine::new(ladder, config.timing.policy());
    let mut driver = SessionDriver::new(Arc::new(bank), engine, Arc::new(SystemClock))
        .with_tick_interval(config.tick_interval());
    if let Some(seed) = config.seed {
        driver = driver.with_seed(seed);
    }

    let sink = AnnouncingSink {
        inner: FileExportSink::new(&config.output_dir, formats),
    };
    let options = SessionOptions {
        quota: config.quota,
        start_level,
        participant: args.name,
    };

    println!(
        "adaptest v{}: {} questions, starting at {}",
        env!("CARGO_PKG_VERSION"),
        options.quota,
        options.start_level
    );

    let mut presenter = TerminalPresenter::new(spawn_stdin_reader());
    driver
        .run_session(options, &mut presenter, &ConsoleReporter, &sink)
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Terminal presentation
// ---------------------------------------------------------------------------

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Line-oriented presenter: renders to stdout, reads answers from a line channel.
pub struct TerminalPresenter {
    lines: mpsc::Receiver<String>,
    view: Option<StageView>,
}

impl TerminalPresenter {
    pub fn new(lines: mpsc::Receiver<String>) -> Self {
        Self { lines, view: None }
    }
}

#[async_trait]
impl Presenter for TerminalPresenter {
    async fn render(&mut self, view: &StageView) -> Result<()> {
        let Some(header) = header(view) else {
            return Ok(());
        };
        println!();
        println!("{header}");
        match view {
            StageView::Ask { text, options, .. } => {
                println!("{text}");
                print_options(options);
            }
            StageView::Help {
                text,
                options,
                assistance,
                ..
            } => {
                println!("{text}");
                print_options(options);
                if let Some((modality, body)) = assistance {
                    let label = match modality {
                        HelpModality::Hint => "Hint",
                        HelpModality::Example => "Example",
                    };
                    println!("{label}: {body}");
                }
            }
            StageView::Final => {}
        }
        prompt(view)?;
        self.view = Some(view.clone());
        Ok(())
    }

    async fn next_input(&mut self) -> Result<Option<SessionEvent>> {
        loop {
            // `recv` is cancel-safe; nothing else here awaits.
            let Some(line) = self.lines.recv().await else {
                return Ok(None);
            };
            let Some(view) = &self.view else {
                continue;
            };
            match parse_input(view, &line) {
                Ok(event) => return Ok(Some(event)),
                Err(msg) => {
                    println!("{msg}");
                    prompt(view)?;
                }
            }
        }
    }

    async fn feedback(&mut self, transition: &Transition) -> Result<()> {
        match transition {
            Transition::Waiting | Transition::HelpChosen(_) => {}
            Transition::AutoEscalated => println!("\nTime is up for a first answer."),
            Transition::Escalated { reason } => {
                let msg = match reason {
                    EscalationReason::Wrong => "Not quite.",
                    EscalationReason::Slow => "Correct, but over the time limit.",
                    EscalationReason::WrongAndSlow => "Not quite, and over the time limit.",
                };
                println!("{msg}");
            }
            Transition::Finalized {
                outcome,
                score_delta,
                level,
            } => println!("Result: {outcome} ({score_delta:+}), next level {level}"),
        }
        Ok(())
    }

    async fn rejected(&mut self, error: &AssessError) -> Result<()> {
        println!("Not accepted: {error}");
        if let Some(view) = &self.view {
            prompt(view)?;
        }
        Ok(())
    }
}

/// Status line for a stage. Views are only rendered on stage entry and after
/// a help choice, so the time shown is the limit from that point, not a
/// running countdown.
fn header(view: &StageView) -> Option<String> {
    match view {
        StageView::Ask {
            number,
            quota,
            score,
            level,
            remaining,
            ..
        } => Some(format!(
            "Question {number}/{quota} | level {level} | score {score} | answer within {}s",
            remaining.as_secs()
        )),
        StageView::Help { remaining, .. } => Some(format!(
            "Help stage | answer within {}s",
            remaining.as_secs()
        )),
        StageView::Final => None,
    }
}

fn print_options(options: &[String]) {
    for (i, option) in options.iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
}

fn prompt(view: &StageView) -> Result<()> {
    let text = match view {
        StageView::Ask { .. } => "Answer [number or text] [high|medium|low]: ",
        StageView::Help {
            assistance: None, ..
        } => "Choose (h)int or (e)xample: ",
        StageView::Help { .. } => "Answer: ",
        StageView::Final => return Ok(()),
    };
    print!("{text}");
    std::io::stdout().flush()?;
    Ok(())
}

/// Match an input against the options, by 1-based number or by text.
fn resolve_option(options: &[String], input: &str) -> Option<String> {
    if let Some(option) = input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
    {
        return Some(option.clone());
    }
    options
        .iter()
        .find(|o| o.trim().eq_ignore_ascii_case(input))
        .cloned()
}

/// Turn one input line into an event for the rendered stage.
fn parse_input(view: &StageView, line: &str) -> Result<SessionEvent, String> {
    let line = line.trim();
    if line.is_empty() {
        return Err("Please enter an option.".into());
    }
    let unknown = || format!("'{line}' is not one of the options.");

    match view {
        StageView::Ask { options, .. } => {
            if let Some(answer) = resolve_option(options, line) {
                return Ok(SessionEvent::SubmitAnswer {
                    answer,
                    confidence: Confidence::High,
                });
            }
            let (head, tail) = line.rsplit_once(char::is_whitespace).ok_or_else(unknown)?;
            let confidence = tail.parse::<Confidence>().map_err(|_| unknown())?;
            let answer = resolve_option(options, head.trim()).ok_or_else(unknown)?;
            Ok(SessionEvent::SubmitAnswer { answer, confidence })
        }
        StageView::Help {
            options,
            assistance,
            ..
        } => {
            if assistance.is_none() {
                if let Ok(modality) = line.parse::<HelpModality>() {
                    return Ok(SessionEvent::ChooseHelp(modality));
                }
            }
            resolve_option(options, line)
                .map(|answer| SessionEvent::SubmitSecondAnswer { answer })
                .ok_or_else(unknown)
        }
        StageView::Final => Err("No question is active.".into()),
    }
}

// ---------------------------------------------------------------------------
// Progress and export
// ---------------------------------------------------------------------------

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_question_start(&self, number: u32, quota: u32, level: &str) {
        tracing::debug!(number, quota, level, "question started");
    }

    fn on_question_complete(&self, record: &QuestionRecord) {
        let time = record
            .initial_time
            .map(|t| format!("{t:.1}s"))
            .unwrap_or_else(|| "no answer".into());
        eprintln!(
            "  Done: Q{} [{}] {} ({}) score {}",
            record.number, record.level, record.outcome, time, record.score_after
        );
    }

    fn on_input_rejected(&self, _error: &AssessError) {}

    fn on_session_complete(&self, log: &SessionLog) {
        println!(
            "\nFinal score: {} | final level: {}",
            log.final_score, log.final_level
        );
        print_summary(log);
        eprintln!(
            "Complete: {} questions ({:.1}s)",
            log.records.len(),
            log.duration_ms as f64 / 1000.0
        );
    }
}

fn print_summary(log: &SessionLog) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "#", "Level", "Answer", "Time", "Help", "Outcome", "Score", "Next",
    ]);

    for r in &log.records {
        let help = if r.hint_binary == 1 {
            "hint"
        } else if r.example_binary == 1 {
            "example"
        } else {
            "-"
        };
        table.add_row(vec![
            Cell::new(r.number),
            Cell::new(&r.level),
            Cell::new(r.initial_answer.as_deref().unwrap_or("-")),
            Cell::new(
                r.initial_time
                    .map(|t| format!("{t:.1}s"))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(help),
            Cell::new(r.outcome),
            Cell::new(r.score_after),
            Cell::new(&r.level_after),
        ]);
    }

    println!("{table}");
}

/// Writes the export files and tells the user where they went.
struct AnnouncingSink {
    inner: FileExportSink,
}

#[async_trait]
impl ExportSink for AnnouncingSink {
    async fn export(&self, log: &SessionLog) -> Result<Vec<PathBuf>> {
        let paths = self.inner.export(log).await.with_context(|| {
            format!(
                "failed to export results to {}",
                self.inner.output_dir().display()
            )
        })?;
        for path in &paths {
            eprintln!("Results saved to: {}", path.display());
        }
        Ok(paths)
    }
}
