//! The `adaptest init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("adaptest.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("question-banks").context("failed to create question-banks/")?;
    write_if_missing(Path::new("question-banks/sample.json"), SAMPLE_BANK)?;

    println!("\nNext steps:");
    println!("  1. Add questions to question-banks/sample.json");
    println!("  2. Run: adaptest validate --bank question-banks/sample.json");
    println!("  3. Run: adaptest run --name \"Your Name\"");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

quota = 20
levels = ["B1", "B2", "C1", "C2"]
# start_level = "B1"
bank = "question-banks/sample.json"
output_dir = "./adaptest-results"
formats = ["csv", "json"]
# seed = 42
tick_interval_ms = 500

[timing]
ask_budget_secs = 180
auto_escalate_secs = 178
reward_deadline_secs = 120
help_window_secs = 60
"#;

const SAMPLE_BANK: &str = r#"[
  {
    "level": "B1",
    "question": "She ___ to work by bus every day.",
    "options": ["go", "goes", "going", "gone"],
    "answer": "goes",
    "hint": "Third person singular in the present simple.",
    "example": "He walks to school every morning."
  },
  {
    "level": "B2",
    "question": "If I ___ more time, I would learn Japanese.",
    "options": ["have", "had", "will have", "would have"],
    "answer": "had",
    "hint": "Second conditional: if + past simple.",
    "example": "If she lived closer, she would visit more often."
  },
  {
    "level": "C1",
    "question": "Not until the results were published ___ the scale of the problem.",
    "options": ["we realised", "did we realise", "we did realise", "realised we"],
    "answer": "did we realise",
    "hint": "Negative adverbials at the start of a sentence trigger inversion.",
    "example": "Only then did they understand what had happened."
  },
  {
    "level": "C2",
    "question": "The minister's remarks were widely seen as ___ to the negotiations.",
    "options": ["detrimental", "detriment", "detrimentally", "detrimented"],
    "answer": "detrimental",
    "hint": "An adjective is needed after 'seen as'.",
    "example": "Lack of sleep is detrimental to your health."
  }
]
"#;
