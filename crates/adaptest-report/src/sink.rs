//! File-backed export sink.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use adaptest_core::error::AssessError;
use adaptest_core::record::SessionLog;
use adaptest_core::traits::ExportSink;

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Json,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Html];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }

    /// Parse a list of format names. `all` expands to every format;
    /// duplicates are dropped, first occurrence wins.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<ExportFormat>, AssessError> {
        let mut formats = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            let parsed = if name.eq_ignore_ascii_case("all") {
                Self::ALL.to_vec()
            } else {
                vec![name.parse()?]
            };
            for format in parsed {
                if !formats.contains(&format) {
                    formats.push(format);
                }
            }
        }
        if formats.is_empty() {
            return Err(AssessError::InvalidConfig(
                "at least one output format is required".into(),
            ));
        }
        Ok(formats)
    }

    fn write(self, log: &SessionLog, path: &Path) -> Result<()> {
        match self {
            ExportFormat::Csv => crate::csv::write_csv_report(log, path),
            ExportFormat::Json => log.save_json(path),
            ExportFormat::Html => crate::html::write_html_report(log, path),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AssessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            other => Err(AssessError::InvalidConfig(format!(
                "unknown output format: {other}"
            ))),
        }
    }
}

/// Writes one file per configured format into `output_dir`.
pub struct FileExportSink {
    output_dir: PathBuf,
    formats: Vec<ExportFormat>,
}

impl FileExportSink {
    pub fn new(output_dir: impl Into<PathBuf>, formats: Vec<ExportFormat>) -> Self {
        Self {
            output_dir: output_dir.into(),
            formats,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `results-{slug}-{timestamp}` or `results-{timestamp}` when anonymous.
    fn file_stem(log: &SessionLog) -> String {
        let timestamp = Utc::now().format("%Y-%m-%dT%H%M%S");
        match log.participant_slug() {
            Some(slug) => format!("results-{slug}-{timestamp}"),
            None => format!("results-{timestamp}"),
        }
    }
}

#[async_trait]
impl ExportSink for FileExportSink {
    async fn export(&self, log: &SessionLog) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir)?;
        let stem = Self::file_stem(log);

        let mut written = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            let path = self
                .output_dir
                .join(format!("{stem}.{}", format.extension()));
            format.write(log, &path)?;
            tracing::debug!(format = %format, path = %path.display(), "wrote export file");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::ladder::Level;

    fn make_log(participant: Option<&str>) -> SessionLog {
        SessionLog {
            id: uuid::Uuid::new_v4(),
            participant: participant.map(str::to_string),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            quota: 0,
            final_score: 0,
            final_level: Level::new("B1"),
            records: vec![],
            duration_ms: 0,
        }
    }

    #[test]
    fn parse_format_list() {
        let formats = ExportFormat::parse_list(&["csv", "HTML"]).unwrap();
        assert_eq!(formats, vec![ExportFormat::Csv, ExportFormat::Html]);

        let all = ExportFormat::parse_list(&["json", "all"]).unwrap();
        assert_eq!(
            all,
            vec![ExportFormat::Json, ExportFormat::Csv, ExportFormat::Html]
        );
    }

    #[test]
    fn unknown_format_is_config_error() {
        let err = ExportFormat::parse_list(&["xlsx"]).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("xlsx"));

        let err = ExportFormat::parse_list::<&str>(&[]).unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn exports_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileExportSink::new(dir.path().join("out"), ExportFormat::ALL.to_vec());

        let paths = sink.export(&make_log(Some("Ada Lovelace"))).await.unwrap();

        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert!(path.exists());
            let name = path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("results-ada_lovelace-"), "{name}");
        }
        let loaded = SessionLog::load_json(&paths[1]).unwrap();
        assert_eq!(loaded.participant.as_deref(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn participant_name_cannot_leave_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let sink = FileExportSink::new(&out, vec![ExportFormat::Csv, ExportFormat::Json]);

        for name in ["Smith/Jones", "../x", "x/../../../tmp/p"] {
            let paths = sink.export(&make_log(Some(name))).await.unwrap();
            for path in &paths {
                assert_eq!(path.parent(), Some(out.as_path()), "{}", path.display());
                assert!(path.exists());
            }
        }
        let entries = std::fs::read_dir(&out).unwrap().count();
        assert!(entries >= 2);
        assert!(std::fs::read_dir(&out)
            .unwrap()
            .all(|e| e.unwrap().path().is_file()));
    }

    #[tokio::test]
    async fn anonymous_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileExportSink::new(dir.path(), vec![ExportFormat::Csv]);

        let paths = sink.export(&make_log(None)).await.unwrap();

        let name = paths[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("results-20"), "{name}");
        assert!(name.ends_with(".csv"));
    }
}
