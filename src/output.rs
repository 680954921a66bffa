use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context;
use csv::{QuoteStyle, WriterBuilder};

use crate::job_search::JobRecord;

pub trait OutputSink {
    /// Writes one batch. Nothing is buffered between calls.
    fn append(&mut self, records: &[JobRecord]) -> anyhow::Result<()>;
}

/// Append-only CSV file. The file is opened for each batch and closed again
/// before `append` returns, so an interrupted run loses at most the batch in
/// flight.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for CsvSink {
    fn append(&mut self, records: &[JobRecord]) -> anyhow::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        // Header goes in once, when the file is started.
        let is_new = file.metadata()?.len() == 0;

        // Every column is text, so every field is quoted. Quotes are
        // doubled; backslashes are escaped by hand since the writer only
        // applies its escape character to quotes.
        let mut writer = WriterBuilder::new()
            .has_headers(is_new)
            .quote_style(QuoteStyle::Always)
            .from_writer(file);
        for record in records {
            writer.serialize(escape_backslashes(record))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

fn escape_backslashes(record: &JobRecord) -> JobRecord {
    let escape = |text: &str| text.replace('\\', "\\\\");
    JobRecord {
        id: escape(&record.id),
        site: record.site,
        title: escape(&record.title),
        company: escape(&record.company),
        location: escape(&record.location),
        job_url: escape(&record.job_url),
        date_posted: escape(&record.date_posted),
        description: escape(&record.description),
    }
}
