use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use weber_core::TrialRecord;

use crate::error::SinkError;

/// Receives every scored gameplay trial
pub trait TrialSink {
    fn record_trial(&mut self, record: &TrialRecord) -> Result<(), SinkError>;
}

/// One JSON object per line, flushed after each trial
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Appends to `path`, creating it if needed.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TrialSink for JsonLinesSink<W> {
    fn record_trial(&mut self, record: &TrialRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<TrialRecord>,
}

impl TrialSink for MemorySink {
    fn record_trial(&mut self, record: &TrialRecord) -> Result<(), SinkError> {
        self.records.push(record.clone());
        Ok(())
    }
}
