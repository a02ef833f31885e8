use crate::crawler::Request;
use crate::output::traits::{ConsumerResult, ResultConsumer};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

#[derive(Serialize)]
struct Line<'a, T> {
    url: &'a str,
    result: &'a T,
}

/// Appends each result to a file as one JSON object per line
///
/// Lines look like `{"url":"...","result":...}`.
pub struct JsonLinesConsumer {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesConsumer {
    /// Opens (or creates) `path` for appending
    pub fn new(path: impl AsRef<Path>) -> ConsumerResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl<T: Serialize> ResultConsumer<T> for JsonLinesConsumer {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn handle(&self, request: &Request, item: &T) -> ConsumerResult<()> {
        let line = serde_json::to_string(&Line {
            url: request.url().as_str(),
            result: item,
        })?;

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    fn close(&self) -> ConsumerResult<()> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()?;
        Ok(())
    }
}
