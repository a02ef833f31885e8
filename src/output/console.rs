use crate::crawler::Request;
use crate::output::traits::{ConsumerResult, ResultConsumer};
use std::fmt::Debug;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Prints each result on its own line as `<url> <result:?>`
pub struct ConsoleConsumer {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleConsumer {
    /// Writes to standard output
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Writes to any sink, e.g. a buffer in tests
    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }
}

impl Default for ConsoleConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> ResultConsumer<T> for ConsoleConsumer {
    fn name(&self) -> &str {
        "console"
    }

    fn handle(&self, request: &Request, item: &T) -> ConsumerResult<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{} {:?}", request.url(), item)?;
        Ok(())
    }

    fn close(&self) -> ConsumerResult<()> {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()?;
        Ok(())
    }
}
