use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::warn;

use crate::trace::trace::FormTraceEvent;

/// JSON-lines sink for form events. Every event is one line, flushed as it
/// is written. A sink that cannot be written drops the event with a warning;
/// tracing never fails a form operation.
#[derive(Debug, Default)]
pub struct TraceLogger {
    sink: Option<Mutex<LineWriter<File>>>,
}

impl TraceLogger {
    /// Append to `path`, creating it if needed. An unopenable path yields a
    /// disabled logger.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                sink: Some(Mutex::new(LineWriter::new(file))),
            },
            Err(e) => {
                warn!("could not open trace file '{}': {}", path.display(), e);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, event: &FormTraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = append_event(sink, event) {
            warn!(event = %event.event, "dropped trace event: {}", e);
        }
    }
}

fn append_event(sink: &Mutex<LineWriter<File>>, event: &FormTraceEvent) -> io::Result<()> {
    let mut out = sink
        .lock()
        .map_err(|_| io::Error::other("trace sink lock poisoned"))?;
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")
}
