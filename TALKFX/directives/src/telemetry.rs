use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Builder for directive telemetry sinks.
pub struct DirectiveTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
    sinks: Vec<Arc<dyn LogSink>>,
}

impl DirectiveTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::Debug,
            sinks: Vec::new(),
        }
    }

    /// Sets the JSON-lines log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Drops records below `level` from the file sink.
    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Adds an extra sink, e.g. a [`shared_logging::MemoryLogger`].
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Builds the telemetry handle.
    pub fn build(self) -> Result<DirectiveTelemetry> {
        let mut sinks = self.sinks;
        if let Some(path) = self.log_path {
            sinks.push(Arc::new(JsonLogger::new(path)?.with_min_level(self.min_level)));
        }
        Ok(DirectiveTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sinks,
            }),
        })
    }
}

/// Telemetry handle shared by the dispatcher and the ranker.
#[derive(Clone)]
pub struct DirectiveTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for DirectiveTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveTelemetry")
            .field("module", &self.inner.module)
            .field("sinks", &self.inner.sinks.len())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    sinks: Vec<Arc<dyn LogSink>>,
}

impl DirectiveTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> DirectiveTelemetryBuilder {
        DirectiveTelemetryBuilder::new(module)
    }

    /// Logs structured metadata to every sink. The first sink error is returned after all
    /// sinks were tried.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
        let mut first_error = None;
        for sink in &self.inner.sinks {
            if let Err(err) = sink.log(&record) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_logging::MemoryLogger;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_file_and_memory_sinks() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("directives.log");
        let memory = Arc::new(MemoryLogger::new(16));
        let telemetry = DirectiveTelemetry::builder("directives")
            .log_path(&path)
            .sink(memory.clone())
            .build()
            .unwrap();
        telemetry
            .log(
                LogLevel::Info,
                "directives.batch.parsed",
                json!({ "invocations": 2 }),
            )
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("directives.batch.parsed"));
        let records = memory.find("directives.batch.parsed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata["invocations"], 2);
    }

    #[test]
    fn min_level_filters_file_sink() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("directives.log");
        let telemetry = DirectiveTelemetry::builder("directives")
            .log_path(&path)
            .min_level(LogLevel::Warn)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Debug, "directives.noise", json!({}))
            .unwrap();
        telemetry
            .log(LogLevel::Error, "directives.invocation.failed", json!({}))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        assert!(!content.contains("directives.noise"));
        assert!(content.contains("directives.invocation.failed"));
    }
}
