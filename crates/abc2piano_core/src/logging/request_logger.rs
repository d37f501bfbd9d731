//! One log file per conversion request.
//!
//! The file is `<logs_folder>/<request-id>.log`. Stage markers, tool
//! command lines and results always land in it; raw tool output only goes
//! to the tail buffer in compact mode and is written out when a stage
//! fails.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};
use crate::models::RequestId;

struct Sink {
    file: Option<BufWriter<File>>,
    tail: VecDeque<String>,
}

/// Request log with an optional live callback.
pub struct RequestLogger {
    path: PathBuf,
    config: LogConfig,
    callback: Option<LogCallback>,
    sink: Mutex<Sink>,
}

impl RequestLogger {
    pub fn new(
        request: &RequestId,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let path = log_dir.join(format!("{}.log", request));
        let file = BufWriter::new(File::create(&path)?);

        Ok(Self {
            path,
            callback,
            sink: Mutex::new(Sink {
                file: Some(file),
                tail: VecDeque::with_capacity(config.error_tail),
            }),
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level >= self.config.level {
            self.emit(message);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// `$ <argv>` for a tool about to run.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
    }

    /// `=== <stage> ===` marker.
    pub fn phase(&self, stage: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(stage));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Record one line a tool printed.
    pub fn tool_output(&self, line: &str) {
        if self.config.error_tail > 0 {
            let mut sink = self.sink.lock();
            if sink.tail.len() == self.config.error_tail {
                sink.tail.pop_front();
            }
            sink.tail.push_back(line.to_string());
        }

        if !self.config.compact {
            self.emit(line);
        }
    }

    /// Write the buffered tool output under a `[<stage>/tail]` header.
    pub fn dump_tail(&self, stage: &str) {
        let lines: Vec<String> = self.sink.lock().tail.drain(..).collect();
        if lines.is_empty() {
            return;
        }
        self.emit(&format!("[{}/tail]", stage));
        for line in &lines {
            self.emit(line);
        }
    }

    pub fn clear_tail(&self) {
        self.sink.lock().tail.clear();
    }

    pub fn tail(&self) -> Vec<String> {
        self.sink.lock().tail.iter().cloned().collect()
    }

    /// Flush and release the file handle. Later messages only reach the
    /// callback.
    pub fn close(&self) {
        if let Some(mut file) = self.sink.lock().file.take() {
            let _ = file.flush();
        }
    }

    fn emit(&self, message: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        };

        if let Some(file) = self.sink.lock().file.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
        if let Some(callback) = &self.callback {
            callback(&line);
        }
    }
}

impl Drop for RequestLogger {
    fn drop(&mut self) {
        self.close();
    }
}
