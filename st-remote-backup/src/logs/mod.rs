//! In-memory ring buffer of operational log lines.
//!
//! Backs the `/logs` endpoint of the control panel. Lines are fed by
//! [`layer::LogBufferLayer`], which sits next to the stdout formatter in the
//! tracing subscriber.

pub mod layer;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Default number of lines kept before the oldest are evicted
pub const DEFAULT_MAX_LINES: usize = 2000;

/// Default UTC offset for timestamps (Asia/Shanghai)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => f.write_str("info"),
            LogLevel::Error => f.write_str("error"),
        }
    }
}

/// A single buffered line
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.timestamp, self.level, self.message)
    }
}

/// Bounded, insertion-ordered log store shared across requests
#[derive(Debug)]
pub struct LogBuffer {
    lines: Mutex<VecDeque<LogLine>>,
    max_lines: usize,
    offset: FixedOffset,
}

impl LogBuffer {
    /// Create a buffer holding at most `max_lines` lines (at least one).
    /// Timestamps are rendered at `utc_offset_minutes` from UTC; an out of
    /// range offset falls back to UTC.
    pub fn new(max_lines: usize, utc_offset_minutes: i32) -> Self {
        let max_lines = max_lines.max(1);
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self {
            lines: Mutex::new(VecDeque::with_capacity(max_lines.min(1024))),
            max_lines,
            offset,
        }
    }

    /// Append a line, evicting from the front once the capacity is exceeded
    pub fn append(&self, level: LogLevel, message: impl Into<String>) {
        self.append_at(Utc::now(), level, message.into());
    }

    fn append_at(&self, at: DateTime<Utc>, level: LogLevel, message: String) {
        let line = LogLine {
            timestamp: at
                .with_timezone(&self.offset)
                .format("%Y/%-m/%-d %H:%M:%S")
                .to_string(),
            level,
            message,
        };

        let mut lines = self.lock();
        lines.push_back(line);
        while lines.len() > self.max_lines {
            lines.pop_front();
        }
    }

    /// The last `min(limit, capacity)` lines, oldest first
    pub fn read(&self, limit: usize) -> Vec<LogLine> {
        let lines = self.lock();
        let count = limit.min(self.max_lines).min(lines.len());
        lines.iter().skip(lines.len() - count).cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_lines
    }

    // A panic while holding the lock cannot leave the deque half-updated.
    fn lock(&self) -> MutexGuard<'_, VecDeque<LogLine>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES, DEFAULT_UTC_OFFSET_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn messages(lines: &[LogLine]) -> Vec<String> {
        lines.iter().map(|l| l.message.clone()).collect()
    }

    #[test]
    fn test_never_exceeds_capacity_and_evicts_oldest() {
        let buffer = LogBuffer::new(3, 0);
        for i in 0..10 {
            buffer.append(LogLevel::Info, format!("line {i}"));
            assert!(buffer.len() <= 3);
        }
        assert_eq!(
            messages(&buffer.read(100)),
            vec!["line 7", "line 8", "line 9"]
        );
    }

    #[test]
    fn test_read_returns_tail_in_insertion_order() {
        let buffer = LogBuffer::new(10, 0);
        for i in 0..5 {
            buffer.append(LogLevel::Info, format!("m{i}"));
        }
        assert_eq!(messages(&buffer.read(2)), vec!["m3", "m4"]);
        assert_eq!(buffer.read(0).len(), 0);
        assert_eq!(buffer.read(50).len(), 5);
    }

    #[test]
    fn test_clear_empties_buffer() {
        let buffer = LogBuffer::new(10, 0);
        buffer.append(LogLevel::Error, "boom");
        assert!(!buffer.is_empty());
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.read(10).is_empty());
    }

    #[test]
    fn test_line_format_uses_configured_offset() {
        let buffer = LogBuffer::new(10, 8 * 60);
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 20, 4, 3).unwrap();
        buffer.append_at(at, LogLevel::Error, "[backup] error: disk full".into());

        let line = buffer.read(1).remove(0);
        assert_eq!(
            line.to_string(),
            "2024/1/6 04:04:03 [error] [backup] error: disk full"
        );
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let buffer = LogBuffer::new(0, 0);
        buffer.append(LogLevel::Info, "a");
        buffer.append(LogLevel::Info, "b");
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(messages(&buffer.read(5)), vec!["b"]);
    }
}
