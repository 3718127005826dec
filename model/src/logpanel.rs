use std::collections::VecDeque;

/// Number of entries the operator log keeps before evicting the oldest.
pub const LOG_CAPACITY: usize = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

/// One line of the operator log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

/// Bounded, newest-first list of operator log entries.
#[derive(Clone, Debug)]
pub struct LogPanel {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl LogPanel {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Adds `message` at the head, evicting from the tail past the capacity.
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        self.entries.push_front(LogEntry {
            timestamp,
            level,
            message: message.into(),
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_panel_is_bounded() {
        let mut panel = LogPanel::default();
        for i in 0..(LOG_CAPACITY * 3) {
            panel.push(LogLevel::Info, format!("entry {i}"));
            assert!(panel.len() <= LOG_CAPACITY);
        }

        assert_eq!(panel.len(), LOG_CAPACITY);
        assert_eq!(panel.newest().unwrap().message, "entry 149");
        assert_eq!(panel.entries().last().unwrap().message, "entry 100");
    }

    #[test]
    fn test_log_entry_timestamp_format() {
        let mut panel = LogPanel::with_capacity(2);
        panel.push(LogLevel::Success, "done");

        let entry = panel.newest().unwrap();
        assert_eq!(entry.level, LogLevel::Success);
        assert_eq!(entry.timestamp.len(), 8);
        assert_eq!(entry.timestamp.matches(':').count(), 2);
    }
}
