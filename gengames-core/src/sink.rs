//! Output sinks - the append-only text streams the engine writes for humans

use std::sync::Mutex;

use crate::control::lock;

/// An append-only text stream supporting "replace everything" and
/// "append a line".
pub trait LogSink: Send + Sync {
    /// Discard the current content and start over with `text`
    fn replace(&self, text: &str);

    /// Append one line
    fn append_line(&self, line: &str);
}

/// In-memory sink, kept as a list of lines
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    /// Everything joined with newlines
    pub fn contents(&self) -> String {
        lock(&self.lines).join("\n")
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        lock(&self.lines).iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn replace(&self, text: &str) {
        let mut lines = lock(&self.lines);
        lines.clear();
        lines.extend(text.lines().map(str::to_string));
    }

    fn append_line(&self, line: &str) {
        lock(&self.lines).push(line.to_string());
    }
}

/// Forwards every line to `tracing`, labelled with the stream it belongs to
#[derive(Clone, Copy, Debug)]
pub struct TracingSink {
    stream: &'static str,
}

impl TracingSink {
    pub fn new(stream: &'static str) -> Self {
        Self { stream }
    }

    /// The generation-level log
    pub fn ga() -> Self {
        Self::new("ga")
    }

    /// The match-level log
    pub fn matches() -> Self {
        Self::new("match")
    }
}

impl LogSink for TracingSink {
    fn replace(&self, text: &str) {
        tracing::info!(stream = self.stream, "----");
        for line in text.lines() {
            self.append_line(line);
        }
    }

    fn append_line(&self, line: &str) {
        if !line.is_empty() {
            tracing::info!(stream = self.stream, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_append_and_replace() {
        let sink = MemorySink::new();
        sink.append_line("one");
        sink.append_line("two");
        assert_eq!(sink.lines(), vec!["one", "two"]);

        sink.replace("fresh\nstart");
        assert_eq!(sink.lines(), vec!["fresh", "start"]);
        assert!(sink.contains("sta"));
        assert_eq!(sink.contents(), "fresh\nstart");
    }
}
