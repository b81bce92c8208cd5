//! Output contracts: formatter, status display and dump pacing.
//!
//! The formatter and status display belong to the firmware around the
//! watcher; this module only fixes the calls the watcher makes. The
//! collecting implementations exist for tests and host-side tools.

use std::time::Duration;

use crate::platform::AddressWidth;

/// Low-level text output (serial port, console).
pub trait ReportSink {
    /// Print one byte as two hex digits.
    fn emit_hex_byte(&mut self, byte: u8);

    /// Print an address as hex, padded to the target's address width.
    fn emit_hex_word(&mut self, word: usize, width: AddressWidth);

    /// Print literal text.
    fn emit_text(&mut self, text: &str);

    /// End the current line.
    fn emit_line(&mut self);
}

/// Short operator-facing messages (status line of a display).
pub trait StatusSink {
    /// Show a brief summary.
    fn show_message(&mut self, text: &str);
}

/// Called between dump rows so other cooperative work keeps running.
pub trait Pacer {
    /// Yield for a moment.
    fn pause(&mut self);
}

impl<F: FnMut()> Pacer for F {
    fn pause(&mut self) {
        self()
    }
}

/// Pacer that never yields.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pause(&mut self) {}
}

/// Pacer that sleeps the current thread between rows.
#[derive(Debug, Clone, Copy)]
pub struct SleepPacer(pub Duration);

impl Default for SleepPacer {
    fn default() -> Self {
        Self(Duration::from_millis(25))
    }
}

impl Pacer for SleepPacer {
    fn pause(&mut self) {
        std::thread::sleep(self.0);
    }
}

/// A [`ReportSink`] that collects finished lines of text.
#[derive(Debug, Clone, Default)]
pub struct TextReport {
    lines: Vec<String>,
    current: String,
}

impl TextReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished lines, without the partial line still being written.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether any finished line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    /// Join everything, including a trailing partial line.
    pub fn into_string(mut self) -> String {
        if !self.current.is_empty() {
            self.emit_line();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

impl ReportSink for TextReport {
    fn emit_hex_byte(&mut self, byte: u8) {
        self.current.push_str(&format!("{:02X}", byte));
    }

    fn emit_hex_word(&mut self, word: usize, width: AddressWidth) {
        self.current.push_str(&width.format(word));
    }

    fn emit_text(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn emit_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }
}

/// A [`StatusSink`] that remembers every message.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<String>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages shown so far.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }
}

impl StatusSink for MessageLog {
    fn show_message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_report_lines() {
        let mut out = TextReport::new();
        out.emit_text("addr=");
        out.emit_hex_word(0x1B80, AddressWidth::Bits16);
        out.emit_text(" byte=");
        out.emit_hex_byte(0xE5);
        out.emit_line();
        out.emit_text("partial");

        assert_eq!(out.lines(), &["addr=1B80 byte=E5".to_string()]);
        assert_eq!(out.into_string(), "addr=1B80 byte=E5\npartial\n");
    }

    #[test]
    fn test_closure_pacer() {
        let mut calls = 0;
        {
            let mut pacer = || calls += 1;
            pacer.pause();
            pacer.pause();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_message_log() {
        let mut log = MessageLog::new();
        assert_eq!(log.last(), None);
        log.show_message("Free memory OK");
        assert_eq!(log.last(), Some("Free memory OK"));
    }
}
