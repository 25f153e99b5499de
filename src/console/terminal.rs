//! Scrollback for device output.

use std::collections::VecDeque;

/// Default number of lines kept.
pub const DEFAULT_MAX_LINES: usize = 1000;

/// Line-oriented log of everything shown to the operator.
///
/// `\r\n` and bare `\r` both become a single line break, including when the
/// pair is split across two appends. Only the newest `max_lines` lines are
/// kept; the last line may be unterminated and keeps growing until a break
/// arrives.
#[derive(Debug, Clone)]
pub struct TerminalLog {
    lines: VecDeque<String>,
    max_lines: usize,
    /// The previous append ended in `\r`; a leading `\n` belongs to it.
    pending_cr: bool,
}

impl TerminalLog {
    pub fn new(max_lines: usize) -> Self {
        let mut lines = VecDeque::new();
        lines.push_back(String::new());
        Self {
            lines,
            max_lines: max_lines.max(1),
            pending_cr: false,
        }
    }

    /// Append raw text, returning it with line endings normalized.
    pub fn append(&mut self, text: &str) -> String {
        let mut normalized = String::with_capacity(text.len());
        for ch in text.chars() {
            let was_cr = std::mem::replace(&mut self.pending_cr, ch == '\r');
            match ch {
                '\n' if was_cr => {}
                '\r' | '\n' => {
                    normalized.push('\n');
                    self.lines.push_back(String::new());
                }
                _ => {
                    normalized.push(ch);
                    if let Some(last) = self.lines.back_mut() {
                        last.push(ch);
                    }
                }
            }
        }

        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
        normalized
    }

    /// Append a complete line, terminating any partial line first.
    pub fn push_line(&mut self, line: &str) -> String {
        let mut text = String::new();
        if self.lines.back().is_some_and(|l| !l.is_empty()) {
            text.push('\n');
        }
        text.push_str(line);
        text.push('\n');
        self.append(&text)
    }

    /// Number of lines held, counting a trailing partial line.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// The whole log as one string.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.lines.push_back(String::new());
        self.pending_cr = false;
    }
}

impl Default for TerminalLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

/// What a single keystroke sends to the device, if anything.
///
/// Return becomes `\r`; backspace is swallowed; everything else passes through.
pub fn keystroke_payload(key: char) -> Option<String> {
    match key {
        '\u{8}' | '\u{7f}' => None,
        '\r' | '\n' => Some("\r".to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_crlf_and_cr_normalize() {
        let mut log = TerminalLog::new(10);
        let shown = log.append("one\r\ntwo\rthree\n");
        assert_eq!(shown, "one\ntwo\nthree\n");
        assert_eq!(log.text(), "one\ntwo\nthree\n");
    }

    #[test]
    fn test_crlf_split_across_appends() {
        let mut log = TerminalLog::new(10);
        log.append("Kp=50\r");
        log.append("\nKi=2\r\n");
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["Kp=50", "Ki=2", ""]);
    }

    #[test]
    fn test_oldest_lines_dropped() {
        let mut log = TerminalLog::new(3);
        log.append("1\n2\n3\n4\n5");
        assert_eq!(log.len(), 3);
        assert_eq!(log.text(), "3\n4\n5");
    }

    #[test]
    fn test_push_line_terminates_partial_line() {
        let mut log = TerminalLog::new(10);
        log.append("partial");
        log.push_line("Diags App Error: boom");
        assert_eq!(log.text(), "partial\nDiags App Error: boom\n");
    }

    #[test]
    fn test_clear() {
        let mut log = TerminalLog::new(10);
        log.append("data\r");
        log.clear();
        assert!(log.is_empty());
        log.append("\nnext");
        assert_eq!(log.text(), "\nnext");
    }

    #[test]
    fn test_keystroke_mapping() {
        assert_eq!(keystroke_payload('a').as_deref(), Some("a"));
        assert_eq!(keystroke_payload('\n').as_deref(), Some("\r"));
        assert_eq!(keystroke_payload('\u{8}'), None);
    }

    proptest! {
        #[test]
        fn prop_no_carriage_returns_and_bounded(chunks in prop::collection::vec(".{0,40}", 0..20), max in 1usize..50) {
            let mut log = TerminalLog::new(max);
            for chunk in &chunks {
                log.append(chunk);
            }
            prop_assert!(log.len() <= max);
            prop_assert!(!log.text().contains('\r'));
        }

        #[test]
        fn prop_chunking_does_not_change_result(text in "[a-z\r\n]{0,80}", split in 0usize..80) {
            let split = split.min(text.len());
            let mut whole = TerminalLog::new(1000);
            whole.append(&text);

            let mut chunked = TerminalLog::new(1000);
            chunked.append(&text[..split]);
            chunked.append(&text[split..]);

            prop_assert_eq!(whole.text(), chunked.text());
        }
    }
}
