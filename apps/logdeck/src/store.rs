use std::collections::VecDeque;

use crate::render::style::strip_codes;

/// One logical log record: the line that matched the entry pattern plus
/// every continuation line that followed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    text: String,
    line_count: usize,
}

impl Entry {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            text: line.into(),
            line_count: 1,
        }
    }

    pub fn push_line(&mut self, line: &str) {
        self.text.push('\n');
        self.text.push_str(line);
        self.line_count += 1;
    }

    /// Raw text, style sequences included, lines joined with `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The line that opened the entry.
    pub fn header(&self) -> &str {
        match self.text.split_once('\n') {
            Some((head, _)) => head,
            None => &self.text,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn plain_text(&self) -> String {
        strip_codes(&self.text)
    }
}

/// A raw output line after classification against the source's entry
/// pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestedLine {
    Start(String),
    Continuation(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreChange {
    /// A new entry became index 0.
    Inserted,
    /// The newest entry grew by one line.
    Appended,
    /// A continuation arrived before any entry existed.
    Dropped,
}

/// Entries of one source, newest first. Only the front entry is ever
/// mutated.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: VecDeque<Entry>,
    dropped_lines: u64,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, line: IngestedLine) -> StoreChange {
        match line {
            IngestedLine::Start(line) => {
                self.entries.push_front(Entry::new(line));
                StoreChange::Inserted
            }
            IngestedLine::Continuation(line) => match self.entries.front_mut() {
                Some(entry) => {
                    entry.push_line(&line);
                    StoreChange::Appended
                }
                None => {
                    self.dropped_lines += 1;
                    StoreChange::Dropped
                }
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Position of the entry counted from the oldest one. Unlike the index it
    /// does not change when newer entries arrive.
    pub fn ordinal(&self, index: usize) -> Option<usize> {
        (index < self.entries.len()).then(|| self.entries.len() - 1 - index)
    }

    pub fn dropped_lines(&self) -> u64 {
        self.dropped_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(line: &str) -> IngestedLine {
        IngestedLine::Start(line.to_string())
    }

    fn cont(line: &str) -> IngestedLine {
        IngestedLine::Continuation(line.to_string())
    }

    #[test_timeout::timeout]
    fn newest_entry_is_first() {
        let mut store = EntryStore::new();
        assert_eq!(store.apply(start("10:00:01 start")), StoreChange::Inserted);
        assert_eq!(store.apply(cont("  continuation")), StoreChange::Appended);
        assert_eq!(store.apply(start("10:00:02 next")), StoreChange::Inserted);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).map(Entry::text), Some("10:00:02 next"));
        assert_eq!(
            store.get(1).map(Entry::text),
            Some("10:00:01 start\n  continuation")
        );
        assert_eq!(store.get(1).map(Entry::line_count), Some(2));
    }

    #[test_timeout::timeout]
    fn orphan_continuations_are_dropped() {
        let mut store = EntryStore::new();
        assert_eq!(store.apply(cont("stray")), StoreChange::Dropped);
        assert!(store.is_empty());
        assert_eq!(store.dropped_lines(), 1);
    }

    #[test_timeout::timeout]
    fn older_entries_are_frozen() {
        let mut store = EntryStore::new();
        store.apply(start("a"));
        store.apply(start("b"));
        store.apply(cont("b2"));
        assert_eq!(store.get(1).map(Entry::text), Some("a"));
        assert_eq!(store.get(0).map(Entry::header), Some("b"));
    }

    #[test_timeout::timeout]
    fn ordinals_are_stable() {
        let mut store = EntryStore::new();
        store.apply(start("a"));
        assert_eq!(store.ordinal(0), Some(0));
        store.apply(start("b"));
        assert_eq!(store.ordinal(1), Some(0));
        assert_eq!(store.ordinal(0), Some(1));
        assert_eq!(store.ordinal(2), None);
    }

    #[test_timeout::timeout]
    fn plain_text_drops_styles() {
        let entry = Entry::new("\x1b[1;31mERROR\x1b[0m: failed");
        assert_eq!(entry.plain_text(), "ERROR: failed");
    }
}
