use crate::MAX_ENTRIES;
use crate::entry::Entry;

/// Entries gathered during one run, never more than [`MAX_ENTRIES`]
#[derive(Debug, Default)]
pub struct Accumulator {
    entries: Vec<Entry>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_ENTRIES),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Room left before the cap
    pub fn remaining(&self) -> usize {
        MAX_ENTRIES.saturating_sub(self.entries.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Append one page's entries in page order, dropping any beyond the cap.
    /// Returns how many were kept.
    pub(crate) fn append_page(&mut self, page: Vec<Entry>) -> usize {
        let keep = page.len().min(self.remaining());
        self.entries.extend(page.into_iter().take(keep));
        keep
    }

    /// Most recent first; entries with equal recency keep discovery order
    pub(crate) fn sort_by_recency(&mut self) {
        self.entries.sort_by(|a, b| b.recency().cmp(&a.recency()));
    }

    pub(crate) fn into_ranked(mut self) -> Vec<Entry> {
        self.sort_by_recency();
        self.entries.truncate(MAX_ENTRIES);
        self.entries
    }
}
