//! Range options for multi-document reads

use crate::storage::Entry;

/// Window over an id-ordered snapshot
///
/// Applied in a fixed order: direction first, then `skip`, then `limit`,
/// then `until_key`, which stops before the first entry with that id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeOptions {
    /// Entries to drop from the start
    pub skip: Option<usize>,
    /// Maximum number of entries
    pub limit: Option<usize>,
    /// Stop before this id
    pub until_key: Option<String>,
    /// Walk ids from last to first
    pub reverse: bool,
}

impl RangeOptions {
    /// Whether these options select every entry in id order
    pub fn is_full(&self) -> bool {
        *self == Self::default()
    }

    /// Restrict `entries` to the window
    pub fn apply(&self, mut entries: Vec<Entry>) -> Vec<Entry> {
        if self.is_full() {
            return entries;
        }
        if self.reverse {
            entries.reverse();
        }

        let until = self.until_key.as_deref();
        entries
            .into_iter()
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .take_while(|(id, _)| Some(id.as_str()) != until)
            .collect()
    }
}
