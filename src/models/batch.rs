// file: src/models/batch.rs
// description: a single chat message worth of digest entries
// reference: internal data structures

use super::article::{DIGEST_HEADER, DigestEntry};

pub const NO_RESULTS_TEXT: &str = "ありません";

#[derive(Debug, Clone, PartialEq)]
pub struct MessageBatch {
    pub query: String,
    /// Search date already formatted as `YYYY/MM/DD`.
    pub search_date: String,
    /// 1-based sequence number within one query's pass.
    pub message_count: u32,
    pub entries: Vec<DigestEntry>,
}

impl MessageBatch {
    pub fn is_placeholder(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn body(&self) -> String {
        if self.entries.is_empty() {
            return format!(
                "{} ({})\n\n{}\n\n",
                DIGEST_HEADER, self.query, NO_RESULTS_TEXT
            );
        }

        self.entries.iter().map(DigestEntry::render).collect()
    }
}
