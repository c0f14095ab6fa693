// file: src/pipeline/batcher.rs
// description: groups digest entries into size-bounded chat messages
// reference: internal pipeline structure

use crate::models::{DigestEntry, MessageBatch};

pub struct MessageBatcher {
    query: String,
    search_date: String,
    max_per_message: usize,
    buffer: Vec<DigestEntry>,
    qualifying: usize,
    message_count: u32,
}

impl MessageBatcher {
    pub fn new(query: &str, search_date: &str, max_per_message: usize) -> Self {
        Self {
            query: query.to_string(),
            search_date: search_date.to_string(),
            max_per_message: max_per_message.max(1),
            buffer: Vec::new(),
            qualifying: 0,
            message_count: 0,
        }
    }

    /// Appends one entry; returns the completed batch when the buffer is full.
    pub fn push(&mut self, entry: DigestEntry) -> Option<MessageBatch> {
        self.buffer.push(entry);
        self.qualifying += 1;

        if self.qualifying % self.max_per_message == 0 {
            Some(self.flush())
        } else {
            None
        }
    }

    /// Flushes the remainder. A query that never produced an entry still gets
    /// one placeholder batch.
    pub fn finish(mut self) -> Option<MessageBatch> {
        if !self.buffer.is_empty() || self.qualifying == 0 {
            Some(self.flush())
        } else {
            None
        }
    }

    pub fn qualifying(&self) -> usize {
        self.qualifying
    }

    fn flush(&mut self) -> MessageBatch {
        self.message_count += 1;
        MessageBatch {
            query: self.query.clone(),
            search_date: self.search_date.clone(),
            message_count: self.message_count,
            entries: std::mem::take(&mut self.buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleId;
    use pretty_assertions::assert_eq;

    fn entries(n: usize) -> Vec<DigestEntry> {
        (1..=n)
            .map(|i| DigestEntry::new(ArticleId::new(i.to_string()), "q", format!("digest {i}")))
            .collect()
    }

    fn batch_all(n: usize) -> Vec<MessageBatch> {
        let mut batcher = MessageBatcher::new("q", "2024/03/14", 6);
        let mut batches: Vec<MessageBatch> =
            entries(n).into_iter().filter_map(|e| batcher.push(e)).collect();
        batches.extend(batcher.finish());
        batches
    }

    #[test]
    fn test_zero_entries_yield_placeholder() {
        let batches = batch_all(0);
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_placeholder());
        assert_eq!(batches[0].message_count, 1);
    }

    #[test]
    fn test_seven_entries_yield_two_batches() {
        let batches = batch_all(7);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].entries.len(), 6);
        assert_eq!(batches[1].entries.len(), 1);
        assert_eq!(batches[0].message_count, 1);
        assert_eq!(batches[1].message_count, 2);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_batch() {
        let batches = batch_all(12);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.entries.len() == 6));
    }

    #[test]
    fn test_batch_count_and_order() {
        for n in 1..=20 {
            let batches = batch_all(n);
            assert_eq!(batches.len(), n.div_ceil(6), "n = {n}");

            let flattened: Vec<DigestEntry> =
                batches.into_iter().flat_map(|b| b.entries).collect();
            assert_eq!(flattened, entries(n));
        }
    }

    #[test]
    fn test_push_reports_qualifying_count() {
        let mut batcher = MessageBatcher::new("q", "2024/03/14", 2);
        assert!(batcher.push(entries(1).remove(0)).is_none());
        assert_eq!(batcher.qualifying(), 1);
        let batch = batcher.push(entries(2).remove(1)).unwrap();
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batcher.qualifying(), 2);
        assert!(batcher.finish().is_none());
    }
}
