// file: src/pipeline/progress.rs
// description: per-query progress display and run statistics
// reference: uses indicatif for progress bars and tracks processing metrics

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub articles_found: usize,
    pub articles_qualifying: usize,
    pub articles_skipped: usize,
    pub messages_posted: usize,
    pub messages_failed: usize,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages_total(&self) -> usize {
        self.messages_posted + self.messages_failed
    }
}

/// Counters for one pass over a query. Reset on every retry attempt.
pub struct ProgressTracker {
    bar: ProgressBar,
    articles_found: AtomicUsize,
    articles_qualifying: AtomicUsize,
    articles_skipped: AtomicUsize,
    messages_posted: AtomicUsize,
    messages_failed: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(query: &str, visible: bool, colored: bool) -> Self {
        let bar = if visible {
            create_progress_bar(colored)
        } else {
            ProgressBar::hidden()
        };
        bar.set_prefix(query.to_string());

        Self {
            bar,
            articles_found: AtomicUsize::new(0),
            articles_qualifying: AtomicUsize::new(0),
            articles_skipped: AtomicUsize::new(0),
            messages_posted: AtomicUsize::new(0),
            messages_failed: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn hidden(query: &str) -> Self {
        Self::new(query, false, false)
    }

    pub fn set_found(&self, total: usize) {
        self.articles_found.store(total, Ordering::SeqCst);
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    pub fn inc_processed(&self) {
        self.bar.inc(1);
    }

    pub fn inc_qualifying(&self) {
        self.articles_qualifying.fetch_add(1, Ordering::SeqCst);
        self.update_message();
    }

    pub fn inc_skipped(&self) {
        self.articles_skipped.fetch_add(1, Ordering::SeqCst);
        self.update_message();
    }

    pub fn record_delivery(&self, delivered: bool) {
        if delivered {
            self.messages_posted.fetch_add(1, Ordering::SeqCst);
        } else {
            self.messages_failed.fetch_add(1, Ordering::SeqCst);
        }
        self.update_message();
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn get_stats(&self) -> QueryStats {
        QueryStats {
            articles_found: self.articles_found.load(Ordering::SeqCst),
            articles_qualifying: self.articles_qualifying.load(Ordering::SeqCst),
            articles_skipped: self.articles_skipped.load(Ordering::SeqCst),
            messages_posted: self.messages_posted.load(Ordering::SeqCst),
            messages_failed: self.messages_failed.load(Ordering::SeqCst),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn update_message(&self) {
        let message = format!(
            "qualifying: {} | skipped: {} | messages: {}",
            self.articles_qualifying.load(Ordering::SeqCst),
            self.articles_skipped.load(Ordering::SeqCst),
            self.messages_posted.load(Ordering::SeqCst),
        );
        self.bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(colored: bool) -> ProgressBar {
    let bar = ProgressBar::new(0);
    let template = if colored {
        "{spinner:.green} {prefix:.bold} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}"
    } else {
        "{spinner} {prefix} [{elapsed_precise}] [{bar:30}] {pos}/{len} {msg}"
    };

    match ProgressStyle::default_bar().template(template) {
        Ok(style) => bar.set_style(style.progress_chars("=>-")),
        Err(_) => bar.set_style(ProgressStyle::default_bar()),
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_counts() {
        let tracker = ProgressTracker::hidden("q");
        tracker.set_found(5);
        tracker.inc_qualifying();
        tracker.inc_qualifying();
        tracker.inc_skipped();
        tracker.record_delivery(true);
        tracker.record_delivery(false);

        let stats = tracker.get_stats();
        assert_eq!(stats.articles_found, 5);
        assert_eq!(stats.articles_qualifying, 2);
        assert_eq!(stats.articles_skipped, 1);
        assert_eq!(stats.messages_posted, 1);
        assert_eq!(stats.messages_failed, 1);
        assert_eq!(stats.messages_total(), 2);
    }

    #[test]
    fn test_empty_stats() {
        let stats = QueryStats::new();
        assert_eq!(stats.messages_total(), 0);
    }
}
