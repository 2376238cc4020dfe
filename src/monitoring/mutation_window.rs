use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a modification stays in the window.
pub const RETENTION: Duration = Duration::from_secs(60);

/// Lookback used to classify a burst of modifications.
pub const BURST_WINDOW: Duration = Duration::from_secs(5);

/// Rolling record of modification timestamps, kept sorted oldest first.
///
/// Entries at or before `now - RETENTION` are dropped on every `record`, so the
/// window stays bounded by the event rate rather than by uptime.
#[derive(Debug, Clone)]
pub struct MutationWindow {
    entries: VecDeque<Instant>,
    retention: Duration,
}

impl MutationWindow {
    pub fn new() -> Self {
        Self::with_retention(RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            retention,
        }
    }

    pub fn record(&mut self, timestamp: Instant) {
        // Watchers may deliver slightly out of order; keep the deque sorted.
        let at = self.entries.partition_point(|t| *t <= timestamp);
        self.entries.insert(at, timestamp);
        self.prune(timestamp);
    }

    pub fn prune(&mut self, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.retention) else {
            return;
        };
        while self.entries.front().is_some_and(|t| *t <= cutoff) {
            self.entries.pop_front();
        }
    }

    /// Entries strictly newer than `now - window`. Does not mutate.
    pub fn count_since(&self, now: Instant, window: Duration) -> usize {
        match now.checked_sub(window) {
            Some(cutoff) => {
                self.entries.len() - self.entries.partition_point(|t| *t <= cutoff)
            }
            None => self.entries.len(),
        }
    }

    /// Modifications inside the retention horizon as seen at `now`. Entries the
    /// last prune has not yet dropped are not counted.
    pub fn len(&self, now: Instant) -> usize {
        self.count_since(now, self.retention)
    }

    pub fn is_empty(&self, now: Instant) -> bool {
        self.len(now) == 0
    }

    /// Entries physically held, including any not yet pruned.
    #[cfg(test)]
    fn stored(&self) -> usize {
        self.entries.len()
    }
}

impl Default for MutationWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_within_four_seconds_is_counted() {
        let start = Instant::now();
        let mut window = MutationWindow::new();
        for i in 0..15 {
            window.record(start + Duration::from_millis(i * 250));
        }
        let now = start + Duration::from_secs(4);

        assert_eq!(window.count_since(now, BURST_WINDOW), 15);
        assert_eq!(window.len(now), 15);
    }

    #[test]
    fn entries_expire_after_retention() {
        let start = Instant::now();
        let mut window = MutationWindow::new();
        for i in 0..15 {
            window.record(start + Duration::from_millis(i * 250));
        }

        let later = start + Duration::from_secs(4 + 61);
        assert_eq!(window.len(later), 0);
        assert!(window.is_empty(later));

        window.prune(later);
        assert_eq!(window.stored(), 0);
    }

    #[test]
    fn record_prunes_stale_entries() {
        let start = Instant::now();
        let mut window = MutationWindow::new();
        window.record(start);
        window.record(start + Duration::from_secs(30));
        window.record(start + Duration::from_secs(61));

        assert_eq!(window.stored(), 2);
        assert_eq!(window.len(start + Duration::from_secs(61)), 2);
    }

    #[test]
    fn burst_lookback_excludes_older_activity() {
        let start = Instant::now();
        let mut window = MutationWindow::new();
        for i in 0..8 {
            window.record(start + Duration::from_secs(i));
        }
        let now = start + Duration::from_secs(10);

        // Entries at 6s and 7s are inside (5s, 10s]; the one at exactly 5s is not.
        assert_eq!(window.count_since(now, BURST_WINDOW), 2);
        assert_eq!(window.len(now), 8);
    }

    #[test]
    fn out_of_order_timestamps_stay_sorted() {
        let start = Instant::now();
        let mut window = MutationWindow::new();
        window.record(start + Duration::from_secs(3));
        window.record(start + Duration::from_secs(1));
        window.record(start + Duration::from_secs(2));

        let now = start + Duration::from_secs(62);
        assert_eq!(window.count_since(now, RETENTION), 1);
    }
}
