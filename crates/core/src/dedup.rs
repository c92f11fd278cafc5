use std::time::{Duration, Instant};

/// Suppresses an identical utterance arriving within a short cool-down
/// window. Speech frontends love to deliver the same transcription twice in
/// quick succession; this keeps the second copy from firing the action again.
#[derive(Debug)]
pub struct Deduplicator {
    last_command: String,
    last_seen: Option<Instant>,
    window: Duration,
}

impl Deduplicator {
    pub fn new(window: Duration) -> Self {
        Self {
            last_command: String::new(),
            last_seen: None,
            window,
        }
    }

    /// Returns true when `command` repeats the stored command within the
    /// window. The caller lower-cases and trims beforehand; no further
    /// normalization happens here.
    ///
    /// State is updated only together with a non-duplicate verdict: a
    /// suppressed repeat does NOT refresh the stored timestamp, so a train
    /// of slow repeats each independently races the original window instead
    /// of extending it indefinitely.
    pub fn is_duplicate(&mut self, command: &str, now: Instant) -> bool {
        if command == self.last_command {
            if let Some(seen) = self.last_seen {
                if now.duration_since(seen) < self.window {
                    tracing::info!(command, "duplicate command blocked");
                    return true;
                }
            }
        }

        self.last_command = command.to_string();
        self.last_seen = Some(now);
        false
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_within_window_is_suppressed() {
        let mut dedup = Deduplicator::default();
        let t0 = Instant::now();

        assert!(!dedup.is_duplicate("open youtube", t0));
        assert!(dedup.is_duplicate("open youtube", t0 + Duration::from_secs(2)));
    }

    #[test]
    fn different_command_passes_and_replaces_state() {
        let mut dedup = Deduplicator::default();
        let t0 = Instant::now();

        assert!(!dedup.is_duplicate("open youtube", t0));
        assert!(!dedup.is_duplicate("open google", t0 + Duration::from_secs(1)));
        // The stored command is now "open google"; the earlier text is fresh again.
        assert!(!dedup.is_duplicate("open youtube", t0 + Duration::from_secs(2)));
    }

    #[test]
    fn repeat_after_window_elapses_passes() {
        let mut dedup = Deduplicator::default();
        let t0 = Instant::now();

        assert!(!dedup.is_duplicate("open youtube", t0));
        assert!(!dedup.is_duplicate("open youtube", t0 + Duration::from_secs(6)));
    }

    #[test]
    fn suppressed_repeat_does_not_refresh_the_window() {
        let mut dedup = Deduplicator::default();
        let t0 = Instant::now();

        assert!(!dedup.is_duplicate("open youtube", t0));
        // Blocked at t0+4s, but the stored timestamp stays t0.
        assert!(dedup.is_duplicate("open youtube", t0 + Duration::from_secs(4)));
        // t0+6s is past the original window even though only 2s have passed
        // since the blocked repeat.
        assert!(!dedup.is_duplicate("open youtube", t0 + Duration::from_secs(6)));
    }
}
