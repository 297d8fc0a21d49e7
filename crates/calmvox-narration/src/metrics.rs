//! Session counters for narration activity.

/// Narration session metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NarrationMetrics {
    /// Utterances handed to the engine
    pub utterances_submitted: u64,
    /// Utterances that played to their natural end
    pub utterances_finished: u64,
    /// Utterances that failed mid-playback
    pub utterances_failed: u64,
    /// Utterances cancelled before completing
    pub utterances_cancelled: u64,
    /// Cancel requests issued to the engine
    pub cancel_requests: u64,
    /// Narrations that reached the end of the text
    pub sessions_completed: u64,
}

impl NarrationMetrics {
    /// Utterances submitted but not yet finished, failed, or cancelled.
    ///
    /// The session never lets this exceed 1.
    pub fn in_flight(&self) -> u64 {
        self.utterances_submitted
            - (self.utterances_finished + self.utterances_failed + self.utterances_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_counts_unresolved_submissions() {
        let mut metrics = NarrationMetrics::default();
        assert_eq!(metrics.in_flight(), 0);

        metrics.utterances_submitted = 5;
        metrics.utterances_finished = 3;
        metrics.utterances_cancelled = 1;
        assert_eq!(metrics.in_flight(), 1);

        metrics.utterances_failed = 1;
        assert_eq!(metrics.in_flight(), 0);
    }
}
