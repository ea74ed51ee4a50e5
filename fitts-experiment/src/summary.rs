use chrono::{DateTime, Utc};
use fitts_core::{ParticipantId, ParticipantSummary, TrialRecord, accuracy_percentage};

/// Running totals for the session in progress
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTally {
    pub total_distance: f64,
    pub hits: u32,
    pub misses: u32,
    pub total_square_time: f64,
    pub trials_run: usize,
}

impl SessionTally {
    /// Counts one persisted attempt, hit or miss
    pub fn record_attempt(&mut self, record: &TrialRecord) {
        self.total_distance += record.distance_travelled;
        if record.hit {
            self.hits += 1;
        }
        if record.miss {
            self.misses += 1;
        }
    }

    /// Counts a finished trial; its square time enters the average once
    pub fn complete_trial(&mut self, square_time: f64) {
        self.total_square_time += square_time;
        self.trials_run += 1;
    }

    pub fn accuracy_percentage(&self) -> f64 {
        accuracy_percentage(self.hits, self.misses)
    }

    pub fn average_square_time(&self) -> f64 {
        if self.trials_run == 0 {
            0.0
        } else {
            self.total_square_time / self.trials_run as f64
        }
    }

    pub fn summarize(&self, participant_id: ParticipantId, at: DateTime<Utc>) -> ParticipantSummary {
        ParticipantSummary {
            participant_id,
            total_distance: self.total_distance,
            hits: self.hits,
            misses: self.misses,
            accuracy_percentage: self.accuracy_percentage(),
            average_square_time: self.average_square_time(),
            timestamp: at,
        }
    }
}
