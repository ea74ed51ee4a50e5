use fitts_core::{ParticipantId, ParticipantSummary, ScreeningRecord, TrialRecord};

use crate::error::{StoreError, StoreResult};

/// Durable destination for everything a session produces.
///
/// Every `append_*` call must have completed durably when it returns `Ok`;
/// the caller aborts the session on the first error.
pub trait RecordSink {
    /// `max(stored participant ids) + 1`, or 1 for an empty sink
    fn next_participant_id(&mut self) -> StoreResult<ParticipantId>;
    fn append_screening(&mut self, record: &ScreeningRecord) -> StoreResult<()>;
    fn append_trial(&mut self, record: &TrialRecord) -> StoreResult<()>;
    fn append_summary(&mut self, summary: &ParticipantSummary) -> StoreResult<()>;
    /// Human-readable location for log lines
    fn describe(&self) -> String;
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn next_participant_id(&mut self) -> StoreResult<ParticipantId> {
        (**self).next_participant_id()
    }
    fn append_screening(&mut self, record: &ScreeningRecord) -> StoreResult<()> {
        (**self).append_screening(record)
    }
    fn append_trial(&mut self, record: &TrialRecord) -> StoreResult<()> {
        (**self).append_trial(record)
    }
    fn append_summary(&mut self, summary: &ParticipantSummary) -> StoreResult<()> {
        (**self).append_summary(summary)
    }
    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Shared by every sink once it has found the largest stored id
pub(crate) fn next_after(max_existing: Option<u32>) -> StoreResult<ParticipantId> {
    ParticipantId::after(max_existing).ok_or_else(|| {
        StoreError::Corrupt(format!(
            "participant id {} leaves no room for another participant",
            u32::MAX
        ))
    })
}

/// Keeps records in process memory. Used for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub screenings: Vec<ScreeningRecord>,
    pub trials: Vec<TrialRecord>,
    pub summaries: Vec<ParticipantSummary>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn max_participant(&self) -> Option<u32> {
        let screening = self.screenings.iter().map(|r| r.participant_id.get());
        let trials = self.trials.iter().map(|r| r.participant_id.get());
        let summaries = self.summaries.iter().map(|r| r.participant_id.get());
        screening.chain(trials).chain(summaries).max()
    }
}

impl RecordSink for MemorySink {
    fn next_participant_id(&mut self) -> StoreResult<ParticipantId> {
        next_after(self.max_participant())
    }

    fn append_screening(&mut self, record: &ScreeningRecord) -> StoreResult<()> {
        self.screenings.push(record.clone());
        Ok(())
    }

    fn append_trial(&mut self, record: &TrialRecord) -> StoreResult<()> {
        self.trials.push(record.clone());
        Ok(())
    }

    fn append_summary(&mut self, summary: &ParticipantSummary) -> StoreResult<()> {
        self.summaries.push(summary.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory sink".to_string()
    }
}
