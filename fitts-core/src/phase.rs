/// Defines session phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    /// Whether pointer presses reach the phase; quit is honored regardless
    fn allows_input(&self) -> bool;
    /// Phase is shown for a fixed hold and then advances on its own
    fn is_timed(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_trials(&self) -> bool {
        false
    }
    fn is_screening(&self) -> bool {
        false
    }
    fn is_consent(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Consent,
    ConsentRecorded,
    Screening,
    Trials,
    Debrief,
}

impl Phase for SessionPhase {
    fn allows_input(&self) -> bool {
        !matches!(self, Self::ConsentRecorded | Self::Debrief)
    }

    fn is_timed(&self) -> bool {
        matches!(self, Self::ConsentRecorded | Self::Debrief)
    }

    fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Consent => ConsentRecorded,
            ConsentRecorded => Screening,
            Screening => Trials,
            Trials => Debrief,
            Debrief => return None,
        })
    }

    fn is_trials(&self) -> bool {
        matches!(self, SessionPhase::Trials)
    }

    fn is_screening(&self) -> bool {
        matches!(self, SessionPhase::Screening)
    }

    fn is_consent(&self) -> bool {
        matches!(self, SessionPhase::Consent)
    }
}
