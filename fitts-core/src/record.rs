use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::task::{Direction, TaskCombination};

/// Trial state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    AwaitSquareClick,
    AwaitCircleClick,
    Complete,
}

/// Participant identifier, assigned once per run as `max(existing) + 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    pub const FIRST: ParticipantId = ParticipantId(1);

    /// Next identifier after the largest one already stored, `None` once
    /// the id space is exhausted
    pub fn after(max_existing: Option<u32>) -> Option<Self> {
        match max_existing {
            Some(max) => max.checked_add(1).map(ParticipantId),
            None => Some(Self::FIRST),
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

/// Weekly mouse usage bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseUsage {
    #[serde(rename = "0–2 Hours")]
    UpToTwo,
    #[serde(rename = "3–8 Hours")]
    ThreeToEight,
    #[serde(rename = "8+ Hours")]
    MoreThanEight,
}

impl MouseUsage {
    pub const ALL: [MouseUsage; 3] = [
        MouseUsage::UpToTwo,
        MouseUsage::ThreeToEight,
        MouseUsage::MoreThanEight,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MouseUsage::UpToTwo => "0–2 Hours",
            MouseUsage::ThreeToEight => "3–8 Hours",
            MouseUsage::MoreThanEight => "8+ Hours",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub participant_id: ParticipantId,
    pub handedness: Handedness,
    pub mouse_usage: MouseUsage,
    pub timestamp: DateTime<Utc>,
}

/// One persisted attempt at a target. Hits complete a trial; misses may be
/// followed by further attempts with the same `trial_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant_id: ParticipantId,
    pub trial_number: usize,
    pub diameter: u32,
    pub distance: u32,
    pub direction: Direction,
    pub task_time: f64,
    pub distance_travelled: f64,
    pub hit: bool,
    pub miss: bool,
    pub square_time: f64,
    pub timestamp: DateTime<Utc>,
}

impl TrialRecord {
    pub fn combination(&self) -> TaskCombination {
        TaskCombination {
            diameter: self.diameter,
            distance: self.distance,
            direction: self.direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub participant_id: ParticipantId,
    pub total_distance: f64,
    pub hits: u32,
    pub misses: u32,
    pub accuracy_percentage: f64,
    pub average_square_time: f64,
    pub timestamp: DateTime<Utc>,
}

/// `100 * hits / (hits + misses)`, or 0 when nothing was attempted
pub fn accuracy_percentage(hits: u32, misses: u32) -> f64 {
    let attempts = hits + misses;
    if attempts == 0 {
        0.0
    } else {
        100.0 * hits as f64 / attempts as f64
    }
}
