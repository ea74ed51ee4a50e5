pub mod geometry;
pub mod phase;
pub mod record;
pub mod task;
pub mod view;

pub use geometry::{Bounds, ClickOutcome, Point, classify_click, target_center};
pub use phase::{Phase, SessionPhase};
pub use record::{
    Handedness, MouseUsage, ParticipantId, ParticipantSummary, ScreeningRecord, TrialRecord,
    TrialState, accuracy_percentage,
};
pub use task::{Direction, TaskCombination};
pub use view::{FrameView, Rgba, Shape, TextAnchor};
