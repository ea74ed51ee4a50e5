pub mod config;
pub mod error;
pub mod generator;
pub mod screening;
pub mod state;
pub mod summary;
pub mod trial;

pub use config::{AttemptPolicy, ExperimentConfig};
pub use error::{ExperimentError, Result};
pub use generator::{TrialGenerator, build_combinations};
pub use screening::{ScreeningControl, ScreeningForm, ScreeningLayout};
pub use state::{ExperimentEvent, ExperimentStateMachine, SessionContext};
pub use summary::SessionTally;
pub use trial::{Trial, TrialTimestamps};
