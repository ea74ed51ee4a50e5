use fitts_core::{TaskCombination, TrialState};

/// The trial currently on screen
#[derive(Debug, Clone)]
pub struct Trial<T> {
    /// 1-based position in the session
    pub number: usize,
    /// Drawn when the square is clicked
    pub combination: Option<TaskCombination>,
    pub timestamps: TrialTimestamps<T>,
    pub square_time: Option<f64>,
    pub attempts: u32,
    pub state: TrialState,
}

#[derive(Debug, Clone)]
pub struct TrialTimestamps<T> {
    pub square_shown: T,
    pub circle_shown: Option<T>,
}

impl<T> Trial<T> {
    pub fn new(number: usize, square_shown: T) -> Self {
        Self {
            number,
            combination: None,
            timestamps: TrialTimestamps {
                square_shown,
                circle_shown: None,
            },
            square_time: None,
            attempts: 0,
            state: TrialState::AwaitSquareClick,
        }
    }
}
