use rand::distributions::WeightedError;
use thiserror::Error;

use crate::ml::rl::grid_world::State;

/// Errors raised while building a grid world or sampling from it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("grid must have at least one column and one row, got {cols}x{rows}")]
    EmptyGrid { cols: i32, rows: i32 },

    #[error("obstacle {0} lies outside the grid")]
    ObstacleOutOfBounds(State),

    #[error("terminal state {0} is not a legal position")]
    IllegalTerminal(State),

    #[error("discount factor must lie in [0, 1), got {0}")]
    InvalidDiscount(f64),

    #[error("slip model must be a distribution, got intended {intended} and slip {slip}")]
    InvalidProbability { intended: f64, slip: f64 },

    #[error("step reward must be finite, got {0}")]
    NonFiniteStepReward(f64),

    #[error("terminal reward for {0} must be finite")]
    NonFiniteTerminalReward(State),

    #[error("{0} is not a legal state")]
    IllegalState(State),

    #[error("policy has no action for non-terminal state {0}")]
    MissingAction(State),

    #[error("transition distribution cannot be sampled: {0}")]
    InvalidDistribution(#[from] WeightedError),
}

pub type Result<T> = std::result::Result<T, Error>;
