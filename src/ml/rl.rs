pub mod bellman;
pub mod grid_world;
pub mod policy_iteration;
pub mod simulation;
pub mod state_grid;
pub mod value_iteration;

#[cfg(test)]
mod tests;

pub use bellman::{backup, expected_value, greedy_action, greedy_policy};
pub use grid_world::{Action, Distribution, GridWorld, GridWorldConfig, State};
pub use policy_iteration::{
    evaluate_policy, improve_policy, initial_policy, policy_iteration, policy_iteration_with,
    PolicyIterationReport,
};
pub use simulation::{estimate_value, rollout, sample_transition, Episode};
pub use state_grid::{Policy, StateGrid, ValueFunction};
pub use value_iteration::{
    value_iteration, value_iteration_with, ValueIterationReport, DEFAULT_THETA,
};
