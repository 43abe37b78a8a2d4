//! Value iteration for the grid world.
//!
//! Each sweep applies the Bellman optimality update
//! `U(s) = R(s) + gamma * max_a sum_{s'} P(s'|s,a) U(s')` to every
//! non-terminal state, reading only the previous sweep's values. Sweeps stop
//! once the largest change falls below `theta`, after which a greedy policy
//! is read off the converged values.

use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::bellman::{greedy_action, greedy_policy};
use super::grid_world::{GridWorld, State};
use super::state_grid::{Policy, ValueFunction};

/// Default convergence threshold on the per-sweep maximum change.
pub const DEFAULT_THETA: f64 = 1e-5;

/// Outcome of a value-iteration run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueIterationReport {
    /// The converged value function
    pub values: ValueFunction,
    /// Greedy policy with respect to `values`
    pub policy: Policy,
    /// Number of sweeps performed
    pub sweeps: usize,
    /// Largest absolute change observed in each sweep
    pub deltas: Vec<f64>,
}

/// Solves the default 4x3 world by value iteration.
///
/// # Panics
/// Panics if `theta` is not a positive finite number.
///
/// # Examples
///
/// ```
/// use gridworld_mdp::ml::rl::{value_iteration, Action, State, DEFAULT_THETA};
///
/// let (values, policy) = value_iteration(DEFAULT_THETA);
///
/// assert_eq!(policy.action(State::new(1, 1)), Some(Action::Up));
/// assert!(values[State::new(3, 3)] > values[State::new(1, 1)]);
/// ```
pub fn value_iteration(theta: f64) -> (ValueFunction, Policy) {
    let report = value_iteration_with(&GridWorld::default(), theta);
    (report.values, report.policy)
}

/// Runs value iteration on `world` until a sweep changes no value by more
/// than `theta`.
///
/// There is no sweep limit; a valid world has `gamma < 1`, which guarantees
/// convergence.
///
/// # Panics
/// Panics if `theta` is not a positive finite number.
pub fn value_iteration_with(world: &GridWorld, theta: f64) -> ValueIterationReport {
    assert!(
        theta > 0.0 && theta.is_finite(),
        "Convergence threshold must be positive, got {}",
        theta
    );

    let states: Vec<State> = world.non_terminal_states().collect();
    let mut values = ValueFunction::initial(world);
    let mut deltas = Vec::new();

    loop {
        // Every update in this sweep reads the snapshot, never `values`
        let snapshot = values.clone();
        let updates = sweep(world, &snapshot, &states);

        let mut delta = 0.0_f64;
        for (&state, &value) in states.iter().zip(&updates) {
            delta = delta.max((value - snapshot[state]).abs());
            values[state] = value;
        }
        deltas.push(delta);
        debug!("value iteration sweep {}: max delta {:e}", deltas.len(), delta);

        if delta < theta {
            break;
        }
    }

    info!(
        "value iteration converged after {} sweeps (theta = {:e})",
        deltas.len(),
        theta
    );

    let policy = greedy_policy(world, &values);
    ValueIterationReport {
        values,
        policy,
        sweeps: deltas.len(),
        deltas,
    }
}

/// New value of each state in `states` computed from `snapshot`.
#[cfg(not(feature = "parallel"))]
fn sweep(world: &GridWorld, snapshot: &ValueFunction, states: &[State]) -> Vec<f64> {
    states
        .iter()
        .map(|&state| optimal_backup(world, snapshot, state))
        .collect()
}

/// New value of each state in `states` computed from `snapshot`.
///
/// States only read the snapshot, so they can be updated in parallel; the
/// results come back in `states` order.
#[cfg(feature = "parallel")]
fn sweep(world: &GridWorld, snapshot: &ValueFunction, states: &[State]) -> Vec<f64> {
    states
        .par_iter()
        .map(|&state| optimal_backup(world, snapshot, state))
        .collect()
}

fn optimal_backup(world: &GridWorld, values: &ValueFunction, state: State) -> f64 {
    let (_, best) = greedy_action(world, values, state);
    world.reward(state) + world.gamma() * best
}
