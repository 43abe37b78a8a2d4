//! Bellman backups shared by the dynamic-programming solvers.

use super::grid_world::{Action, GridWorld, State};
use super::state_grid::{Policy, ValueFunction};

/// Expected value `sum_{s'} P(s'|s,a) * U(s')` of taking `action` in `state`.
pub fn expected_value(
    world: &GridWorld,
    values: &ValueFunction,
    state: State,
    action: Action,
) -> f64 {
    world
        .transition(state, action)
        .expectation(|next| values[next])
}

/// One-step lookahead `R(s) + gamma * sum_{s'} P(s'|s,a) * U(s')`.
pub fn backup(world: &GridWorld, values: &ValueFunction, state: State, action: Action) -> f64 {
    world.reward(state) + world.gamma() * expected_value(world, values, state, action)
}

/// The action with the highest expected value in `state`, with its value.
///
/// Actions are tried in `Action::ALL` order and the best is only replaced by
/// a strictly greater value, so ties go to the earliest action.
pub fn greedy_action(world: &GridWorld, values: &ValueFunction, state: State) -> (Action, f64) {
    let mut best_action = Action::ALL[0];
    let mut best_value = f64::NEG_INFINITY;
    for action in Action::ALL {
        let value = expected_value(world, values, state, action);
        if value > best_value {
            best_value = value;
            best_action = action;
        }
    }
    (best_action, best_value)
}

/// Greedy policy with respect to `values`; terminal states get no action.
pub fn greedy_policy(world: &GridWorld, values: &ValueFunction) -> Policy {
    Policy::from_fn(world, |state| {
        if world.is_terminal(state) {
            None
        } else {
            Some(greedy_action(world, values, state).0)
        }
    })
}
