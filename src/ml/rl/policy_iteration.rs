//! Policy iteration for the grid world.
//!
//! Alternates policy evaluation, which solves for the value of the current
//! policy with in-place sweeps, and policy improvement, which makes the policy
//! greedy with respect to those values. Stops when improvement leaves every
//! action unchanged.

use log::{debug, info};

use super::bellman::{backup, greedy_action};
use super::grid_world::{Action, GridWorld, State};
use super::state_grid::{Policy, ValueFunction};
use super::value_iteration::DEFAULT_THETA;

/// Outcome of a policy-iteration run.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyIterationReport {
    /// Value of the final policy
    pub values: ValueFunction,
    /// The stable policy
    pub policy: Policy,
    /// Number of evaluate/improve rounds, including the final stable one
    pub rounds: usize,
    /// Evaluation sweeps spent in each round
    pub evaluation_sweeps: Vec<usize>,
}

/// Solves the default 4x3 world by policy iteration.
///
/// # Examples
///
/// ```
/// use gridworld_mdp::ml::rl::{policy_iteration, Action, State};
///
/// let (values, policy) = policy_iteration();
///
/// assert_eq!(policy.action(State::new(3, 3)), Some(Action::Right));
/// assert!(values[State::new(1, 3)] > 0.0);
/// ```
pub fn policy_iteration() -> (ValueFunction, Policy) {
    let report = policy_iteration_with(&GridWorld::default(), DEFAULT_THETA);
    (report.values, report.policy)
}

/// Runs policy iteration on `world`, evaluating each policy until a sweep
/// changes no value by more than `theta`.
///
/// Starts from [`initial_policy`] and the initial value function (terminal
/// rewards, zero elsewhere).
///
/// # Panics
/// Panics if `theta` is not a positive finite number.
pub fn policy_iteration_with(world: &GridWorld, theta: f64) -> PolicyIterationReport {
    assert!(
        theta > 0.0 && theta.is_finite(),
        "Convergence threshold must be positive, got {}",
        theta
    );

    let mut values = ValueFunction::initial(world);
    let mut policy = initial_policy(world);
    let mut evaluation_sweeps = Vec::new();

    loop {
        let sweeps = evaluate_policy(world, &policy, &mut values, theta);
        evaluation_sweeps.push(sweeps);

        let stable = improve_policy(world, &mut policy, &values);
        debug!(
            "policy iteration round {}: {} evaluation sweeps, stable = {}",
            evaluation_sweeps.len(),
            sweeps,
            stable
        );
        if stable {
            break;
        }
    }

    info!(
        "policy iteration stable after {} rounds",
        evaluation_sweeps.len()
    );

    PolicyIterationReport {
        values,
        policy,
        rounds: evaluation_sweeps.len(),
        evaluation_sweeps,
    }
}

/// The starting policy: `Up` in every non-terminal state.
pub fn initial_policy(world: &GridWorld) -> Policy {
    Policy::uniform(world, Action::Up)
}

/// Iterative policy evaluation, updating `values` in place.
///
/// Each state's new value is visible to the states after it in the same
/// sweep. Terminal states are left untouched. Returns the number of sweeps
/// until the largest change in a sweep fell below `theta`.
///
/// # Panics
/// Panics if a non-terminal state has no action in `policy`.
pub fn evaluate_policy(
    world: &GridWorld,
    policy: &Policy,
    values: &mut ValueFunction,
    theta: f64,
) -> usize {
    let states: Vec<State> = world.non_terminal_states().collect();
    let mut sweeps = 0;
    loop {
        let mut delta = 0.0_f64;
        for &state in &states {
            let action = match policy.action(state) {
                Some(action) => action,
                None => panic!("Policy has no action for non-terminal state {}", state),
            };
            let value = backup(world, values, state, action);
            delta = delta.max((value - values[state]).abs());
            values[state] = value;
        }
        sweeps += 1;

        if delta < theta {
            return sweeps;
        }
    }
}

/// Makes `policy` greedy with respect to `values` in every non-terminal
/// state. Returns `true` when no action changed.
pub fn improve_policy(world: &GridWorld, policy: &mut Policy, values: &ValueFunction) -> bool {
    let mut stable = true;
    for state in world.non_terminal_states() {
        let (best, _) = greedy_action(world, values, state);
        if policy[state] != Some(best) {
            policy[state] = Some(best);
            stable = false;
        }
    }
    stable
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_world_values() {
        let (values, _) = policy_iteration();

        assert_abs_diff_eq!(values[State::new(1, 1)], 0.2965, epsilon = 1e-3);
        assert_abs_diff_eq!(values[State::new(2, 3)], 0.6496, epsilon = 1e-3);
        assert_abs_diff_eq!(values[State::new(3, 3)], 0.7954, epsilon = 1e-3);
        assert_eq!(values[State::new(4, 3)], 1.0);
        assert_eq!(values[State::new(4, 2)], -1.0);
    }

    #[test]
    fn test_rounds() {
        let report = policy_iteration_with(&GridWorld::default(), DEFAULT_THETA);
        assert_eq!(report.rounds, 3);
        assert_eq!(report.evaluation_sweeps.len(), report.rounds);
        assert!(report.evaluation_sweeps.iter().all(|&n| n > 0));
    }

    #[test]
    fn test_evaluate_fixed_policy() {
        let world = GridWorld::default();
        let policy = initial_policy(&world);
        let mut values = ValueFunction::initial(&world);
        let sweeps = evaluate_policy(&world, &policy, &mut values, 1e-10);
        assert!(sweeps > 1);

        // The evaluated values satisfy the Bellman equation for the policy
        for state in world.non_terminal_states() {
            let expected = backup(&world, &values, state, Action::Up);
            assert_abs_diff_eq!(values[state], expected, epsilon = 1e-9);
        }
        assert_eq!(values[State::new(4, 3)], 1.0);
    }

    #[test]
    fn test_evaluation_is_in_place() {
        // One sweep of Up from zero: (1, 1) is updated before (1, 2) reads it
        let world = GridWorld::default();
        let policy = initial_policy(&world);
        let mut values = ValueFunction::initial(&world);
        evaluate_policy(&world, &policy, &mut values, f64::INFINITY);

        let v11 = -0.04;
        assert_abs_diff_eq!(values[State::new(1, 1)], v11, epsilon = 1e-12);
        // (1, 2) up: 0.8 -> (1, 3), 0.1 bump -> (1, 2), 0.1 obstacle bump -> (1, 2)
        assert_abs_diff_eq!(values[State::new(1, 2)], -0.04, epsilon = 1e-12);
        // (2, 1) up bumps the obstacle: 0.8 stay, 0.1 -> (1, 1), 0.1 -> (3, 1)
        let v21 = -0.04 + 0.9 * 0.1 * v11;
        assert_abs_diff_eq!(values[State::new(2, 1)], v21, epsilon = 1e-12);
    }

    #[test]
    fn test_improve_reports_stability() {
        let world = GridWorld::default();
        let report = policy_iteration_with(&world, DEFAULT_THETA);
        let mut policy = report.policy.clone();
        assert!(improve_policy(&world, &mut policy, &report.values));
        assert_eq!(policy, report.policy);

        let mut up = initial_policy(&world);
        assert!(!improve_policy(&world, &mut up, &report.values));
        assert_eq!(up, report.policy);
    }

    #[test]
    #[should_panic]
    fn test_evaluate_rejects_incomplete_policy() {
        let world = GridWorld::default();
        let policy = Policy::from_fn(&world, |_| None);
        let mut values = ValueFunction::initial(&world);
        evaluate_policy(&world, &policy, &mut values, DEFAULT_THETA);
    }
}
