use std::collections::BTreeMap;

use approx::assert_abs_diff_eq;

use crate::ml::rl::{
    policy_iteration, policy_iteration_with, value_iteration, value_iteration_with, Action,
    GridWorld, GridWorldConfig, State, DEFAULT_THETA,
};

#[test]
fn test_solvers_agree_on_default_world() {
    let (vi_values, vi_policy) = value_iteration(DEFAULT_THETA);
    let (pi_values, pi_policy) = policy_iteration();

    assert!(vi_values.max_abs_difference(&pi_values) < 1e-3);
    assert_eq!(vi_policy, pi_policy);

    let world = GridWorld::default();
    for state in world.non_terminal_states() {
        assert!(vi_policy.action(state).is_some());
        assert_eq!(vi_policy.action(state), pi_policy.action(state));
    }
}

#[test]
fn test_default_world_landmarks() {
    let (values, policy) = value_iteration(DEFAULT_THETA);

    // Up and Right are the candidates at the start; Up wins outright
    assert_eq!(policy.action(State::new(1, 1)), Some(Action::Up));
    assert!(values[State::new(1, 3)] > 0.0);
    // (3, 2) sits next to the -1 exit and is worth less than (3, 3)
    assert!(values[State::new(3, 2)] < values[State::new(3, 3)]);
    // Right from (3, 2) would risk the -1 exit, so the policy avoids it
    assert_ne!(policy.action(State::new(3, 2)), Some(Action::Right));
}

#[test]
fn test_solvers_are_deterministic() {
    let world = GridWorld::default();

    let vi_a = value_iteration_with(&world, DEFAULT_THETA);
    let vi_b = value_iteration_with(&world, DEFAULT_THETA);
    assert_eq!(vi_a, vi_b);
    for ((_, a), (_, b)) in vi_a.values.iter().zip(vi_b.values.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }

    let pi_a = policy_iteration_with(&world, DEFAULT_THETA);
    let pi_b = policy_iteration_with(&world, DEFAULT_THETA);
    assert_eq!(pi_a, pi_b);
}

#[test]
fn test_solvers_agree_on_custom_world() {
    // 5x4 board, harsher living cost, steeper discount
    let mut terminals = BTreeMap::new();
    terminals.insert(State::new(5, 4), 2.0);
    terminals.insert(State::new(5, 3), -2.0);
    terminals.insert(State::new(1, 4), 0.5);
    let world = GridWorld::new(GridWorldConfig {
        cols: 5,
        rows: 4,
        obstacle: State::new(3, 2),
        terminals,
        gamma: 0.95,
        step_reward: -0.1,
        intended_probability: 0.7,
        slip_probability: 0.15,
    })
    .unwrap();

    let vi = value_iteration_with(&world, 1e-7);
    let pi = policy_iteration_with(&world, 1e-7);

    assert!(vi.values.max_abs_difference(&pi.values) < 1e-3);
    for state in world.non_terminal_states() {
        let vi_action = vi.policy.action(state).unwrap();
        let pi_action = pi.policy.action(state).unwrap();
        if vi_action != pi_action {
            // Only a genuine tie may separate the two solvers
            let q_vi = crate::ml::rl::expected_value(&world, &vi.values, state, vi_action);
            let q_pi = crate::ml::rl::expected_value(&world, &vi.values, state, pi_action);
            assert_abs_diff_eq!(q_vi, q_pi, epsilon = 1e-4);
        }
    }
    assert_eq!(vi.values[State::new(1, 4)], 0.5);
}

#[test]
fn test_zero_discount_is_myopic() {
    let world = GridWorld::new(GridWorldConfig {
        gamma: 0.0,
        ..GridWorldConfig::default()
    })
    .unwrap();

    let vi = value_iteration_with(&world, DEFAULT_THETA);
    let pi = policy_iteration_with(&world, DEFAULT_THETA);
    for state in world.non_terminal_states() {
        assert_eq!(vi.values[state], -0.04);
        assert_eq!(pi.values[state], -0.04);
    }
    // Only the exits themselves pull the greedy choice
    assert_eq!(vi.policy.action(State::new(3, 3)), Some(Action::Right));
    assert_eq!(vi.policy, pi.policy);
    assert_eq!(vi.sweeps, 2);
}
