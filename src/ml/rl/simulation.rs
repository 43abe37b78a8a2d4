//! Sampling episodes from the grid world.
//!
//! Used to check a computed policy empirically: the mean discounted return
//! of many rollouts from a state converges to that state's value under the
//! policy.

use rand::distributions::{Distribution as _, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::grid_world::{Action, GridWorld, State};
use super::state_grid::Policy;
use crate::error::{Error, Result};

/// A trajectory through the grid world.
///
/// `states[0]` is the start and `states[t + 1]` is where `actions[t]` led.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub states: Vec<State>,
    pub actions: Vec<Action>,
    /// Whether the episode ended by entering a terminal state
    pub terminated: bool,
}

impl Episode {
    /// Number of actions taken.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn final_state(&self) -> Option<State> {
        self.states.last().copied()
    }

    /// `sum_t gamma^t * R(s_t)` over the visited states, terminal included.
    pub fn discounted_return(&self, world: &GridWorld) -> f64 {
        let gamma = world.gamma();
        let mut discount = 1.0;
        let mut total = 0.0;
        for &state in &self.states {
            total += discount * world.reward(state);
            discount *= gamma;
        }
        total
    }
}

/// Draws a successor of `state` under `action`.
pub fn sample_transition<R>(
    world: &GridWorld,
    state: State,
    action: Action,
    rng: &mut R,
) -> Result<State>
where
    R: Rng + ?Sized,
{
    if !world.is_legal(state) {
        return Err(Error::IllegalState(state));
    }
    let distribution = world.transition(state, action);
    let outcomes = distribution.outcomes();
    let index = WeightedIndex::new(outcomes.iter().map(|&(_, p)| p))?;
    Ok(outcomes[index.sample(rng)].0)
}

/// Follows `policy` from `start` until a terminal state is entered or
/// `max_steps` actions have been taken.
pub fn rollout<R>(
    world: &GridWorld,
    policy: &Policy,
    start: State,
    max_steps: usize,
    rng: &mut R,
) -> Result<Episode>
where
    R: Rng + ?Sized,
{
    if !world.is_legal(start) {
        return Err(Error::IllegalState(start));
    }

    let mut states = vec![start];
    let mut actions = Vec::new();
    let mut state = start;
    while !world.is_terminal(state) && actions.len() < max_steps {
        let action = policy.action(state).ok_or(Error::MissingAction(state))?;
        state = sample_transition(world, state, action, rng)?;
        actions.push(action);
        states.push(state);
    }

    Ok(Episode {
        terminated: world.is_terminal(state),
        states,
        actions,
    })
}

/// Monte Carlo estimate of the value of `start` under `policy`: the mean
/// discounted return of `episodes` rollouts seeded from `seed`.
///
/// # Panics
/// Panics if `episodes` is zero.
pub fn estimate_value(
    world: &GridWorld,
    policy: &Policy,
    start: State,
    episodes: usize,
    max_steps: usize,
    seed: u64,
) -> Result<f64> {
    assert!(episodes > 0, "Need at least one episode");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut total = 0.0;
    for _ in 0..episodes {
        let episode = rollout(world, policy, start, max_steps, &mut rng)?;
        total += episode.discounted_return(world);
    }
    Ok(total / episodes as f64)
}
