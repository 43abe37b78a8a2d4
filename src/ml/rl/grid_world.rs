//! A small stochastic grid world expressed as a Markov Decision Process.
//!
//! The agent moves on a `cols x rows` board with one blocked cell. Every
//! action succeeds with `intended_probability` and otherwise slips to one of
//! the two perpendicular directions with `slip_probability` each. Some cells
//! are absorbing terminals that pay a fixed reward; every other cell costs
//! `step_reward` to stand in.

use log::debug;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// A cell on the board, 1-indexed: `x` counts columns from the left and `y`
/// counts rows from the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    pub x: i32,
    pub y: i32,
}

impl State {
    pub const fn new(x: i32, y: i32) -> Self {
        State { x, y }
    }

    fn offset(self, (dx, dy): (i32, i32)) -> Self {
        State::new(self.x + dx, self.y + dy)
    }
}

impl From<(i32, i32)> for State {
    fn from((x, y): (i32, i32)) -> Self {
        State::new(x, y)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four compass moves available in every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// Every action in enumeration order. Greedy selection breaks ties in
    /// favour of the earliest action in this list.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Unit displacement `(dx, dy)` of the action.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (0, 1),
            Action::Down => (0, -1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }

    /// The two directions an action can slip into.
    pub fn perpendicular(self) -> [Action; 2] {
        match self {
            Action::Up | Action::Down => [Action::Left, Action::Right],
            Action::Left | Action::Right => [Action::Up, Action::Down],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of a grid world.
///
/// `Default` yields the classic 4x3 board: obstacle at `(2, 2)`, `+1` exit at
/// `(4, 3)`, `-1` exit at `(4, 2)`, discount `0.9`, step reward `-0.04` and an
/// 80/10/10 slip model.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWorldConfig {
    /// Number of columns (`x` ranges over `1..=cols`)
    pub cols: i32,
    /// Number of rows (`y` ranges over `1..=rows`)
    pub rows: i32,
    /// The single blocked cell
    pub obstacle: State,
    /// Absorbing states and the reward they pay
    pub terminals: BTreeMap<State, f64>,
    /// Discount factor (0 <= gamma < 1)
    pub gamma: f64,
    /// Reward for every non-terminal state
    pub step_reward: f64,
    /// Probability that an action moves in its intended direction
    pub intended_probability: f64,
    /// Probability of slipping into each of the two perpendicular directions
    pub slip_probability: f64,
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        let mut terminals = BTreeMap::new();
        terminals.insert(State::new(4, 3), 1.0);
        terminals.insert(State::new(4, 2), -1.0);

        Self {
            cols: 4,
            rows: 3,
            obstacle: State::new(2, 2),
            terminals,
            gamma: 0.9,
            step_reward: -0.04,
            intended_probability: 0.8,
            slip_probability: 0.1,
        }
    }
}

impl GridWorldConfig {
    fn in_bounds(&self, state: State) -> bool {
        (1..=self.cols).contains(&state.x) && (1..=self.rows).contains(&state.y)
    }

    /// Checks that the configuration describes a solvable world.
    pub fn validate(&self) -> Result<()> {
        if self.cols < 1 || self.rows < 1 {
            return Err(Error::EmptyGrid {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if !self.in_bounds(self.obstacle) {
            return Err(Error::ObstacleOutOfBounds(self.obstacle));
        }
        for (&state, &reward) in &self.terminals {
            if !self.in_bounds(state) || state == self.obstacle {
                return Err(Error::IllegalTerminal(state));
            }
            if !reward.is_finite() {
                return Err(Error::NonFiniteTerminalReward(state));
            }
        }
        // gamma < 1 keeps both solvers contractions
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(Error::InvalidDiscount(self.gamma));
        }
        if !self.step_reward.is_finite() {
            return Err(Error::NonFiniteStepReward(self.step_reward));
        }
        let probabilities = [self.intended_probability, self.slip_probability];
        let total = self.intended_probability + 2.0 * self.slip_probability;
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p))
            || (total - 1.0).abs() > 1e-9
        {
            return Err(Error::InvalidProbability {
                intended: self.intended_probability,
                slip: self.slip_probability,
            });
        }
        Ok(())
    }
}

/// A probability mass function over successor states.
///
/// Outcomes keep the order in which they were first produced, so sums over a
/// distribution are evaluated in the same order on every run.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    outcomes: Vec<(State, f64)>,
}

impl Distribution {
    fn certain(state: State) -> Self {
        Distribution {
            outcomes: vec![(state, 1.0)],
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        Distribution {
            outcomes: Vec::with_capacity(capacity),
        }
    }

    /// Adds `probability` to `state`, merging with an existing outcome.
    fn accumulate(&mut self, state: State, probability: f64) {
        if probability <= 0.0 {
            return;
        }
        match self.outcomes.iter_mut().find(|(s, _)| *s == state) {
            Some((_, p)) => *p += probability,
            None => self.outcomes.push((state, probability)),
        }
    }

    /// `(successor, probability)` pairs in insertion order.
    pub fn outcomes(&self) -> &[(State, f64)] {
        &self.outcomes
    }

    /// Probability of reaching `state`, zero if it is not an outcome.
    pub fn probability(&self, state: State) -> f64 {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == state)
            .map_or(0.0, |&(_, p)| p)
    }

    /// Sum of all probabilities; 1.0 up to rounding.
    pub fn total(&self) -> f64 {
        self.outcomes.iter().map(|&(_, p)| p).sum()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Expected value of `f` over the successor states.
    pub fn expectation<F>(&self, mut f: F) -> f64
    where
        F: FnMut(State) -> f64,
    {
        let mut total = 0.0;
        for &(state, probability) in &self.outcomes {
            total += probability * f(state);
        }
        total
    }
}

/// The grid world MDP: legality, rewards and the stochastic transition model.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: GridWorldConfig,
    states: Vec<State>,
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::from_config(GridWorldConfig::default())
    }
}

impl GridWorld {
    /// Builds a world after validating `config`.
    pub fn new(config: GridWorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: GridWorldConfig) -> Self {
        // x-major so that the position in `states` follows (x-1)*rows + (y-1)
        let states: Vec<State> = (1..=config.cols)
            .flat_map(|x| (1..=config.rows).map(move |y| State::new(x, y)))
            .filter(|&s| s != config.obstacle)
            .collect();

        debug!(
            "grid world {}x{} with {} states ({} terminal)",
            config.cols,
            config.rows,
            states.len(),
            config.terminals.len()
        );

        GridWorld { config, states }
    }

    pub fn config(&self) -> &GridWorldConfig {
        &self.config
    }

    pub fn gamma(&self) -> f64 {
        self.config.gamma
    }

    /// Every legal state, column by column.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Legal states that are not terminal, in the same order as `states`.
    pub fn non_terminal_states(&self) -> impl Iterator<Item = State> + '_ {
        self.states
            .iter()
            .copied()
            .filter(move |&s| !self.is_terminal(s))
    }

    /// True iff `state` is on the board and not the obstacle.
    pub fn is_legal(&self, state: State) -> bool {
        self.config.in_bounds(state) && state != self.config.obstacle
    }

    pub fn is_terminal(&self, state: State) -> bool {
        self.config.terminals.contains_key(&state)
    }

    pub fn terminal_reward(&self, state: State) -> Option<f64> {
        self.config.terminals.get(&state).copied()
    }

    /// Reward for being in `state`: its terminal payoff, otherwise the step
    /// reward.
    pub fn reward(&self, state: State) -> f64 {
        self.terminal_reward(state).unwrap_or(self.config.step_reward)
    }

    /// Moves one cell in the direction of `action`, staying put when the move
    /// would leave the board or hit the obstacle.
    pub fn deterministic_move(&self, state: State, action: Action) -> State {
        debug_assert!(self.is_legal(state), "{} is not a legal state", state);
        let next = state.offset(action.delta());
        if self.is_legal(next) {
            next
        } else {
            state
        }
    }

    /// Successor distribution for taking `action` in `state`.
    ///
    /// Terminal states are absorbing and return `{state: 1.0}` whatever the
    /// action.
    pub fn transition(&self, state: State, action: Action) -> Distribution {
        debug_assert!(self.is_legal(state), "{} is not a legal state", state);
        if self.is_terminal(state) {
            return Distribution::certain(state);
        }

        let slip = self.config.slip_probability;
        let [first, second] = action.perpendicular();
        let mut distribution = Distribution::with_capacity(3);
        for (outcome, probability) in [
            (action, self.config.intended_probability),
            (first, slip),
            (second, slip),
        ] {
            distribution.accumulate(self.deterministic_move(state, outcome), probability);
        }
        distribution
    }
}
