//! Dense per-state storage for value functions and policies.
//!
//! Cells are laid out as a `cols x rows` array indexed by `[x - 1, y - 1]`,
//! which flattens to `(x - 1) * rows + (y - 1)`. The obstacle cell is `None`.

use ndarray::{Array2, Zip};
use std::ops::{Index, IndexMut};

use super::grid_world::{Action, GridWorld, State};

/// A value of type `T` for every legal state of a grid world.
#[derive(Debug, Clone, PartialEq)]
pub struct StateGrid<T> {
    cells: Array2<Option<T>>,
}

/// Estimated discounted return for every legal state.
pub type ValueFunction = StateGrid<f64>;

/// The chosen action for every legal state; terminal states hold `None`.
pub type Policy = StateGrid<Option<Action>>;

impl<T> StateGrid<T> {
    /// Fills every legal state of `world` with `f(state)`.
    pub fn from_fn<F>(world: &GridWorld, mut f: F) -> Self
    where
        F: FnMut(State) -> T,
    {
        let config = world.config();
        let shape = (config.cols as usize, config.rows as usize);
        let cells = Array2::from_shape_fn(shape, |(i, j)| {
            let state = State::new(i as i32 + 1, j as i32 + 1);
            if world.is_legal(state) {
                Some(f(state))
            } else {
                None
            }
        });
        StateGrid { cells }
    }

    fn cell_index(state: State) -> Option<(usize, usize)> {
        if state.x < 1 || state.y < 1 {
            return None;
        }
        Some(((state.x - 1) as usize, (state.y - 1) as usize))
    }

    /// The entry for `state`, or `None` if it is not a legal state.
    pub fn get(&self, state: State) -> Option<&T> {
        let index = Self::cell_index(state)?;
        self.cells.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, state: State) -> Option<&mut T> {
        let index = Self::cell_index(state)?;
        self.cells.get_mut(index)?.as_mut()
    }

    /// Legal states and their entries, column by column.
    pub fn iter(&self) -> impl Iterator<Item = (State, &T)> + '_ {
        self.cells.indexed_iter().filter_map(|((i, j), cell)| {
            cell.as_ref()
                .map(|value| (State::new(i as i32 + 1, j as i32 + 1), value))
        })
    }

    /// Number of legal states stored.
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The underlying `(cols, rows)` array, for callers that render grids.
    pub fn as_array(&self) -> &Array2<Option<T>> {
        &self.cells
    }
}

impl<T> Index<State> for StateGrid<T> {
    type Output = T;

    fn index(&self, state: State) -> &T {
        match self.get(state) {
            Some(value) => value,
            None => panic!("{} is not a legal state", state),
        }
    }
}

impl<T> IndexMut<State> for StateGrid<T> {
    fn index_mut(&mut self, state: State) -> &mut T {
        match self.get_mut(state) {
            Some(value) => value,
            None => panic!("{} is not a legal state", state),
        }
    }
}

impl StateGrid<f64> {
    /// Terminal states start at their reward, every other state at zero.
    pub fn initial(world: &GridWorld) -> Self {
        Self::from_fn(world, |s| world.terminal_reward(s).unwrap_or(0.0))
    }

    /// Largest absolute per-state difference between two value functions
    /// over the same world.
    pub fn max_abs_difference(&self, other: &Self) -> f64 {
        Zip::from(&self.cells)
            .and(&other.cells)
            .fold(0.0_f64, |acc, a, b| match (a, b) {
                (Some(a), Some(b)) => acc.max((a - b).abs()),
                _ => acc,
            })
    }
}

impl StateGrid<Option<Action>> {
    /// A policy taking `action` in every non-terminal state.
    pub fn uniform(world: &GridWorld, action: Action) -> Self {
        Self::from_fn(world, |s| (!world.is_terminal(s)).then_some(action))
    }

    /// The action chosen in `state`; `None` for terminals and illegal states.
    pub fn action(&self, state: State) -> Option<Action> {
        self.get(state).copied().flatten()
    }
}
