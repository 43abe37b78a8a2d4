pub mod rl;

pub use rl::*;
