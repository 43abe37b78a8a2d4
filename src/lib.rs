pub mod error;
pub mod ml;

pub use error::{Error, Result};
pub use ml::rl;
