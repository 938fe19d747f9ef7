mod health;
mod index;
mod votes;

pub use health::*;
pub use index::*;
pub use votes::*;
