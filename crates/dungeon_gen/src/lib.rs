//! Puzzle dungeon generator
//!
//! A dungeon is a set of enclaves connected by doorways. Every enclave holds a mechanism which
//! changes one state variable and every doorway requires some variables to have specific
//! values. The generator grows the dungeon one enclave at a time and simulates a player while
//! doing so, which makes the result solvable by construction.

mod builder;
mod dungeon;
mod enclave;
mod error;
mod reach;
mod report;
mod state;
mod unused;

pub use builder::*;
pub use dungeon::*;
pub use enclave::*;
pub use error::*;
pub use reach::*;
pub use report::*;
pub use state::*;
pub use unused::*;
