//! The interface between boards and robot searches.
//!
//! Searches only see a [`RulesEngine`]: candidate moves, exact
//! execute/unexecute, the result, a digest and a static evaluation.

pub mod engine;

pub use engine::{GameResult, RulesEngine};
