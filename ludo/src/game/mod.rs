//! Core game logic: board entities, move rules, and turn scheduling.

pub mod constants;
pub mod entities;
pub mod errors;
pub mod rules;
pub mod scheduler;

pub use errors::{ErrorCategory, GameError};
