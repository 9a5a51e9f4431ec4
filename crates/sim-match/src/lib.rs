#![deny(warnings)]

//! Match simulation: weighted player selection, lineup construction and the
//! minute-by-minute match state machine.
//!
//! All randomness comes from a caller-supplied [`rand::Rng`], so a seeded
//! generator (e.g. `ChaCha8Rng`) reproduces a match exactly.

pub mod commentary;
pub mod engine;
pub mod lineup;
pub mod roster;
pub mod selector;
pub mod squad;

pub use engine::{simulate_match, substitution_probability, MatchSimulator};
pub use lineup::build_lineup;
pub use roster::{Booking, RosterState};
pub use selector::{select, Purpose};
