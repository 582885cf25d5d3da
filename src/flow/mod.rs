//! Security-setup wizard gating dashboard access.

pub mod input;
mod machine;
mod rules;

pub use machine::{FlowError, Outcome, SecuritySetup, Step};
pub use rules::{next_gate, Gate};
