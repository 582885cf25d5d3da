//! Client for the platform authentication API. The wizard in [`crate::flow`]
//! is the only consumer; everything here is request plumbing and wire types.

mod client;
mod error;
pub mod types;

pub use client::{AuthClient, LoginOutcome};
pub use error::ApiError;
