//! Client for the ad account reseller platform. New accounts must clear a
//! sequence of security gates (email verification, TOTP enrollment, mandatory
//! password rotation) before the dashboard is reachable; [`flow`] implements
//! that wizard as a state machine over the [`api`] client.

pub mod api;
pub mod cli;
pub mod flow;
