//! HTTP handlers for quire-api.

pub mod account;
pub mod admin;
pub mod notes;
pub mod tags;
