// src/cli/handlers/mod.rs

// One module per CLI command; `commons` holds what they share.

pub mod add;
pub mod commons;
pub mod kill_chaincode;
pub mod lifecycle;
pub mod list;
pub mod peer;
pub mod remove;
pub mod status;
