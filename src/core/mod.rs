// src/core/mod.rs

pub mod environment;
pub mod factory;
pub mod local;
pub mod managed;
pub mod nodes;
pub mod paths;
pub mod registry;
pub mod runtime_state;
pub mod settings;
pub mod ticker;
