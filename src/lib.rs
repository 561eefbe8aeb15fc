//! Harvests SWAPI people, resolves their linked resources to names, and
//! stores one flattened row per person.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod harvest;
pub mod logging;
pub mod swapi;
pub mod utils;
