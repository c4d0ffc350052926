//! Mod discovery for a game mod manager.
//!
//! [`core::source_collector`] gathers candidate sources from the game's
//! search roots, [`core::discovery`] turns them into descriptors on a worker
//! pool (in batch or as an ordered stream), and [`core::load_status`] decides
//! which of them the game will actually load. [`core::registry::ModRegistry`]
//! ties these together with the on-disk and in-memory metadata caches.

pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod utils;
