//! rickdex-core library.
//!
//! Catalog aggregation, filtering and per-identity favorites for the
//! Rick and Morty character browser.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums in the engine, `anyhow::Result` at
//!   configuration edges.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Threading**: everything runs on one logical thread; state uses
//!   `RefCell` and borrows never span an `.await`.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod kv;
pub mod model;
pub mod observe;
pub mod session;
pub mod sort;
pub mod source;
pub mod view;
