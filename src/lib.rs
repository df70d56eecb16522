//! Bookshelf application library
//!
//! The books module plus the bootstrap that wires settings, the store, the
//! module registry and the HTTP server together.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::{build_registry, build_router, migrate, open_store, serve, Store};
