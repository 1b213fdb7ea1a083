//! # ddnsd
//!
//! Edge daemon for signed DDNS updates: an `axum` router in front of the
//! `ddns-core` validator and record updater, with the Cloudflare provider.
//!
//! The binary in `main.rs` is a thin integration layer: it reads
//! [`settings::Settings`] from the environment, builds [`app::AppState`]
//! and serves [`app::create_router`].

pub mod app;
pub mod settings;

pub use app::{AppState, create_router};
pub use settings::Settings;
