//! Relicard turns public Honkai: Star Rail profile data into build cards.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`fetch`] queries the provider endpoints in priority order, with a
//!   per-UID on-disk cache in front.
//! - [`normalize`] maps any supported provider payload onto the [`model`]
//!   types, with lookups into the [`gamedata`] snapshot and relic
//!   [`scoring`].
//! - [`render`] lays out and rasterizes the card, pulling bitmaps through the
//!   [`assets`] resolver.
//! - [`service`] ties the three together behind `get_card`.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod assets;
pub mod cli;
pub mod core;
pub mod fetch;
pub mod gamedata;
pub mod model;
pub mod normalize;
pub mod render;
pub mod scoring;
pub mod service;
pub mod utils;
