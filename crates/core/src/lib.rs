//! Emporium Core - Shared types library.
//!
//! This crate provides common types used across all Emporium components:
//! - `storefront` - API client, cart synchronizer and checkout handoff
//! - `cli` - Command-line front end for shoppers and admins
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Cart totals and order summaries are computed here so every surface
//! derives them the same way.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, products, cart lines, orders, accounts and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
