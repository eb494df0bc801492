//! # Championship Backend
//!
//! Bookkeeping for a racing championship: teams, drivers, races and
//! per-race results, plus the driver standings derived from them.
//!
//! ## Features
//!
//! - **Roster rules**: at most two drivers per team, race numbers unique
//! - **Result rules**: one result per driver per race, one driver per position
//! - **Standings**: fixed top-10 points table, stable ranking
//! - **Reports**: championship summary as CSV
//! - **HTTP API**: REST endpoints via Axum
//!
//! ## Architecture
//!
//! - [`api`]: entity types and request payloads
//! - [`db`]: repository traits, in-memory and PostgreSQL stores, factory
//! - [`services`]: rule engines and read models
//! - [`http`]: Axum router and handlers (feature `http-server`)

// RepositoryError carries an ErrorContext
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
