//! ServiceTrack API Library
//!
//! Service-layer core of the ServiceTrack repair/assembly pipeline: stage
//! routing and activities, the raw material ledger, and disassembly
//! recovery. The surrounding system supplies transport, authentication,
//! and reporting; this crate owns the state machine and its invariants.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

impl AppState {
    /// Builds the application state over an established connection pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        roles: Arc<dyn services::RoleDirectory>,
        event_sender: events::EventSender,
    ) -> Self {
        let services = services::AppServices::new(
            db.clone(),
            config.pipeline.clone(),
            roles,
            Some(event_sender.clone()),
        );

        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}
