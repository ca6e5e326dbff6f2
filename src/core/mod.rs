//! # Core Application Logic
//!
//! This module contains pushbox's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No terminal. No HTTP.  │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │ Messaging  │      │  Updates   │
//!     │  Adapter   │      │ (push gw)  │      │ (manifest) │
//!     │ (ratatui)  │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`notification`]: records and the ingestion defaulting rules
//! - [`notification_log`]: the newest-first notification log
//! - [`update`]: the update trigger state machine and flow
//! - [`state`]: the `App` struct, all application state in one place
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`config`]: layered configuration

pub mod action;
pub mod config;
pub mod notification;
pub mod notification_log;
pub mod state;
pub mod update;
