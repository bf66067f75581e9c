//! # arcpay-gateway
//!
//! REST backend for the ArcPay waitlist and referral program.
//!
//! The marketing site, wallet adapter, and dashboard UI are external
//! collaborators; this crate is the request/response model behind them:
//! waitlist signup and login, the referral/points ledger, per-user task
//! verification, an event-sourced points accumulator, the merchant
//! leaderboard reconciler, and the contact-form-to-Telegram notifier.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + DTOs (api/)
//!     ├── Session cookies (api/session)
//!     │
//!     ├── UserService / ReferralService / TaskService (service/)
//!     ├── LeaderboardReconciler (service/)
//!     │
//!     ├── UserRegistry / ReferralBook / TaskStore / PointsLog (domain/)
//!     ├── Telegram integration (notify/)
//!     │
//!     └── PostgreSQL write-behind mirror (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod service;
