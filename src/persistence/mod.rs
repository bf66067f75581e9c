//! Persistence layer: PostgreSQL write-behind mirror.
//!
//! The in-memory domain stores are the operational system of record;
//! PostgreSQL keeps a durable mirror written best-effort after each
//! mutation, plus the points-history log replayed at startup.
//!
//! Expected schema (one table per collection, matching the documented
//! indexes):
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY,
//!     wallet_address TEXT NOT NULL UNIQUE,
//!     email TEXT UNIQUE,
//!     phone TEXT,
//!     referral_code TEXT NOT NULL,
//!     status TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     last_login_at TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE referrals (
//!     id UUID PRIMARY KEY,
//!     referrer_id UUID NOT NULL,
//!     referred_user_id UUID NOT NULL UNIQUE,
//!     code TEXT NOT NULL,
//!     reward_status TEXT NOT NULL,
//!     reward_amount BIGINT NOT NULL,
//!     actions_completed TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE INDEX referrals_referrer_idx ON referrals (referrer_id);
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     user_id UUID NOT NULL,
//!     task_type TEXT NOT NULL,
//!     status TEXT NOT NULL,
//!     submitted_at TIMESTAMPTZ NOT NULL,
//!     UNIQUE (user_id, task_type)
//! );
//!
//! CREATE TABLE points_history (
//!     id BIGSERIAL PRIMARY KEY,
//!     user_id UUID NOT NULL,
//!     delta BIGINT NOT NULL,
//!     kind TEXT NOT NULL,
//!     label TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE INDEX points_history_user_idx ON points_history (user_id, created_at);
//! ```

pub mod models;
pub mod postgres;

pub use postgres::PostgresPersistence;
