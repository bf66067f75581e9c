//! Outbound notifications.
//!
//! The contact form relays to a Telegram chat through the Bot API, and
//! channel-membership checks go through the same bot. Everything here is
//! fire-and-forget from the request path's point of view.

pub mod sanitize;
pub mod telegram;

pub use telegram::{ContactMessage, NotifyError, TelegramNotifier};
