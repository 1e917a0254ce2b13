//! Reporting facade for trading models.
//!
//! This crate provides:
//! - `Dispatcher` sending alerts as SMS (via carrier email gateways), email,
//!   or Google Chat webhook messages
//! - Card rendering of tables, mappings, sequences and records for chat
//! - `notify.json` preferences resolution with environment overrides
//! - `LiveVarRegistry` mirroring exported values under explicit handles
//! - `ReportingBackend` hooks for strategy, screener and order reporting

pub mod card;
pub mod dispatcher;
pub mod email;
pub mod hooks;
pub mod live_vars;
pub mod preferences;
pub mod reporter;
pub mod traits;
pub mod webhook;

pub use card::{render, CardDocument, Payload, Table};
pub use dispatcher::Dispatcher;
pub use hooks::{HookError, NoopBackend, ReportingBackend};
pub use live_vars::{LiveVarError, LiveVarHandle, LiveVarRegistry};
pub use preferences::{FilePreferences, NotifyPreferences, PreferencesSource, SmsProvider};
pub use reporter::Reporter;
pub use traits::{MailTransport, NotifyError, WebhookTransport};
