//! Emporium storefront client library.
//!
//! Talks to the Emporium REST service and keeps a shared, observable view of
//! the session's cart. Accounts, checkout and store administration go through
//! the same client. Binaries and UIs build on the pieces exported here.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod notify;
pub mod telemetry;

pub use api::{ApiClient, ApiError, AuthSession, Credentials, NewAccount, PasswordChange};
pub use cart::{CartApi, CartSnapshot, CartSynchronizer, MutationOutcome};
pub use checkout::{Checkout, CheckoutApi, CheckoutError, CheckoutReceipt};
pub use config::{ApiConfig, ClientConfig, ConfigError};
pub use notify::{Notification, NotificationLevel, Notifier, TracingNotifier};
