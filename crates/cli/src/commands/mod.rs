//! Subcommand implementations.
//!
//! Every command shares one [`Session`]: an API client, the cart synchronizer
//! built on it, and checkout. Notifications go to the log via
//! [`TracingNotifier`].

use std::sync::Arc;

use thiserror::Error;

use emporium_storefront::{
    ApiClient, ApiError, CartSynchronizer, Checkout, CheckoutError, ClientConfig, MutationOutcome,
    TracingNotifier,
};

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

/// Errors that end a command with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Checkout stopped; the reason has already been reported.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// A cart mutation was rejected; the reason has already been reported.
    #[error("Cart was not changed")]
    CartUnchanged,

    /// An argument could not be interpreted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading stdin or a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether this failure is worth a Sentry event rather than user error.
    pub const fn is_unexpected(&self) -> bool {
        match self {
            Self::Api(error) | Self::Checkout(CheckoutError::Api(error)) => matches!(
                error,
                ApiError::Http(_)
                    | ApiError::Parse(_)
                    | ApiError::Contract(_)
                    | ApiError::InvalidUrl(_)
            ),
            Self::Checkout(_) | Self::CartUnchanged | Self::InvalidArgument(_) | Self::Io(_) => {
                false
            }
        }
    }
}

/// Map a settled cart mutation to the command's result.
const fn applied(outcome: MutationOutcome) -> Result<(), CliError> {
    match outcome {
        MutationOutcome::Applied => Ok(()),
        MutationOutcome::Failed => Err(CliError::CartUnchanged),
    }
}

/// Clients shared by every command.
pub struct Session {
    pub client: ApiClient,
    pub cart: CartSynchronizer,
    pub checkout: Checkout,
}

impl Session {
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let client = ApiClient::new(&config.api);
        let api = Arc::new(client.clone());
        let notifier = Arc::new(TracingNotifier);
        let cart = CartSynchronizer::new(api.clone(), notifier.clone());
        let checkout = Checkout::new(api, cart.clone(), notifier);

        Self {
            client,
            cart,
            checkout,
        }
    }
}
