//! Emporium CLI - shop from the terminal against the Emporium REST API.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! emporium products list --category fruit
//! emporium products show golden-pineapple-3f2a9c1e-8d4b-4e6f-a1c2-9b8d7e6f5a4b.html
//!
//! # Work with the cart
//! emporium cart add <product-id> -q 2
//! emporium cart set <product-id> 0      # same as `cart remove`
//! emporium cart summary
//!
//! # Pay
//! emporium checkout begin
//! emporium checkout complete <reference>
//!
//! # Sign in (password read from stdin) and export the printed token
//! emporium auth login --email jane@example.com
//!
//! # Store administration (admin token required)
//! emporium admin orders
//! emporium admin status <order-id> shipped
//! emporium admin products create --name ... --image ./photo.jpg
//! ```
//!
//! # Environment Variables
//!
//! - `EMPORIUM_API_URL` - Base URL of the REST service (required)
//! - `EMPORIUM_API_TOKEN` - Bearer token for the session
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Error tracking
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use emporium_storefront::ClientConfig;
use emporium_storefront::telemetry::{self, LogFormat};

mod commands;
mod output;

use commands::{CliError, Session};

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium storefront CLI")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up, sign in and manage the session's account
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Inspect and change the session's cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List your orders
    Orders,
    /// Pay for the current cart
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Store administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account and print its session token
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
    /// Sign in and print the session token
    Login {
        #[arg(short, long)]
        email: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the account behind EMPORIUM_API_TOKEN
    Whoami,
    /// End the session on the server
    Logout,
    /// Change the account password
    Password {
        /// Current password; read from stdin when omitted
        #[arg(long)]
        old: Option<String>,

        /// New password; read from stdin when omitted
        #[arg(long)]
        new: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart lines and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product id or product page slug
        product: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a line (zero or less removes it)
    Set {
        /// Product id
        product: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Product id
        product: String,
    },
    /// Remove every line
    Clear,
    /// Subtotal, shipping, tax and grand total
    Summary,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one product
    Show {
        /// Product id or product page slug
        product: String,
    },
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Place an order and print the payment link
    Begin,
    /// Verify a payment reference and clear the cart when paid
    Complete {
        /// Reference from the payment provider's redirect
        reference: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List every order in the store
    Orders,
    /// Change an order's status
    Status {
        order: String,

        /// `pending`, `processing`, `shipped`, `delivered` or `cancelled`
        status: String,
    },
    /// Dashboard figures
    Stats,
    /// Manage the catalog
    Products {
        #[command(subcommand)]
        action: AdminProductsAction,
    },
}

#[derive(Subcommand)]
enum AdminProductsAction {
    /// Create a product with an image upload
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Unit price, e.g. 12.50
        #[arg(long)]
        price: Decimal,

        #[arg(long)]
        stock: u32,

        #[arg(long)]
        category: String,

        /// Path to a JPEG, PNG, WebP or GIF
        #[arg(long)]
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            telemetry::init_tracing(telemetry::DEFAULT_LOG_FILTER, LogFormat::Text);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = telemetry::init_sentry(&config);

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    telemetry::init_tracing(telemetry::DEFAULT_LOG_FILTER, format);

    let session = Session::new(&config);

    if let Err(e) = run(cli.command, &session).await {
        if e.is_unexpected() {
            sentry::capture_error(&e);
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, session: &Session) -> Result<(), CliError> {
    match command {
        Commands::Auth { action } => match action {
            AuthAction::Signup {
                name,
                email,
                password,
                phone,
                address,
            } => {
                let args = commands::auth::SignupArgs {
                    name,
                    email,
                    password,
                    phone,
                    address,
                };
                commands::auth::signup(session, args).await
            }
            AuthAction::Login { email, password } => {
                commands::auth::login(session, email, password).await
            }
            AuthAction::Whoami => commands::auth::whoami(session).await,
            AuthAction::Logout => commands::auth::logout(session).await,
            AuthAction::Password { old, new } => {
                commands::auth::change_password(session, old, new).await
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(session).await,
            CartAction::Add { product, quantity } => {
                commands::cart::add(session, &product, quantity).await
            }
            CartAction::Set { product, quantity } => {
                commands::cart::set(session, &product, quantity).await
            }
            CartAction::Remove { product } => commands::cart::remove(session, &product).await,
            CartAction::Clear => commands::cart::clear(session).await,
            CartAction::Summary => commands::cart::summary(session).await,
        },
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                page,
                limit,
            } => {
                let query = emporium_storefront::api::ProductQuery {
                    search,
                    category,
                    page,
                    limit,
                };
                commands::products::list(session, &query).await
            }
            ProductsAction::Show { product } => commands::products::show(session, &product).await,
        },
        Commands::Orders => commands::orders::mine(session).await,
        Commands::Checkout { action } => match action {
            CheckoutAction::Begin => commands::orders::begin_checkout(session).await,
            CheckoutAction::Complete { reference } => {
                commands::orders::complete_checkout(session, &reference).await
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Orders => commands::admin::orders(session).await,
            AdminAction::Status { order, status } => {
                commands::admin::set_status(session, &order, &status).await
            }
            AdminAction::Stats => commands::admin::stats(session).await,
            AdminAction::Products {
                action:
                    AdminProductsAction::Create {
                        name,
                        description,
                        price,
                        stock,
                        category,
                        image,
                    },
            } => {
                let args = commands::admin::CreateProductArgs {
                    name,
                    description,
                    price,
                    stock,
                    category,
                    image,
                };
                commands::admin::create_product(session, args).await
            }
        },
    }
}
