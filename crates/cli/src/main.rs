//! MarketPulse CLI - Drive the storefront cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! mp-cli catalog list --category Electronics
//!
//! # Add two of product 3 in size M
//! mp-cli cart add 3 -q 2 -o size=M
//!
//! # Show the cart and what checkout would charge
//! mp-cli cart show
//! mp-cli checkout summary
//!
//! # Place the order
//! mp-cli checkout place --first-name Ada --last-name Lovelace \
//!     --email ada@example.com --phone 555-0100 --address "12 Analytical Way" \
//!     --city London --state LDN --zip-code 10001
//!
//! # Look the order up later
//! mp-cli order show 1
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and change the cart
//! - `checkout` - Price the cart and place orders
//! - `catalog` - Browse products and their reviews
//! - `order` - Browse the order history and move orders along
//!
//! The cart and the order history persist between runs in
//! `MARKETPULSE_DATA_DIR`; see `marketpulse_storefront::config` for every
//! setting.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use marketpulse_core::{OrderId, OrderStatus, ProductId};
use marketpulse_storefront::checkout::ShippingAddress;
use marketpulse_storefront::config::StorefrontConfig;
use marketpulse_storefront::error::{AppError, Result};
use marketpulse_storefront::state::AppState;
use marketpulse_storefront::telemetry;

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "MarketPulse storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Price the cart and place orders
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Browse products
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Browse and update placed orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines, item count, and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: ProductId,

        /// How many to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Selected option as `name=value` (repeatable)
        #[arg(short = 'o', long = "option", value_parser = commands::cart::parse_option)]
        options: Vec<(String, String)>,
    },
    /// Remove a product's line
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        /// Product ID
        product_id: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Show subtotal, shipping, tax, and total
    Summary,
    /// Place an order for everything in the cart
    Place(AddressArgs),
}

#[derive(clap::Args)]
struct AddressArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    state: String,
    #[arg(long)]
    zip_code: String,
    #[arg(long, default_value = "United States")]
    country: String,
}

impl From<AddressArgs> for ShippingAddress {
    fn from(args: AddressArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            address: args.address,
            city: args.city,
            state: args.state,
            zip_code: args.zip_code,
            country: args.country,
        }
    }
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only products matching this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product with its reviews
    Show {
        /// Product ID
        product_id: ProductId,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List placed orders, oldest first
    List,
    /// Show one order
    Show {
        /// Order ID (the number without `#` and padding)
        order_id: OrderId,
    },
    /// Move an order to a new status
    Status {
        /// Order ID
        order_id: OrderId,

        /// pending, processing, confirmed, shipped, delivered, or cancelled
        status: OrderStatus,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _telemetry = telemetry::init(&StorefrontConfig::default());
            AppError::from(e).report();
            std::process::exit(1);
        }
    };

    // Initialize Sentry and tracing (guard flushes on drop)
    let telemetry = telemetry::init(&config);

    if let Err(e) = run(cli, config).await {
        e.report();
        drop(telemetry);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<()> {
    let state = AppState::new(config).await?;

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state).await,
            CartAction::Add {
                product_id,
                quantity,
                options,
            } => {
                commands::cart::add(&state, &product_id, quantity, options.into_iter().collect())
                    .await?;
            }
            CartAction::Remove { product_id } => commands::cart::remove(&state, &product_id).await,
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&state, &product_id, quantity).await?,
            CartAction::Clear => commands::cart::clear(&state).await,
        },
        Commands::Checkout { action } => match action {
            CheckoutAction::Summary => commands::checkout::summary(&state).await,
            CheckoutAction::Place(address) => {
                commands::checkout::place(&state, address.into()).await?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::List { category, search } => {
                commands::catalog::list(&state, category.as_deref(), search.as_deref()).await;
            }
            CatalogAction::Show { product_id } => {
                commands::catalog::show(&state, &product_id).await?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::List => commands::order::list(&state).await?,
            OrderAction::Show { order_id } => commands::order::show(&state, &order_id).await?,
            OrderAction::Status { order_id, status } => {
                commands::order::set_status(&state, &order_id, status).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cart_add_with_options() {
        let cli = Cli::try_parse_from(["mp-cli", "cart", "add", "7", "-q", "3", "-o", "size=M"]);
        let Ok(Cli {
            command: Commands::Cart {
                action: CartAction::Add {
                    product_id,
                    quantity,
                    options,
                },
            },
        }) = cli
        else {
            panic!("expected cart add");
        };
        assert_eq!(product_id, ProductId::from(7));
        assert_eq!(quantity, 3);
        assert_eq!(options, vec![("size".to_string(), "M".to_string())]);
    }

    #[test]
    fn test_parse_negative_quantity() {
        let cli = Cli::try_parse_from(["mp-cli", "cart", "set", "7", "-2"]);
        assert!(matches!(
            cli,
            Ok(Cli {
                command: Commands::Cart {
                    action: CartAction::Set { quantity: -2, .. }
                }
            })
        ));
    }

    #[test]
    fn test_parse_order_status() {
        let cli = Cli::try_parse_from(["mp-cli", "order", "status", "3", "shipped"]);
        let Ok(Cli {
            command: Commands::Order {
                action: OrderAction::Status { order_id, status },
            },
        }) = cli
        else {
            panic!("expected order status");
        };
        assert_eq!(order_id, OrderId::from(3));
        assert_eq!(status, OrderStatus::Shipped);

        assert!(Cli::try_parse_from(["mp-cli", "order", "status", "3", "lost"]).is_err());
    }

    #[test]
    fn test_blank_product_id_rejected() {
        assert!(Cli::try_parse_from(["mp-cli", "cart", "remove", " "]).is_err());
    }
}
