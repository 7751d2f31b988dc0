use std::sync::Arc;

use clap::{Parser, Subcommand};
use marketplace_app::{config::AppConfig, domain::carts::CartsService};

mod cart;
mod checkout;

#[derive(Debug, Parser)]
#[command(name = "marketplace", about = "Marketplace cart and checkout CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Cart(cart::CartCommand),
    Checkout(checkout::CheckoutCommand),
}

impl Cli {
    /// Load configuration from `.env`, the environment and arguments.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let storage = Arc::new(self.config.storage());

        let carts = CartsService::load(storage)
            .await
            .map_err(|error| format!("failed to open cart: {error}"))?;

        let result = match self.command {
            Commands::Cart(command) => cart::run(command, &carts),
            Commands::Checkout(command) => checkout::run(command, &carts),
        };

        carts.settle().await;

        result
    }
}
