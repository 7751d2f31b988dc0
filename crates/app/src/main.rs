//! Marketplace CLI

use std::process;

use marketplace_app::observability;

mod cli;

#[tokio::main]
pub async fn main() {
    let cli = cli::Cli::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = observability::init(&cli.config.logging) {
        report(&error.to_string());
        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        report(&error);
        process::exit(1);
    }
}

#[expect(
    clippy::print_stderr,
    reason = "errors are reported to the terminal, not the log"
)]
fn report(error: &str) {
    eprintln!("{error}");
}
