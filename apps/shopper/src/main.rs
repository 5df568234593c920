//! ExpressScan shopper command-line driver.
//!
//! Runs one cart operation for one user and prints the result as JSON.
//! Errors are printed to stderr in the same wire form the mobile front end
//! receives.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use expressscan_shopper::config::AppConfig;
use expressscan_shopper::error::{ApiError, AppError, AppResult};
use expressscan_shopper::session::Session;
use expressscan_shopper::ShopperApp;
use serde::Serialize;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "expressscan-shopper")]
#[command(about = "Scan, price and check out an ExpressScan cart")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Signed-in user id (from phone OTP sign-in)
    #[arg(long, short = 'u', global = true)]
    user: Option<String>,

    /// Config file (default: platform config dir/shopper.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add one unit of a scanned product (deep link or bare barcode)
    Scan { code: String },

    /// Change an item's quantity by a signed amount
    Adjust {
        barcode: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },

    /// Remove an item from the cart
    Remove { barcode: String },

    /// Show the priced cart
    Cart,

    /// List offers that can be applied today
    Offers,

    /// Apply an offer to the cart
    Apply { offer_id: String },

    /// Build the UPI payment link for the cart total
    Pay,

    /// Confirm payment: save the order and empty the cart
    Confirm,

    /// List past orders, newest first
    Orders,

    /// Add every item of a past order back to the cart
    Reorder { order_id: String },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    expressscan_shopper::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", to_json(&ApiError::from(&err)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<String> {
    let config = AppConfig::load(cli.config)?;

    if let Command::Config = cli.command {
        return Ok(config.to_toml()?);
    }

    let session = match cli.user.as_deref() {
        Some(user) => Session::signed_in(user)?,
        None => Session::anonymous(),
    };

    let app = ShopperApp::start(&config).await?;
    let result = execute(&app, &session, &config, cli.command).await;
    app.shutdown().await;
    result
}

async fn execute(
    app: &ShopperApp,
    session: &Session,
    config: &AppConfig,
    command: Command,
) -> AppResult<String> {
    let output = match command {
        Command::Scan { code } => to_json(&app.carts.scan(session, &code).await?),
        Command::Adjust { barcode, delta } => {
            to_json(&app.carts.adjust_quantity(session, &barcode, delta).await?)
        }
        Command::Remove { barcode } => {
            app.carts.remove(session, &barcode).await?;
            to_json(&app.carts.view(session).await?)
        }
        Command::Cart => to_json(&app.carts.view(session).await?),
        Command::Offers => to_json(&app.offers.active_offers()),
        Command::Apply { offer_id } => {
            let offer = app.offers.offer(&offer_id)?.clone();
            match app.offers.apply_offer(session, &offer).await {
                Ok(outcome) => to_json(&outcome),
                Err(err @ AppError::PartialWrite { .. }) => {
                    let failed = err.failed_barcodes();
                    warn!(?failed, "Retrying failed offer items once");
                    to_json(&app.offers.retry_offer_items(session, &offer, &failed).await?)
                }
                Err(err) => return Err(err),
            }
        }
        Command::Pay => to_json(&app.checkout.payment_link(session).await?),
        Command::Confirm => to_json(&app.checkout.confirm_payment(session).await?),
        Command::Orders => to_json(&app.checkout.history(session).await?),
        Command::Reorder { order_id } => to_json(&app.checkout.reorder(session, &order_id).await?),
        Command::Config => config.to_toml()?,
    };
    Ok(output)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}
