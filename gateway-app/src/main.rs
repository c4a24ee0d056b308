//! # Gateway Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Build the provider adapter registry over a transport
//! - Create the payment gateway with an in-memory ledger
//! - Drive one payment end to end from the command line

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gateway_core::PaymentGateway;
use gateway_ledger::InMemoryLedger;
use gateway_rails::{HttpTransport, ProviderTransport, SandboxTransport};
use gateway_types::{
    CardDetails, CurrencyCode, CustomerProfile, MethodDetails, Money, PaymentMethod,
    PaymentRequest, PaymentStatus,
};

#[derive(Parser)]
#[command(name = "gateway", about = "Payment orchestration gateway")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a payment request from a JSON file
    Pay {
        /// Path to a PaymentRequest JSON document
        file: PathBuf,
        /// Seconds to wait for a pending transaction to confirm
        #[arg(long, default_value_t = 0)]
        wait: u64,
        /// Print the ledger trail after processing
        #[arg(long)]
        trail: bool,
    },
    /// Print a sample payment request document
    Sample,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gateway_core=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Pay { file, wait, trail } => pay(file, wait, trail).await,
        Command::Sample => {
            println!("{}", serde_json::to_string_pretty(&sample_request())?);
            Ok(())
        }
    }
}

async fn pay(file: PathBuf, wait: u64, trail: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file)?;
    let request: PaymentRequest = serde_json::from_str(&raw)?;

    let config = config::Config::from_env();
    let transport: Arc<dyn ProviderTransport> = match &config.provider_base_url {
        Some(base_url) => {
            tracing::info!(base_url, "using HTTP provider transport");
            Arc::new(HttpTransport::new(base_url.clone()).map_err(|e| anyhow::anyhow!("{e}"))?)
        }
        None => {
            tracing::info!("no PROVIDER_BASE_URL set, using sandbox transport");
            Arc::new(SandboxTransport::new())
        }
    };

    let ledger = Arc::new(InMemoryLedger::new());
    let gateway = PaymentGateway::builder(ledger.clone())
        .with_registry(gateway_rails::build_registry(transport, &config.secrets))
        .with_settlement_channels(gateway_rails::build_settlement_channels())
        .with_callback_secrets(config.secrets.callback_secrets())
        .build();

    let mut transaction = gateway.process_payment(request).await?;
    tracing::info!(
        transaction_id = %transaction.id,
        status = %transaction.status,
        "payment processed"
    );

    if wait > 0 {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(wait);
        while !transaction.status.payment_settled()
            && transaction.status != PaymentStatus::Pending3ds
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(Duration::from_millis(500)).await;
            transaction = gateway.check_status(transaction.id)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&transaction)?);

    if trail {
        let entries = ledger.history(transaction.id);
        println!("{}", serde_json::to_string_pretty(&entries)?);
    }
    Ok(())
}

fn sample_request() -> PaymentRequest {
    PaymentRequest {
        amount: Money::new(10_000, CurrencyCode::USD).expect("positive sample amount"),
        method: PaymentMethod::Card,
        details: MethodDetails::Card(CardDetails {
            number: "4242424242424242".into(),
            exp_month: 12,
            exp_year: 2030,
            cvv: "123".into(),
            cardholder_name: "Jane Doe".into(),
        }),
        customer: CustomerProfile {
            reference: "cust-demo-1".into(),
            country: Some("US".into()),
            billing_country: Some("US".into()),
            shipping_country: Some("US".into()),
            returning: true,
        },
        merchant_id: "merchant-demo".into(),
        merchant_tier: Default::default(),
        metadata: Default::default(),
        instant_settlement: None,
    }
}
