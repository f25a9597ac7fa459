use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use transfer_client::cache::{start_cache_gc, QueryCache};
use transfer_client::config::{AppConfig, PageLocation};
use transfer_client::errors::ClientError;
use transfer_client::queries::TransferQueries;
use transfer_client::router::{Router, View};
use transfer_client::submission::TransferScheduler;
use transfer_client::transport::{TransferApi, TransferResponse};
use transfer_client::validation::{AmountInput, DateInput, FeeCalculationInput, TransferFormInput};

const CACHE_GC_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(author, version, about = "Schedule bank transfers and browse scheduled ones", long_about = None)]
struct Cli {
    /// Backend base URL, overrides TRANSFER_API_BASE_URL
    #[arg(long)]
    api_base_url: Option<String>,
    /// Origin of the hosting page, e.g. http://192.168.1.5:5173
    #[arg(long)]
    page_origin: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lists scheduled transfers
    List,
    /// Previews the fee for an amount on a date
    Fee {
        amount: String,
        /// Transfer date, YYYY-MM-DD
        date: String,
    },
    /// Schedules a transfer
    Schedule {
        #[arg(long)]
        source: String,
        #[arg(long)]
        destination: String,
        #[arg(long)]
        amount: String,
        /// Transfer date, YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
    /// Navigates to a page path and renders it
    Open { path: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        tracing::error!(error = ?err, "transfer client error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load().context("load configuration from environment")?;
    if let Some(url) = cli.api_base_url {
        config.api_base_url = Some(url);
    }
    if let Some(origin) = cli.page_origin.as_deref() {
        config.page = Some(PageLocation::from_origin(origin).context("parse page origin")?);
    }

    let api = TransferApi::from_config(&config).context("initialize transfer API client")?;
    info!(
        base_url = %api.base_url(),
        retries = api.retry_policy().max_retries,
        "transfer client online"
    );

    let cache = QueryCache::default();
    let gc_handle = start_cache_gc(cache.clone(), CACHE_GC_INTERVAL);
    let queries =
        TransferQueries::new(Arc::new(api), cache).with_options(config.query_options());
    let scheduler = TransferScheduler::new(queries.clone());

    let outcome = match cli.command {
        Command::List => print_transfers(&queries).await,
        Command::Fee { amount, date } => {
            let preview = scheduler
                .preview_fee(&FeeCalculationInput {
                    amount: AmountInput::Text(amount),
                    transfer_date: Some(DateInput::Text(date)),
                })
                .await
                .map_err(report)?;
            println!(
                "amount {:.2} fee {:.2} total {:.2} on {}",
                preview.amount, preview.fee, preview.total, preview.transfer_date
            );
            Ok(())
        }
        Command::Schedule {
            source,
            destination,
            amount,
            date,
        } => {
            let form = TransferFormInput {
                source_account: source,
                destination_account: destination,
                transfer_amount: AmountInput::Text(amount),
                transfer_date: Some(DateInput::Text(date)),
            };
            let submitted = scheduler.submit(&form).await.map_err(report)?;
            println!("{}", submitted.message);
            if let Some(transfer) = submitted.transfer {
                print_transfer(&transfer);
            }
            Ok(())
        }
        Command::Open { path } => {
            let mut router = Router::new(config.base_path.as_deref());
            let Some(route) = router.push(&path) else {
                bail!("no page at {path}");
            };
            info!(view = %route.view(), path = %route.full_path, "page opened");
            match route.view() {
                View::Home => {
                    queries.prefetch_callback()().await;
                    println!("home: transfer list prefetched");
                    Ok(())
                }
                View::TransferList => print_transfers(&queries).await,
            }
        }
    };

    gc_handle.abort();
    outcome
}

async fn print_transfers(queries: &TransferQueries) -> Result<()> {
    let transfers = queries.transfers().await.map_err(report)?;
    if transfers.is_empty() {
        println!("no scheduled transfers");
    }
    for transfer in &transfers {
        print_transfer(transfer);
    }
    Ok(())
}

fn print_transfer(transfer: &TransferResponse) {
    println!(
        "#{} {} -> {} amount {:.2} fee {:.2} on {} (scheduled {})",
        transfer.id,
        transfer.source_account,
        transfer.destination_account,
        transfer.transfer_amount,
        transfer.fee,
        transfer.transfer_date,
        transfer.schedule_date
    );
}

/// Log field-level messages before handing the error to anyhow.
fn report(err: ClientError) -> anyhow::Error {
    for (field, message) in err.field_messages() {
        warn!(field = %field, "{message}");
    }
    anyhow!(err)
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
