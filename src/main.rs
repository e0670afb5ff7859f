use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use staysheet::scrape::{search_listing_ids, Amenity};
use staysheet::{Config, GoogleSheetProvider, Reconciler, ScrapeClient, SearchQuery, StayParams};

#[derive(Parser)]
#[command(name = "staysheet", version, about = "Keep a spreadsheet of vacation-rental listings in sync with scraped provider data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Update rows already present in the spreadsheet with freshly
    /// scraped data.
    Refresh(SheetArgs),
    /// Refresh, then search a location for new listings and fill them
    /// into empty rows.
    Discover(DiscoverArgs),
}

#[derive(Args)]
struct SheetArgs {
    /// Name of the sheet (tab) to synchronize.
    #[arg(long)]
    spreadsheet_name: String,

    /// API key for the listing provider.
    #[arg(long)]
    airbnb_api_key: String,

    /// API key for the weather provider.
    #[arg(long)]
    weather_api_key: String,

    /// Check-in date, YYYY-MM-DD.
    #[arg(long)]
    check_in: String,

    /// Check-out date, YYYY-MM-DD.
    #[arg(long)]
    check_out: String,

    /// Number of guests.
    #[arg(long, default_value_t = 1)]
    guests: u32,
}

impl SheetArgs {
    fn stay(&self) -> StayParams {
        StayParams {
            check_in: self.check_in.clone(),
            check_out: self.check_out.clone(),
            guests: self.guests,
        }
    }
}

#[derive(Args)]
struct DiscoverArgs {
    #[command(flatten)]
    sheet: SheetArgs,

    /// Location to search for listings in.
    #[arg(long)]
    location: String,

    /// Minimum number of bedrooms.
    #[arg(long, default_value_t = 1)]
    min_bedrooms: u32,

    /// Amenity filter; may be repeated.
    #[arg(long = "amenity", value_enum)]
    amenities: Vec<Amenity>,

    /// Maximum number of search results.
    #[arg(long, default_value_t = 200)]
    max_results: usize,

    /// Maximum nightly price in USD.
    #[arg(long)]
    price_max: Option<u32>,

    /// Write discovered listings without prompting.
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;
    let provider = GoogleSheetProvider::try_new(&config)
        .await
        .context("connecting to the spreadsheet backend")?;

    match cli.command {
        Command::Refresh(args) => {
            let stay = args.stay();
            let fetcher =
                ScrapeClient::new(args.airbnb_api_key.clone(), args.weather_api_key.clone());
            let reconciler = Reconciler::new(
                &provider,
                &fetcher,
                &config,
                &args.spreadsheet_name,
                &stay,
            );

            let summary = reconciler.refresh().await.context("refreshing listings")?;
            println!(
                "Wrote {} rows: {} merged, {} duplicates blanked, {} kept after failed fetches",
                summary.written, summary.merged, summary.blanked, summary.failed
            );
        }
        Command::Discover(args) => {
            let stay = args.sheet.stay();
            let fetcher = ScrapeClient::new(
                args.sheet.airbnb_api_key.clone(),
                args.sheet.weather_api_key.clone(),
            );
            let reconciler = Reconciler::new(
                &provider,
                &fetcher,
                &config,
                &args.sheet.spreadsheet_name,
                &stay,
            );

            let refresh = reconciler.refresh().await.context("refreshing listings")?;
            println!(
                "Refreshed {} rows ({} merged, {} blanked, {} failed)",
                refresh.written, refresh.merged, refresh.blanked, refresh.failed
            );

            let query = SearchQuery {
                location: args.location.clone(),
                stay: stay.clone(),
                min_bedrooms: args.min_bedrooms,
                amenities: args.amenities.iter().map(|a| a.code()).collect(),
                price_max: args.price_max,
            };
            let discovered =
                search_listing_ids(&fetcher, &query, args.max_results, config.search_page_size)
                    .await
                    .context("searching for listings")?;
            println!("Found {} listings", discovered.len());
            if discovered.is_empty() {
                return Ok(());
            }

            // EOF or a declined prompt aborts the write.
            let proceed = args.yes
                || Confirm::new()
                    .with_prompt("Write entries to spreadsheet?")
                    .default(false)
                    .interact()
                    .unwrap_or(false);
            if !proceed {
                println!("Nothing written.");
                return Ok(());
            }

            let added = reconciler
                .add_listings(&discovered)
                .await
                .context("adding discovered listings")?;
            println!(
                "Added {} listings ({} already tracked)",
                added.added, added.already_tracked
            );
        }
    }

    Ok(())
}
