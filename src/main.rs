use anyhow::{anyhow, Result};
use clap::Parser;

use watchlist::{
    cli::{Cli, Commands},
    config,
    euroinvestor::ChartType,
    watchlist::join_buffered,
    BackendEvent, Watchlist,
};

// concurrent quote lookups from a single invocation
const MAX_IN_FLIGHT: usize = 8;

fn preprocess() {
    dotenv::dotenv().ok();
    env_logger::init();
}

#[tokio::main]
async fn main() -> Result<()> {
    preprocess();

    let cli = Cli::parse();
    log::info!("Command line input recorded: {cli:#?}");

    let config = config::load_or_default(&cli.config)?;
    let (watchlist, mut events) = Watchlist::new(&config)?;

    // each handle resolves once its event has been sent
    let handles = match &cli.command {
        Commands::Search { query } => vec![watchlist.search_name(query)],

        Commands::Quote { ids } => {
            // outcomes arrive through the event channel; only a panic is fatal here
            join_buffered(ids.iter().map(|ids| watchlist.search_quote(ids)), MAX_IN_FLIGHT)
                .await?;
            vec![]
        }

        Commands::Market { keys } => vec![watchlist.lookup_market_data_keys(keys)],

        Commands::Chart {
            ext_ref_id,
            chart_type,
        } => {
            let chart_type = ChartType::try_from(*chart_type)?;
            vec![watchlist.fetch_prices_for_chart(ext_ref_id, chart_type)]
        }

        Commands::Resolve { key } => {
            let id = watchlist
                .resolve_market_data_id(key)
                .ok_or_else(|| anyhow!("{key}: not a known market data key"))?;
            println!("{id}");
            return Ok(());
        }

        Commands::Keys => {
            for key in watchlist.market_data().table().keys() {
                println!("{key}");
            }
            return Ok(());
        }
    };

    for handle in handles {
        // results are reported through the event channel below
        let _ = handle.await?;
    }

    // close the channel so the drain below terminates
    drop(watchlist);

    let mut failures = 0;
    while let Some(event) = events.recv().await {
        match event {
            BackendEvent::SearchResultAvailable(json)
            | BackendEvent::QuoteResultAvailable(json)
            | BackendEvent::MarketDataResultAvailable(json)
            | BackendEvent::ChartPricesAvailable { json, .. } => println!("{json}"),
            BackendEvent::RequestError(message) | BackendEvent::ResponseMalformed(message) => {
                eprintln!("{message}");
                failures += 1;
            }
            BackendEvent::MarketDataKeyUnknown(key) => {
                eprintln!("{key}: not a known market data key");
                failures += 1;
            }
            BackendEvent::ChartTypeInvalid(code) => {
                eprintln!("{code}: not a chart type");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{failures} request(s) failed"));
    }
    Ok(())
}
