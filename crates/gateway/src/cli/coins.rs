//! `trendpup coins …` — market reports from the local data files.

use chrono::Utc;
use tp_domain::config::MarketConfig;
use tp_market::{analysis, source};

use super::CoinsCommand;

/// Build the report text for one subcommand.
pub async fn report(market: &MarketConfig, command: &CoinsCommand) -> anyhow::Result<String> {
    let load = || source::load_analysis(&market.analysis_path);
    Ok(match command {
        CoinsCommand::Trending { limit } => analysis::trending_report(&load().await?, *limit),
        CoinsCommand::Search { query } => analysis::search_report(&load().await?, query),
        CoinsCommand::Info { symbol } => analysis::coin_info_report(&load().await?, symbol),
        CoinsCommand::Risk { symbol } => analysis::risk_report(&load().await?, symbol),
        CoinsCommand::Freshness => {
            let modified = source::last_modified(&market.analysis_path).await?;
            analysis::freshness_report(modified, Utc::now())
        }
    })
}

pub async fn run(market: &MarketConfig, command: CoinsCommand) -> anyhow::Result<()> {
    println!("{}", report(market, &command).await?);
    Ok(())
}
