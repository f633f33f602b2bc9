use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Locations of the market data documents produced by the scraper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Coin investment analysis (`{ coins: [...] }`).
    #[serde(default = "d_analysis_path")]
    pub analysis_path: PathBuf,
    /// Exchange market records (`{ data: [...] }`).
    #[serde(default = "d_helix_path")]
    pub helix_path: PathBuf,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            analysis_path: d_analysis_path(),
            helix_path: d_helix_path(),
        }
    }
}

fn d_analysis_path() -> PathBuf {
    PathBuf::from("./data/coin_investment_analysis.json")
}
fn d_helix_path() -> PathBuf {
    PathBuf::from("./data/helix_data.json")
}
