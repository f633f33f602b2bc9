//! Market data for the TrendPup assistant: the scraper's coin analysis
//! document, exchange market records, their text reports, and the wallet
//! address helpers used by chat flows.

pub mod analysis;
pub mod helix;
pub mod source;
pub mod wallet;

pub use analysis::{CoinAnalysis, CoinMarketData, CoinRecord};
pub use helix::{FormattedMemecoin, HelixCoin, HelixDocument};
