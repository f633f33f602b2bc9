//! Exchange market records and the scored view served to the dashboard.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelixDocument {
    #[serde(default)]
    pub data: Vec<HelixCoin>,
}

/// One market row as scraped. Numeric fields keep their display form
/// (`"16,183.328 INJ"`, `"+0.09%"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelixCoin {
    pub symbol: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub change_24h: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_limit_order_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_24h: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_24h: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helix_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedMemecoin {
    pub id: usize,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change_24h: f64,
    pub risk: u8,
    pub potential: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helix_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_size: Option<String>,
    pub high_24h: f64,
    pub low_24h: f64,
}

// ── Numeric parsing ─────────────────────────────────────────────────

/// Longest numeric prefix of `s` (optional leading `-`, digits, one `.`).
pub(crate) fn leading_number(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, b) in s.bytes().enumerate() {
        match b {
            b'-' if i == 0 => {}
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + 1;
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

/// Parse a display figure such as `"16,183.328 INJ"` or `"+6.51%"`.
/// Anything unparseable, including `"N/A"`, is 0.
pub fn parse_numeric(raw: &str) -> f64 {
    if raw == "N/A" {
        return 0.0;
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    leading_number(&cleaned).unwrap_or(0.0)
}

fn price_band(price: f64) -> usize {
    if price < 0.001 {
        0
    } else if price < 0.01 {
        1
    } else if price < 0.1 {
        2
    } else {
        3
    }
}

/// 0–10: recent volatility weighted 60%, price band 40%.
pub fn calculate_risk(price: f64, change: &str) -> u8 {
    const PRICE_RISK: [f64; 4] = [8.0, 6.0, 5.0, 3.0];
    let volatility = parse_numeric(change).abs().min(10.0);
    let score = volatility * 0.6 + PRICE_RISK[price_band(price)] * 0.4;
    score.round().min(10.0) as u8
}

/// 0–10: direction of the last day and price band, equally weighted.
pub fn calculate_potential(price: f64, change: &str) -> u8 {
    const PRICE_POTENTIAL: [f64; 4] = [9.0, 7.0, 6.0, 5.0];
    let change = parse_numeric(change);
    let momentum = if change > 5.0 {
        8.0
    } else if change > 0.0 {
        6.0
    } else {
        4.0
    };
    let score = momentum * 0.5 + PRICE_POTENTIAL[price_band(price)] * 0.5;
    score.round().min(10.0) as u8
}

impl HelixCoin {
    /// Base asset of the pair (`"HDRO/INJ"` → `"HDRO"`).
    pub fn base_symbol(&self) -> &str {
        self.symbol.split('/').next().unwrap_or(&self.symbol)
    }

    /// Scored view; `id` is the 1-based position in the source.
    pub fn format(&self, id: usize) -> FormattedMemecoin {
        let price = parse_numeric(&self.price);
        let name = self.base_symbol().to_string();
        FormattedMemecoin {
            id,
            symbol: name.clone(),
            name,
            price,
            change_24h: parse_numeric(&self.change_24h),
            risk: calculate_risk(price, &self.change_24h),
            potential: calculate_potential(price, &self.change_24h),
            market_id: self.market_id.clone(),
            helix_link: self.helix_link.clone(),
            tick_size: self.tick_size.clone(),
            min_order_size: self.min_limit_order_size.clone(),
            high_24h: self.high_24h.as_deref().map(parse_numeric).unwrap_or(0.0),
            low_24h: self.low_24h.as_deref().map(parse_numeric).unwrap_or(0.0),
        }
    }
}

impl HelixDocument {
    pub fn formatted(&self) -> Vec<FormattedMemecoin> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, coin)| coin.format(i + 1))
            .collect()
    }

    /// Built-in sample served when the market file cannot be used.
    pub fn fallback() -> Self {
        let row = |symbol: &str, price: &str, change: &str, ts: &str| HelixCoin {
            symbol: symbol.into(),
            price: price.into(),
            volume: "N/A".into(),
            change_24h: change.into(),
            timestamp: ts.into(),
            ..HelixCoin::default()
        };

        let hinj = HelixCoin {
            market_id: Some(
                "0x1b1e062b3306f26ae3af3c354a10c1cf38b00dcb42917f038ba3fc14978b1dd8".into(),
            ),
            market_name: Some("hINJ/INJ".into()),
            tick_size: Some("0.0001".into()),
            min_limit_order_size: Some("0.001".into()),
            volume_24h: Some("16,183.328 INJ".into()),
            high_24h: Some("0.9941".into()),
            low_24h: Some("0.9901".into()),
            helix_link: Some("https://helixapp.com/spot/hinj-inj".into()),
            ..row("HINJ/INJ", "1", "+0.09%", "2025-03-18T17:54:51.946Z")
        };
        let stinj = HelixCoin {
            market_id: Some(
                "0x2a3e06be3b6c13730f801c66010b355c3d28d5bd4ee736eeabbfa56e0a735b58".into(),
            ),
            ..row("STINJ/INJ", "1.3816", "+0.03%", "2025-03-18T17:54:51.947Z")
        };

        Self {
            data: vec![
                hinj,
                stinj,
                row("HDRO/INJ", "0.001931", "+6.51%", "2025-03-18T17:54:51.947Z"),
                row("NEPT/INJ", "0.03867", "+6.18%", "2025-03-18T17:54:51.948Z"),
                row("AGENT/INJ", "0.03247", "-1.00%", "2025-03-18T17:54:51.948Z"),
            ],
        }
    }
}
