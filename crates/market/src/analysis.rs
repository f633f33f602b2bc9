//! Coin investment analysis produced by the social-media scraper, and the
//! plain-text reports built from it.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NO_DATA: &str = "No memecoin data available";
pub const NO_SEARCH_RESULTS: &str = "No memecoins found matching your search";
const DEFAULT_TRENDING_LIMIT: usize = 10;
const RECENT_MINUTES: i64 = 180;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Document types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinAnalysis {
    pub analysis_timestamp: Option<String>,
    pub total_coins_analyzed: Option<u64>,
    pub coins: Vec<CoinRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinRecord {
    pub symbol: String,
    pub mention_count: Option<u64>,
    pub risk_score: Option<f64>,
    pub potential_score: Option<f64>,
    pub community_score: Option<f64>,
    pub first_seen: Option<String>,
    pub latest_seen: Option<String>,
    pub categories: Vec<String>,
    pub search_terms: Vec<String>,
    pub market_data: Option<CoinMarketData>,
    pub red_flags: Vec<String>,
    pub positive_indicators: Vec<String>,
    pub telegram_links: Vec<String>,
    pub other_links: Vec<String>,
    pub sample_tweets: Vec<String>,
    pub recommendation: Option<String>,
}

/// Exchange figures attached to a coin. The scraper writes these as either
/// numbers or strings, so they stay loosely typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinMarketData {
    pub price_usd: Option<Value>,
    pub volume_24h: Option<Value>,
    pub price_change_24h_percent: Option<Value>,
    pub high_24h: Option<Value>,
    pub low_24h: Option<Value>,
}

impl CoinAnalysis {
    /// Exact, case-insensitive symbol lookup.
    pub fn find(&self, symbol: &str) -> Option<&CoinRecord> {
        self.coins
            .iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
    }
}

// ── Levels ──────────────────────────────────────────────────────────

pub fn risk_level(score: Option<f64>) -> &'static str {
    match score.filter(|s| *s != 0.0) {
        None => "Unknown",
        Some(s) if s >= 8.0 => "Very High",
        Some(s) if s >= 6.0 => "High",
        Some(s) if s >= 4.0 => "Medium",
        Some(s) if s >= 2.0 => "Low",
        Some(_) => "Very Low",
    }
}

pub fn potential_level(score: Option<f64>) -> &'static str {
    match score.filter(|s| *s != 0.0) {
        None => "Unknown",
        Some(s) if s >= 8.0 => "Excellent",
        Some(s) if s >= 6.0 => "Good",
        Some(s) if s >= 4.0 => "Moderate",
        Some(s) if s >= 2.0 => "Limited",
        Some(_) => "Poor",
    }
}

// ── Value rendering ─────────────────────────────────────────────────

fn score(v: Option<f64>) -> String {
    match v.filter(|s| *s != 0.0) {
        Some(s) => s.to_string(),
        None => "N/A".into(),
    }
}

/// Render a loosely typed figure; null, empty and zero read as `N/A`.
fn figure(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".into(),
        _ => "N/A".into(),
    }
}

fn is_present(v: Option<&Value>) -> bool {
    figure(v) != "N/A"
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => crate::helix::leading_number(s.trim()),
        _ => None,
    }
}

fn timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "Unknown".into();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S UTC").to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn bullet_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        format!("\n  - {}", items.join("\n  - "))
    }
}

fn comma_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

fn market_section(heading: &str, md: &CoinMarketData) -> String {
    [
        format!("{heading}:"),
        format!("• Price: ${}", figure(md.price_usd.as_ref())),
        format!("• 24h Volume: ${}", figure(md.volume_24h.as_ref())),
        format!(
            "• 24h Price Change: {}%",
            figure(md.price_change_24h_percent.as_ref())
        ),
        format!("• 24h High: ${}", figure(md.high_24h.as_ref())),
        format!("• 24h Low: ${}", figure(md.low_24h.as_ref())),
    ]
    .join("\n")
}

fn score_lines(coin: &CoinRecord) -> [String; 3] {
    [
        format!(
            "• Risk Score: {}/10 ({})",
            score(coin.risk_score),
            risk_level(coin.risk_score)
        ),
        format!(
            "• Potential Score: {}/10 ({})",
            score(coin.potential_score),
            potential_level(coin.potential_score)
        ),
        format!("• Community Score: {}/10", score(coin.community_score)),
    ]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reports
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Top coins by mention count, ties broken by potential score.
/// A limit of 0 means the default of 10.
pub fn trending_report(doc: &CoinAnalysis, limit: usize) -> String {
    if doc.coins.is_empty() {
        return NO_DATA.into();
    }
    let limit = if limit == 0 { DEFAULT_TRENDING_LIMIT } else { limit };

    let mut ranked: Vec<&CoinRecord> = doc.coins.iter().collect();
    ranked.sort_by(|a, b| {
        b.mention_count
            .unwrap_or(0)
            .cmp(&a.mention_count.unwrap_or(0))
            .then_with(|| {
                b.potential_score
                    .unwrap_or(0.0)
                    .total_cmp(&a.potential_score.unwrap_or(0.0))
            })
    });
    ranked.truncate(limit);

    let entries: Vec<String> = ranked
        .iter()
        .enumerate()
        .map(|(i, coin)| {
            let mut lines = vec![format!("{}. **Coin:** {}", i + 1, coin.symbol)];
            if let Some(md) = &coin.market_data {
                lines.push(format!("   * **Price:** ${}", figure(md.price_usd.as_ref())));
                if let Some(change) = md
                    .price_change_24h_percent
                    .as_ref()
                    .filter(|v| is_present(Some(*v)))
                    .and_then(as_number)
                {
                    let arrow = if change >= 0.0 { "↗️" } else { "↘️" };
                    lines.push(format!("   * **24h Change:** {arrow} {change}%"));
                }
                if is_present(md.volume_24h.as_ref()) {
                    lines.push(format!(
                        "   * **24h Volume:** ${}",
                        figure(md.volume_24h.as_ref())
                    ));
                }
            }
            lines.push(format!(
                "   * **Risk Score:** {}/10 ({})",
                score(coin.risk_score),
                risk_level(coin.risk_score)
            ));
            lines.push(format!(
                "   * **Potential Score:** {}/10 ({})",
                score(coin.potential_score),
                potential_level(coin.potential_score)
            ));
            lines.push(format!(
                "   * **Community Score:** {}/10",
                score(coin.community_score)
            ));
            lines.push(format!(
                "   * **Mention Count:** {} times",
                coin.mention_count.unwrap_or(0)
            ));
            if let Some(flag) = coin.red_flags.first() {
                lines.push(format!("   * **Key Risk:** {flag}"));
            }
            if let Some(plus) = coin.positive_indicators.first() {
                lines.push(format!("   * **Key Positive:** {plus}"));
            }
            lines.join("\n")
        })
        .collect();

    format!(
        "Here are the top {} trending memecoins based on our analysis:\n\n{}\n\n\
         Remember, all memecoins are high-risk investments. Do your own research before investing.",
        ranked.len(),
        entries.join("\n\n")
    )
}

/// Case-insensitive substring match on the symbol.
pub fn search_report(doc: &CoinAnalysis, query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return "Please specify a coin to search for".into();
    }
    if doc.coins.is_empty() {
        return NO_DATA.into();
    }
    let needle = query.to_lowercase();
    let hits: Vec<&CoinRecord> = doc
        .coins
        .iter()
        .filter(|c| c.symbol.to_lowercase().contains(&needle))
        .collect();
    if hits.is_empty() {
        return NO_SEARCH_RESULTS.into();
    }

    let entries: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, coin)| {
            let mut lines = vec![
                format!("{}. **{}**", i + 1, coin.symbol),
                format!("   • Mention Count: {}", coin.mention_count.unwrap_or(0)),
            ];
            lines.extend(score_lines(coin).map(|l| format!("   {l}")));
            if let Some(flag) = coin.red_flags.first() {
                lines.push(format!("   • Key Risk: {flag}"));
            }
            if let Some(plus) = coin.positive_indicators.first() {
                lines.push(format!("   • Key Positive: {plus}"));
            }
            lines.push(format!(
                "   • Recommendation: {}",
                coin.recommendation
                    .as_deref()
                    .unwrap_or("No recommendation available")
            ));
            lines.join("\n")
        })
        .collect();

    format!(
        "=== Search Results for \"{query}\" ===\n\n{}",
        entries.join("\n\n")
    )
}

pub fn coin_info_report(doc: &CoinAnalysis, symbol: &str) -> String {
    let coin = match lookup(doc, symbol) {
        Ok(coin) => coin,
        Err(text) => return text,
    };

    let mut sections = vec![
        format!("=== {} Detailed Information ===", coin.symbol),
        [
            "Basic Information:".to_string(),
            format!("• Symbol: {}", coin.symbol),
            format!("• Mention Count: {}", coin.mention_count.unwrap_or(0)),
            format!("• First Seen: {}", timestamp(coin.first_seen.as_deref())),
            format!("• Latest Seen: {}", timestamp(coin.latest_seen.as_deref())),
            format!("• Categories: {}", comma_list(&coin.categories, "None")),
        ]
        .join("\n"),
    ];
    if let Some(md) = &coin.market_data {
        sections.push(market_section("Market Data", md));
    }
    let mut analysis = vec!["Analysis:".to_string()];
    analysis.extend(score_lines(coin));
    sections.push(analysis.join("\n"));
    sections.push(format!(
        "Risk Factors:\n• Red Flags: {}\n• Positive Indicators: {}",
        bullet_list(&coin.red_flags, "None identified"),
        bullet_list(&coin.positive_indicators, "None identified"),
    ));
    sections.push(format!(
        "Community Links:\n• Telegram Links: {}\n• Other Links: {}",
        bullet_list(&coin.telegram_links, "None available"),
        bullet_list(&coin.other_links, "None available"),
    ));
    sections.push(format!(
        "Recent Conversation:\n{}",
        if coin.sample_tweets.is_empty() {
            "No recent conversations found".to_string()
        } else {
            format!("• {}", coin.sample_tweets.join("\n• "))
        }
    ));
    sections.push(format!(
        "Recommendation:\n{}",
        coin.recommendation
            .as_deref()
            .unwrap_or("No specific recommendation available for this coin")
    ));
    sections.join("\n\n")
}

pub fn risk_report(doc: &CoinAnalysis, symbol: &str) -> String {
    let coin = match lookup(doc, symbol) {
        Ok(coin) => coin,
        Err(text) => return text,
    };

    let mut sections = vec![
        format!("=== {} Analysis Report ===", coin.symbol),
        [
            "Basic Information:".to_string(),
            format!("• Mention Count: {}", coin.mention_count.unwrap_or(0)),
            format!("• First Seen: {}", timestamp(coin.first_seen.as_deref())),
            format!("• Latest Seen: {}", timestamp(coin.latest_seen.as_deref())),
            format!("• Categories: {}", comma_list(&coin.categories, "None")),
            format!("• Search Terms: {}", comma_list(&coin.search_terms, "None")),
        ]
        .join("\n"),
    ];
    if let Some(md) = &coin.market_data {
        sections.push(market_section("Market Data (from Coinbase)", md));
    }
    let mut assessment = vec!["Risk Assessment:".to_string()];
    assessment.extend(score_lines(coin));
    sections.push(assessment.join("\n"));
    sections.push(format!(
        "Community & Links:\n• Telegram Links: {}\n• Other Links: {}",
        comma_list(&coin.telegram_links, "None"),
        comma_list(&coin.other_links, "None"),
    ));
    sections.push(format!(
        "Risk Factors:\n• Red Flags: {}\n• Positive Indicators: {}",
        bullet_list(&coin.red_flags, "None"),
        bullet_list(&coin.positive_indicators, "None"),
    ));
    sections.push(format!(
        "Sample Tweets:\n{}",
        if coin.sample_tweets.is_empty() {
            "No sample tweets available".to_string()
        } else {
            coin.sample_tweets
                .iter()
                .map(|t| format!("• {t}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
    ));
    sections.push(format!(
        "Final Recommendation:\n{}",
        coin.recommendation
            .as_deref()
            .unwrap_or("No recommendation available")
    ));
    sections.push(format!(
        "Data Freshness:\n• Last Updated: {}\n• Total Coins Analyzed: {}",
        timestamp(doc.analysis_timestamp.as_deref()),
        doc.total_coins_analyzed
            .map(|n| n.to_string())
            .unwrap_or_else(|| doc.coins.len().to_string()),
    ));
    sections.join("\n\n")
}

fn lookup<'a>(doc: &'a CoinAnalysis, symbol: &str) -> Result<&'a CoinRecord, String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err("Please specify a coin symbol".into());
    }
    if doc.coins.is_empty() {
        return Err(NO_DATA.into());
    }
    doc.find(symbol)
        .ok_or_else(|| format!("No data found for coin: {symbol}"))
}

/// Dataset symbols mentioned in free text, in dataset order.
pub fn coins_in_text(doc: &CoinAnalysis, text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let upper = text.to_uppercase();
    doc.coins
        .iter()
        .filter(|c| !c.symbol.is_empty() && upper.contains(c.symbol.as_str()))
        .map(|c| c.symbol.clone())
        .collect()
}

/// How old the analysis file is, relative to `now`.
pub fn freshness_report(modified: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - modified).num_minutes().max(0);
    let age = if minutes < 60 {
        format!("{minutes} minutes ago")
    } else if minutes < 1440 {
        let hours = minutes / 60;
        format!("{hours} hour{} ago", if hours > 1 { "s" } else { "" })
    } else {
        let days = minutes / 1440;
        format!("{days} day{} ago", if days > 1 { "s" } else { "" })
    };
    let status = if minutes < RECENT_MINUTES {
        "✅ Recent data"
    } else {
        "⚠️ Data might be outdated"
    };

    format!(
        "=== Memecoin Data Freshness Report ===\n\n\
         • Data Last Updated: {}\n\
         • Data Age: {age}\n\
         • Status: {status}\n\n\
         Note: We strive to keep our memecoin data as fresh as possible. \
         Data is typically updated every 1-2 hours to reflect the latest market and social media trends.",
        modified.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
