//! Loading the scraper's JSON documents from disk.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tp_domain::trace::TraceEvent;
use tp_domain::{Error, Result};

use crate::analysis::CoinAnalysis;
use crate::helix::{FormattedMemecoin, HelixDocument};

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("market data file {}", path.display()))
        } else {
            Error::Io(e)
        }
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn load_analysis(path: &Path) -> Result<CoinAnalysis> {
    read_json(path).await
}

pub async fn load_helix(path: &Path) -> Result<HelixDocument> {
    read_json(path).await
}

/// The market file as stored, without interpreting it.
pub async fn load_helix_raw(path: &Path) -> Result<serde_json::Value> {
    read_json(path).await
}

/// Scored market view. Falls back to the built-in sample when the file is
/// missing, unreadable, or empty.
pub async fn market_snapshot(path: &Path) -> Vec<FormattedMemecoin> {
    let reason = match load_helix(path).await {
        Ok(doc) if !doc.data.is_empty() => return doc.formatted(),
        Ok(_) => "no market rows".to_string(),
        Err(e) => e.to_string(),
    };
    tracing::warn!(path = %path.display(), reason = %reason, "using fallback market data");
    TraceEvent::MarketDataFallback {
        source: path.display().to_string(),
        reason,
    }
    .emit();
    HelixDocument::fallback().formatted()
}

/// Modification time of a data file.
pub async fn last_modified(path: &Path) -> Result<DateTime<Utc>> {
    let meta = tokio::fs::metadata(path).await?;
    Ok(DateTime::<Utc>::from(meta.modified()?))
}
