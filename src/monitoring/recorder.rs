use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::feed::types::MarketUpdate;

const HEADER: &str = "timestamp,market_id,yes_odds,no_odds,volume_24h,volatility,momentum,price_change";

/// Appends every published feed update to a CSV file
pub struct UpdateRecorder {
    path: PathBuf,
}

impl UpdateRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        // Create CSV file with headers if it doesn't exist
        if !path.exists() {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .open(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            writeln!(file, "{}", HEADER)?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, update: &MarketUpdate) -> Result<()> {
        let mut file = self.open()?;
        writeln!(
            file,
            "{},{},{:.2},{:.2},{:.0},{},{},{:.4}",
            update.timestamp.to_rfc3339(),
            update.market_id,
            update.yes_odds,
            update.no_odds,
            update.volume_24h,
            update.volatility,
            update.momentum,
            update.price_change
        )?;
        Ok(())
    }

    /// Free-form line, e.g. feed start and stop
    pub fn record_event(&self, event: &str) -> Result<()> {
        let mut file = self.open()?;
        writeln!(file, "{},EVENT,{},,,,,", Utc::now().to_rfc3339(), event)?;
        Ok(())
    }

    fn open(&self) -> Result<std::fs::File> {
        OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::{Momentum, Volatility};
    use std::fs;
    use tempfile::TempDir;

    fn update() -> MarketUpdate {
        MarketUpdate {
            market_id: "4".to_string(),
            yes_odds: 78.25,
            no_odds: 21.75,
            volume_24h: 1_200_350.0,
            timestamp: Utc::now(),
            volatility: Volatility::High,
            momentum: Momentum::Bullish,
            price_change: 0.8731,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("updates.csv");

        UpdateRecorder::new(&path).unwrap();
        let recorder = UpdateRecorder::new(&path).unwrap();
        recorder.record(&update()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].ends_with(",4,78.25,21.75,1200350,high,bullish,0.8731"));
    }

    #[test]
    fn test_event_rows_keep_column_count() {
        let dir = TempDir::new().unwrap();
        let recorder = UpdateRecorder::new(dir.path().join("updates.csv")).unwrap();
        recorder.record_event("feed started").unwrap();

        let contents = fs::read_to_string(recorder.path()).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(row.split(',').count(), HEADER.split(',').count());
        assert!(row.contains(",EVENT,feed started,"));
    }
}
