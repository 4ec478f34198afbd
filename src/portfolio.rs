use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arbitrage::Platform;
use crate::data::types::Side;
use crate::feed::types::MarketUpdate;

/// Open mock position. Prices are token prices in 0-1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: u32,
    pub market: String,
    /// Mock market this position follows, when there is one
    pub market_id: Option<String>,
    pub platform: Platform,
    pub side: Side,
    pub entry_price: f64,
    pub current_price: f64,
    pub quantity: f64,
}

impl Position {
    pub fn cost(&self) -> f64 {
        self.entry_price * self.quantity
    }

    pub fn value(&self) -> f64 {
        self.current_price * self.quantity
    }

    pub fn pnl(&self) -> f64 {
        (self.current_price - self.entry_price) * self.quantity
    }

    pub fn pnl_percent(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (self.current_price - self.entry_price) / self.entry_price * 100.0
    }

    /// Mark to the feed's odds for our side
    pub fn mark(&mut self, update: &MarketUpdate) {
        let odds = match self.side {
            Side::Yes => update.yes_odds,
            Side::No => update.no_odds,
        };
        self.current_price = odds / 100.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub positions: usize,
    pub total_value: f64,
    pub total_cost: f64,
    pub unrealized_pnl: f64,
    /// Share of positions currently in profit, 0-1
    pub win_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    positions: Vec<Position>,
}

impl Portfolio {
    pub fn new(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn summary(&self) -> PortfolioSummary {
        let n = self.positions.len();
        let winners = self.positions.iter().filter(|p| p.pnl() > 0.0).count();

        PortfolioSummary {
            positions: n,
            total_value: self.positions.iter().map(Position::value).sum(),
            total_cost: self.positions.iter().map(Position::cost).sum(),
            unrealized_pnl: self.positions.iter().map(Position::pnl).sum(),
            win_rate: if n == 0 { 0.0 } else { winners as f64 / n as f64 },
        }
    }

    /// Mark every linked position to its latest feed update; returns how many moved
    pub fn reprice<F>(&mut self, latest: F) -> usize
    where
        F: Fn(&str) -> Option<MarketUpdate>,
    {
        let mut repriced = 0;
        for position in &mut self.positions {
            if let Some(update) = position.market_id.as_deref().and_then(&latest) {
                position.mark(&update);
                repriced += 1;
            }
        }
        repriced
    }
}

/// Mock equity curve ending on `end`, one point per day
pub fn performance_series<R: Rng + ?Sized>(end: NaiveDate, days: usize, rng: &mut R) -> Vec<EquityPoint> {
    (0..days)
        .map(|i| EquityPoint {
            date: end - Duration::days((days - 1 - i) as i64),
            value: 7000.0 + rng.gen::<f64>() * 2000.0 + i as f64 * 40.0,
        })
        .collect()
}
