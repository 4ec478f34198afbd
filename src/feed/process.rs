//! Mean-reverting odds process with momentum, volatility clustering and
//! soft boundary reflection.
//!
//! Every random draw goes through the caller's `Rng`, so a seeded generator
//! makes the whole path reproducible.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::feed::types::{Momentum, Volatility};

/// Odds drift back toward this level
pub const EQUILIBRIUM: f64 = 50.0;

/// Volume assumed when a market has none to start from
pub const DEFAULT_VOLUME: f64 = 100_000.0;

/// Smallest volume increment applied per update
const MIN_VOLUME_STEP: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// Overshoot is mirrored back inside, scaled by `damping`
    Mirror { damping: f64 },
    /// Overshoot is replaced by a random point up to `depth` inside the bound
    Rebound { depth: f64 },
}

/// Tuning constants for one flavour of the process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessParams {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub boundary: Boundary,
    /// Fraction of the distance to equilibrium recovered per tick
    pub reversion_strength: f64,
    pub momentum_decay: f64,
    /// Shock is drawn from `[-width / 2, width / 2)`
    pub shock_width: f64,
    pub momentum_weight: f64,
    pub noise_scale: f64,
    pub volatility_persistence: f64,
    /// Evolve the volatility level before drawing noise; otherwise noise
    /// scales with the previous level and the level moves after the tick
    pub noise_uses_updated_level: bool,
    pub base_volatility_min: f64,
    pub base_volatility_span: f64,
    pub history_capacity: usize,
    /// RMS below this is `Low`
    pub low_volatility_below: f64,
    /// RMS at or above this is `High`
    pub high_volatility_from: f64,
    pub momentum_threshold: f64,
    pub track_volume: bool,
}

impl ProcessParams {
    /// Many markets ticking together on the overview pages
    pub const BATCH: ProcessParams = ProcessParams {
        lower_bound: 8.0,
        upper_bound: 92.0,
        boundary: Boundary::Mirror { damping: 0.5 },
        reversion_strength: 0.001,
        momentum_decay: 0.85,
        shock_width: 0.4,
        momentum_weight: 1.0,
        noise_scale: 2.0,
        volatility_persistence: 0.7,
        noise_uses_updated_level: true,
        base_volatility_min: 0.3,
        base_volatility_span: 0.3,
        history_capacity: 10,
        low_volatility_below: 0.5,
        high_volatility_from: 1.2,
        momentum_threshold: 0.15,
        track_volume: true,
    };

    /// One market on its detail page
    pub const SINGLE: ProcessParams = ProcessParams {
        lower_bound: 5.0,
        upper_bound: 95.0,
        boundary: Boundary::Rebound { depth: 2.0 },
        reversion_strength: 0.005,
        momentum_decay: 0.8,
        shock_width: 0.6,
        momentum_weight: 0.5,
        noise_scale: 1.0,
        volatility_persistence: 0.7,
        noise_uses_updated_level: false,
        base_volatility_min: 0.3,
        base_volatility_span: 0.4,
        history_capacity: 15,
        low_volatility_below: 0.3,
        high_volatility_from: 0.8,
        momentum_threshold: 0.1,
        track_volume: false,
    };

    pub fn volatility_label(&self, rms: f64) -> Volatility {
        if rms < self.low_volatility_below {
            Volatility::Low
        } else if rms < self.high_volatility_from {
            Volatility::Medium
        } else {
            Volatility::High
        }
    }

    pub fn momentum_label(&self, mean: f64) -> Momentum {
        if mean > self.momentum_threshold {
            Momentum::Bullish
        } else if mean < -self.momentum_threshold {
            Momentum::Bearish
        } else {
            Momentum::Neutral
        }
    }

    /// Bring an out-of-range value back inside the soft bounds
    pub fn reflect<R: Rng + ?Sized>(&self, odds: f64, rng: &mut R) -> f64 {
        let reflected = if odds > self.upper_bound {
            match self.boundary {
                Boundary::Mirror { damping } => self.upper_bound - (odds - self.upper_bound) * damping,
                Boundary::Rebound { depth } => self.upper_bound - rng.gen::<f64>() * depth,
            }
        } else if odds < self.lower_bound {
            match self.boundary {
                Boundary::Mirror { damping } => self.lower_bound + (self.lower_bound - odds) * damping,
                Boundary::Rebound { depth } => self.lower_bound + rng.gen::<f64>() * depth,
            }
        } else {
            odds
        };

        // only reachable with an overshoot larger than the whole band
        reflected.clamp(self.lower_bound, self.upper_bound)
    }

    /// Upper bound on `|price_change|` for one tick from `state`,
    /// taking the shock and noise draws at their extremes
    pub fn max_step(&self, state: &MarketState, include_shock: bool) -> f64 {
        let shock = if include_shock { self.shock_width / 2.0 } else { 0.0 };
        let momentum = state.momentum.abs() * self.momentum_decay + shock;
        let level = if self.noise_uses_updated_level {
            let base_max = self.base_volatility_min + self.base_volatility_span;
            state.volatility_level * self.volatility_persistence + base_max * (1.0 - self.volatility_persistence)
        } else {
            state.volatility_level
        };
        let reversion = (EQUILIBRIUM - state.odds).abs() * self.reversion_strength;

        momentum * self.momentum_weight + reversion + 0.5 * level * self.noise_scale
    }
}

/// Per-market simulation state; lives only as long as the feed that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    odds: f64,
    volume_24h: f64,
    momentum: f64,
    volatility_level: f64,
    recent_changes: VecDeque<f64>,
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new(EQUILIBRIUM, DEFAULT_VOLUME)
    }
}

impl MarketState {
    pub fn new(odds: f64, volume_24h: f64) -> Self {
        Self {
            odds,
            volume_24h,
            momentum: 0.0,
            volatility_level: 0.5,
            recent_changes: VecDeque::new(),
        }
    }

    /// Fresh state with a random initial drift and regime
    pub fn seeded<R: Rng + ?Sized>(odds: f64, volume_24h: f64, rng: &mut R) -> Self {
        let momentum = (rng.gen::<f64>() - 0.5) * 0.5;
        let volatility_level = 0.5 + rng.gen::<f64>() * 0.5;
        Self::new(odds, volume_24h).with_dynamics(momentum, volatility_level)
    }

    pub fn with_dynamics(mut self, momentum: f64, volatility_level: f64) -> Self {
        self.momentum = momentum;
        self.volatility_level = volatility_level;
        self
    }

    pub fn odds(&self) -> f64 {
        self.odds
    }

    pub fn set_odds(&mut self, odds: f64) {
        self.odds = odds;
    }

    pub fn volume_24h(&self) -> f64 {
        self.volume_24h
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn volatility_level(&self) -> f64 {
        self.volatility_level
    }

    pub fn recent_changes(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.recent_changes.iter().copied()
    }

    /// Root mean square of the recent changes, 0 when empty
    pub fn recent_rms(&self) -> f64 {
        if self.recent_changes.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.recent_changes.iter().map(|c| c * c).sum();
        (sum_sq / self.recent_changes.len() as f64).sqrt()
    }

    pub fn recent_mean(&self) -> f64 {
        if self.recent_changes.is_empty() {
            return 0.0;
        }
        self.recent_changes.iter().sum::<f64>() / self.recent_changes.len() as f64
    }

    /// Advance one tick
    pub fn step<R: Rng + ?Sized>(&mut self, params: &ProcessParams, rng: &mut R) -> Step {
        let mean_reversion = (EQUILIBRIUM - self.odds) * params.reversion_strength;

        let shock = (rng.gen::<f64>() - 0.5) * params.shock_width;
        self.momentum = self.momentum * params.momentum_decay + shock;

        if params.noise_uses_updated_level {
            self.evolve_volatility(params, rng);
        }

        let noise = (rng.gen::<f64>() - 0.5) * self.volatility_level * params.noise_scale;
        let price_change = self.momentum * params.momentum_weight + mean_reversion + noise;

        let odds = params.reflect(self.odds + price_change, rng);
        self.odds = round_to(odds, 1);

        if !params.noise_uses_updated_level {
            self.evolve_volatility(params, rng);
        }

        if params.track_volume {
            let activity = price_change.abs() * 0.1 + rng.gen::<f64>() * 0.02;
            let increase = self.volume_24h * activity * 0.1;
            self.volume_24h += increase.max(MIN_VOLUME_STEP);
        }

        self.recent_changes.push_back(price_change);
        while self.recent_changes.len() > params.history_capacity {
            self.recent_changes.pop_front();
        }

        Step {
            price_change,
            yes_odds: self.odds,
            no_odds: round_to(100.0 - self.odds, 1),
            volume_24h: self.volume_24h,
            volatility: params.volatility_label(self.recent_rms()),
            momentum: params.momentum_label(self.recent_mean()),
        }
    }

    /// Volatility clustering: blend the current level with a fresh base draw
    fn evolve_volatility<R: Rng + ?Sized>(&mut self, params: &ProcessParams, rng: &mut R) {
        let base = params.base_volatility_min + rng.gen::<f64>() * params.base_volatility_span;
        self.volatility_level = self.volatility_level * params.volatility_persistence
            + base * (1.0 - params.volatility_persistence);
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub price_change: f64,
    pub yes_odds: f64,
    pub no_odds: f64,
    pub volume_24h: f64,
    pub volatility: Volatility,
    pub momentum: Momentum,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedRng;
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_scripted_rng_reproduces_draws() {
        let mut rng = ScriptedRng::new(&[0.25, 0.75], 0.5);
        assert_eq!(rng.gen::<f64>(), 0.25);
        assert_eq!(rng.gen::<f64>(), 0.75);
        assert_eq!(rng.gen::<f64>(), 0.5);
    }

    #[test]
    fn test_equilibrium_with_zero_draws_stays_put() {
        // shock and noise both land on zero at the midpoint
        let mut state = MarketState::new(50.0, DEFAULT_VOLUME).with_dynamics(0.0, 0.5);
        let step = state.step(&ProcessParams::BATCH, &mut ScriptedRng::midpoint());

        assert_eq!(step.price_change, 0.0);
        assert_eq!(step.yes_odds, 50.0);
        assert_eq!(step.no_odds, 50.0);
    }

    #[test]
    fn test_single_tick_bound_with_zero_shock() {
        let params = ProcessParams::BATCH;
        let start = MarketState::new(50.0, DEFAULT_VOLUME).with_dynamics(0.0, 0.5);
        let bound = params.max_step(&start, false);
        // 0.5 * (0.5 * 0.7 + 0.6 * 0.3) * 2.0
        assert!((bound - 0.53).abs() < 1e-9);

        for noise in [0.0, 0.001, 0.25, 0.75, 0.999_999] {
            let mut state = start.clone();
            // shock, base volatility, noise
            let mut rng = ScriptedRng::new(&[0.5, 0.999_999, noise], 0.5);
            let step = state.step(&params, &mut rng);

            assert!(step.price_change.abs() <= bound + 1e-9);
            assert!((step.yes_odds - 50.0).abs() <= bound + 0.05);
        }
    }

    #[test]
    fn test_single_noise_scales_with_previous_level() {
        let params = ProcessParams::SINGLE;
        let mut state = MarketState::new(50.0, DEFAULT_VOLUME).with_dynamics(0.0, 1.0);
        // shock, noise, then the base draw falls back to 0.5
        let mut rng = ScriptedRng::new(&[0.5, 0.999_999], 0.5);
        let step = state.step(&params, &mut rng);

        // noise used level 1.0, not the blended 0.85
        assert!((step.price_change - 0.5).abs() < 1e-5);
        assert!((state.volatility_level() - 0.85).abs() < 1e-9);
        assert!(step.price_change.abs() <= params.max_step(&MarketState::new(50.0, 0.0).with_dynamics(0.0, 1.0), false));
    }

    #[test]
    fn test_batch_noise_scales_with_blended_level() {
        let params = ProcessParams::BATCH;
        let mut state = MarketState::new(50.0, DEFAULT_VOLUME).with_dynamics(0.0, 1.0);
        // shock, base volatility (0.45), noise
        let mut rng = ScriptedRng::new(&[0.5, 0.5, 0.999_999], 0.5);
        let step = state.step(&params, &mut rng);

        // level 1.0 * 0.7 + 0.45 * 0.3 = 0.835, noise = 0.5 * 0.835 * 2.0
        assert!((state.volatility_level() - 0.835).abs() < 1e-9);
        assert!((step.price_change - 0.835).abs() < 1e-5);
    }

    #[test]
    fn test_odds_complementary_and_bounded() {
        for params in [ProcessParams::BATCH, ProcessParams::SINGLE] {
            let mut rng = StdRng::seed_from_u64(11);
            let mut state = MarketState::seeded(90.0, 500_000.0, &mut rng);

            for _ in 0..5_000 {
                let step = state.step(&params, &mut rng);
                assert!((step.yes_odds + step.no_odds - 100.0).abs() < 1e-9);
                assert!(step.yes_odds >= params.lower_bound);
                assert!(step.yes_odds <= params.upper_bound);
            }
        }
    }

    #[test]
    fn test_mirror_reflection_is_damped_not_clamped() {
        let params = ProcessParams::BATCH;
        let mut rng = ScriptedRng::midpoint();

        assert!((params.reflect(94.0, &mut rng) - 91.0).abs() < 1e-9);
        assert!((params.reflect(5.0, &mut rng) - 9.5).abs() < 1e-9);
        assert_eq!(params.reflect(50.0, &mut rng), 50.0);
    }

    #[test]
    fn test_rebound_lands_inside_band() {
        let params = ProcessParams::SINGLE;
        let mut rng = ScriptedRng::new(&[0.5, 0.25], 0.5);

        assert!((params.reflect(96.3, &mut rng) - 94.0).abs() < 1e-9);
        assert!((params.reflect(3.0, &mut rng) - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_volatility_label_monotonic_in_rms() {
        for params in [ProcessParams::BATCH, ProcessParams::SINGLE] {
            let mut previous = Volatility::Low;
            for i in 0..400 {
                let rms = i as f64 * 0.01;
                let label = params.volatility_label(rms);
                assert!(label >= previous, "label dropped at rms {}", rms);
                previous = label;
            }
            assert_eq!(previous, Volatility::High);
        }
    }

    #[test]
    fn test_momentum_label_thresholds() {
        let params = ProcessParams::BATCH;
        assert_eq!(params.momentum_label(0.16), Momentum::Bullish);
        assert_eq!(params.momentum_label(0.15), Momentum::Neutral);
        assert_eq!(params.momentum_label(-0.15), Momentum::Neutral);
        assert_eq!(params.momentum_label(-0.2), Momentum::Bearish);

        let single = ProcessParams::SINGLE;
        assert_eq!(single.momentum_label(0.12), Momentum::Bullish);
        assert_eq!(single.momentum_label(-0.12), Momentum::Bearish);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = MarketState::default();
        for _ in 0..50 {
            state.step(&ProcessParams::SINGLE, &mut rng);
        }
        assert_eq!(state.recent_changes().len(), 15);

        for _ in 0..50 {
            state.step(&ProcessParams::BATCH, &mut rng);
        }
        assert_eq!(state.recent_changes().len(), 10);
    }

    #[test]
    fn test_volume_never_decreases() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = MarketState::seeded(42.0, 892_000.0, &mut rng);
        let mut last = state.volume_24h();

        for _ in 0..1_000 {
            let step = state.step(&ProcessParams::BATCH, &mut rng);
            assert!(step.volume_24h >= last + MIN_VOLUME_STEP - 1e-9);
            last = step.volume_24h;
        }
    }

    #[test]
    fn test_single_params_leave_volume_alone() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut state = MarketState::new(60.0, 1234.0);
        state.step(&ProcessParams::SINGLE, &mut rng);
        assert_eq!(state.volume_24h(), 1234.0);
    }

    #[test]
    fn test_same_seed_same_path() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = MarketState::seeded(30.0, DEFAULT_VOLUME, &mut rng);
            (0..100)
                .map(|_| state.step(&ProcessParams::BATCH, &mut rng).yes_odds)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(21), run(21));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(42.349, 1), 42.3);
        assert_eq!(round_to(-0.126, 2), -0.13);
    }
}
