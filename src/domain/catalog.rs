//! Indicator catalog.
//!
//! The catalog is validated once at startup and is read-only afterwards. Any
//! validation failure is a fatal configuration error.

use crate::domain::errors::CatalogError;
use crate::domain::indicator::{IndicatorDefinition, RiskDirection};
use crate::domain::proximity::ScoringConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "indicator")]
    indicators: Vec<IndicatorDefinition>,
}

#[derive(Debug, Clone)]
pub struct IndicatorCatalog {
    definitions: Vec<IndicatorDefinition>,
    index: HashMap<String, usize>,
}

impl IndicatorCatalog {
    pub fn new(definitions: Vec<IndicatorDefinition>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(definitions.len());

        for (position, def) in definitions.iter().enumerate() {
            validate_definition(def)?;
            if index.insert(def.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId { id: def.id.clone() });
            }
        }

        Ok(Self { definitions, index })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content).map_err(|e| CatalogError::Parse {
            reason: e.to_string(),
        })?;
        Self::new(file.indicators)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            "Loaded {} indicator definitions from {:?}",
            catalog.len(),
            path
        );
        Ok(catalog)
    }

    /// The market-cycle indicators tracked out of the box.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(builtin_definitions())
    }

    /// Verify that indicators relying on scoring defaults still get a usable
    /// decay window or safety ceiling.
    pub fn check_scoring(&self, scoring: &ScoringConfig) -> Result<(), CatalogError> {
        for def in &self.definitions {
            match def.direction {
                RiskDirection::LowerIsWorse { decay_window: None } => {
                    check_decay_window(&def.id, scoring.decay_window)?;
                }
                RiskDirection::Banded {
                    safety_ceiling: None,
                } => {
                    check_safety_ceiling(&def.id, scoring.safety_ceiling, def.reference_threshold)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&IndicatorDefinition> {
        self.index.get(id).map(|&i| &self.definitions[i])
    }

    pub fn definitions(&self) -> &[IndicatorDefinition] {
        &self.definitions
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn validate_definition(def: &IndicatorDefinition) -> Result<(), CatalogError> {
    if def.id.trim().is_empty() {
        return Err(CatalogError::EmptyId);
    }

    let reference = def.reference_threshold;
    if !reference.is_finite() || reference == 0.0 {
        return Err(CatalogError::InvalidReference {
            id: def.id.clone(),
            value: reference,
        });
    }

    match def.direction {
        RiskDirection::HigherIsWorse => Ok(()),
        RiskDirection::LowerIsWorse { decay_window } => match decay_window {
            Some(window) => check_decay_window(&def.id, window),
            None => Ok(()),
        },
        RiskDirection::Banded { safety_ceiling } => match safety_ceiling {
            Some(ceiling) => check_safety_ceiling(&def.id, ceiling, reference),
            None => Ok(()),
        },
    }
}

fn check_decay_window(id: &str, window: f64) -> Result<(), CatalogError> {
    if !window.is_finite() || window <= 1.0 {
        return Err(CatalogError::InvalidDecayWindow {
            id: id.to_string(),
            window,
        });
    }
    Ok(())
}

fn check_safety_ceiling(id: &str, ceiling: f64, reference: f64) -> Result<(), CatalogError> {
    if !ceiling.is_finite() || ceiling <= reference {
        return Err(CatalogError::InvalidSafetyCeiling {
            id: id.to_string(),
            ceiling,
            reference,
        });
    }
    Ok(())
}

fn higher(id: &str, reference: f64, unit: &str, fallback: f64, description: &str) -> IndicatorDefinition {
    IndicatorDefinition::new(id, reference, RiskDirection::HigherIsWorse)
        .with_unit(unit)
        .with_description(description)
        .with_fallback(fallback)
}

fn lower(id: &str, reference: f64, unit: &str, fallback: f64, description: &str) -> IndicatorDefinition {
    IndicatorDefinition::new(id, reference, RiskDirection::lower_is_worse())
        .with_unit(unit)
        .with_description(description)
        .with_fallback(fallback)
}

fn builtin_definitions() -> Vec<IndicatorDefinition> {
    vec![
        higher("Bitcoin Ahr999 Index", 4.0, "", 0.98, "Price vs 200-day cost basis. Above 4 suggests a market top."),
        higher("Pi Cycle Top Indicator", 190771.0, "$", 111351.78, "111DMA crossing 2x 350DMA signals a cycle top."),
        higher("Puell Multiple", 2.2, "", 1.13, "Daily miner revenue vs 365-day average. Above 2.2 suggests a cycle end."),
        higher("Bitcoin Rainbow Chart", 5.0, "", 3.0, "Logarithmic price band. Band 5 (red) marks a possible top."),
        higher("2-Year MA Multiplier", 364280.0, "$", 111312.05, "Price vs 2-year moving average x5."),
        higher("MVRV Z-Score", 5.0, "", 2.12, "Market value vs realized value z-score. Above 5 suggests a top."),
        higher("Bitcoin Bubble Index", 80.0, "", 13.48, "Price deviation bubble index. Above 80 signals an extreme bubble."),
        IndicatorDefinition::new("Bitcoin Dominance", 40.0, RiskDirection::banded(70.0))
            .with_unit("%")
            .with_description("Bitcoin share of total crypto market cap. A drop to 40% marks a late cycle.")
            .with_fallback(57.8),
        higher("Bitcoin MVRV Ratio", 3.0, "", 2.10, "Market value to realized value. Above 3 signals overvaluation."),
        higher("Mayer Multiple", 2.2, "", 1.13, "Price vs 200-day moving average. Above 2.2 signals overvaluation."),
        higher("Fear & Greed Index", 90.0, "", 55.0, "Market fear and greed. Above 90 signals extreme greed."),
        higher("Bitcoin Net Unrealized P&L", 70.0, "%", 54.91, "Net unrealized profit/loss (NUPL). Above 70% signals euphoria."),
        higher("Bitcoin RHODL Ratio", 10000.0, "", 2754.0, "Realized HODL ratio. Above 10000 suggests a top."),
        higher("Bitcoin Macro Oscillator", 1.4, "", 0.84, "Macro cycle oscillator. Above 1.4 signals a cycle end."),
        higher("Bitcoin 4-Year Moving Average", 3.5, "", 2.13, "Price vs 4-year moving average. Above 3.5 suggests a top."),
        higher("Crypto Bitcoin Bull Run Index", 90.0, "", 74.0, "CBBI bull run index. Above 90 signals the end of a bull run."),
        higher("Bitcoin Reserve Risk", 0.005, "", 0.0024, "Long-term holder confidence vs price. Above 0.005 is high risk."),
        higher("Golden Ratio Multiplier", 135522.0, "$", 112035.99, "Golden ratio multiples of the 350DMA."),
        higher("Bitcoin Terminal Price", 187702.0, "$", 112035.99, "Terminal price model ceiling."),
        higher("Smithson Bitcoin Price Forecast", 175000.0, "$", 112035.99, "Smithson price forecast target."),
        lower("Bitcoin Long Term Holder Supply", 13.5, "M", 15.47, "Long-term holder supply. Below 13.5M signals distribution."),
        higher("Bitcoin Short Term Holder Supply", 30.0, "%", 22.31, "Short-term holder share. Above 30% signals speculation."),
        lower("Bitcoin AHR999x Top Escape", 0.45, "", 3.04, "AHR999x top escape. Below 0.45 signals time to sell."),
        higher("MicroStrategy Avg Bitcoin Cost", 155655.0, "$", 73526.0, "MicroStrategy average acquisition cost."),
        higher("Bitcoin Trend Indicator", 7.0, "", 6.14, "Momentum trend indicator. Above 7 suggests a reversal."),
        higher("3-Month Annualized Ratio", 30.0, "%", 9.95, "3-month annualized basis. Above 30% is unsustainable growth."),
        higher("Days of ETF Net Outflows", 10.0, " days", 2.0, "Consecutive days of ETF net outflows."),
        lower("ETF-to-BTC Ratio", 3.5, "%", 3.2, "ETF holdings vs total BTC. Below 3.5% may signal a cycle end."),
        higher("USDT Flexible Savings", 29.0, "%", 5.66, "USDT flexible savings rate. Above 29% signals stablecoin demand."),
        higher("RSI - 22 Day", 80.0, "", 47.173, "22-day relative strength index. Above 80 is extreme overbought."),
        higher("CMC Altcoin Season Index", 75.0, "", 54.0, "Altcoin season index. Above 75 is an extreme altseason."),
    ]
}
