//! Market reference data and tick types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::{Price, Volume};

/// Exchange identifier (e.g. `CFFEX`, `SHFE`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Exchange(String);

impl Exchange {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the instrument key `"{symbol}.{exchange}"`.
pub fn vt_symbol(symbol: &str, exchange: &Exchange) -> String {
    format!("{}.{}", symbol, exchange)
}

/// Static contract specification supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractData {
    pub symbol: String,
    pub exchange: Exchange,
    #[serde(default)]
    pub name: String,
    /// Minimum price increment.
    pub pricetick: Price,
    /// Contract multiplier.
    #[serde(default = "default_size")]
    pub size: Decimal,
    #[serde(default)]
    pub min_volume: Option<Volume>,
    #[serde(default)]
    pub max_volume: Option<Volume>,
}

fn default_size() -> Decimal {
    Decimal::ONE
}

impl ContractData {
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }

    /// Sanity-check reference data before it is handed to the rules.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(CoreError::InvalidSymbol("empty symbol".to_string()));
        }
        if self.pricetick.inner().is_sign_negative() {
            return Err(CoreError::InvalidPrice(format!(
                "{}: negative pricetick {}",
                self.vt_symbol(),
                self.pricetick
            )));
        }
        if let (Some(min), Some(max)) = (self.min_volume, self.max_volume) {
            if min > max {
                return Err(CoreError::InvalidVolume(format!(
                    "{}: min_volume {} above max_volume {}",
                    self.vt_symbol(),
                    min,
                    max
                )));
            }
        }
        Ok(())
    }
}

/// Market data snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickData {
    pub symbol: String,
    pub exchange: Exchange,
    pub last_price: Price,
    #[serde(default)]
    pub volume: Volume,
    /// Exchange timestamp (Unix milliseconds).
    pub timestamp_ms: u64,
}

impl TickData {
    pub fn vt_symbol(&self) -> String {
        vt_symbol(&self.symbol, &self.exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn contract() -> ContractData {
        ContractData {
            symbol: "IF2401".to_string(),
            exchange: Exchange::new("CFFEX"),
            name: "CSI 300".to_string(),
            pricetick: Price::new(dec!(0.2)),
            size: dec!(300),
            min_volume: Some(Volume::new(dec!(1))),
            max_volume: Some(Volume::new(dec!(20))),
        }
    }

    #[test]
    fn test_contract_validate() {
        assert!(contract().validate().is_ok());

        let mut bad = contract();
        bad.min_volume = Some(Volume::new(dec!(50)));
        assert!(matches!(bad.validate(), Err(CoreError::InvalidVolume(_))));

        let mut bad = contract();
        bad.pricetick = Price::new(dec!(-0.2));
        assert!(matches!(bad.validate(), Err(CoreError::InvalidPrice(_))));
    }

    #[test]
    fn test_contract_serde_defaults() {
        let json = r#"{"symbol":"rb2405","exchange":"SHFE","pricetick":"1"}"#;
        let c: ContractData = serde_json::from_str(json).unwrap();
        assert_eq!(c.size, dec!(1));
        assert_eq!(c.min_volume, None);
        assert_eq!(c.vt_symbol(), "rb2405.SHFE");
    }
}
