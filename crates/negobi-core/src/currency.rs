//! Display currency selection, conversion and formatting.
//!
//! `CurrencyContext` is shared by every consumer that renders amounts.
//! Rates are expressed as units of a currency per one unit of the base
//! currency, so converting an amount *into* the base divides by the rate.
//! Formatting never converts; callers convert explicitly first.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::utils::format_grouped;

/// Currency selected on first load.
pub const DEFAULT_CURRENCY: Currency = Currency::Usd;

/// Currency amounts are stored in on the backend.
pub const DEFAULT_BASE_CURRENCY: Currency = Currency::Ves;

const AMOUNT_DECIMALS: usize = 2;
const RATE_DECIMALS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurrencyError {
    #[error("No exchange rate for {0}")]
    MissingRate(Currency),

    #[error("Invalid exchange rate for {currency}: {rate}")]
    InvalidRate { currency: Currency, rate: f64 },

    #[error("Unknown currency: {0}")]
    Unknown(String),
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Ves,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Ves, Currency::Eur];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Ves => "VES",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Ves => "Bs.",
            Currency::Eur => "€",
        }
    }

    /// Thousands and decimal separators of the locale the currency is shown in.
    fn separators(&self) -> (char, char) {
        match self {
            Currency::Usd => (',', '.'),
            Currency::Ves | Currency::Eur => ('.', ','),
        }
    }

    fn symbol_after(&self) -> bool {
        matches!(self, Currency::Eur)
    }

    fn grouped(&self, value: f64, decimals: usize) -> String {
        let (thousands, decimal) = self.separators();
        format_grouped(value, decimals, thousands, decimal)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "VES" | "BS" => Ok(Currency::Ves),
            "EUR" => Ok(Currency::Eur),
            other => Err(CurrencyError::Unknown(other.to_string())),
        }
    }
}

/// Exchange rates relative to a base currency. The base always has rate 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    base: Currency,
    rates: BTreeMap<Currency, f64>,
}

impl RateTable {
    pub fn new(base: Currency) -> Self {
        Self {
            base,
            rates: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> Currency {
        self.base
    }

    pub fn set(&mut self, currency: Currency, rate: f64) -> Result<(), CurrencyError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CurrencyError::InvalidRate { currency, rate });
        }
        if currency != self.base {
            self.rates.insert(currency, rate);
        }
        Ok(())
    }

    pub fn with_rates<I>(base: Currency, rates: I) -> Result<Self, CurrencyError>
    where
        I: IntoIterator<Item = (Currency, f64)>,
    {
        let mut table = Self::new(base);
        for (currency, rate) in rates {
            table.set(currency, rate)?;
        }
        Ok(table)
    }

    pub fn get(&self, currency: Currency) -> Result<f64, CurrencyError> {
        if currency == self.base {
            return Ok(1.0);
        }
        self.rates
            .get(&currency)
            .copied()
            .ok_or(CurrencyError::MissingRate(currency))
    }
}

#[derive(Debug, Clone)]
struct Selection {
    selected: Currency,
    table: RateTable,
}

/// Process-wide currency selection. Clones share the same selection.
#[derive(Debug, Clone)]
pub struct CurrencyContext {
    inner: Arc<RwLock<Selection>>,
}

impl CurrencyContext {
    pub fn new(selected: Currency, table: RateTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Selection { selected, table })),
        }
    }

    fn read(&self) -> Selection {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write<R>(&self, f: impl FnOnce(&mut Selection) -> R) -> R {
        match self.inner.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    pub fn selected(&self) -> Currency {
        self.read().selected
    }

    pub fn base(&self) -> Currency {
        self.read().table.base()
    }

    /// Switch the display currency for every consumer of this context.
    pub fn set_currency(&self, currency: Currency) {
        debug!(currency = %currency, "Display currency changed");
        self.write(|s| s.selected = currency);
    }

    pub fn set_rate(&self, currency: Currency, rate: f64) -> Result<(), CurrencyError> {
        self.write(|s| s.table.set(currency, rate))
    }

    pub fn rate(&self, currency: Currency) -> Result<f64, CurrencyError> {
        self.read().table.get(currency)
    }

    pub fn rates(&self) -> RateTable {
        self.read().table
    }

    /// Convert an amount expressed in `from` into the base currency.
    pub fn convert(&self, value: f64, from: Currency) -> Result<f64, CurrencyError> {
        let table = self.read().table;
        if from == table.base() {
            return Ok(value);
        }
        Ok(value / table.get(from)?)
    }

    /// Convert an amount in the base currency into the selected currency.
    pub fn to_selected(&self, value: f64) -> Result<f64, CurrencyError> {
        let selection = self.read();
        Ok(value * selection.table.get(selection.selected)?)
    }

    /// `1.234,56` style number in the selected currency's locale.
    pub fn format_amount(&self, value: f64) -> String {
        self.selected().grouped(value, AMOUNT_DECIMALS)
    }

    /// Amount with the selected currency's symbol.
    pub fn format_price(&self, value: f64) -> String {
        format_price_in(self.selected(), value)
    }

    /// Amount followed by the ISO code.
    pub fn format_with_code(&self, value: f64) -> String {
        let currency = self.selected();
        format!("{} {}", currency.grouped(value, AMOUNT_DECIMALS), currency.code())
    }

    /// Exchange rate with four fraction digits.
    pub fn format_rate(&self, value: f64) -> String {
        self.selected().grouped(value, RATE_DECIMALS)
    }
}

impl Default for CurrencyContext {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY, RateTable::new(DEFAULT_BASE_CURRENCY))
    }
}

/// Symbol-formatted amount for an explicit currency.
pub fn format_price_in(currency: Currency, value: f64) -> String {
    let grouped = currency.grouped(value.abs(), AMOUNT_DECIMALS);
    let sign = if value < 0.0 && grouped.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    if currency.symbol_after() {
        format!("{}{} {}", sign, grouped, currency.symbol())
    } else if currency == Currency::Usd {
        format!("{}{}{}", sign, currency.symbol(), grouped)
    } else {
        format!("{}{} {}", sign, currency.symbol(), grouped)
    }
}
