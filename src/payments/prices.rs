//! Plan price table

use std::collections::BTreeMap;

/// Plan → price in the smallest currency unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    currency: String,
    prices: BTreeMap<String, u64>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new("usd")
            .with_plan("basic", 9_900)
            .with_plan("advanced", 19_900)
            .with_plan("golden", 29_900)
    }
}

impl PriceTable {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            prices: BTreeMap::new(),
        }
    }

    pub fn with_plan(mut self, plan: impl Into<String>, amount: u64) -> Self {
        self.prices.insert(plan.into(), amount);
        self
    }

    /// Price for an exact plan key; zero-priced plans are not sellable
    pub fn price(&self, plan: &str) -> Option<u64> {
        self.prices.get(plan).copied().filter(|amount| *amount > 0)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn plans(&self) -> impl Iterator<Item = &str> {
        self.prices.keys().map(String::as_str)
    }
}
