use std::sync::Arc;
use tracing::debug;

use crate::commodity::Commodity;
use crate::error::Result;
use crate::ledger::Day;
use crate::price::{NormalizedPrices, Prices};
use crate::process::Processor;

/// Maintains the price graph and attaches the normalised prices to every
/// day. Does nothing without a valuation commodity.
#[derive(Debug)]
pub struct ComputePrices {
    valuation: Option<Commodity>,
    prices: Prices,
    previous: Option<Arc<NormalizedPrices>>,
}

impl ComputePrices {
    pub fn new(valuation: Option<Commodity>) -> Self {
        ComputePrices {
            valuation,
            prices: Prices::new(),
            previous: None,
        }
    }
}

impl Processor for ComputePrices {
    fn process(&mut self, day: &mut Day) -> Result<()> {
        let Some(valuation) = &self.valuation else {
            return Ok(());
        };
        if day.prices.is_empty() {
            if self.previous.is_none() {
                self.previous = Some(Arc::new(self.prices.normalize(valuation)));
            }
        } else {
            for p in &day.prices {
                self.prices.insert(p)?;
            }
            let normalized = self.prices.normalize(valuation);
            debug!(date = %day.date, commodities = normalized.len(), "normalized prices");
            self.previous = Some(Arc::new(normalized));
        }
        day.normalized = self.previous.clone();
        Ok(())
    }
}
