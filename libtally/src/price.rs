use indexmap::IndexMap;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::commodity::Commodity;
use crate::directive::Price;
use crate::error::{Error, Result};

/// Fractional digits kept for prices and valuated amounts.
pub const SCALE: u32 = 8;

pub fn truncate(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero)
}

/// Multiplies and truncates to [`SCALE`] digits.
pub fn multiply(a: Decimal, b: Decimal) -> Decimal {
    truncate(a * b)
}

/// Directed price graph. `edges[t][c]` is the price of one `c` in `t`.
#[derive(Clone, Debug, Default)]
pub struct Prices {
    edges: IndexMap<Commodity, IndexMap<Commodity, Decimal>>,
}

impl Prices {
    pub fn new() -> Self {
        Prices::default()
    }

    /// Inserts the quote and its inverse.
    pub fn insert(&mut self, price: &Price) -> Result<()> {
        let inverse = match Decimal::ONE.checked_div(price.price) {
            Some(inverse) if !price.price.is_zero() => truncate(inverse),
            _ => {
                return Err(Error::InvalidPrice {
                    price: price.clone(),
                })
            }
        };
        self.add_edge(&price.target, &price.commodity, price.price);
        self.add_edge(&price.commodity, &price.target, inverse);
        Ok(())
    }

    fn add_edge(&mut self, from: &Commodity, to: &Commodity, price: Decimal) {
        self.edges
            .entry(from.clone())
            .or_default()
            .insert(to.clone(), price);
    }

    pub fn edge(&self, from: &Commodity, to: &Commodity) -> Option<Decimal> {
        self.edges.get(from).and_then(|e| e.get(to)).copied()
    }

    /// Prices of every commodity reachable from `valuation`, expressed in
    /// `valuation`. The first path found wins.
    pub fn normalize(&self, valuation: &Commodity) -> NormalizedPrices {
        let mut done = IndexMap::new();
        let mut todo = vec![(valuation.clone(), Decimal::ONE)];
        while let Some((current, price)) = todo.pop() {
            if done.contains_key(&current) {
                continue;
            }
            done.insert(current.clone(), price);
            if let Some(neighbors) = self.edges.get(&current) {
                for (neighbor, p) in neighbors.iter().rev() {
                    if !done.contains_key(neighbor) {
                        todo.push((neighbor.clone(), multiply(*p, price)));
                    }
                }
            }
        }
        NormalizedPrices(done)
    }
}

/// Price of each commodity in the valuation commodity on a given day.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedPrices(IndexMap<Commodity, Decimal>);

impl NormalizedPrices {
    pub fn price(&self, commodity: &Commodity) -> Option<Decimal> {
        self.0.get(commodity).copied()
    }

    pub fn valuate(&self, commodity: &Commodity, amount: Decimal) -> Option<Decimal> {
        self.price(commodity).map(|p| multiply(amount, p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Commodity, &Decimal)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::directive::Price;
    use crate::error::Error;
    use crate::price::{truncate, Prices};
    use crate::registry::Registry;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn quote(reg: &Registry, c: &str, p: Decimal, t: &str) -> Result<Price> {
        Ok(Price {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?,
            commodity: reg.commodity(c)?,
            target: reg.commodity(t)?,
            price: p,
            src: None,
        })
    }

    #[test]
    fn insert_both_edges() -> Result<()> {
        let reg = Registry::new();
        let mut prices = Prices::new();
        prices.insert(&quote(&reg, "USD", dec!(3), "CHF")?)?;
        let (usd, chf) = (reg.commodity("USD")?, reg.commodity("CHF")?);
        assert_eq!(prices.edge(&chf, &usd), Some(dec!(3)));
        assert_eq!(prices.edge(&usd, &chf), Some(dec!(0.33333333)));
        Ok(())
    }

    #[test]
    fn inverse_insertion_is_idempotent() -> Result<()> {
        let reg = Registry::new();
        let (usd, chf) = (reg.commodity("USD")?, reg.commodity("CHF")?);
        let mut once = Prices::new();
        once.insert(&quote(&reg, "USD", dec!(0.8), "CHF")?)?;
        let mut twice = once.clone();
        twice.insert(&quote(&reg, "CHF", dec!(1.25), "USD")?)?;
        assert_eq!(once.edge(&chf, &usd), twice.edge(&chf, &usd));
        assert_eq!(once.edge(&usd, &chf), twice.edge(&usd, &chf));
        Ok(())
    }

    #[test]
    fn reject_zero_price() -> Result<()> {
        let reg = Registry::new();
        let mut prices = Prices::new();
        assert!(matches!(
            prices.insert(&quote(&reg, "USD", Decimal::ZERO, "CHF")?),
            Err(Error::InvalidPrice { .. })
        ));
        Ok(())
    }

    #[test]
    fn normalize_transitively() -> Result<()> {
        let reg = Registry::new();
        let mut prices = Prices::new();
        prices.insert(&quote(&reg, "USD", dec!(0.9), "CHF")?)?;
        prices.insert(&quote(&reg, "AAPL", dec!(150), "USD")?)?;
        prices.insert(&quote(&reg, "EUR", dec!(1.1), "USD")?)?;
        reg.commodity("BTC")?;

        let chf = reg.commodity("CHF")?;
        let np = prices.normalize(&chf);
        assert_eq!(np.price(&chf), Some(Decimal::ONE));
        assert_eq!(np.price(&reg.commodity("USD")?), Some(dec!(0.9)));
        assert_eq!(np.price(&reg.commodity("AAPL")?), Some(dec!(135)));
        assert_eq!(np.price(&reg.commodity("EUR")?), Some(dec!(0.99)));
        assert_eq!(np.price(&reg.commodity("BTC")?), None);
        assert_eq!(np.valuate(&reg.commodity("USD")?, dec!(1000)), Some(dec!(900)));

        let back = prices
            .edge(&reg.commodity("USD")?, &chf)
            .ok_or(anyhow!("missing edge"))?;
        let product = truncate(dec!(0.9) * back);
        assert!((Decimal::ONE - product).abs() < dec!(0.0000001));
        Ok(())
    }

    #[test]
    fn normalize_empty_graph() -> Result<()> {
        let reg = Registry::new();
        let chf = reg.commodity("CHF")?;
        let np = Prices::new().normalize(&chf);
        assert_eq!(np.len(), 1);
        assert_eq!(np.price(&chf), Some(Decimal::ONE));
        Ok(())
    }
}
