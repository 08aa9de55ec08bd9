use rust_decimal::Decimal;

use crate::amounts::{accept_all, Amounts, Key, Predicate};
use crate::commodity::Commodity;
use crate::error::Result;
use crate::ledger::Day;
use crate::process::Processor;

/// Sink for the amounts produced by a [`Query`].
pub trait Collection {
    fn insert(&mut self, key: Key, amount: Decimal);
}

impl Collection for Amounts {
    fn insert(&mut self, key: Key, amount: Decimal) {
        self.add(key, amount)
    }
}

/// Feeds every posting, keyed by date, accounts, commodity and description,
/// into a collection. Posting values are used when a valuation is set,
/// quantities otherwise.
pub struct Query<'a, C: Collection> {
    collection: &'a mut C,
    valuation: Option<Commodity>,
    mapper: Box<dyn Fn(&Key) -> Key + 'a>,
    filter: Predicate<'a, Key>,
}

impl<'a, C: Collection> Query<'a, C> {
    pub fn new(collection: &'a mut C, valuation: Option<Commodity>) -> Self {
        Query {
            collection,
            valuation,
            mapper: Box::new(Key::clone),
            filter: accept_all(),
        }
    }

    pub fn mapper(mut self, mapper: impl Fn(&Key) -> Key + 'a) -> Self {
        self.mapper = Box::new(mapper);
        self
    }

    pub fn filter(mut self, filter: Predicate<'a, Key>) -> Self {
        self.filter = filter;
        self
    }
}

impl<C: Collection> Processor for Query<'_, C> {
    fn process(&mut self, day: &mut Day) -> Result<()> {
        for t in &day.transactions {
            for p in &t.postings {
                let key = Key {
                    date: Some(t.date),
                    account: Some(p.account.clone()),
                    other: Some(p.other.clone()),
                    commodity: Some(p.commodity.clone()),
                    valuation: self.valuation.clone(),
                    description: Some(t.description.clone()),
                };
                if !(self.filter)(&key) {
                    continue;
                }
                let amount = if self.valuation.is_some() {
                    p.value
                } else {
                    p.amount
                };
                self.collection.insert((self.mapper)(&key), amount);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::amounts::{filter_account, identity, Amounts, Key, KeyMapper};
    use crate::ledger::Day;
    use crate::posting::PostingBuilder;
    use crate::process::{Processor, Query};
    use crate::registry::Registry;
    use crate::transaction::Transaction;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use regex::Regex;
    use rust_decimal_macros::dec;

    #[test]
    fn collect_postings() -> Result<()> {
        let reg = Registry::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let chf = reg.commodity("CHF")?;
        let bank = reg.account("Assets:Bank")?;
        let mut day = Day::new(date);
        day.transactions.push(
            Transaction::builder(date, "Deposit")
                .posting(
                    PostingBuilder::new(reg.account("Equity:Equity")?, bank.clone(), chf.clone(), dec!(10))
                        .value(dec!(11)),
                )
                .build(),
        );

        let mut quantities = Amounts::new();
        let mapper = KeyMapper {
            account: Some(identity()),
            commodity: Some(identity()),
            ..KeyMapper::default()
        }
        .build();
        Query::new(&mut quantities, None)
            .mapper(mapper)
            .filter(filter_account(vec![Regex::new("^Assets")?]))
            .process(&mut day)?;
        assert_eq!(quantities.len(), 1);
        assert_eq!(quantities.amount(&Key::position(&bank, &chf)), dec!(10));

        let mut values = Amounts::new();
        Query::new(&mut values, Some(chf.clone())).process(&mut day)?;
        assert_eq!(values.len(), 2);
        assert_eq!(values.sum(), dec!(0));
        let key = values
            .keys()
            .find(|k| k.account.as_ref() == Some(&bank))
            .ok_or(anyhow!("missing key"))?;
        assert_eq!(values.amount(key), dec!(11));
        assert_eq!(key.description.as_deref(), Some("Deposit"));
        assert_eq!(key.valuation, Some(chf));
        Ok(())
    }
}
