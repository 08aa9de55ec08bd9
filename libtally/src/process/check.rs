use crate::directive::{Assertion, Balance};
use crate::error::Result;
use crate::ledger::Day;
use crate::process::{Balancer, Processor};
use crate::registry::Registry;

/// Validates a ledger without valuating it. With `write` set, records an
/// assertion of every nonzero position at the end of each day.
pub struct Checker<'a> {
    balancer: Balancer<'a>,
    write: bool,
    assertions: Vec<Assertion>,
}

impl<'a> Checker<'a> {
    pub fn new(registry: &'a Registry, write: bool) -> Self {
        Checker {
            balancer: Balancer::new(registry, None),
            write,
            assertions: Vec::new(),
        }
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn into_assertions(self) -> Vec<Assertion> {
        self.assertions
    }
}

impl Processor for Checker<'_> {
    fn process(&mut self, day: &mut Day) -> Result<()> {
        self.balancer.process(day)?;
        if !self.write {
            return Ok(());
        }
        let mut balances: Vec<Balance> = self
            .balancer
            .quantities()
            .iter()
            .filter(|(_, q)| !q.is_zero())
            .filter_map(|(k, q)| {
                Some(Balance {
                    account: k.account.clone()?,
                    commodity: k.commodity.clone()?,
                    quantity: *q,
                })
            })
            .collect();
        if balances.is_empty() {
            return Ok(());
        }
        balances.sort_by(|a, b| {
            a.account
                .cmp(&b.account)
                .then_with(|| a.commodity.cmp(&b.commodity))
        });
        self.assertions.push(Assertion {
            date: day.date,
            balances,
            src: None,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::directive::{Assertion, Balance, Open};
    use crate::error::Error;
    use crate::ledger::Ledger;
    use crate::posting::PostingBuilder;
    use crate::process::{Checker, Processor};
    use crate::registry::Registry;
    use crate::transaction::Transaction;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn write_assertions() -> Result<()> {
        let reg = Registry::new();
        let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).ok_or(anyhow!("invalid date"));
        let mut ledger = Ledger::new();
        for name in ["Assets:Bank", "Assets:Cash", "Equity:Equity"] {
            ledger.add(Open {
                date: d(1)?,
                account: reg.account(name)?,
                src: None,
            });
        }
        ledger.add(
            Transaction::builder(d(2)?, "Deposit")
                .posting(PostingBuilder::new(
                    reg.account("Equity:Equity")?,
                    reg.account("Assets:Cash")?,
                    reg.commodity("USD")?,
                    dec!(5),
                ))
                .posting(PostingBuilder::new(
                    reg.account("Equity:Equity")?,
                    reg.account("Assets:Bank")?,
                    reg.commodity("CHF")?,
                    dec!(10),
                ))
                .build(),
        );

        let mut checker = Checker::new(&reg, true);
        for day in ledger.days_mut() {
            checker.process(day)?;
        }
        let assertions = checker.into_assertions();
        assert_eq!(assertions.len(), 1);
        assert_eq!(
            assertions[0].to_string(),
            "2020-01-02 balance\nAssets:Bank 10 CHF\nAssets:Cash 5 USD"
        );
        Ok(())
    }

    #[test]
    fn check_fails_on_assertion() -> Result<()> {
        let reg = Registry::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let mut ledger = Ledger::new();
        ledger.add(Open {
            date,
            account: reg.account("Assets:Bank")?,
            src: None,
        });
        ledger.add(Assertion {
            date,
            balances: vec![Balance {
                account: reg.account("Assets:Bank")?,
                commodity: reg.commodity("CHF")?,
                quantity: dec!(1),
            }],
            src: None,
        });
        let mut checker = Checker::new(&reg, false);
        let res = ledger.days_mut().try_for_each(|day| checker.process(day));
        assert!(matches!(res, Err(Error::AssertionFailed { .. })));
        assert!(checker.assertions().is_empty());
        Ok(())
    }
}
