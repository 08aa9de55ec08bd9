use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::debug;

use crate::account::Account;
use crate::amounts::{Amounts, Key};
use crate::date::Partition;
use crate::error::Result;
use crate::ledger::{Day, Ledger};
use crate::posting::PostingBuilder;
use crate::process::Processor;
use crate::registry::Registry;
use crate::transaction::Transaction;

/// Moves the balances of income, expense and equity accounts into
/// `Equity:Equity` at the start of every partition period.
pub struct CloseAccounts {
    equity: Account,
    dates: BTreeSet<NaiveDate>,
    quantities: Amounts,
    values: Amounts,
}

impl CloseAccounts {
    pub fn new(registry: &Registry, partition: &Partition) -> Result<Self> {
        Ok(CloseAccounts {
            equity: registry.account("Equity:Equity")?,
            dates: partition.start_dates().iter().copied().collect(),
            quantities: Amounts::new(),
            values: Amounts::new(),
        })
    }

    fn closings(&self, date: NaiveDate) -> Vec<Transaction> {
        self.quantities
            .iter()
            .filter_map(|(key, quantity)| {
                let value = self.values.amount(key);
                if quantity.is_zero() && value.is_zero() {
                    return None;
                }
                let (account, commodity) = (key.account.as_ref()?, key.commodity.as_ref()?);
                Some(
                    Transaction::builder(
                        date,
                        format!("Closing account {account} in {commodity}"),
                    )
                    .posting(
                        PostingBuilder::new(
                            account.clone(),
                            self.equity.clone(),
                            commodity.clone(),
                            *quantity,
                        )
                        .value(value),
                    )
                    .build(),
                )
            })
            .collect()
    }
}

impl Processor for CloseAccounts {
    fn init(&mut self, ledger: &mut Ledger) -> Result<()> {
        for d in &self.dates {
            ledger.day(*d);
        }
        Ok(())
    }

    fn process(&mut self, day: &mut Day) -> Result<()> {
        if self.dates.contains(&day.date) {
            let closings = self.closings(day.date);
            debug!(date = %day.date, transactions = closings.len(), "closing accounts");
            day.transactions.extend(closings);
        }
        for t in &day.transactions {
            for p in &t.postings {
                if p.account.is_al() || p.account == self.equity {
                    continue;
                }
                let key = Key::position(&p.account, &p.commodity);
                self.quantities.add(key.clone(), p.amount);
                self.values.add(key, p.value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::date::{Interval, Partition, Period};
    use crate::ledger::Ledger;
    use crate::posting::PostingBuilder;
    use crate::process::{CloseAccounts, Pipeline};
    use crate::registry::Registry;
    use crate::transaction::Transaction;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn close_income_at_period_start() -> Result<()> {
        let reg = Registry::new();
        let chf = reg.commodity("CHF")?;
        let d = |m, d| NaiveDate::from_ymd_opt(2020, m, d).ok_or(anyhow!("invalid date"));
        let partition = Partition::new(Period::new(d(1, 1)?, d(3, 31)?), Interval::Monthly, 0);

        let mut ledger = Ledger::new();
        ledger.add(
            Transaction::builder(d(1, 25)?, "Salary")
                .posting(
                    PostingBuilder::new(
                        reg.account("Income:Salary")?,
                        reg.account("Assets:Bank")?,
                        chf.clone(),
                        dec!(5000),
                    )
                    .value(dec!(5000)),
                )
                .build(),
        );

        Pipeline::new()
            .add(CloseAccounts::new(&reg, &partition)?)
            .run(&mut ledger)?;

        assert_eq!(ledger.len(), 4);
        assert!(ledger.get(d(1, 1)?).ok_or(anyhow!("no day"))?.transactions.is_empty());
        let feb = ledger.get(d(2, 1)?).ok_or(anyhow!("no day"))?;
        assert_eq!(feb.transactions.len(), 1);
        let closing = &feb.transactions[0];
        assert_eq!(closing.description, "Closing account Income:Salary in CHF");
        let salary = closing
            .postings
            .iter()
            .find(|p| p.account.name() == "Income:Salary")
            .ok_or(anyhow!("no posting"))?;
        assert_eq!(salary.amount, dec!(5000));
        assert_eq!(salary.value, dec!(5000));
        assert_eq!(salary.other, reg.account("Equity:Equity")?);
        let total: Decimal = closing.postings.iter().map(|p| p.amount).sum();
        assert_eq!(total, Decimal::ZERO);

        assert!(ledger.get(d(3, 1)?).ok_or(anyhow!("no day"))?.transactions.is_empty());
        Ok(())
    }
}
