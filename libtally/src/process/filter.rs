use crate::date::Partition;
use crate::error::Result;
use crate::ledger::Day;
use crate::process::Processor;

/// Drops transactions outside of the partition's period. Openings,
/// closings, prices and assertions are kept.
#[derive(Debug)]
pub struct Filter<'a> {
    partition: &'a Partition,
}

impl<'a> Filter<'a> {
    pub fn new(partition: &'a Partition) -> Self {
        Filter { partition }
    }
}

impl Processor for Filter<'_> {
    fn process(&mut self, day: &mut Day) -> Result<()> {
        let partition = self.partition;
        day.transactions.retain(|t| partition.contains(t.date));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::date::{Interval, Partition, Period};
    use crate::directive::Open;
    use crate::ledger::Day;
    use crate::posting::PostingBuilder;
    use crate::process::{Filter, Processor};
    use crate::registry::Registry;
    use crate::transaction::Transaction;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn drop_transactions_outside_period() -> Result<()> {
        let reg = Registry::new();
        let d = |m, d| NaiveDate::from_ymd_opt(2020, m, d).ok_or(anyhow!("invalid date"));
        let partition = Partition::new(Period::new(d(2, 1)?, d(2, 29)?), Interval::Once, 0);
        let mut filter = Filter::new(&partition);

        for (date, kept) in [(d(1, 31)?, 0), (d(2, 1)?, 1), (d(2, 29)?, 1), (d(3, 1)?, 0)] {
            let mut day = Day::new(date);
            day.openings.push(Open {
                date,
                account: reg.account("Assets:Bank")?,
                src: None,
            });
            day.transactions.push(
                Transaction::builder(date, "Deposit")
                    .posting(PostingBuilder::new(
                        reg.account("Equity:Equity")?,
                        reg.account("Assets:Bank")?,
                        reg.commodity("CHF")?,
                        dec!(1),
                    ))
                    .build(),
            );
            filter.process(&mut day)?;
            assert_eq!(day.transactions.len(), kept);
            assert_eq!(day.openings.len(), 1);
        }
        Ok(())
    }
}
