use crate::error::Result;
use crate::ledger::Day;
use crate::process::Processor;

/// Sorts the transactions of each day. Ties keep their input order.
#[derive(Debug, Default)]
pub struct Sort;

impl Processor for Sort {
    fn process(&mut self, day: &mut Day) -> Result<()> {
        day.transactions.sort_by(|a, b| a.compare(b));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::Day;
    use crate::posting::PostingBuilder;
    use crate::process::{Processor, Sort};
    use crate::registry::Registry;
    use crate::transaction::Transaction;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn sort_by_description_then_postings() -> Result<()> {
        let reg = Registry::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let equity = reg.account("Equity:Equity")?;
        let bank = reg.account("Assets:Bank")?;
        let chf = reg.commodity("CHF")?;
        let txn = |desc: &str, amount| {
            Transaction::builder(date, desc)
                .posting(PostingBuilder::new(equity.clone(), bank.clone(), chf.clone(), amount))
                .build()
        };

        let mut day = Day::new(date);
        day.transactions = vec![txn("b", dec!(1)), txn("a", dec!(2)), txn("a", dec!(1))];
        Sort.process(&mut day)?;
        let got: Vec<_> = day
            .transactions
            .iter()
            .map(|t| (t.description.as_str(), t.postings[0].amount))
            .collect();
        assert_eq!(got, vec![("a", dec!(1)), ("a", dec!(2)), ("b", dec!(1))]);
        Ok(())
    }
}
