use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::account::Account;
use crate::commodity::Commodity;
use crate::date::{Interval, Period};
use crate::directive::Source;
use crate::posting::{Posting, PostingBuilder};

/// Accrual annotation: spread the transaction over `period` in steps of
/// `interval`, parking the amount on `account` meanwhile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accrual {
    pub interval: Interval,
    pub period: Period,
    pub account: Account,
}

impl fmt::Display for Accrual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@accrue {} {} {} {}",
            self.interval, self.period.start, self.period.end, self.account
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub postings: Vec<Posting>,
    /// Commodities the value change is attributed to. `Some(vec![])` is not
    /// the same as `None`.
    pub targets: Option<Vec<Commodity>>,
    pub accrual: Option<Accrual>,
    pub src: Option<Arc<Source>>,
}

impl Transaction {
    pub fn builder(date: NaiveDate, description: impl Into<String>) -> TransactionBuilder {
        TransactionBuilder::new(date, description)
    }

    /// Orders by date, description, postings pairwise and finally the
    /// number of postings.
    pub fn compare(&self, other: &Transaction) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.description.cmp(&other.description))
            .then_with(|| {
                self.postings
                    .iter()
                    .zip(other.postings.iter())
                    .map(|(p, q)| p.cmp(q))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| self.postings.len().cmp(&other.postings.len()))
    }

    pub fn commodities(&self) -> Vec<Commodity> {
        let mut res: Vec<Commodity> = Vec::new();
        for p in &self.postings {
            if !res.contains(&p.commodity) {
                res.push(p.commodity.clone());
            }
        }
        res
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(targets) = &self.targets {
            let names: Vec<_> = targets.iter().map(Commodity::name).collect();
            writeln!(f, "@performance({})", names.join(","))?;
        }
        if let Some(accrual) = &self.accrual {
            writeln!(f, "{accrual}")?;
        }
        write!(f, "{} {:?}", self.date, self.description)?;
        for p in self.postings.iter().filter(|p| !p.amount.is_sign_negative()) {
            write!(f, "\n{p}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct TransactionBuilder {
    date: NaiveDate,
    description: String,
    postings: Vec<Posting>,
    targets: Option<Vec<Commodity>>,
    accrual: Option<Accrual>,
    src: Option<Arc<Source>>,
}

impl TransactionBuilder {
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        TransactionBuilder {
            date,
            description: description.into(),
            postings: Vec::new(),
            targets: None,
            accrual: None,
            src: None,
        }
    }

    pub fn posting(mut self, builder: PostingBuilder) -> Self {
        self.postings.extend(builder.build());
        self
    }

    pub fn postings(mut self, postings: impl IntoIterator<Item = Posting>) -> Self {
        self.postings.extend(postings);
        self
    }

    pub fn targets(mut self, targets: Option<Vec<Commodity>>) -> Self {
        self.targets = targets;
        self
    }

    pub fn accrual(mut self, accrual: Option<Accrual>) -> Self {
        self.accrual = accrual;
        self
    }

    pub fn src(mut self, src: Option<Arc<Source>>) -> Self {
        self.src = src;
        self
    }

    pub fn build(mut self) -> Transaction {
        self.postings.sort();
        Transaction {
            date: self.date,
            description: self.description,
            postings: self.postings,
            targets: self.targets,
            accrual: self.accrual,
            src: self.src,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::date::{Interval, Period};
    use crate::posting::PostingBuilder;
    use crate::registry::Registry;
    use crate::transaction::{Accrual, Transaction};

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::cmp::Ordering;

    #[test]
    fn build_sorts_postings() -> Result<()> {
        let reg = Registry::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let chf = reg.commodity("CHF")?;
        let txn = Transaction::builder(date, "Salary")
            .posting(PostingBuilder::new(
                reg.account("Income:Salary")?,
                reg.account("Assets:Bank")?,
                chf.clone(),
                dec!(1000),
            ))
            .posting(PostingBuilder::new(
                reg.account("Assets:Bank")?,
                reg.account("Expenses:Tax")?,
                chf.clone(),
                dec!(200),
            ))
            .build();

        let accounts: Vec<_> = txn.postings.iter().map(|p| p.account.name()).collect();
        assert_eq!(
            accounts,
            vec!["Assets:Bank", "Assets:Bank", "Income:Salary", "Expenses:Tax"]
        );
        let total: Decimal = txn.postings.iter().map(|p| p.amount).sum();
        assert_eq!(total, Decimal::ZERO);
        assert_eq!(txn.commodities(), vec![chf]);
        Ok(())
    }

    #[test]
    fn compare_transactions() -> Result<()> {
        let reg = Registry::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let posting = PostingBuilder::new(
            reg.account("Equity:Equity")?,
            reg.account("Assets:Bank")?,
            reg.commodity("CHF")?,
            dec!(1),
        );
        let a = Transaction::builder(date, "A").posting(posting.clone()).build();
        let b = Transaction::builder(date, "B").posting(posting.clone()).build();
        let a2 = Transaction::builder(date, "A")
            .posting(posting.clone())
            .posting(posting.clone())
            .build();
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(a.compare(&a2), Ordering::Less);
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
        Ok(())
    }

    #[test]
    fn display_transaction() -> Result<()> {
        let reg = Registry::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let end = NaiveDate::from_ymd_opt(2020, 12, 31).ok_or(anyhow!("invalid date"))?;
        let txn = Transaction::builder(date, "Rent")
            .posting(PostingBuilder::new(
                reg.account("Assets:Bank")?,
                reg.account("Expenses:Rent")?,
                reg.commodity("CHF")?,
                dec!(1200),
            ))
            .targets(Some(vec![reg.commodity("CHF")?]))
            .accrual(Some(Accrual {
                interval: Interval::Monthly,
                period: Period::new(date, end),
                account: reg.account("Liabilities:Accr")?,
            }))
            .build();
        assert_eq!(
            txn.to_string(),
            "@performance(CHF)\n\
             @accrue monthly 2020-01-01 2020-12-31 Liabilities:Accr\n\
             2020-01-01 \"Rent\"\n\
             Assets:Bank Expenses:Rent 1200 CHF"
        );
        Ok(())
    }
}
