use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::account::Account;
use crate::date::Partition;
use crate::error::Result;
use crate::ledger::{Day, Ledger};
use crate::posting::PostingBuilder;
use crate::process::Processor;
use crate::transaction::{Accrual, Transaction};

/// Replaces every transaction carrying an accrual annotation by its
/// expansion. The rewrite happens when the pipeline initialises, so that
/// synthetic transactions land on their own days before anything is booked.
#[derive(Debug, Default)]
pub struct ExpandAccruals;

impl Processor for ExpandAccruals {
    fn init(&mut self, ledger: &mut Ledger) -> Result<()> {
        let mut accruals = Vec::new();
        for day in ledger.days_mut() {
            let (accrued, kept): (Vec<Transaction>, Vec<Transaction>) = day
                .transactions
                .drain(..)
                .partition(|t| t.accrual.is_some());
            day.transactions = kept;
            accruals.extend(accrued);
        }
        for t in &accruals {
            let expanded = expand(t);
            debug!(date = %t.date, description = %t.description, transactions = expanded.len(), "expanded accrual");
            ledger.extend(expanded);
        }
        Ok(())
    }

    fn process(&mut self, _day: &mut Day) -> Result<()> {
        Ok(())
    }
}

/// Expands an accrual transaction into its single and multi bookings.
///
/// | credit | debit | single (original date) | multi (each period end) |
/// |--------|-------|------------------------|-------------------------|
/// | AL     | IE    | credit -> accrual      | accrual -> debit        |
/// | IE     | AL    | accrual -> debit       | credit -> accrual       |
/// | IE     | IE    |                        | credit -> debit         |
/// | other  |       | credit -> debit        |                         |
///
/// Transactions without an accrual are returned unchanged.
pub fn expand(t: &Transaction) -> Vec<Transaction> {
    let Some(accrual) = &t.accrual else {
        return vec![t.clone()];
    };
    let mut res = Vec::new();
    for p in t.postings.iter().filter(|p| p.amount > Decimal::ZERO) {
        let (credit, debit) = (&p.other, &p.account);
        let (single, multi) = classify(credit, debit, &accrual.account);
        if let Some((cr, dr)) = single {
            res.push(
                Transaction::builder(t.date, t.description.clone())
                    .posting(PostingBuilder::new(cr, dr, p.commodity.clone(), p.amount))
                    .targets(t.targets.clone())
                    .src(t.src.clone())
                    .build(),
            );
        }
        if let Some((cr, dr)) = multi {
            let dates = accrual_dates(accrual);
            let n = Decimal::from(dates.len());
            let quotient = (p.amount / n).trunc();
            let remainder = p.amount - quotient * n;
            for (i, date) in dates.iter().enumerate() {
                let amount = if i == 0 { quotient + remainder } else { quotient };
                res.push(
                    Transaction::builder(
                        *date,
                        format!("{} (accrual {}/{})", t.description, i + 1, dates.len()),
                    )
                    .posting(PostingBuilder::new(
                        cr.clone(),
                        dr.clone(),
                        p.commodity.clone(),
                        amount,
                    ))
                    .targets(t.targets.clone())
                    .src(t.src.clone())
                    .build(),
                );
            }
        }
    }
    res
}

type Booking = Option<(Account, Account)>;

fn classify(credit: &Account, debit: &Account, accrual: &Account) -> (Booking, Booking) {
    let (c, d, a) = (credit.clone(), debit.clone(), accrual.clone());
    if credit.is_al() && debit.is_ie() {
        (Some((c, a.clone())), Some((a, d)))
    } else if credit.is_ie() && debit.is_al() {
        (Some((a.clone(), d)), Some((c, a)))
    } else if credit.is_ie() && debit.is_ie() {
        (None, Some((c, d)))
    } else {
        (Some((c, d)), None)
    }
}

fn accrual_dates(accrual: &Accrual) -> Vec<NaiveDate> {
    let dates = Partition::new(accrual.period, accrual.interval, 0)
        .end_dates()
        .to_vec();
    if dates.is_empty() {
        vec![accrual.period.end]
    } else {
        dates
    }
}
