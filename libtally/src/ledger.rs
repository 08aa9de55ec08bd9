use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::amounts::Amounts;
use crate::date::Period;
use crate::directive::{Assertion, Close, Directive, Open, Price};
use crate::performance::Performance;
use crate::price::NormalizedPrices;
use crate::transaction::Transaction;

/// Everything that happens on one calendar date, plus the results
/// processors attach to it.
#[derive(Debug)]
pub struct Day {
    pub date: NaiveDate,
    pub prices: Vec<Price>,
    pub assertions: Vec<Assertion>,
    pub openings: Vec<Open>,
    pub transactions: Vec<Transaction>,
    pub closings: Vec<Close>,

    /// Running positions after the day.
    pub amounts: Option<Amounts>,
    /// Running positions in the valuation commodity after the day.
    pub values: Option<Amounts>,
    pub normalized: Option<Arc<NormalizedPrices>>,
    pub performance: Option<Performance>,
}

impl Day {
    pub fn new(date: NaiveDate) -> Day {
        Day {
            date,
            prices: Vec::new(),
            assertions: Vec::new(),
            openings: Vec::new(),
            transactions: Vec::new(),
            closings: Vec::new(),
            amounts: None,
            values: None,
            normalized: None,
            performance: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
            && self.assertions.is_empty()
            && self.openings.is_empty()
            && self.transactions.is_empty()
            && self.closings.is_empty()
    }
}

/// Directives grouped by date.
#[derive(Debug, Default)]
pub struct Ledger {
    days: BTreeMap<NaiveDate, Day>,
    period: Option<Period>,
}

macro_rules! daybook_insert {
    ($self:ident, $date:expr, $field:ident, $val:expr) => {
        $self.day($date).$field.push($val)
    };
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger {
            days: BTreeMap::new(),
            period: None,
        }
    }

    /// Files the directive under its date.
    pub fn add(&mut self, directive: impl Into<Directive>) {
        match directive.into() {
            Directive::Open(o) => daybook_insert!(self, o.date, openings, o),
            Directive::Price(p) => {
                self.extend_period(p.date);
                daybook_insert!(self, p.date, prices, p)
            }
            Directive::Transaction(t) => {
                self.extend_period(t.date);
                daybook_insert!(self, t.date, transactions, t)
            }
            Directive::Assertion(a) => daybook_insert!(self, a.date, assertions, a),
            Directive::Close(c) => daybook_insert!(self, c.date, closings, c),
        }
    }

    fn extend_period(&mut self, date: NaiveDate) {
        self.period = Some(match self.period {
            Some(p) => Period::new(p.start.min(date), p.end.max(date)),
            None => Period::new(date, date),
        });
    }

    /// The range spanned by prices and transactions.
    pub fn period(&self) -> Option<Period> {
        self.period
    }

    /// Gets or creates the day at `date`.
    pub fn day(&mut self, date: NaiveDate) -> &mut Day {
        self.days.entry(date).or_insert_with(|| Day::new(date))
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Day> {
        self.days.get(&date)
    }

    pub fn days(&self) -> impl Iterator<Item = &Day> {
        self.days.values()
    }

    pub fn days_mut(&mut self) -> impl Iterator<Item = &mut Day> {
        self.days.values_mut()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl<D: Into<Directive>> FromIterator<D> for Ledger {
    fn from_iter<I: IntoIterator<Item = D>>(iter: I) -> Self {
        let mut ledger = Ledger::new();
        ledger.extend(iter);
        ledger
    }
}

impl<D: Into<Directive>> Extend<D> for Ledger {
    fn extend<I: IntoIterator<Item = D>>(&mut self, iter: I) {
        for d in iter {
            self.add(d);
        }
    }
}
