//! Day processors.
//!
//! A [`Pipeline`] pushes every [`Day`] of a [`Ledger`] through an ordered
//! chain of processors. Days are processed in ascending date order, and
//! within a day processors run in the order they were added, so synthetic
//! transactions created by one processor are visible to the next.
//!
//! The recommended order is sort, compute prices, balance, close accounts,
//! filter, query.

use tracing::{debug, info_span};

use crate::error::Result;
use crate::ledger::{Day, Ledger};

mod accrual;
mod balance;
mod check;
mod close;
mod filter;
mod prices;
mod query;
mod sort;

pub use accrual::{expand, ExpandAccruals};
pub use balance::Balancer;
pub use check::Checker;
pub use close::CloseAccounts;
pub use filter::Filter;
pub use prices::ComputePrices;
pub use query::{Collection, Query};
pub use sort::Sort;

pub trait Processor {
    /// Called once, in pipeline order, before any day is processed.
    fn init(&mut self, _ledger: &mut Ledger) -> Result<()> {
        Ok(())
    }

    fn process(&mut self, day: &mut Day) -> Result<()>;
}

/// Lets a caller keep ownership of a processor and read its state after a
/// pipeline run.
impl<P: Processor + ?Sized> Processor for &mut P {
    fn init(&mut self, ledger: &mut Ledger) -> Result<()> {
        (**self).init(ledger)
    }

    fn process(&mut self, day: &mut Day) -> Result<()> {
        (**self).process(day)
    }
}

#[derive(Default)]
pub struct Pipeline<'a> {
    processors: Vec<Box<dyn Processor + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Pipeline {
            processors: Vec::new(),
        }
    }

    pub fn add(mut self, processor: impl Processor + 'a) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn add_if(self, cond: bool, processor: impl Processor + 'a) -> Self {
        if cond {
            self.add(processor)
        } else {
            self
        }
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Runs the pipeline, aborting on the first error.
    pub fn run(&mut self, ledger: &mut Ledger) -> Result<()> {
        let span = info_span!("pipeline", processors = self.processors.len());
        let _enter = span.enter();
        for p in self.processors.iter_mut() {
            p.init(ledger)?;
        }
        debug!(days = ledger.len(), "processing days");
        for day in ledger.days_mut() {
            for p in self.processors.iter_mut() {
                p.process(day)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Result as LedgerResult;
    use crate::ledger::{Day, Ledger};
    use crate::process::{Pipeline, Processor};

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use std::cell::RefCell;

    struct Recorder<'a> {
        name: &'static str,
        log: &'a RefCell<Vec<String>>,
    }

    impl Processor for Recorder<'_> {
        fn init(&mut self, ledger: &mut Ledger) -> LedgerResult<()> {
            self.log.borrow_mut().push(format!("init {} {}", self.name, ledger.len()));
            Ok(())
        }

        fn process(&mut self, day: &mut Day) -> LedgerResult<()> {
            self.log.borrow_mut().push(format!("{} {}", self.name, day.date));
            Ok(())
        }
    }

    #[test]
    fn run_day_major() -> Result<()> {
        let d1 = NaiveDate::from_ymd_opt(2020, 1, 2).ok_or(anyhow!("invalid date"))?;
        let d2 = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let mut ledger = Ledger::new();
        ledger.day(d1);
        ledger.day(d2);

        let log = RefCell::new(Vec::new());
        Pipeline::new()
            .add(Recorder { name: "a", log: &log })
            .add(Recorder { name: "b", log: &log })
            .run(&mut ledger)?;
        assert_eq!(
            log.into_inner(),
            vec![
                "init a 2",
                "init b 2",
                "a 2020-01-01",
                "b 2020-01-01",
                "a 2020-01-02",
                "b 2020-01-02",
            ]
        );
        Ok(())
    }
}
