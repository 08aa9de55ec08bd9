//! Portfolio performance using the modified Dietz method.
//!
//! The [`Calculator`] attaches a [`Performance`] record to every day: the
//! portfolio values at the start and the end of the day, plus the external
//! and internal flows caused by the day's transactions. [`dietz`] turns a
//! record into a daily return and [`Returns`] compounds those per period.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use tracing::debug;

use crate::account::Account;
use crate::commodity::Commodity;
use crate::date::Partition;
use crate::error::{Error, Result};
use crate::ledger::{Day, Ledger};
use crate::process::Processor;
use crate::registry::Registry;

/// Amounts per commodity, in units of the valuation commodity.
pub type Flows = BTreeMap<Commodity, f64>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Performance {
    pub v0: Flows,
    pub v1: Flows,
    pub inflow: Flows,
    pub outflow: Flows,
    pub internal_inflow: Flows,
    pub internal_outflow: Flows,
    pub portfolio_inflow: f64,
    pub portfolio_outflow: f64,
}

/// Computes the daily [`Performance`] of the portfolio formed by the asset
/// and liability accounts matching `accounts`.
///
/// Must run after the [`Balancer`](crate::process::Balancer), as it reads
/// posting values and the day's value snapshot.
pub struct Calculator {
    valuation: Option<Commodity>,
    accounts: Vec<Regex>,
    commodities: Vec<Regex>,
    previous: Flows,
}

impl Calculator {
    pub fn new(valuation: Option<Commodity>) -> Self {
        Calculator {
            valuation,
            accounts: Vec::new(),
            commodities: Vec::new(),
            previous: Flows::new(),
        }
    }

    pub fn accounts(mut self, regexes: Vec<Regex>) -> Self {
        self.accounts = regexes;
        self
    }

    pub fn commodities(mut self, regexes: Vec<Regex>) -> Self {
        self.commodities = regexes;
        self
    }

    fn in_portfolio(&self, account: &Account) -> bool {
        account.is_al()
            && (self.accounts.is_empty() || self.accounts.iter().any(|r| r.is_match(account.name())))
    }

    fn accepts(&self, commodity: &Commodity) -> bool {
        self.commodities.is_empty() || self.commodities.iter().any(|r| r.is_match(commodity.name()))
    }

    fn values(&self, day: &Day) -> Flows {
        let mut res = Flows::new();
        let Some(values) = day.values.as_ref().or(day.amounts.as_ref()) else {
            return res;
        };
        for (key, value) in values.iter() {
            let (Some(account), Some(commodity)) = (&key.account, &key.commodity) else {
                continue;
            };
            if value.is_zero() || !self.in_portfolio(account) || !self.accepts(commodity) {
                continue;
            }
            *res.entry(commodity.clone()).or_default() += to_f64(*value);
        }
        res
    }

    /// Non-currencies first, then currencies other than the valuation, then
    /// whatever is left.
    fn targets(&self, targets: &[Commodity]) -> Vec<Commodity> {
        let non_currencies: Vec<_> = targets.iter().filter(|c| !c.is_currency()).cloned().collect();
        if !non_currencies.is_empty() {
            return non_currencies;
        }
        let currencies: Vec<_> = targets
            .iter()
            .filter(|c| Some(*c) != self.valuation.as_ref())
            .cloned()
            .collect();
        if !currencies.is_empty() {
            return currencies;
        }
        targets.to_vec()
    }

    fn flows(&self, day: &Day, perf: &mut Performance) {
        let mut portfolio_flows = 0.0;
        for t in &day.transactions {
            let mut flows = Flows::new();
            let mut internal = Flows::new();
            let targets = t.targets.as_deref().map(|ts| self.targets(ts));
            for p in &t.postings {
                if !self.in_portfolio(&p.account) || self.in_portfolio(&p.other) {
                    continue;
                }
                let value = to_f64(p.value);
                match targets.as_deref() {
                    None => *flows.entry(p.commodity.clone()).or_default() += value,
                    Some([target]) if *target == p.commodity => {}
                    Some([]) => {
                        *internal.entry(p.commodity.clone()).or_default() += value;
                        portfolio_flows -= value;
                    }
                    Some(ts) => {
                        *internal.entry(p.commodity.clone()).or_default() += value;
                        let share = value / ts.len() as f64;
                        for target in ts {
                            *internal.entry(target.clone()).or_default() -= share;
                        }
                    }
                }
            }
            split(flows, &mut perf.inflow, &mut perf.outflow);
            split(internal, &mut perf.internal_inflow, &mut perf.internal_outflow);
        }
        perf.portfolio_inflow = portfolio_flows.max(0.0);
        perf.portfolio_outflow = portfolio_flows.min(0.0);
    }
}

pub(crate) fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or_default()
}

fn split(flows: Flows, inflow: &mut Flows, outflow: &mut Flows) {
    for (c, f) in flows {
        if f > 0.0 {
            *inflow.entry(c).or_default() += f;
        } else if f < 0.0 {
            *outflow.entry(c).or_default() += f;
        }
    }
}

impl Processor for Calculator {
    fn process(&mut self, day: &mut Day) -> Result<()> {
        let mut perf = Performance {
            v0: std::mem::take(&mut self.previous),
            v1: self.values(day),
            ..Performance::default()
        };
        self.flows(day, &mut perf);
        self.previous = perf.v1.clone();
        day.performance = Some(perf);
        Ok(())
    }
}

/// Modified Dietz return of a single day, `1.0` meaning no change.
pub fn dietz(perf: &Performance) -> f64 {
    let sum = |f: &Flows| f.values().sum::<f64>();
    let (v0, v1) = (sum(&perf.v0), sum(&perf.v1));
    let inflow = sum(&perf.inflow) + sum(&perf.internal_inflow) + perf.portfolio_inflow;
    let outflow = sum(&perf.outflow) + sum(&perf.internal_outflow) + perf.portfolio_outflow;
    if v0 == v1 && inflow == 0.0 && outflow == 0.0 {
        return 1.0;
    }
    let denominator = v0 + inflow;
    if denominator == 0.0 {
        return 1.0;
    }
    (v1 - outflow) / denominator
}

/// Compounds the daily returns of each partition period. Must run after the
/// [`Calculator`].
pub struct Returns<'a> {
    partition: &'a Partition,
    running: f64,
    returns: Vec<(NaiveDate, f64)>,
}

impl<'a> Returns<'a> {
    pub fn new(partition: &'a Partition) -> Self {
        Returns {
            partition,
            running: 1.0,
            returns: Vec::new(),
        }
    }

    /// The return of every completed period, keyed by its end date.
    pub fn returns(&self) -> &[(NaiveDate, f64)] {
        &self.returns
    }
}

impl Processor for Returns<'_> {
    fn init(&mut self, ledger: &mut Ledger) -> Result<()> {
        for d in self.partition.end_dates() {
            ledger.day(*d);
        }
        Ok(())
    }

    fn process(&mut self, day: &mut Day) -> Result<()> {
        if !self.partition.contains(day.date) {
            return Ok(());
        }
        if let Some(perf) = &day.performance {
            self.running *= dietz(perf);
        }
        if self.partition.is_end(day.date) {
            debug!(date = %day.date, r = self.running - 1.0, "period return");
            self.returns.push((day.date, self.running - 1.0));
            self.running = 1.0;
        }
        Ok(())
    }
}

/// Classification of commodities into `:`-separated class paths.
#[derive(Debug, Default)]
pub struct Universe(HashMap<Commodity, Vec<String>>);

impl Universe {
    /// Reads a YAML mapping of class paths to commodity lists. Every
    /// commodity may be classified at most once.
    pub fn from_reader(registry: &Registry, reader: impl Read) -> Result<Universe> {
        let classes: BTreeMap<String, Vec<String>> = serde_yaml::from_reader(reader)?;
        Universe::from_classes(registry, classes)
    }

    pub fn from_yaml(registry: &Registry, yaml: &str) -> Result<Universe> {
        Universe::from_reader(registry, yaml.as_bytes())
    }

    fn from_classes(registry: &Registry, classes: BTreeMap<String, Vec<String>>) -> Result<Universe> {
        let mut universe = HashMap::new();
        for (class, names) in classes {
            for name in names {
                let commodity = registry.commodity(&name)?;
                if universe.contains_key(&commodity) {
                    return Err(Error::Universe(format!(
                        "commodity {commodity} already has a classification"
                    )));
                }
                let mut path: Vec<String> = class.split(':').map(str::to_owned).collect();
                path.push(commodity.name().to_owned());
                universe.insert(commodity, path);
            }
        }
        Ok(Universe(universe))
    }

    /// The class path of `commodity`, ending with its name.
    pub fn locate(&self, commodity: &Commodity) -> Vec<String> {
        self.0
            .get(commodity)
            .cloned()
            .unwrap_or_else(|| vec!["Other".to_owned(), commodity.name().to_owned()])
    }
}
