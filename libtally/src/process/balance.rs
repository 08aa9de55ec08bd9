use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use crate::account::Account;
use crate::amounts::{Amounts, Key};
use crate::commodity::Commodity;
use crate::directive::Directive;
use crate::error::{Error, Result};
use crate::ledger::Day;
use crate::posting::PostingBuilder;
use crate::process::Processor;
use crate::registry::Registry;
use crate::transaction::Transaction;

/// Books openings, postings, assertions and closings, and valuates every
/// posting when a valuation commodity is set.
///
/// Price changes of held commodities are materialised as synthetic gain
/// transactions against `Income:<account tail>`, so that the running values
/// always equal the quantities times the day's prices.
pub struct Balancer<'a> {
    registry: &'a Registry,
    valuation: Option<Commodity>,
    quantities: Amounts,
    values: Amounts,
    open: HashSet<Account>,
}

impl<'a> Balancer<'a> {
    pub fn new(registry: &'a Registry, valuation: Option<Commodity>) -> Self {
        Balancer {
            registry,
            valuation,
            quantities: Amounts::new(),
            values: Amounts::new(),
            open: HashSet::new(),
        }
    }

    pub fn quantities(&self) -> &Amounts {
        &self.quantities
    }

    pub fn values(&self) -> &Amounts {
        &self.values
    }

    fn book(&mut self, day: &Day) -> Result<()> {
        for o in &day.openings {
            if !self.open.insert(o.account.clone()) {
                return Err(Error::AccountAlreadyOpen { open: o.clone() });
            }
        }
        for t in &day.transactions {
            for p in &t.postings {
                if !self.open.contains(&p.account) {
                    return Err(Error::AccountNotOpen {
                        directive: Box::new(Directive::Transaction(t.clone())),
                        account: p.account.clone(),
                    });
                }
                if p.account.is_al() {
                    self.quantities
                        .add(Key::position(&p.account, &p.commodity), p.amount);
                }
            }
        }
        for a in &day.assertions {
            for b in &a.balances {
                if !self.open.contains(&b.account) {
                    return Err(Error::AccountNotOpen {
                        directive: Box::new(Directive::Assertion(a.clone())),
                        account: b.account.clone(),
                    });
                }
                let actual = self
                    .quantities
                    .amount(&Key::position(&b.account, &b.commodity));
                if actual != b.quantity {
                    return Err(Error::AssertionFailed {
                        assertion: Box::new(a.clone()),
                        balance: b.clone(),
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    fn valuate_transactions(&mut self, day: &mut Day, valuation: &Commodity) -> Result<()> {
        let date = day.date;
        for t in day.transactions.iter_mut() {
            let mut missing = None;
            for p in t.postings.iter_mut() {
                p.value = if p.commodity == *valuation {
                    p.amount
                } else {
                    match day
                        .normalized
                        .as_ref()
                        .and_then(|np| np.valuate(&p.commodity, p.amount))
                    {
                        Some(value) => value,
                        None => {
                            missing = Some(p.commodity.clone());
                            break;
                        }
                    }
                };
                if p.account.is_al() {
                    self.values.add(Key::position(&p.account, &p.commodity), p.value);
                }
            }
            if let Some(commodity) = missing {
                return Err(Error::NoPriceFound {
                    date,
                    commodity,
                    directive: Some(Box::new(Directive::Transaction(t.clone()))),
                });
            }
        }
        Ok(())
    }

    fn valuate_gains(&mut self, day: &mut Day, valuation: &Commodity) -> Result<()> {
        let mut gains = Vec::new();
        for (key, quantity) in self.quantities.iter() {
            let (Some(account), Some(commodity)) = (&key.account, &key.commodity) else {
                continue;
            };
            if commodity == valuation {
                continue;
            }
            let target = if quantity.is_zero() {
                Decimal::ZERO
            } else {
                day.normalized
                    .as_ref()
                    .and_then(|np| np.valuate(commodity, *quantity))
                    .ok_or_else(|| Error::NoPriceFound {
                        date: day.date,
                        commodity: commodity.clone(),
                        directive: None,
                    })?
            };
            let gain = target - self.values.amount(key);
            if gain.is_zero() {
                continue;
            }
            debug!(date = %day.date, %account, %commodity, %gain, "valuation gain");
            gains.push(
                Transaction::builder(
                    day.date,
                    format!("Adjust value of {commodity} in account {account}"),
                )
                .posting(
                    PostingBuilder::new(
                        self.registry.valuation_account_for(account),
                        account.clone(),
                        commodity.clone(),
                        Decimal::ZERO,
                    )
                    .value(gain),
                )
                .targets(Some(vec![commodity.clone()]))
                .build(),
            );
        }
        for t in &gains {
            for p in t.postings.iter().filter(|p| p.account.is_al()) {
                self.values.add(Key::position(&p.account, &p.commodity), p.value);
            }
        }
        day.transactions.extend(gains);
        Ok(())
    }

    fn close(&mut self, day: &Day) -> Result<()> {
        for c in &day.closings {
            let held = |k: &Key| k.account.as_ref() == Some(&c.account);
            let nonzero = self.quantities.iter().find_map(|(k, q)| match &k.commodity {
                Some(commodity) if held(k) && !q.is_zero() => Some((commodity.clone(), *q)),
                _ => None,
            });
            if let Some((commodity, quantity)) = nonzero {
                return Err(Error::AccountHasNonzeroPosition {
                    close: c.clone(),
                    commodity,
                    quantity,
                });
            }
            self.quantities.retain(|k, _| !held(k));
            self.values.retain(|k, _| !held(k));
            if !self.open.remove(&c.account) {
                return Err(Error::AccountNotOpen {
                    directive: Box::new(Directive::Close(c.clone())),
                    account: c.account.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Processor for Balancer<'_> {
    fn process(&mut self, day: &mut Day) -> Result<()> {
        self.book(day)?;
        if let Some(valuation) = self.valuation.clone() {
            self.valuate_transactions(day, &valuation)?;
            self.valuate_gains(day, &valuation)?;
        }
        self.close(day)?;
        day.amounts = Some(self.quantities.clone());
        if self.valuation.is_some() {
            day.values = Some(self.values.clone());
        }
        Ok(())
    }
}
