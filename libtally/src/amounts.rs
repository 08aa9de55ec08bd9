use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;
use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::account::Account;
use crate::commodity::Commodity;

/// Aggregation key. Absent fields act as wildcards that have been projected
/// away.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Key {
    pub date: Option<NaiveDate>,
    pub account: Option<Account>,
    pub other: Option<Account>,
    pub commodity: Option<Commodity>,
    pub valuation: Option<Commodity>,
    pub description: Option<String>,
}

impl Key {
    pub fn position(account: &Account, commodity: &Commodity) -> Key {
        Key {
            account: Some(account.clone()),
            commodity: Some(commodity.clone()),
            ..Key::default()
        }
    }

    pub fn date_commodity(date: NaiveDate, commodity: &Commodity) -> Key {
        Key {
            date: Some(date),
            commodity: Some(commodity.clone()),
            ..Key::default()
        }
    }

    pub fn commodity(commodity: &Commodity) -> Key {
        Key {
            commodity: Some(commodity.clone()),
            ..Key::default()
        }
    }

    pub fn account(account: &Account) -> Key {
        Key {
            account: Some(account.clone()),
            ..Key::default()
        }
    }
}

/// Insertion-ordered `Key -> Decimal` table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Amounts(IndexMap<Key, Decimal>);

impl Amounts {
    pub fn new() -> Self {
        Amounts(IndexMap::new())
    }

    pub fn add(&mut self, key: Key, v: Decimal) {
        *self.0.entry(key).or_insert(Decimal::ZERO) += v;
    }

    /// The amount at `key`, zero if absent.
    pub fn amount(&self, key: &Key) -> Decimal {
        self.0.get(key).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn get(&self, key: &Key) -> Option<Decimal> {
        self.0.get(key).copied()
    }

    pub fn remove(&mut self, key: &Key) -> Option<Decimal> {
        self.0.shift_remove(key)
    }

    pub fn retain(&mut self, f: impl FnMut(&Key, &mut Decimal) -> bool) {
        self.0.retain(f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Decimal)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn plus(&self, other: &Amounts) -> Amounts {
        let mut res = self.clone();
        for (k, v) in other.iter() {
            res.add(k.clone(), *v);
        }
        res
    }

    pub fn minus(&self, other: &Amounts) -> Amounts {
        let mut res = self.clone();
        for (k, v) in other.iter() {
            res.add(k.clone(), -*v);
        }
        res
    }

    pub fn sum_by(&self, pred: impl Fn(&Key) -> bool, mapper: impl Fn(&Key) -> Key) -> Amounts {
        let mut res = Amounts::new();
        self.sum_into_by(&mut res, pred, mapper);
        res
    }

    /// Adds every entry passing `pred` to `dest` under `mapper(key)`, then
    /// drops the zero entries of `dest`.
    pub fn sum_into_by(
        &self,
        dest: &mut Amounts,
        pred: impl Fn(&Key) -> bool,
        mapper: impl Fn(&Key) -> Key,
    ) {
        for (k, v) in self.iter().filter(|(k, _)| pred(k)) {
            dest.add(mapper(k), *v);
        }
        dest.0.retain(|_, v| !v.is_zero());
    }

    pub fn sum_over(&self, pred: impl Fn(&Key) -> bool) -> Decimal {
        self.iter().filter(|(k, _)| pred(k)).map(|(_, v)| *v).sum()
    }

    pub fn sum(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    /// The distinct commodities, sorted by name.
    pub fn commodities(&self) -> Vec<Commodity> {
        let mut res: Vec<Commodity> = self.keys().filter_map(|k| k.commodity.clone()).collect();
        res.sort();
        res.dedup();
        res
    }

    /// The distinct dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut res: Vec<NaiveDate> = self.keys().filter_map(|k| k.date).collect();
        res.sort();
        res.dedup();
        res
    }

    pub fn index(&self, cmp: impl Fn(&Key, &Key) -> Ordering) -> Vec<Key> {
        let mut res: Vec<Key> = self.keys().cloned().collect();
        res.sort_by(|a, b| cmp(a, b));
        res
    }
}

impl FromIterator<(Key, Decimal)> for Amounts {
    fn from_iter<I: IntoIterator<Item = (Key, Decimal)>>(iter: I) -> Self {
        let mut res = Amounts::new();
        for (k, v) in iter {
            res.add(k, v);
        }
        res
    }
}

/// Maps one field of a [`Key`]. Absent values stay absent unless the mapper
/// decides otherwise.
pub type Mapper<'a, T> = Box<dyn Fn(&Option<T>) -> Option<T> + 'a>;

pub fn identity<'a, T: Clone>() -> Mapper<'a, T> {
    Box::new(|t| t.clone())
}

/// Lifts `f` to a field mapper that applies to present values.
pub fn present<'a, T, F>(f: F) -> Mapper<'a, T>
where
    F: Fn(&T) -> T + 'a,
{
    Box::new(move |t| t.as_ref().map(&f))
}

/// Field-wise key projection; fields without a mapper come out empty.
#[derive(Default)]
pub struct KeyMapper<'a> {
    pub date: Option<Mapper<'a, NaiveDate>>,
    pub account: Option<Mapper<'a, Account>>,
    pub other: Option<Mapper<'a, Account>>,
    pub commodity: Option<Mapper<'a, Commodity>>,
    pub valuation: Option<Mapper<'a, Commodity>>,
    pub description: Option<Mapper<'a, String>>,
}

fn apply<T>(mapper: &Option<Mapper<'_, T>>, value: &Option<T>) -> Option<T> {
    mapper.as_ref().and_then(|m| m(value))
}

impl<'a> KeyMapper<'a> {
    pub fn map(&self, key: &Key) -> Key {
        Key {
            date: apply(&self.date, &key.date),
            account: apply(&self.account, &key.account),
            other: apply(&self.other, &key.other),
            commodity: apply(&self.commodity, &key.commodity),
            valuation: apply(&self.valuation, &key.valuation),
            description: apply(&self.description, &key.description),
        }
    }

    pub fn build(self) -> Box<dyn Fn(&Key) -> Key + 'a> {
        Box::new(move |k| self.map(k))
    }
}

pub type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

pub fn accept_all<'a, T>() -> Predicate<'a, T> {
    Box::new(|_| true)
}

pub fn and<'a, T: 'a>(preds: Vec<Predicate<'a, T>>) -> Predicate<'a, T> {
    Box::new(move |t| preds.iter().all(|p| p(t)))
}

pub fn or<'a, T: 'a>(preds: Vec<Predicate<'a, T>>) -> Predicate<'a, T> {
    Box::new(move |t| preds.iter().any(|p| p(t)))
}

fn matches_any(regexes: &[Regex], name: &str) -> bool {
    regexes.is_empty() || regexes.iter().any(|r| r.is_match(name))
}

pub fn filter_dates<'a>(f: impl Fn(NaiveDate) -> bool + 'a) -> Predicate<'a, Key> {
    Box::new(move |k| k.date.map_or(false, &f))
}

/// Accepts keys whose account matches any of the regexes. An empty set
/// accepts everything.
pub fn filter_account<'a>(regexes: Vec<Regex>) -> Predicate<'a, Key> {
    Box::new(move |k| {
        regexes.is_empty()
            || k.account
                .as_ref()
                .map_or(false, |a| matches_any(&regexes, a.name()))
    })
}

pub fn filter_other<'a>(regexes: Vec<Regex>) -> Predicate<'a, Key> {
    Box::new(move |k| {
        regexes.is_empty()
            || k.other
                .as_ref()
                .map_or(false, |a| matches_any(&regexes, a.name()))
    })
}

pub fn filter_commodity<'a>(regexes: Vec<Regex>) -> Predicate<'a, Key> {
    Box::new(move |k| {
        regexes.is_empty()
            || k.commodity
                .as_ref()
                .map_or(false, |c| matches_any(&regexes, c.name()))
    })
}
