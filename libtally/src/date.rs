use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Interval {
    pub fn name(self) -> &'static str {
        match self {
            Interval::Once => "once",
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Quarterly => "quarterly",
            Interval::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Interval::Once,
            Interval::Daily,
            Interval::Weekly,
            Interval::Monthly,
            Interval::Quarterly,
            Interval::Yearly,
        ]
        .into_iter()
        .find(|i| i.name() == s)
        .ok_or_else(|| format!("invalid interval: '{s}'"))
    }
}

fn add_months(d: NaiveDate, n: u32) -> NaiveDate {
    d.checked_add_months(Months::new(n)).unwrap_or(NaiveDate::MAX)
}

fn sub_days(d: NaiveDate, n: u32) -> NaiveDate {
    d.checked_sub_days(Days::new(n.into())).unwrap_or(NaiveDate::MIN)
}

fn pred(d: NaiveDate) -> NaiveDate {
    d.pred_opt().unwrap_or(NaiveDate::MIN)
}

fn succ(d: NaiveDate) -> NaiveDate {
    d.succ_opt().unwrap_or(NaiveDate::MAX)
}

/// First day of the interval containing `d`. Weeks start on Monday.
pub fn start_of(d: NaiveDate, interval: Interval) -> NaiveDate {
    match interval {
        Interval::Once | Interval::Daily => d,
        Interval::Weekly => sub_days(d, d.weekday().num_days_from_monday()),
        Interval::Monthly => sub_days(d, d.day0()),
        Interval::Quarterly => {
            let month = sub_days(d, d.day0());
            month
                .checked_sub_months(Months::new(d.month0() % 3))
                .unwrap_or(NaiveDate::MIN)
        }
        Interval::Yearly => sub_days(d, d.ordinal0()),
    }
}

/// Last day of the interval containing `d`.
pub fn end_of(d: NaiveDate, interval: Interval) -> NaiveDate {
    let start = start_of(d, interval);
    match interval {
        Interval::Once | Interval::Daily => d,
        Interval::Weekly => start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX),
        Interval::Monthly => pred(add_months(start, 1)),
        Interval::Quarterly => pred(add_months(start, 3)),
        Interval::Yearly => pred(add_months(start, 12)),
    }
}

/// Closed date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Period { start, end }
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        self.start <= d && d <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Intersection of both periods, `None` when they don't overlap.
    pub fn clip(&self, other: &Period) -> Option<Period> {
        let p = Period::new(self.start.max(other.start), self.end.min(other.end));
        (!p.is_empty()).then_some(p)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// A period split into ordered end dates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    period: Period,
    interval: Interval,
    start_dates: Vec<NaiveDate>,
    end_dates: Vec<NaiveDate>,
}

impl Partition {
    pub fn new(period: Period, interval: Interval, last_n: usize) -> Self {
        let mut end_dates = Vec::new();
        if interval == Interval::Once {
            end_dates.push(period.end);
        } else {
            let mut t = period.start;
            while t <= period.end {
                let end = end_of(t, interval).min(period.end);
                end_dates.push(end);
                if end == NaiveDate::MAX {
                    break;
                }
                t = succ(end);
            }
        }
        if last_n > 0 && end_dates.len() > last_n {
            end_dates.drain(..end_dates.len() - last_n);
        }
        let start_dates = if interval == Interval::Once {
            end_dates.iter().map(|_| period.start).collect()
        } else {
            end_dates
                .iter()
                .map(|e| start_of(*e, interval).max(period.start))
                .collect()
        };
        Partition {
            period,
            interval,
            start_dates,
            end_dates,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn end_dates(&self) -> &[NaiveDate] {
        &self.end_dates
    }

    pub fn start_dates(&self) -> &[NaiveDate] {
        &self.start_dates
    }

    pub fn size(&self) -> usize {
        self.end_dates.len()
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        self.period.contains(d)
    }

    /// The smallest end date not before `d`.
    pub fn map_to_end(&self, d: NaiveDate) -> Option<NaiveDate> {
        let i = self.end_dates.partition_point(|e| *e < d);
        self.end_dates.get(i).copied()
    }

    /// The first day of the partition period ending on or after `d`.
    pub fn map_to_start(&self, d: NaiveDate) -> Option<NaiveDate> {
        let i = self.end_dates.partition_point(|e| *e < d);
        self.start_dates.get(i).copied()
    }

    pub fn is_start(&self, d: NaiveDate) -> bool {
        self.start_dates.binary_search(&d).is_ok()
    }

    pub fn is_end(&self, d: NaiveDate) -> bool {
        self.end_dates.binary_search(&d).is_ok()
    }
}
