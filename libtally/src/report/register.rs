use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::amounts::{Amounts, Key};
use crate::process::Collection;
use crate::table::{Align, Table};

/// Amounts bucketed by date.
#[derive(Debug, Default)]
pub struct RegisterReport {
    nodes: BTreeMap<NaiveDate, Amounts>,
}

impl RegisterReport {
    pub fn new() -> Self {
        RegisterReport::default()
    }

    /// Keys without a date are ignored.
    pub fn insert(&mut self, key: Key, amount: Decimal) {
        if let Some(date) = key.date {
            self.nodes.entry(date).or_default().add(key, amount);
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.nodes.keys()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Amounts> {
        self.nodes.get(&date)
    }
}

impl Collection for RegisterReport {
    fn insert(&mut self, key: Key, amount: Decimal) {
        RegisterReport::insert(self, key, amount)
    }
}

#[derive(Debug, Default)]
pub struct RegisterRenderer {
    /// Adds a `Source` column with the booked account.
    pub show_source: bool,
    pub show_commodities: bool,
    pub show_descriptions: bool,
}

impl RegisterRenderer {
    pub fn render(&self, report: &RegisterReport) -> Table {
        let mut groups = vec![1, 1, 1];
        if self.show_source {
            groups.push(1);
        }
        if self.show_commodities {
            groups.push(1);
        }
        if self.show_descriptions {
            groups.push(1);
        }
        let mut table = Table::new(&groups);
        table.add_separator();
        let mut header = table.add_row().text("Date", Align::Center);
        if self.show_source {
            header = header.text("Source", Align::Center);
        }
        header = header.text("Account", Align::Center);
        if self.show_commodities {
            header = header.text("Comm", Align::Center);
        }
        header = header.text("Amount", Align::Center);
        if self.show_descriptions {
            header = header.text("Desc", Align::Center);
        }
        drop(header);
        table.add_separator();

        for (date, amounts) in &report.nodes {
            let index = amounts.index(|a, b| {
                let mut ord = a.other.cmp(&b.other);
                if self.show_source {
                    ord = a.account.cmp(&b.account).then(ord);
                }
                if self.show_commodities {
                    ord.then_with(|| a.commodity.cmp(&b.commodity))
                } else {
                    ord
                }
            });
            for (i, key) in index.iter().enumerate() {
                let mut row = table.add_row();
                row = if i == 0 {
                    row.text(date.to_string(), Align::Left)
                } else {
                    row.empty()
                };
                if self.show_source {
                    row = row.text(key.account.as_ref().map_or("", |a| a.name()), Align::Left);
                }
                row = row.text(key.other.as_ref().map_or("", |a| a.name()), Align::Left);
                if self.show_commodities {
                    row = row.text(key.commodity.as_ref().map_or("", |c| c.name()), Align::Left);
                }
                row = row.number(-amounts.amount(key));
                if self.show_descriptions {
                    row.text(key.description.as_deref().unwrap_or_default(), Align::Left);
                }
            }
            table.add_separator();
        }
        table
    }
}
