use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

use crate::account::Mapping;
use crate::commodity::Commodity;
use crate::date::Partition;
use crate::error::Result;
use crate::ledger::{Day, Ledger};
use crate::performance::Universe;
use crate::process::Processor;
use crate::table::{Align, Table};

/// Portfolio weight of every commodity at each partition end date, taken
/// from the values the performance calculator attached to the day.
pub struct WeightsReport<'a> {
    partition: &'a Partition,
    weights: BTreeMap<NaiveDate, BTreeMap<Commodity, f64>>,
}

impl<'a> WeightsReport<'a> {
    pub fn new(partition: &'a Partition) -> Self {
        WeightsReport {
            partition,
            weights: BTreeMap::new(),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&BTreeMap<Commodity, f64>> {
        self.weights.get(&date)
    }
}

impl Processor for WeightsReport<'_> {
    fn init(&mut self, ledger: &mut Ledger) -> Result<()> {
        for d in self.partition.end_dates() {
            ledger.day(*d);
        }
        Ok(())
    }

    fn process(&mut self, day: &mut Day) -> Result<()> {
        if !self.partition.is_end(day.date) {
            return Ok(());
        }
        let Some(perf) = &day.performance else {
            return Ok(());
        };
        let total: f64 = perf.v1.values().sum();
        let weights = self.weights.entry(day.date).or_default();
        if total == 0.0 {
            return Ok(());
        }
        for (commodity, v) in &perf.v1 {
            weights.insert(commodity.clone(), v / total);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ClassNode {
    segment: String,
    weights: BTreeMap<NaiveDate, f64>,
    children: IndexMap<String, ClassNode>,
}

impl ClassNode {
    /// Adds `w` to every node along `path`.
    fn add(&mut self, path: &[String], date: NaiveDate, w: f64) {
        *self.weights.entry(date).or_default() += w;
        if let Some((head, tail)) = path.split_first() {
            self.children
                .entry(head.clone())
                .or_insert_with(|| ClassNode {
                    segment: head.clone(),
                    ..ClassNode::default()
                })
                .add(tail, date, w);
        }
    }

    fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    fn sort(&mut self, alphabetically: bool) {
        if alphabetically {
            self.children.sort_keys();
        } else {
            self.children
                .sort_by(|_, a, _, b| b.total().total_cmp(&a.total()));
        }
        for child in self.children.values_mut() {
            child.sort(alphabetically);
        }
    }
}

/// Renders a [`WeightsReport`] as a tree of asset classes.
pub struct WeightsRenderer<'a> {
    pub universe: &'a Universe,
    /// Shortens class paths, matched against the `:`-joined path.
    pub mapping: &'a Mapping,
    pub sort_alphabetically: bool,
}

impl WeightsRenderer<'_> {
    fn locate(&self, commodity: &Commodity) -> Vec<String> {
        let mut path = self.universe.locate(commodity);
        if let Some(level) = self.mapping.level_of(&path.join(":")) {
            path.truncate(level);
        }
        path
    }

    pub fn render(&self, report: &WeightsReport) -> Table {
        let mut root = ClassNode::default();
        let mut dates = BTreeSet::new();
        for (date, weights) in &report.weights {
            dates.insert(*date);
            for (commodity, w) in weights {
                root.add(&self.locate(commodity), *date, *w);
            }
        }
        root.sort(self.sort_alphabetically);

        let mut table = Table::new(&[1, dates.len()]);
        table.add_separator();
        let mut header = table.add_row().text("Commodity", Align::Center);
        for date in &dates {
            header = header.text(date.to_string(), Align::Center);
        }
        drop(header);
        table.add_separator();
        for node in root.children.values() {
            render_node(&mut table, &dates, node, 0);
        }
        table.add_separator();
        table
    }
}

fn render_node(table: &mut Table, dates: &BTreeSet<NaiveDate>, node: &ClassNode, indent: usize) {
    let mut row = table.add_row().indented(node.segment.as_str(), indent);
    for date in dates {
        row = match node.weights.get(date) {
            Some(w) if *w != 0.0 => row.percent(*w),
            _ => row.empty(),
        };
    }
    drop(row);
    for child in node.children.values() {
        render_node(table, dates, child, indent + 2);
    }
}
