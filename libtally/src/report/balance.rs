use indexmap::IndexMap;
use regex::Regex;
use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::account::Account;
use crate::amounts::{identity, Amounts, Key, KeyMapper};
use crate::commodity::Commodity;
use crate::date::Partition;
use crate::performance::to_f64;
use crate::process::Collection;
use crate::registry::Registry;
use crate::report::commodity_if;
use crate::table::{Align, Table};

/// Account tree node holding the amounts booked on exactly this account.
#[derive(Debug)]
pub struct Node {
    account: Option<Account>,
    children: IndexMap<Account, Node>,
    pub amounts: Amounts,
    weight: f64,
}

impl Node {
    fn new(account: Option<Account>) -> Node {
        Node {
            account,
            children: IndexMap::new(),
            amounts: Amounts::new(),
            weight: 0.0,
        }
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn segment(&self) -> &str {
        self.account.as_ref().map_or("", |a| a.segment())
    }

    /// Children in their current sort order.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.values()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    fn leaf(&mut self, path: &[Account]) -> &mut Node {
        match path.split_first() {
            None => self,
            Some((head, tail)) => self
                .children
                .entry(head.clone())
                .or_insert_with(|| Node::new(Some(head.clone())))
                .leaf(tail),
        }
    }

    fn compute_weights(&mut self) -> f64 {
        let own = self.amounts.sum_over(|k| k.valuation.is_some()).abs();
        self.weight = to_f64(own)
            + self
                .children
                .values_mut()
                .map(Node::compute_weights)
                .sum::<f64>();
        self.weight
    }

    fn sort_by<F: Fn(&Node, &Node) -> Ordering>(&mut self, cmp: &F) {
        self.children.sort_by(|_, a, _, b| cmp(a, b));
        for child in self.children.values_mut() {
            child.sort_by(cmp);
        }
    }

    fn sum_into(&self, dest: &mut Amounts, mapper: &dyn Fn(&Key) -> Key) {
        for child in self.children.values() {
            child.sum_into(dest, mapper);
        }
        self.amounts.sum_into_by(dest, |_| true, mapper);
    }
}

/// Balance sheet and income statement as two account trees.
pub struct BalanceReport<'a> {
    registry: &'a Registry,
    pub al: Node,
    pub eie: Node,
}

impl<'a> BalanceReport<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        BalanceReport {
            registry,
            al: Node::new(None),
            eie: Node::new(None),
        }
    }

    /// Accumulates `amount` on the node of the key's account. Keys without
    /// an account are ignored.
    pub fn insert(&mut self, key: Key, amount: Decimal) {
        let Some(account) = &key.account else {
            return;
        };
        let path = self.registry.ancestors(account);
        let tree = if account.is_al() {
            &mut self.al
        } else {
            &mut self.eie
        };
        tree.leaf(&path).amounts.add(key, amount);
    }

    /// Orders siblings by descending absolute valuated amount.
    pub fn sort_weighted(&mut self) {
        self.al.compute_weights();
        self.eie.compute_weights();
        let cmp = |a: &Node, b: &Node| match (&a.account, &b.account) {
            (Some(x), Some(y)) => x
                .account_type()
                .cmp(&y.account_type())
                .then_with(|| b.weight.total_cmp(&a.weight))
                .then_with(|| x.name().cmp(y.name())),
            _ => Ordering::Equal,
        };
        self.al.sort_by(&cmp);
        self.eie.sort_by(&cmp);
    }

    pub fn sort_alpha(&mut self) {
        let cmp = |a: &Node, b: &Node| a.account.cmp(&b.account);
        self.al.sort_by(&cmp);
        self.eie.sort_by(&cmp);
    }

    /// Sums each tree under `mapper`, returning the AL and EIE totals.
    pub fn totals(&self, mapper: impl Fn(&Key) -> Key) -> (Amounts, Amounts) {
        let (mut al, mut eie) = (Amounts::new(), Amounts::new());
        self.al.sum_into(&mut al, &mapper);
        self.eie.sum_into(&mut eie, &mapper);
        (al, eie)
    }
}

impl Collection for BalanceReport<'_> {
    fn insert(&mut self, key: Key, amount: Decimal) {
        BalanceReport::insert(self, key, amount)
    }
}

/// Renders a [`BalanceReport`] whose keys carry partition end dates.
pub struct BalanceRenderer<'a> {
    pub partition: &'a Partition,
    pub valuation: Option<Commodity>,
    /// Accounts shown per commodity even when valuating.
    pub commodity_details: Vec<Regex>,
    pub sort_alphabetically: bool,
    /// Show the change per period instead of the running balance.
    pub diff: bool,
}

impl BalanceRenderer<'_> {
    fn commodity_column(&self) -> bool {
        self.valuation.is_none() || !self.commodity_details.is_empty()
    }

    pub fn render(&self, report: &mut BalanceReport) -> Table {
        if self.sort_alphabetically {
            report.sort_alpha();
        } else {
            report.sort_weighted();
        }
        let size = self.partition.size();
        let mut table = if self.commodity_column() {
            Table::new(&[1, 1, size])
        } else {
            Table::new(&[1, size])
        };
        table.add_separator();
        let mut header = table.add_row().text("Account", Align::Center);
        if self.commodity_column() {
            header = header.text("Comm", Align::Center);
        }
        for date in self.partition.end_dates() {
            header = header.text(date.to_string(), Align::Center);
        }
        drop(header);
        table.add_separator();

        let (total_al, total_eie) = report.totals(
            KeyMapper {
                date: Some(identity()),
                commodity: commodity_if(self.valuation.is_none()),
                ..KeyMapper::default()
            }
            .build(),
        );

        for node in report.al.children() {
            self.render_node(&mut table, 0, false, node);
            table.add_empty();
        }
        self.render_amounts(&mut table, 0, "Total (A+L)", false, &total_al);
        table.add_separator();
        for node in report.eie.children() {
            self.render_node(&mut table, 0, true, node);
            table.add_empty();
        }
        self.render_amounts(&mut table, 0, "Total (E+I+E)", true, &total_eie);
        table.add_separator();
        self.render_amounts(&mut table, 0, "Delta", false, &total_al.plus(&total_eie));
        table.add_separator();
        table
    }

    fn render_node(&self, table: &mut Table, indent: usize, neg: bool, node: &Node) {
        if let Some(account) = node.account() {
            let show = self.valuation.is_none()
                || self.commodity_details.iter().any(|r| r.is_match(account.name()));
            let values = node.amounts.sum_by(
                |_| true,
                KeyMapper {
                    date: Some(identity()),
                    commodity: commodity_if(show),
                    ..KeyMapper::default()
                }
                .build(),
            );
            self.render_amounts(table, indent, node.segment(), neg, &values);
        }
        for child in node.children() {
            self.render_node(table, indent + 2, neg, child);
        }
    }

    fn render_amounts(&self, table: &mut Table, indent: usize, name: &str, neg: bool, values: &Amounts) {
        if values.is_empty() {
            table.add_row().indented(name, indent);
            return;
        }
        let mut commodities: Vec<Option<Commodity>> =
            values.keys().map(|k| k.commodity.clone()).collect();
        commodities.sort();
        commodities.dedup();
        for (i, commodity) in commodities.iter().enumerate() {
            let mut row = table.add_row();
            row = if i == 0 {
                row.indented(name, indent)
            } else {
                row.empty()
            };
            if self.commodity_column() {
                row = match (commodity, &self.valuation) {
                    (Some(c), _) | (None, Some(c)) => row.text(c.name(), Align::Left),
                    (None, None) => row.empty(),
                };
            }
            let mut total = Decimal::ZERO;
            for date in self.partition.end_dates() {
                let key = Key {
                    date: Some(*date),
                    commodity: commodity.clone(),
                    ..Key::default()
                };
                let mut v = values.amount(&key);
                if !self.diff {
                    total += v;
                    v = total;
                }
                row = row.number(if neg { -v } else { v });
            }
        }
    }
}
