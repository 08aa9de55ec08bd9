use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use libtally::directive::{Open, Price};
use libtally::posting::PostingBuilder;
use libtally::table::{Cell, Row, Table};
use libtally::transaction::Transaction;
use libtally::{Ledger, Registry};
use tally::{commands, init_tracing, Config};

fn date(m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2020, m, d).ok_or(anyhow!("invalid date"))
}

/// A monthly salary paid into the bank and a USD position gaining 10% in
/// February.
fn journal(reg: &Registry) -> Result<Ledger> {
    let mut ledger = Ledger::new();
    for name in ["Assets:Bank", "Assets:Broker", "Income:Salary", "Equity:Equity"] {
        ledger.add(Open {
            date: date(1, 1)?,
            account: reg.account(name)?,
            src: None,
        });
    }
    for (m, d, p) in [(1, 1, dec!(1)), (2, 29, dec!(1.1))] {
        ledger.add(Price {
            date: date(m, d)?,
            commodity: reg.commodity("USD")?,
            target: reg.commodity("CHF")?,
            price: p,
            src: None,
        });
    }
    for m in [1, 2] {
        ledger.add(
            Transaction::builder(date(m, 25)?, "Salary")
                .posting(PostingBuilder::new(
                    reg.account("Income:Salary")?,
                    reg.account("Assets:Bank")?,
                    reg.commodity("CHF")?,
                    dec!(1000),
                ))
                .build(),
        );
    }
    ledger.add(
        Transaction::builder(date(1, 26)?, "Transfer")
            .posting(PostingBuilder::new(
                reg.account("Equity:Equity")?,
                reg.account("Assets:Broker")?,
                reg.commodity("USD")?,
                dec!(100),
            ))
            .build(),
    );
    Ok(ledger)
}

fn row<'a>(table: &'a Table, name: &str) -> Option<&'a Row> {
    table.rows().iter().find(|r| {
        matches!(r.cells().first(), Some(Cell::Text { content, .. }) if content == name)
    })
}

fn numbers(row: &Row) -> Vec<Decimal> {
    row.cells()
        .iter()
        .filter_map(|c| match c {
            Cell::Number(n) => Some(*n),
            _ => None,
        })
        .collect()
}

#[test]
fn balance_valuated() -> Result<()> {
    init_tracing();
    let reg = Registry::new();
    let config = Config::from_yaml("valuation: CHF\ninterval: monthly\n")?;
    let table = commands::balance(&reg, journal(&reg)?, &config)?;

    let bank = row(&table, "Bank").ok_or(anyhow!("no bank row"))?;
    assert_eq!(numbers(bank), vec![dec!(1000), dec!(2000)]);
    let broker = row(&table, "Broker").ok_or(anyhow!("no broker row"))?;
    assert_eq!(numbers(broker), vec![dec!(100), dec!(110)]);
    let salary = row(&table, "Salary").ok_or(anyhow!("no salary row"))?;
    assert_eq!(numbers(salary), vec![dec!(1000), dec!(2000)]);
    let delta = row(&table, "Delta").ok_or(anyhow!("no delta row"))?;
    assert_eq!(numbers(delta), vec![Decimal::ZERO, Decimal::ZERO]);
    Ok(())
}

#[test]
fn balance_closes_income() -> Result<()> {
    let reg = Registry::new();
    let config = Config::from_yaml("valuation: CHF\ninterval: monthly\nto: 2020-02-29\nclose: true\ndiff: true\n")?;
    let table = commands::balance(&reg, journal(&reg)?, &config)?;
    let salary = row(&table, "Salary").ok_or(anyhow!("no salary row"))?;
    assert_eq!(numbers(salary), vec![dec!(1000), Decimal::ZERO]);
    Ok(())
}

#[test]
fn balance_ignores_postings_after_period() -> Result<()> {
    let reg = Registry::new();
    let config = Config::from_yaml("valuation: CHF\ninterval: monthly\nto: 2020-01-25\n")?;
    let table = commands::balance(&reg, journal(&reg)?, &config)?;
    let bank = row(&table, "Bank").ok_or(anyhow!("no bank row"))?;
    assert_eq!(numbers(bank), vec![dec!(1000)]);
    assert!(row(&table, "Broker").is_none());
    let total = row(&table, "Total (A+L)").ok_or(anyhow!("no total row"))?;
    assert_eq!(numbers(total), vec![dec!(1000)]);
    Ok(())
}

#[test]
fn register_by_month() -> Result<()> {
    let reg = Registry::new();
    let config = Config::from_yaml("interval: monthly\naccounts: [\"^Assets:Bank$\"]\n")?;
    let table = commands::register(&reg, journal(&reg)?, &config)?;
    let data: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| matches!(r.cells().get(1), Some(Cell::Text { content, .. }) if content == "Income:Salary"))
        .collect();
    assert_eq!(data.len(), 2);
    assert_eq!(numbers(data[0]), vec![dec!(-1000)]);

    let config = Config::from_yaml("interval: monthly\nshow_source: true\nothers: [\"^Equity\"]\n")?;
    let table = commands::register(&reg, journal(&reg)?, &config)?;
    let broker: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| matches!(r.cells().get(1), Some(Cell::Text { content, .. }) if content == "Assets:Broker"))
        .collect();
    assert_eq!(broker.len(), 1);
    assert_eq!(broker[0].cells()[2], Cell::text("Equity:Equity"));
    assert_eq!(numbers(broker[0]), vec![dec!(-100)]);
    Ok(())
}

#[test]
fn returns_and_weights() -> Result<()> {
    let reg = Registry::new();
    let config = Config::from_yaml(
        "valuation: CHF\ninterval: monthly\nto: 2020-02-29\naccounts: [\"^Assets:Broker$\"]\ncurrencies: [CHF, USD]\n",
    )?;
    let table = commands::returns(&reg, journal(&reg)?, &config)?;
    let feb = row(&table, "2020-02-29").ok_or(anyhow!("no february row"))?;
    match feb.cells().get(1) {
        Some(Cell::Percent(r)) => assert!((r - 0.1).abs() < 1e-9),
        other => return Err(anyhow!("unexpected cell {other:?}")),
    }

    let table = commands::weights(&reg, journal(&reg)?, &config)?;
    let usd = row(&table, "USD").ok_or(anyhow!("no usd row"))?;
    assert_eq!(&usd.cells()[1..], &[Cell::Percent(1.0), Cell::Percent(1.0)]);
    assert!(commands::returns(&reg, journal(&reg)?, &Config::default()).is_err());
    Ok(())
}

#[test]
fn check_writes_assertions() -> Result<()> {
    let reg = Registry::new();
    let assertions = commands::check(&reg, journal(&reg)?, true)?;
    let last = assertions.last().ok_or(anyhow!("no assertions"))?;
    assert_eq!(last.date, date(2, 29)?);
    let text = last.to_string();
    assert!(text.starts_with("2020-02-29 balance\n"));
    assert!(text.contains("\nAssets:Bank 2000 CHF"));
    assert!(text.contains("\nAssets:Broker 100 USD"));
    assert!(text.contains("\nIncome:Salary -2000 CHF"));
    assert!(commands::check(&reg, journal(&reg)?, false)?.is_empty());
    Ok(())
}
