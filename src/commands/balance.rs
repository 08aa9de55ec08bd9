use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use libtally::amounts::{
    and, filter_account, filter_commodity, filter_dates, filter_other, identity, KeyMapper,
};
use libtally::process::{Balancer, CloseAccounts, ComputePrices, ExpandAccruals, Pipeline, Query, Sort};
use libtally::report::{BalanceRenderer, BalanceReport};
use libtally::table::Table;
use libtally::{Ledger, Registry};

use crate::commands::account_mapper;
use crate::config::Config;

/// Balance sheet and income statement at every end date of the partition.
pub fn balance(registry: &Registry, mut ledger: Ledger, config: &Config) -> Result<Table> {
    let valuation = config.valuation(registry)?;
    let partition = config.partition(ledger.period())?;
    info!(period = %partition.period(), interval = %partition.interval(), "balance");

    let mut report = BalanceReport::new(registry);
    let mapper = KeyMapper {
        date: Some(Box::new(|d: &Option<NaiveDate>| {
            d.and_then(|d| partition.map_to_end(d))
        })),
        account: Some(account_mapper(registry, config.remap()?, config.mapping()?)),
        commodity: Some(identity()),
        valuation: Some(identity()),
        ..KeyMapper::default()
    };
    let end = partition.period().end;
    let filter = and(vec![
        filter_dates(move |d| d <= end),
        filter_account(config.accounts()?),
        filter_other(config.others()?),
        filter_commodity(config.commodities()?),
    ]);
    Pipeline::new()
        .add(ExpandAccruals)
        .add(Sort)
        .add(ComputePrices::new(valuation.clone()))
        .add(Balancer::new(registry, valuation.clone()))
        .add_if(config.close, CloseAccounts::new(registry, &partition)?)
        .add(
            Query::new(&mut report, valuation.clone())
                .mapper(mapper.build())
                .filter(filter),
        )
        .run(&mut ledger)?;

    let renderer = BalanceRenderer {
        partition: &partition,
        valuation,
        commodity_details: config.commodity_details()?,
        sort_alphabetically: config.sort_alphabetically,
        diff: config.diff,
    };
    Ok(renderer.render(&mut report))
}
