use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use libtally::amounts::{and, filter_account, filter_commodity, filter_other, identity, KeyMapper};
use libtally::process::{Balancer, ComputePrices, ExpandAccruals, Filter, Pipeline, Query, Sort};
use libtally::report::{commodity_if, RegisterRenderer, RegisterReport};
use libtally::table::Table;
use libtally::{Ledger, Registry};

use crate::commands::{account_mapper, remap_mapper};
use crate::config::Config;

/// Postings per partition period, by counter account.
pub fn register(registry: &Registry, mut ledger: Ledger, config: &Config) -> Result<Table> {
    let valuation = config.valuation(registry)?;
    let partition = config.partition(ledger.period())?;
    info!(period = %partition.period(), interval = %partition.interval(), "register");

    let show_commodities = config.show_commodities || valuation.is_none();
    let remap = config.remap()?;
    let mut report = RegisterReport::new();
    let mapper = KeyMapper {
        date: Some(Box::new(|d: &Option<NaiveDate>| {
            d.and_then(|d| partition.map_to_end(d))
        })),
        account: config.show_source.then(|| remap_mapper(registry, remap.clone())),
        other: Some(account_mapper(registry, remap, config.mapping()?)),
        commodity: commodity_if(show_commodities),
        valuation: commodity_if(valuation.is_some()),
        description: config.show_descriptions.then(identity::<String>),
        ..KeyMapper::default()
    };
    let filter = and(vec![
        filter_account(config.accounts()?),
        filter_other(config.others()?),
        filter_commodity(config.commodities()?),
    ]);
    Pipeline::new()
        .add(ExpandAccruals)
        .add(Sort)
        .add(ComputePrices::new(valuation.clone()))
        .add(Balancer::new(registry, valuation.clone()))
        .add(Filter::new(&partition))
        .add(
            Query::new(&mut report, valuation)
                .mapper(mapper.build())
                .filter(filter),
        )
        .run(&mut ledger)?;

    let renderer = RegisterRenderer {
        show_source: config.show_source,
        show_commodities,
        show_descriptions: config.show_descriptions,
    };
    Ok(renderer.render(&report))
}
