use anyhow::{bail, Result};
use tracing::info;

use libtally::performance::Calculator;
use libtally::process::{Balancer, ComputePrices, ExpandAccruals, Pipeline, Sort};
use libtally::report::{WeightsRenderer, WeightsReport};
use libtally::table::Table;
use libtally::{Ledger, Registry};

use crate::config::Config;

/// Portfolio weights by asset class at every end date of the partition.
pub fn weights(registry: &Registry, mut ledger: Ledger, config: &Config) -> Result<Table> {
    let Some(valuation) = config.valuation(registry)? else {
        bail!("computing weights requires a valuation commodity");
    };
    let partition = config.partition(ledger.period())?;
    let universe = config.universe(registry)?;
    let mapping = config.mapping()?;
    info!(period = %partition.period(), interval = %partition.interval(), %valuation, "weights");

    let mut report = WeightsReport::new(&partition);
    Pipeline::new()
        .add(ExpandAccruals)
        .add(Sort)
        .add(ComputePrices::new(Some(valuation.clone())))
        .add(Balancer::new(registry, Some(valuation.clone())))
        .add(
            Calculator::new(Some(valuation))
                .accounts(config.accounts()?)
                .commodities(config.commodities()?),
        )
        .add(&mut report)
        .run(&mut ledger)?;

    let renderer = WeightsRenderer {
        universe: &universe,
        mapping: &mapping,
        sort_alphabetically: config.sort_alphabetically,
    };
    Ok(renderer.render(&report))
}
