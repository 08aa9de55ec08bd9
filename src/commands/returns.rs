use anyhow::{bail, Result};
use tracing::info;

use libtally::performance::{Calculator, Returns};
use libtally::process::{Balancer, ComputePrices, ExpandAccruals, Pipeline, Sort};
use libtally::report::ReturnsRenderer;
use libtally::table::Table;
use libtally::{Ledger, Registry};

use crate::config::Config;

/// Modified Dietz returns of the portfolio per partition period.
pub fn returns(registry: &Registry, mut ledger: Ledger, config: &Config) -> Result<Table> {
    let Some(valuation) = config.valuation(registry)? else {
        bail!("computing returns requires a valuation commodity");
    };
    let partition = config.partition(ledger.period())?;
    info!(period = %partition.period(), interval = %partition.interval(), %valuation, "returns");

    let mut returns = Returns::new(&partition);
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
        .add(&mut returns)
        .run(&mut ledger)?;
    Ok(ReturnsRenderer.render(returns.returns()))
}
