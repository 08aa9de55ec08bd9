use anyhow::Result;
use tracing::info;

use libtally::directive::Assertion;
use libtally::process::{Checker, ExpandAccruals, Pipeline, Sort};
use libtally::{Ledger, Registry};

/// Validates the journal. With `write` set, returns an assertion of every
/// nonzero position at the end of each day.
pub fn check(registry: &Registry, mut ledger: Ledger, write: bool) -> Result<Vec<Assertion>> {
    let mut checker = Checker::new(registry, write);
    Pipeline::new()
        .add(ExpandAccruals)
        .add(Sort)
        .add(&mut checker)
        .run(&mut ledger)?;
    info!(days = ledger.len(), "journal is consistent");
    Ok(checker.into_assertions())
}
