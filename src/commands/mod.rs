use regex::Regex;

use libtally::account::{Account, Mapping};
use libtally::amounts::{present, Mapper};
use libtally::Registry;

mod balance;
mod check;
mod register;
mod returns;
mod weights;

pub use balance::balance;
pub use check::check;
pub use register::register;
pub use returns::returns;
pub use weights::weights;

/// Swaps the type of accounts matching `remap`, then shortens them.
fn account_mapper<'a>(
    registry: &'a Registry,
    remap: Vec<Regex>,
    mapping: Mapping,
) -> Mapper<'a, Account> {
    present(move |a: &Account| {
        let accounts = registry.accounts();
        accounts.shorten(&accounts.remap(a, &remap), &mapping)
    })
}

/// Swaps the type of accounts matching `remap`, keeping their depth.
fn remap_mapper<'a>(registry: &'a Registry, remap: Vec<Regex>) -> Mapper<'a, Account> {
    present(move |a: &Account| registry.accounts().remap(a, &remap))
}
