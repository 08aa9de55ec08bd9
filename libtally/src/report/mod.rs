//! Report sinks and their renderers.
//!
//! Reports collect amounts from a [`Query`](crate::process::Query) or from
//! the days themselves; renderers turn them into a [`Table`](crate::table::Table).

use crate::amounts::{identity, Mapper};
use crate::commodity::Commodity;

mod balance;
mod register;
mod returns;
mod weights;

pub use balance::{BalanceRenderer, BalanceReport, Node};
pub use register::{RegisterRenderer, RegisterReport};
pub use returns::ReturnsRenderer;
pub use weights::{WeightsRenderer, WeightsReport};

/// Keeps the commodity when `keep` is set, drops it otherwise.
pub fn commodity_if<'a>(keep: bool) -> Option<Mapper<'a, Commodity>> {
    if keep {
        Some(identity())
    } else {
        None
    }
}
