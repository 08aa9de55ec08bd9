//! Tally - A plain text double-entry accounting engine
//! ---
//!
//! libtally takes an already parsed journal (openings, prices, transactions,
//! balance assertions and closings), files it into a [`Ledger`] of days, and
//! pushes the days through a [`Pipeline`](process::Pipeline) of processors
//! that check the double-entry invariants, valuate every posting in a
//! reference commodity, expand accruals, and feed the reports.
//!

/// Accounts and their names, e.g. `Assets:Bank:Jawir`.
///
/// The main structure is [`AccountRegistry`][account::AccountRegistry], which
/// validates and interns accounts, and knows about their parents and children.
pub mod account;

/// Aggregation keys and the insertion ordered amount tables built on them.
pub mod amounts;

pub mod commodity;

/// Intervals, periods and partitions of a period into intervals.
pub mod date;

/// Journal directives other than transactions, plus where they came from.
pub mod directive;

mod error;

/// Ledger representation, directives grouped by day.
pub mod ledger;

pub mod performance;
pub mod posting;
pub mod price;

/// Processors that run over the days of a ledger.
pub mod process;

pub mod registry;
pub mod report;
pub mod table;
pub mod transaction;

pub use error::{Error, Result};
pub use ledger::{Day, Ledger};
pub use registry::Registry;
