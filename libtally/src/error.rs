use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

use crate::account::Account;
use crate::commodity::Commodity;
use crate::directive::{Assertion, Balance, Close, Directive, Open, Price, Source};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Directives that may carry a source location.
trait Located: fmt::Display {
    fn location(&self) -> Option<&Source>;
}

macro_rules! located {
    ($($t:ty),*) => {
        $(
            impl Located for $t {
                fn location(&self) -> Option<&Source> {
                    self.src.as_deref()
                }
            }
        )*
    };
}

located!(Open, Close, Price, Assertion);

impl Located for Directive {
    fn location(&self) -> Option<&Source> {
        self.src()
    }
}

impl<T: Located + ?Sized> Located for Box<T> {
    fn location(&self) -> Option<&Source> {
        (**self).location()
    }
}

/// Prints the source location of a directive, or the directive itself when
/// it has none.
struct Context<'a, D: ?Sized>(&'a D);

impl<D: Located + ?Sized> fmt::Display for Context<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.location() {
            Some(src) => write!(f, "\n{src}"),
            None => {
                for line in self.0.to_string().lines() {
                    write!(f, "\n  {line}")?;
                }
                Ok(())
            }
        }
    }
}

fn context<D: Located + ?Sized>(d: &D) -> Context<'_, D> {
    Context(d)
}

fn optional_context(d: &Option<Box<Directive>>) -> String {
    d.as_ref().map(|d| context(d).to_string()).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid account name `{name}': {reason}")]
    InvalidAccountName { name: String, reason: &'static str },

    #[error("invalid commodity name `{name}'")]
    InvalidCommodityName { name: String },

    #[error("account {} is already open{}", .open.account, context(.open))]
    AccountAlreadyOpen { open: Open },

    #[error("account {account} is not open{}", context(.directive))]
    AccountNotOpen {
        directive: Box<Directive>,
        account: Account,
    },

    #[error(
        "account {} has nonzero position {quantity} {commodity}{}",
        .close.account,
        context(.close)
    )]
    AccountHasNonzeroPosition {
        close: Close,
        commodity: Commodity,
        quantity: Decimal,
    },

    #[error(
        "assertion failed: account {} has {actual} {}, expected {}{}",
        .balance.account,
        .balance.commodity,
        .balance.quantity,
        context(.assertion)
    )]
    AssertionFailed {
        assertion: Box<Assertion>,
        balance: Balance,
        actual: Decimal,
    },

    #[error("no price found for commodity {commodity} on {date}{}", optional_context(.directive))]
    NoPriceFound {
        date: NaiveDate,
        commodity: Commodity,
        directive: Option<Box<Directive>>,
    },

    #[error(
        "invalid price for {} in {}: price must not be zero{}",
        .price.commodity,
        .price.target,
        context(.price)
    )]
    InvalidPrice { price: Price },

    #[error("{message}\n{location}")]
    Parse { location: Source, message: String },

    #[error("invalid universe: {0}")]
    Universe(String),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
