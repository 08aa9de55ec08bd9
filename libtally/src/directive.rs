use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::account::Account;
use crate::commodity::Commodity;
use crate::transaction::Transaction;

/// Location of a directive in the journal it was parsed from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Source {
    pub path: Option<PathBuf>,
    pub line: usize,
    pub column: usize,
    pub text: String,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "at {}:{}:{}", path.display(), self.line, self.column)?,
            None => write!(f, "at line {}, column {}", self.line, self.column)?,
        }
        for line in self.text.lines() {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Open {
    pub date: NaiveDate,
    pub account: Account,
    pub src: Option<Arc<Source>>,
}

impl fmt::Display for Open {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} open {}", self.date, self.account)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Close {
    pub date: NaiveDate,
    pub account: Account,
    pub src: Option<Arc<Source>>,
}

impl fmt::Display for Close {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} close {}", self.date, self.account)
    }
}

/// `price` units of `target` per unit of `commodity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Price {
    pub date: NaiveDate,
    pub commodity: Commodity,
    pub target: Commodity,
    pub price: Decimal,
    pub src: Option<Arc<Source>>,
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} price {} {} {}",
            self.date, self.commodity, self.price, self.target
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Balance {
    pub account: Account,
    pub commodity: Commodity,
    pub quantity: Decimal,
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.account, self.quantity, self.commodity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assertion {
    pub date: NaiveDate,
    pub balances: Vec<Balance>,
    pub src: Option<Arc<Source>>,
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.balances.as_slice() {
            [single] => write!(f, "{} balance {}", self.date, single),
            balances => {
                write!(f, "{} balance", self.date)?;
                for b in balances {
                    write!(f, "\n{b}")?;
                }
                Ok(())
            }
        }
    }
}

/// A parsed journal directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    Open(Open),
    Price(Price),
    Transaction(Transaction),
    Assertion(Assertion),
    Close(Close),
}

impl Directive {
    pub fn date(&self) -> NaiveDate {
        match self {
            Directive::Open(o) => o.date,
            Directive::Price(p) => p.date,
            Directive::Transaction(t) => t.date,
            Directive::Assertion(a) => a.date,
            Directive::Close(c) => c.date,
        }
    }

    pub fn src(&self) -> Option<&Source> {
        match self {
            Directive::Open(o) => o.src.as_deref(),
            Directive::Price(p) => p.src.as_deref(),
            Directive::Transaction(t) => t.src.as_deref(),
            Directive::Assertion(a) => a.src.as_deref(),
            Directive::Close(c) => c.src.as_deref(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Open(o) => fmt::Display::fmt(o, f),
            Directive::Price(p) => fmt::Display::fmt(p, f),
            Directive::Transaction(t) => fmt::Display::fmt(t, f),
            Directive::Assertion(a) => fmt::Display::fmt(a, f),
            Directive::Close(c) => fmt::Display::fmt(c, f),
        }
    }
}

macro_rules! directive_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Directive {
                fn from(d: $variant) -> Self {
                    Directive::$variant(d)
                }
            }
        )*
    };
}

directive_from!(Open, Price, Transaction, Assertion, Close);

#[cfg(test)]
mod tests {
    use crate::directive::{Assertion, Balance, Close, Directive, Open, Price, Source};
    use crate::registry::Registry;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn print_directives() -> Result<()> {
        let reg = Registry::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let bank = reg.account("Assets:Bank")?;
        let chf = reg.commodity("CHF")?;

        let open = Directive::from(Open {
            date,
            account: bank.clone(),
            src: None,
        });
        assert_eq!(open.to_string(), "2020-01-01 open Assets:Bank");

        let price = Directive::from(Price {
            date,
            commodity: reg.commodity("USD")?,
            target: chf.clone(),
            price: dec!(0.9),
            src: None,
        });
        assert_eq!(price.to_string(), "2020-01-01 price USD 0.9 CHF");

        let assertion = Directive::from(Assertion {
            date,
            balances: vec![Balance {
                account: bank.clone(),
                commodity: chf.clone(),
                quantity: dec!(1000),
            }],
            src: None,
        });
        assert_eq!(assertion.to_string(), "2020-01-01 balance Assets:Bank 1000 CHF");

        let close = Directive::from(Close {
            date,
            account: bank,
            src: None,
        });
        assert_eq!(close.to_string(), "2020-01-01 close Assets:Bank");
        assert_eq!(close.date(), date);
        Ok(())
    }

    #[test]
    fn print_source() -> Result<()> {
        let reg = Registry::new();
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).ok_or(anyhow!("invalid date"))?;
        let src = Arc::new(Source {
            path: Some("journal.ledger".into()),
            line: 12,
            column: 1,
            text: "2020-01-01 open Assets:Bank".to_string(),
        });
        let open = Directive::from(Open {
            date,
            account: reg.account("Assets:Bank")?,
            src: Some(src),
        });
        assert_eq!(
            open.src().map(ToString::to_string),
            Some("at journal.ledger:12:1\n  2020-01-01 open Assets:Bank".to_string())
        );
        Ok(())
    }
}
