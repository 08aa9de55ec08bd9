use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

use crate::account::Account;
use crate::commodity::Commodity;

/// One side of a booking. Postings always come in canonical pairs, see
/// [`PostingBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Posting {
    pub account: Account,
    pub other: Account,
    pub commodity: Commodity,
    pub amount: Decimal,
    pub value: Decimal,
}

impl Ord for Posting {
    fn cmp(&self, other: &Self) -> Ordering {
        self.account
            .cmp(&other.account)
            .then_with(|| self.other.cmp(&other.other))
            .then_with(|| self.amount.cmp(&other.amount))
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.commodity.cmp(&other.commodity))
    }
}

impl PartialOrd for Posting {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.other, self.account, self.amount, self.commodity
        )
    }
}

/// Booking of `amount` of `commodity` from `credit` to `debit`.
#[derive(Clone, Debug)]
pub struct PostingBuilder {
    pub credit: Account,
    pub debit: Account,
    pub commodity: Commodity,
    pub amount: Decimal,
    pub value: Decimal,
}

impl PostingBuilder {
    pub fn new(credit: Account, debit: Account, commodity: Commodity, amount: Decimal) -> Self {
        PostingBuilder {
            credit,
            debit,
            commodity,
            amount,
            value: Decimal::ZERO,
        }
    }

    pub fn value(mut self, value: Decimal) -> Self {
        self.value = value;
        self
    }

    /// Materialises the canonical pair. Negative bookings are turned around
    /// so that the debit side always carries the non-negative amount.
    pub fn build(&self) -> [Posting; 2] {
        let (credit, debit, amount, value) = if self.amount < Decimal::ZERO
            || (self.amount.is_zero() && self.value < Decimal::ZERO)
        {
            (&self.debit, &self.credit, -self.amount, -self.value)
        } else {
            (&self.credit, &self.debit, self.amount, self.value)
        };
        [
            Posting {
                account: credit.clone(),
                other: debit.clone(),
                commodity: self.commodity.clone(),
                amount: -amount,
                value: -value,
            },
            Posting {
                account: debit.clone(),
                other: credit.clone(),
                commodity: self.commodity.clone(),
                amount,
                value,
            },
        ]
    }
}

/// Builds the canonical pairs of all builders, in order.
pub fn build_all(builders: &[PostingBuilder]) -> Vec<Posting> {
    builders.iter().flat_map(PostingBuilder::build).collect()
}
