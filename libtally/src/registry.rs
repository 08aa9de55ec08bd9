use crate::account::{Account, AccountRegistry, AccountType};
use crate::commodity::{Commodity, CommodityRegistry};
use crate::error::Result;

/// Process-wide store of accounts and commodities.
///
/// The registry is `Send + Sync` and may be shared across threads; all
/// handles it returns stay valid for its whole lifetime.
#[derive(Default)]
pub struct Registry {
    accounts: AccountRegistry,
    commodities: CommodityRegistry,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            accounts: AccountRegistry::new(),
            commodities: CommodityRegistry::new(),
        }
    }

    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    pub fn commodities(&self) -> &CommodityRegistry {
        &self.commodities
    }

    pub fn account(&self, name: &str) -> Result<Account> {
        self.accounts.get(name)
    }

    pub fn commodity(&self, name: &str) -> Result<Commodity> {
        self.commodities.get(name)
    }

    pub fn tag_currency(&self, name: &str) -> Result<Commodity> {
        self.commodities.tag_currency(name)
    }

    /// `Expenses:TBD`, the catch-all for unassigned bookings.
    pub fn tbd_account(&self) -> Account {
        self.accounts
            .get("Expenses:TBD")
            .unwrap_or_else(|_| self.accounts.root(AccountType::Expenses))
    }

    /// The income account valuation gains of `account` are booked against.
    pub fn valuation_account_for(&self, account: &Account) -> Account {
        let mut name = AccountType::Income.name().to_string();
        for segment in account.tail() {
            name.push(':');
            name.push_str(segment);
        }
        self.accounts
            .get(&name)
            .unwrap_or_else(|_| self.accounts.root(AccountType::Income))
    }

    pub fn parent(&self, account: &Account) -> Option<Account> {
        self.accounts.parent(account)
    }

    pub fn ancestors(&self, account: &Account) -> Vec<Account> {
        self.accounts.ancestors(account)
    }

    pub fn children(&self, account: &Account) -> Vec<Account> {
        self.accounts.children(account)
    }

    pub fn nth_parent(&self, account: &Account, n: usize) -> Option<Account> {
        self.accounts.nth_parent(account, n)
    }

    pub fn swap_type(&self, account: &Account) -> Account {
        self.accounts.swap_type(account)
    }
}
