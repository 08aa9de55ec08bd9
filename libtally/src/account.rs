use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountType {
    Assets,
    Liabilities,
    Equity,
    Income,
    Expenses,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Assets,
        AccountType::Liabilities,
        AccountType::Equity,
        AccountType::Income,
        AccountType::Expenses,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AccountType::Assets => "Assets",
            AccountType::Liabilities => "Liabilities",
            AccountType::Equity => "Equity",
            AccountType::Income => "Income",
            AccountType::Expenses => "Expenses",
        }
    }

    /// The type an account of this type maps to when remapped.
    pub fn swapped(self) -> AccountType {
        match self {
            AccountType::Assets => AccountType::Liabilities,
            AccountType::Liabilities => AccountType::Assets,
            AccountType::Income => AccountType::Expenses,
            AccountType::Expenses => AccountType::Income,
            AccountType::Equity => AccountType::Equity,
        }
    }

    pub fn is_al(self) -> bool {
        matches!(self, AccountType::Assets | AccountType::Liabilities)
    }

    pub fn is_ie(self) -> bool {
        matches!(self, AccountType::Income | AccountType::Expenses)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for AccountType {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::InvalidAccountName {
                name: s.to_string(),
                reason: "unknown account type",
            })
    }
}

#[derive(Debug)]
struct AccountData {
    id: usize,
    account_type: AccountType,
    name: String,
    segments: Vec<String>,
    parent: Option<usize>,
}

/// Interned account handle. Cloning is cheap and equality is identity.
#[derive(Clone)]
pub struct Account(Arc<AccountData>);

impl Account {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The last segment of the account name.
    pub fn segment(&self) -> &str {
        self.0
            .segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.0.segments
    }

    /// Segments after the root segment.
    pub fn tail(&self) -> &[String] {
        &self.0.segments[1..]
    }

    pub fn level(&self) -> usize {
        self.0.segments.len()
    }

    pub fn account_type(&self) -> AccountType {
        self.0.account_type
    }

    pub fn is_al(&self) -> bool {
        self.0.account_type.is_al()
    }

    pub fn is_ie(&self) -> bool {
        self.0.account_type.is_ie()
    }

    pub fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    pub(crate) fn id(&self) -> usize {
        self.0.id
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Account {}

impl Hash for Account {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state)
    }
}

impl PartialOrd for Account {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Account {
    fn cmp(&self, other: &Self) -> Ordering {
        self.account_type()
            .cmp(&other.account_type())
            .then_with(|| self.name().cmp(other.name()))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self.name())
    }
}

fn is_valid_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphanumeric)
}

#[derive(Default)]
struct AccountArena {
    index: HashMap<String, Account>,
    arena: Vec<Account>,
    children: HashMap<usize, Vec<Account>>,
    swaps: HashMap<usize, Account>,
}

impl AccountArena {
    /// Interns the account and all of its ancestors. Segments must be valid.
    fn intern(&mut self, account_type: AccountType, segments: &[&str]) -> Account {
        let mut parent: Option<Account> = None;
        for i in 0..segments.len() {
            let name = segments[..=i].join(":");
            let account = match self.index.get(&name) {
                Some(account) => account.clone(),
                None => {
                    let account = Account(Arc::new(AccountData {
                        id: self.arena.len(),
                        account_type,
                        name: name.clone(),
                        segments: segments[..=i].iter().map(|s| s.to_string()).collect(),
                        parent: parent.as_ref().map(Account::id),
                    }));
                    self.arena.push(account.clone());
                    if let Some(p) = &parent {
                        self.children.entry(p.id()).or_default().push(account.clone());
                    }
                    self.index.insert(name, account.clone());
                    account
                }
            };
            parent = Some(account);
        }
        // segments always holds at least the root
        parent.unwrap_or_else(|| self.arena[account_type as usize].clone())
    }
}

/// Thread-safe store of interned accounts.
///
/// Lookups take a read lock; a miss upgrades to the write lock and re-checks
/// before creating the account together with its missing ancestors.
pub struct AccountRegistry {
    arena: RwLock<AccountArena>,
}

impl Default for AccountRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountRegistry {
    pub fn new() -> Self {
        let mut arena = AccountArena::default();
        for t in AccountType::ALL {
            arena.intern(t, &[t.name()]);
        }
        AccountRegistry {
            arena: RwLock::new(arena),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AccountArena> {
        self.arena.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AccountArena> {
        self.arena.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the account with the given name, creating it and its ancestors
    /// if necessary.
    pub fn get(&self, name: &str) -> Result<Account> {
        if let Some(account) = self.lookup(name) {
            return Ok(account);
        }
        let segments: Vec<&str> = name.split(':').collect();
        let account_type = AccountType::try_from(segments[0]).map_err(|_| {
            Error::InvalidAccountName {
                name: name.to_string(),
                reason: "the root segment must be an account type",
            }
        })?;
        if !segments.iter().all(|s| is_valid_segment(s)) {
            return Err(Error::InvalidAccountName {
                name: name.to_string(),
                reason: "segments must be non-empty and alphanumeric",
            });
        }
        Ok(self.write().intern(account_type, &segments))
    }

    /// Returns the account if it has been created before.
    pub fn lookup(&self, name: &str) -> Option<Account> {
        self.read().index.get(name).cloned()
    }

    pub fn root(&self, account_type: AccountType) -> Account {
        self.read().arena[account_type as usize].clone()
    }

    pub fn parent(&self, account: &Account) -> Option<Account> {
        let arena = self.read();
        account.0.parent.map(|id| arena.arena[id].clone())
    }

    /// The chain of ancestors of the account, root first, including the
    /// account itself.
    pub fn ancestors(&self, account: &Account) -> Vec<Account> {
        let arena = self.read();
        let mut res = vec![account.clone()];
        let mut current = account.0.parent;
        while let Some(id) = current {
            let parent = &arena.arena[id];
            current = parent.0.parent;
            res.push(parent.clone());
        }
        res.reverse();
        res
    }

    pub fn children(&self, account: &Account) -> Vec<Account> {
        let mut res = self
            .read()
            .children
            .get(&account.id())
            .cloned()
            .unwrap_or_default();
        res.sort();
        res
    }

    /// Walks `n` levels up from the account. Returns `None` when walking past
    /// the root.
    pub fn nth_parent(&self, account: &Account, n: usize) -> Option<Account> {
        let arena = self.read();
        let mut current = account.clone();
        for _ in 0..n {
            let id = current.0.parent?;
            current = arena.arena[id].clone();
        }
        Some(current)
    }

    /// Returns the account with the same tail under the swapped root
    /// (Assets <-> Liabilities, Income <-> Expenses).
    pub fn swap_type(&self, account: &Account) -> Account {
        if let Some(swapped) = self.read().swaps.get(&account.id()) {
            return swapped.clone();
        }
        let swapped_type = account.account_type().swapped();
        let mut arena = self.write();
        let mut segments = vec![swapped_type.name()];
        segments.extend(account.tail().iter().map(String::as_str));
        let swapped = arena.intern(swapped_type, &segments);
        arena.swaps.insert(account.id(), swapped.clone());
        swapped
    }

    /// Shortens the account according to the mapping.
    pub fn shorten(&self, account: &Account, mapping: &Mapping) -> Account {
        match mapping.level(account) {
            Some(level) if level < account.level() => self
                .nth_parent(account, account.level() - level)
                .unwrap_or_else(|| self.root(account.account_type())),
            _ => account.clone(),
        }
    }

    /// Swaps the type of every account whose name matches one of the regexes.
    pub fn remap(&self, account: &Account, regexes: &[Regex]) -> Account {
        if regexes.iter().any(|r| r.is_match(account.name())) {
            self.swap_type(account)
        } else {
            account.clone()
        }
    }
}

/// Shortening rule: accounts matching `regex` (or all accounts, if there is
/// none) are cut to `level` segments.
#[derive(Clone, Debug)]
pub struct Rule {
    pub level: usize,
    pub regex: Option<Regex>,
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (level, regex) = match s.split_once(',') {
            Some((level, regex)) => (level, Some(regex)),
            None => (s, None),
        };
        let level = level
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid level in rule `{s}': {e}"))?;
        let regex = regex
            .map(Regex::new)
            .transpose()
            .map_err(|e| format!("invalid regex in rule `{s}': {e}"))?;
        Ok(Rule { level, regex })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.regex {
            Some(regex) => write!(f, "{},{}", self.level, regex),
            None => write!(f, "{}", self.level),
        }
    }
}

/// Ordered set of shortening rules, the first matching rule wins.
#[derive(Clone, Debug, Default)]
pub struct Mapping(pub Vec<Rule>);

impl Mapping {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn level(&self, account: &Account) -> Option<usize> {
        self.level_of(account.name())
    }

    pub fn level_of(&self, name: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|r| r.regex.as_ref().map_or(true, |re| re.is_match(name)))
            .map(|r| r.level)
    }
}
