use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Error, Result};

#[derive(Debug)]
struct CommodityData {
    id: usize,
    name: String,
    currency: AtomicBool,
}

/// Interned commodity handle, equality is identity.
#[derive(Clone)]
pub struct Commodity(Arc<CommodityData>);

impl Commodity {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_currency(&self) -> bool {
        self.0.currency.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn set_currency(&self, currency: bool) {
        self.0.currency.store(currency, AtomicOrdering::Relaxed)
    }
}

impl PartialEq for Commodity {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Commodity {}

impl Hash for Commodity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state)
    }
}

impl PartialOrd for Commodity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Commodity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(other.name())
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commodity({})", self.name())
    }
}

#[derive(Debug, Default)]
pub struct CommodityRegistry(RwLock<HashMap<String, Commodity>>);

impl CommodityRegistry {
    pub fn new() -> Self {
        Self(RwLock::new(HashMap::new()))
    }

    pub fn lookup(&self, name: &str) -> Option<Commodity> {
        let store = self.0.read().unwrap_or_else(PoisonError::into_inner);
        store.get(name).cloned()
    }

    pub fn get(&self, name: &str) -> Result<Commodity> {
        if let Some(commodity) = self.lookup(name) {
            return Ok(commodity);
        }
        if name.is_empty() || !name.chars().all(char::is_alphanumeric) {
            return Err(Error::InvalidCommodityName {
                name: name.to_string(),
            });
        }
        let mut store = self.0.write().unwrap_or_else(PoisonError::into_inner);
        let id = store.len();
        let commodity = store
            .entry(name.to_string())
            .or_insert_with(|| {
                Commodity(Arc::new(CommodityData {
                    id,
                    name: name.to_string(),
                    currency: AtomicBool::new(false),
                }))
            })
            .clone();
        Ok(commodity)
    }

    /// Marks the commodity as a currency, creating it if necessary.
    pub fn tag_currency(&self, name: &str) -> Result<Commodity> {
        let commodity = self.get(name)?;
        commodity.set_currency(true);
        Ok(commodity)
    }
}

#[cfg(test)]
mod tests {
    use crate::commodity::CommodityRegistry;
    use crate::error::Error;

    use anyhow::Result;

    #[test]
    fn intern_commodities() -> Result<()> {
        let cs = CommodityRegistry::new();
        let zwl = cs.get("ZWL")?;
        let usd = cs.get("USD")?;
        assert_eq!(zwl, cs.get("ZWL")?);
        assert_ne!(zwl, usd);
        assert_eq!(zwl.name(), "ZWL");
        assert!(usd < zwl);
        assert_eq!(cs.lookup("IDR"), None);
        Ok(())
    }

    #[test]
    fn reject_invalid_names() {
        let cs = CommodityRegistry::new();
        for name in ["", "US D", "USD.1", "€"] {
            assert!(
                matches!(cs.get(name), Err(Error::InvalidCommodityName { .. })),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn tag_currency_after_creation() -> Result<()> {
        let cs = CommodityRegistry::new();
        let jpy = cs.get("JPY")?;
        assert!(!jpy.is_currency());
        cs.tag_currency("JPY")?;
        assert!(jpy.is_currency());
        Ok(())
    }
}
