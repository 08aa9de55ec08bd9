use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

use libtally::account::{Mapping, Rule};
use libtally::commodity::Commodity;
use libtally::date::{Interval, Partition, Period};
use libtally::performance::Universe;
use libtally::Registry;

/// Everything a report run needs besides the journal itself.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub valuation: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub interval: Interval,
    pub last: usize,
    pub close: bool,
    pub diff: bool,
    pub sort_alphabetically: bool,
    pub accounts: Vec<String>,
    pub others: Vec<String>,
    pub commodities: Vec<String>,
    pub commodity_details: Vec<String>,
    pub mapping: Vec<String>,
    pub remap: Vec<String>,
    pub show_source: bool,
    pub show_commodities: bool,
    pub show_descriptions: bool,
    pub universe: Option<PathBuf>,
    pub currencies: Vec<String>,
}

fn regexes(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid regex `{p}'")))
        .collect()
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        serde_yaml::from_reader(file).with_context(|| format!("reading {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Config> {
        serde_yaml::from_str(yaml).context("reading configuration")
    }

    /// Tags the configured currencies and resolves the valuation commodity.
    pub fn valuation(&self, registry: &Registry) -> Result<Option<Commodity>> {
        for c in &self.currencies {
            registry.tag_currency(c)?;
        }
        Ok(self
            .valuation
            .as_deref()
            .map(|v| registry.commodity(v))
            .transpose()?)
    }

    /// The configured range clipped to `journal`, split by the interval.
    pub fn partition(&self, journal: Option<Period>) -> Result<Partition> {
        let journal = journal.ok_or_else(|| anyhow!("the journal has no prices or transactions"))?;
        let period = Period::new(
            self.from.unwrap_or(journal.start),
            self.to.unwrap_or(journal.end),
        );
        let period = period
            .clip(&journal)
            .ok_or_else(|| anyhow!("period {period} does not overlap the journal ({journal})"))?;
        Ok(Partition::new(period, self.interval, self.last))
    }

    pub fn accounts(&self) -> Result<Vec<Regex>> {
        regexes(&self.accounts)
    }

    pub fn others(&self) -> Result<Vec<Regex>> {
        regexes(&self.others)
    }

    pub fn commodities(&self) -> Result<Vec<Regex>> {
        regexes(&self.commodities)
    }

    pub fn commodity_details(&self) -> Result<Vec<Regex>> {
        regexes(&self.commodity_details)
    }

    pub fn remap(&self) -> Result<Vec<Regex>> {
        regexes(&self.remap)
    }

    pub fn mapping(&self) -> Result<Mapping> {
        let rules = self
            .mapping
            .iter()
            .map(|r| r.parse::<Rule>().map_err(|e| anyhow!(e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Mapping(rules))
    }

    /// The configured universe, or an empty one placing everything under
    /// `Other`.
    pub fn universe(&self, registry: &Registry) -> Result<Universe> {
        match &self.universe {
            Some(path) => {
                let file =
                    File::open(path).with_context(|| format!("opening {}", path.display()))?;
                Universe::from_reader(registry, file)
                    .with_context(|| format!("reading universe {}", path.display()))
            }
            None => Ok(Universe::default()),
        }
    }
}
