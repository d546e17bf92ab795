//! Villagers, the enchantments they sell, and the enchantments we need

use crate::cover::MAX_ITEMS;
use anyhow::Result;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// A trading villager and its enchantment offers (price in emeralds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Villager {
    pub name: String,
    pub enchantments: BTreeMap<String, u32>,
}

impl Villager {
    pub fn new<S, I, E>(name: S, offers: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (E, u32)>,
        E: Into<String>,
    {
        Self {
            name: name.into(),
            enchantments: offers
                .into_iter()
                .map(|(enchantment, price)| (enchantment.into(), price))
                .collect(),
        }
    }

    /// Price of an enchantment, if this villager sells it
    pub fn price(&self, enchantment: &str) -> Option<u32> {
        self.enchantments.get(enchantment).copied()
    }

    pub fn offers(&self, enchantment: &str) -> bool {
        self.enchantments.contains_key(enchantment)
    }
}

/// Which offers count as available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OfferPolicy {
    pub max_price: Option<u32>,
}

impl OfferPolicy {
    pub fn new(max_price: Option<u32>) -> Self {
        Self { max_price }
    }

    /// An offer is usable when it exists and is within the price cap
    pub fn is_usable(&self, villager: &Villager, enchantment: &str) -> bool {
        match (villager.price(enchantment), self.max_price) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(price), Some(cap)) => price <= cap,
        }
    }
}

/// Holders of one required enchantment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageEntry {
    pub enchantment: String,
    /// `(villager, price)` sorted by villager name; empty when nobody sells it
    pub holders: Vec<(String, u32)>,
}

impl CoverageEntry {
    pub fn is_missing(&self) -> bool {
        self.holders.is_empty()
    }
}

/// All villagers plus the enchantments that must be obtainable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub villagers: Vec<Villager>,
    pub required: Vec<String>,
}

impl Catalog {
    /// Create a catalog; villagers are kept in name order
    pub fn new(mut villagers: Vec<Villager>, required: Vec<String>) -> Self {
        villagers.sort_by(|a, b| a.name.cmp(&b.name));
        Self { villagers, required }
    }

    /// Reject catalogs the optimizer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.required.is_empty() {
            anyhow::bail!("No required enchantments listed");
        }

        if self.required.len() > MAX_ITEMS {
            anyhow::bail!(
                "{} required enchantments listed, at most {} are supported",
                self.required.len(),
                MAX_ITEMS
            );
        }

        let mut seen = HashSet::new();
        for enchantment in &self.required {
            if enchantment.trim().is_empty() {
                anyhow::bail!("Required enchantment names cannot be empty");
            }
            if !seen.insert(enchantment.as_str()) {
                anyhow::bail!("Duplicate required enchantment: {}", enchantment);
            }
        }

        let mut names = HashSet::new();
        for villager in &self.villagers {
            if villager.name.trim().is_empty() {
                anyhow::bail!("Villager names cannot be empty");
            }
            if !names.insert(villager.name.as_str()) {
                anyhow::bail!("Duplicate villager: {}", villager.name);
            }
            if villager.enchantments.keys().any(|e| e.trim().is_empty()) {
                anyhow::bail!("Villager {} has an enchantment with an empty name", villager.name);
            }
        }

        Ok(())
    }

    pub fn villager(&self, name: &str) -> Option<&Villager> {
        self.villagers.iter().find(|v| v.name == name)
    }

    pub fn villager_names(&self) -> Vec<&str> {
        self.villagers.iter().map(|v| v.name.as_str()).collect()
    }

    /// Every enchantment any villager sells, required or not
    pub fn offered_enchantments(&self) -> BTreeSet<&str> {
        self.villagers
            .iter()
            .flat_map(|v| v.enchantments.keys().map(String::as_str))
            .collect()
    }

    /// Required enchantments nobody sells, sorted
    pub fn missing_enchantments(&self) -> Vec<&str> {
        let offered = self.offered_enchantments();
        self.required
            .iter()
            .map(String::as_str)
            .filter(|e| !offered.contains(e))
            .sorted()
            .collect()
    }

    /// Holders of each required enchantment, sorted by enchantment name
    pub fn coverage(&self) -> Vec<CoverageEntry> {
        self.required
            .iter()
            .sorted()
            .map(|enchantment| CoverageEntry {
                enchantment: enchantment.clone(),
                holders: self
                    .villagers
                    .iter()
                    .filter_map(|v| v.price(enchantment).map(|price| (v.name.clone(), price)))
                    .collect(),
            })
            .collect()
    }
}
