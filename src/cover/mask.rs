//! Bit-encoding of items and providers

use super::error::{CoverError, Result};
use itertools::Itertools;
use std::collections::HashMap;

/// Bitmask over the item universe; bit `i` is the item at position `i`.
pub type Mask = u64;

/// Largest universe a single [`Mask`] can represent.
pub const MAX_ITEMS: usize = Mask::BITS as usize;

/// Stable assignment of item names to bit positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemIndex {
    items: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ItemIndex {
    /// Build an index over `universe` in canonical order.
    ///
    /// Names are ordered case-insensitively, with the exact name as the
    /// tie-break, so the same set of names always gets the same bits no
    /// matter what order it arrives in.
    pub fn new<S: AsRef<str>>(universe: &[S]) -> Result<Self> {
        if universe.len() > MAX_ITEMS {
            return Err(CoverError::UniverseTooLarge {
                size: universe.len(),
                max: MAX_ITEMS,
            });
        }

        let items: Vec<String> = universe
            .iter()
            .map(|name| name.as_ref().to_string())
            .sorted_by(|a, b| canonical_order(a, b))
            .collect();

        let mut positions = HashMap::with_capacity(items.len());
        for (bit, name) in items.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(CoverError::EmptyItemName);
            }
            if positions.insert(name.clone(), bit).is_some() {
                return Err(CoverError::DuplicateItem(name.clone()));
            }
        }

        Ok(Self { items, positions })
    }

    /// Number of items in the universe
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bit position of an item, if it is part of the universe
    pub fn position(&self, item: &str) -> Option<usize> {
        self.positions.get(item).copied()
    }

    /// Single-bit mask of an item
    pub fn bit(&self, item: &str) -> Option<Mask> {
        self.position(item).map(|bit| 1 << bit)
    }

    /// Item name at a bit position
    pub fn name(&self, bit: usize) -> Option<&str> {
        self.items.get(bit).map(String::as_str)
    }

    /// Item names in bit order
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Mask with every item of the universe set
    pub fn full_mask(&self) -> Mask {
        match self.items.len() {
            MAX_ITEMS => Mask::MAX,
            n => (1 << n) - 1,
        }
    }

    /// Item names whose bits are set in `mask`, in bit order
    pub fn names_of(&self, mask: Mask) -> Vec<&str> {
        self.items
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, name)| name.as_str())
            .collect()
    }
}

fn canonical_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// A prepared problem instance: target plus non-empty provider masks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSet {
    pub index: ItemIndex,
    pub target: Mask,
    pub providers: Vec<(String, Mask)>,
}

impl MaskSet {
    /// OR of all provider masks
    pub fn obtainable(&self) -> Mask {
        self.providers.iter().fold(0, |acc, (_, mask)| acc | mask)
    }

    /// The part of the target some provider can actually supply
    pub fn reachable_target(&self) -> Mask {
        self.target & self.obtainable()
    }

    /// Target items no provider supplies
    pub fn missing_items(&self) -> Vec<&str> {
        self.index.names_of(self.target & !self.obtainable())
    }

    /// Mask of a provider by name
    pub fn provider_mask(&self, name: &str) -> Option<Mask> {
        self.providers
            .iter()
            .find(|(provider, _)| provider == name)
            .map(|(_, mask)| *mask)
    }
}

/// Converts named providers into bitmasks over an [`ItemIndex`]
pub struct MaskBuilder;

impl MaskBuilder {
    /// Build provider masks from a usability lookup.
    ///
    /// `usable(provider, item)` decides whether the provider contributes
    /// the item's bit. Providers that end up with an empty mask are
    /// dropped; the rest keep the caller's order.
    pub fn build<I, S, F>(index: ItemIndex, providers: I, mut usable: F) -> MaskSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str, &str) -> bool,
    {
        let mut masks = Vec::new();

        for provider in providers {
            let provider = provider.as_ref();
            let mask: Mask = index
                .items()
                .iter()
                .enumerate()
                .filter(|(_, item)| usable(provider, item.as_str()))
                .fold(0, |mask, (bit, _)| mask | (1 << bit));

            if mask == 0 {
                log::trace!("Dropping provider {} with no usable items", provider);
                continue;
            }
            masks.push((provider.to_string(), mask));
        }

        MaskSet {
            target: index.full_mask(),
            index,
            providers: masks,
        }
    }
}

/// Index the universe and build provider masks in one step
pub fn build_masks<U, I, S, F>(universe: &[U], providers: I, usable: F) -> Result<MaskSet>
where
    U: AsRef<str>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str, &str) -> bool,
{
    let index = ItemIndex::new(universe)?;
    Ok(MaskBuilder::build(index, providers, usable))
}
