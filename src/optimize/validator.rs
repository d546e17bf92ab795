//! Checks that a villager selection covers everything and cannot be shrunk

use crate::cover::{ExactCoverSolver, Mask, MaskSet};
use anyhow::Result;
use itertools::Itertools;
use rayon::prelude::*;

/// Largest number of subsets enumerated before falling back to the exact solver
const BRUTE_FORCE_LIMIT: u64 = 2_000_000;

/// Validates villager selections against a prepared instance
pub struct PlanValidator<'a> {
    masks: &'a MaskSet,
}

/// Result of selection validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub covers_target: bool,
    pub is_minimal: bool,
    /// Names that are not candidate villagers (unknown, or nothing usable to sell)
    pub unknown: Vec<String>,
    /// Reachable enchantments the selection leaves out
    pub uncovered: Vec<String>,
    /// Selected villagers that could each be dropped on their own
    pub redundant: Vec<String>,
    /// A cover with fewer villagers, if one exists
    pub smaller_cover: Option<Vec<String>>,
    pub error_message: Option<String>,
}

impl<'a> PlanValidator<'a> {
    pub fn new(masks: &'a MaskSet) -> Self {
        Self { masks }
    }

    /// Validate a selection by villager name
    pub fn validate(&self, selection: &[String]) -> Result<ValidationResult> {
        let target = self.masks.reachable_target();

        let mut unknown = Vec::new();
        let mut chosen: Vec<(&str, Mask)> = Vec::new();
        for name in selection.iter().unique() {
            match self.masks.provider_mask(name) {
                Some(mask) => chosen.push((name.as_str(), mask)),
                None => unknown.push(name.clone()),
            }
        }

        let covered = chosen.iter().fold(0, |acc: Mask, (_, mask)| acc | mask) & target;
        let covers_target = covered == target;
        let uncovered: Vec<String> = self
            .masks
            .index
            .names_of(target & !covered)
            .into_iter()
            .map(str::to_string)
            .collect();

        let redundant = chosen
            .iter()
            .enumerate()
            .filter(|(skip, _)| {
                let rest = chosen
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| i != skip)
                    .fold(0, |acc: Mask, (_, (_, mask))| acc | mask);
                covers_target && rest & target == target
            })
            .map(|(_, (name, _))| name.to_string())
            .collect::<Vec<_>>();

        let smaller_cover = if covers_target {
            self.find_smaller_cover(chosen.len(), target)
        } else {
            None
        };
        let is_minimal = covers_target && smaller_cover.is_none();
        let is_valid = is_minimal && unknown.is_empty();

        let error_message = if is_valid {
            None
        } else {
            Some(Self::generate_error_message(&unknown, &uncovered, &smaller_cover))
        };

        Ok(ValidationResult {
            is_valid,
            covers_target,
            is_minimal,
            unknown,
            uncovered,
            redundant,
            smaller_cover,
            error_message,
        })
    }

    /// Any cover of the target using fewer than `size` villagers
    fn find_smaller_cover(&self, size: usize, target: Mask) -> Option<Vec<String>> {
        if size == 0 {
            return None;
        }
        let k = size - 1;
        let providers = &self.masks.providers;

        if subset_count(providers.len(), k) <= BRUTE_FORCE_LIMIT {
            log::debug!("Checking all {}-villager subsets of {}", k, providers.len());
            return (0..=k).find_map(|size| {
                providers
                    .iter()
                    .combinations(size)
                    .par_bridge()
                    .find_any(|combo| {
                        combo.iter().fold(0, |acc: Mask, (_, mask)| acc | mask) & target == target
                    })
                    .map(|combo| combo.into_iter().map(|(name, _)| name.clone()).collect())
            });
        }

        log::debug!("Too many subsets to enumerate, asking the exact solver");
        ExactCoverSolver::new()
            .solve(providers, target)
            .into_selection()
            .filter(|optimal| optimal.len() < size)
    }

    fn generate_error_message(
        unknown: &[String],
        uncovered: &[String],
        smaller_cover: &Option<Vec<String>>,
    ) -> String {
        let mut message = String::new();

        if !unknown.is_empty() {
            message.push_str(&format!("Not candidate villagers: {}. ", unknown.join(", ")));
        }
        if !uncovered.is_empty() {
            message.push_str(&format!("Not covered: {}. ", uncovered.join(", ")));
        }
        if let Some(smaller) = smaller_cover {
            message.push_str(&format!(
                "A smaller selection of {} exists: {}.",
                smaller.len(),
                smaller.join(", ")
            ));
        }

        message.trim_end().to_string()
    }
}

/// `n choose k`, saturating
fn subset_count(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u64;
    let n = n as u64;
    (0..k).fold(1u64, |acc, i| acc.saturating_mul(n - i) / (i + 1))
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Validation Result:")?;
        writeln!(f, "  Valid: {}", self.is_valid)?;
        writeln!(f, "  Covers all obtainable enchantments: {}", self.covers_target)?;
        writeln!(f, "  Minimal: {}", self.is_minimal)?;
        if !self.redundant.is_empty() {
            writeln!(f, "  Redundant: {}", self.redundant.join(", "))?;
        }
        if let Some(ref error) = self.error_message {
            writeln!(f, "  Error: {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::build_masks;
    use std::collections::{HashMap, HashSet};

    fn masks() -> MaskSet {
        let offers: HashMap<&str, HashSet<&str>> = HashMap::from([
            ("P1", HashSet::from(["A", "B", "C"])),
            ("P2", HashSet::from(["A"])),
            ("P3", HashSet::from(["D"])),
            ("P4", HashSet::from(["C", "D"])),
        ]);
        build_masks(&["A", "B", "C", "D", "E"], ["P1", "P2", "P3", "P4"], |p, item| {
            offers[p].contains(item)
        })
        .unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_minimal_selection_is_valid() {
        let masks = masks();
        let result = PlanValidator::new(&masks).validate(&names(&["P1", "P3"])).unwrap();
        assert!(result.is_valid);
        assert!(result.redundant.is_empty());
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_non_minimal_selection() {
        let masks = masks();
        let result = PlanValidator::new(&masks)
            .validate(&names(&["P1", "P2", "P3"]))
            .unwrap();
        assert!(result.covers_target);
        assert!(!result.is_minimal);
        assert_eq!(result.redundant, vec!["P2"]);
        assert_eq!(result.smaller_cover.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_incomplete_selection() {
        let masks = masks();
        let result = PlanValidator::new(&masks).validate(&names(&["P2", "P3"])).unwrap();
        assert!(!result.covers_target);
        assert_eq!(result.uncovered, vec!["B", "C"]);
        assert!(result.error_message.unwrap().contains("Not covered: B, C"));
    }

    #[test]
    fn test_unknown_villager() {
        let masks = masks();
        let result = PlanValidator::new(&masks)
            .validate(&names(&["P1", "P3", "Nobody"]))
            .unwrap();
        assert!(result.is_minimal);
        assert!(!result.is_valid);
        assert_eq!(result.unknown, vec!["Nobody"]);
    }

    /// 24 items, a singleton seller for each plus six four-item blocks
    fn blocks_and_singletons() -> MaskSet {
        let items: Vec<String> = (0..24).map(|i| format!("I{:02}", i)).collect();
        let mut offers: HashMap<String, HashSet<String>> = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            offers.insert(format!("S{:02}", i), HashSet::from([item.clone()]));
            offers
                .entry(format!("B{}", i / 4))
                .or_default()
                .insert(item.clone());
        }
        let mut providers: Vec<String> = offers.keys().cloned().collect();
        providers.sort();
        build_masks(&items, providers, |p, item| offers[p].contains(item)).unwrap()
    }

    #[test]
    fn test_large_selection_checked_by_exact_solver() {
        let masks = blocks_and_singletons();
        assert_eq!(masks.providers.len(), 30);

        // Four blocks plus the eight singletons they leave out.
        let mut selection = names(&["B0", "B1", "B2", "B3"]);
        selection.extend((16..24).map(|i| format!("S{:02}", i)));
        assert_eq!(selection.len(), 12);
        assert!(subset_count(30, 11) > BRUTE_FORCE_LIMIT);

        let result = PlanValidator::new(&masks).validate(&selection).unwrap();
        assert!(result.covers_target);
        assert!(!result.is_minimal);
        let smaller = result.smaller_cover.unwrap();
        assert_eq!(smaller.len(), 6);
        assert!(smaller.iter().all(|name| name.starts_with('B')));
    }

    #[test]
    fn test_subset_count() {
        assert_eq!(subset_count(5, 2), 10);
        assert_eq!(subset_count(4, 0), 1);
        assert_eq!(subset_count(3, 4), 0);
        assert_eq!(subset_count(60, 30), 118_264_581_564_861_424);
    }
}
