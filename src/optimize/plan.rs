//! The result of an optimization: which villagers to keep

use crate::market::Offer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// How a plan was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Proven minimum number of villagers
    Optimal,
    /// Exact search was interrupted; the plan covers everything reachable but may not be minimal
    BestEffort,
    /// Greedy heuristic only
    Greedy,
    /// Nothing required can be bought from anyone
    Empty,
}

/// A villager kept by the plan, with the required enchantments it sells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeptVillager {
    pub name: String,
    pub enchantments: BTreeMap<String, u32>,
}

/// Which villagers to keep and what that buys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub status: PlanStatus,
    /// Kept villagers in name order
    pub kept: Vec<KeptVillager>,
    /// Villagers that can go, in name order
    pub removed: Vec<String>,
    /// Required enchantments no villager sells (under the price policy)
    pub missing: Vec<String>,
    /// Cheapest kept seller of each covered enchantment
    pub assignments: Vec<Offer>,
    /// Extra villagers worth keeping for a much better price
    pub bargains: Vec<Offer>,
    #[serde(skip)]
    pub solve_time: Duration,
}

/// Compact summary for listings and JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub status: PlanStatus,
    pub kept_count: usize,
    pub removed_count: usize,
    pub covered_count: usize,
    pub missing_count: usize,
    pub total_price: u32,
    pub solve_time_ms: u64,
}

impl Plan {
    pub fn kept_names(&self) -> Vec<&str> {
        self.kept.iter().map(|k| k.name.as_str()).collect()
    }

    pub fn is_kept(&self, villager: &str) -> bool {
        self.kept.iter().any(|k| k.name == villager)
    }

    /// Whether every required enchantment is obtainable from the kept villagers
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Sum of the assigned prices, buying each enchantment once
    pub fn total_price(&self) -> u32 {
        self.assignments.iter().map(|offer| offer.price).sum()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            status: self.status,
            kept_count: self.kept.len(),
            removed_count: self.removed.len(),
            covered_count: self.assignments.len(),
            missing_count: self.missing.len(),
            total_price: self.total_price(),
            solve_time_ms: self.solve_time.as_millis() as u64,
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Create from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save to file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn offer(enchantment: &str, villager: &str, price: u32) -> Offer {
        Offer {
            enchantment: enchantment.to_string(),
            villager: villager.to_string(),
            price,
        }
    }

    fn sample_plan() -> Plan {
        Plan {
            status: PlanStatus::Optimal,
            kept: vec![KeptVillager {
                name: "Steve".to_string(),
                enchantments: BTreeMap::from([("Mending".to_string(), 12), ("Silk Touch".to_string(), 20)]),
            }],
            removed: vec!["Alex".to_string()],
            missing: vec!["Feather Falling IV".to_string()],
            assignments: vec![offer("Mending", "Steve", 12), offer("Silk Touch", "Steve", 20)],
            bargains: vec![],
            solve_time: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_summary() {
        let summary = sample_plan().summary();
        assert_eq!(summary.kept_count, 1);
        assert_eq!(summary.covered_count, 2);
        assert_eq!(summary.missing_count, 1);
        assert_eq!(summary.total_price, 32);
        assert_eq!(summary.solve_time_ms, 3);
    }

    #[test]
    fn test_queries() {
        let plan = sample_plan();
        assert!(plan.is_kept("Steve"));
        assert!(!plan.is_kept("Alex"));
        assert!(!plan.is_complete());
        assert_eq!(plan.kept_names(), vec!["Steve"]);
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("plan.json");
        let plan = sample_plan();

        plan.save_to_file(&path).unwrap();
        let loaded = Plan::load_from_file(&path).unwrap();

        assert_eq!(loaded.status, PlanStatus::Optimal);
        assert_eq!(loaded.kept, plan.kept);
        assert_eq!(loaded.solve_time, Duration::ZERO);
    }
}
