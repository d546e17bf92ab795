//! Villager optimization problem definition

use super::plan::{KeptVillager, Plan, PlanStatus};
use crate::config::{Settings, SolverStrategy};
use crate::cover::{
    greedy_cover, CoverOutcome, ExactCoverSolver, ItemIndex, Mask, MaskBuilder, MaskSet,
    SolverStatistics,
};
use crate::market::{bargain_keeps, cheapest_offers, load_catalog, Catalog, OfferPolicy};
use anyhow::{Context, Result};
use std::time::Instant;

/// Represents one "fewest villagers" problem
pub struct OptimizationProblem {
    settings: Settings,
    catalog: Catalog,
    policy: OfferPolicy,
    masks: MaskSet,
}

impl OptimizationProblem {
    /// Create a new problem, loading the catalog named in the settings
    pub fn new(settings: Settings) -> Result<Self> {
        let catalog = load_catalog(&settings.input).context("Failed to load catalog")?;
        Self::with_catalog(settings, catalog)
    }

    /// Create a problem with an explicit catalog (useful for testing)
    pub fn with_catalog(settings: Settings, catalog: Catalog) -> Result<Self> {
        catalog.validate()?;
        let policy = OfferPolicy::new(settings.pricing.max_price);
        let index = ItemIndex::new(&catalog.required).context("Failed to index enchantments")?;
        let masks = MaskBuilder::build(index, catalog.villager_names(), |name, enchantment| {
            catalog
                .villager(name)
                .is_some_and(|villager| policy.is_usable(villager, enchantment))
        });

        log::debug!(
            "{} of {} villagers sell something required",
            masks.providers.len(),
            catalog.villagers.len()
        );

        Ok(Self {
            settings,
            catalog,
            policy,
            masks,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn masks(&self) -> &MaskSet {
        &self.masks
    }

    pub fn policy(&self) -> OfferPolicy {
        self.policy
    }

    /// Find the smallest set of villagers covering every obtainable enchantment
    pub fn solve(&self) -> Result<(Plan, Option<SolverStatistics>)> {
        let start_time = Instant::now();
        let target = self.masks.reachable_target();
        let missing = self.masks.missing_items();

        if !missing.is_empty() {
            log::warn!("No villager sells: {}", missing.join(", "));
        }

        log::info!(
            "Covering {} enchantments with {} candidate villagers ({:?})",
            target.count_ones(),
            self.masks.providers.len(),
            self.settings.solver.strategy
        );

        let (selection, status, stats) = match self.settings.solver.strategy {
            SolverStrategy::Exact => self.solve_exact(target)?,
            SolverStrategy::Greedy => {
                let masks: Vec<Mask> = self.masks.providers.iter().map(|(_, m)| *m).collect();
                let greedy = greedy_cover(&masks, target);
                let selection = greedy
                    .selection
                    .into_iter()
                    .map(|i| self.masks.providers[i].0.clone())
                    .collect();
                (selection, PlanStatus::Greedy, None)
            }
        };

        let mut plan = self.build_plan(selection, status);
        plan.solve_time = start_time.elapsed();

        log::info!(
            "Keeping {} of {} villagers in {:.3}s",
            plan.kept.len(),
            self.catalog.villagers.len(),
            plan.solve_time.as_secs_f64()
        );
        Ok((plan, stats))
    }

    fn solve_exact(&self, target: Mask) -> Result<(Vec<String>, PlanStatus, Option<SolverStatistics>)> {
        let mut solver = ExactCoverSolver::new();
        if let Some(timeout) = self.settings.timeout() {
            solver = solver.with_timeout(timeout);
        }

        let (outcome, stats) = solver.solve_with_stats(&self.masks.providers, target);
        let (selection, status) = match outcome {
            CoverOutcome::Optimal(selection) if selection.is_empty() => (selection, PlanStatus::Empty),
            CoverOutcome::Optimal(selection) => (selection, PlanStatus::Optimal),
            CoverOutcome::BestEffort(selection) => {
                log::warn!("Search stopped early, plan may not be minimal");
                (selection, PlanStatus::BestEffort)
            }
            CoverOutcome::Infeasible => {
                anyhow::bail!("Reachable enchantments could not be covered; villager data is inconsistent")
            }
            CoverOutcome::Interrupted => anyhow::bail!("Search was stopped before any plan was found"),
        };

        Ok((selection, status, Some(stats)))
    }

    /// Turn a list of kept villager names into a full plan
    pub fn build_plan(&self, selection: Vec<String>, status: PlanStatus) -> Plan {
        let mut kept: Vec<KeptVillager> = selection
            .iter()
            .filter_map(|name| self.catalog.villager(name))
            .map(|villager| KeptVillager {
                name: villager.name.clone(),
                enchantments: self
                    .catalog
                    .required
                    .iter()
                    .filter(|e| self.policy.is_usable(villager, e))
                    .filter_map(|e| villager.price(e).map(|price| (e.clone(), price)))
                    .collect(),
            })
            .collect();
        kept.sort_by(|a, b| a.name.cmp(&b.name));

        let removed = self
            .catalog
            .villagers
            .iter()
            .filter(|v| !selection.contains(&v.name))
            .map(|v| v.name.clone())
            .collect();

        let assignments = cheapest_offers(
            &self.catalog,
            selection.iter().map(String::as_str),
            self.policy,
        )
        .into_values()
        .collect();

        let bargains = if self.settings.pricing.keep_bargains {
            bargain_keeps(
                &self.catalog,
                &selection,
                self.policy,
                self.settings.pricing.bargain_margin,
            )
        } else {
            Vec::new()
        };

        Plan {
            status,
            kept,
            removed,
            missing: self.masks.missing_items().iter().map(|s| s.to_string()).collect(),
            assignments,
            bargains,
            solve_time: Default::default(),
        }
    }

    /// Sizes of the instance handed to the solver
    pub fn statistics(&self) -> ProblemStatistics {
        let reachable = self.masks.reachable_target();
        ProblemStatistics {
            villagers: self.catalog.villagers.len(),
            candidate_villagers: self.masks.providers.len(),
            required: self.catalog.required.len(),
            reachable: reachable.count_ones() as usize,
            missing: self.masks.missing_items().len(),
            max_offers_per_villager: self
                .masks
                .providers
                .iter()
                .map(|(_, m)| (m & reachable).count_ones() as usize)
                .max()
                .unwrap_or(0),
        }
    }
}

/// Size of an optimization problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemStatistics {
    pub villagers: usize,
    pub candidate_villagers: usize,
    pub required: usize,
    pub reachable: usize,
    pub missing: usize,
    pub max_offers_per_villager: usize,
}

impl std::fmt::Display for ProblemStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Problem Statistics:")?;
        writeln!(f, "  Villagers: {} ({} sell something required)", self.villagers, self.candidate_villagers)?;
        writeln!(f, "  Required enchantments: {}", self.required)?;
        writeln!(f, "  Obtainable: {}", self.reachable)?;
        writeln!(f, "  Missing: {}", self.missing)?;
        writeln!(f, "  Most enchantments from one villager: {}", self.max_offers_per_villager)?;
        Ok(())
    }
}
