//! Exact minimum set cover by bitmask branch-and-bound

use super::greedy::greedy_cover;
use super::mask::{Mask, MAX_ITEMS};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often (in expanded nodes) the deadline is polled
const DEADLINE_POLL_INTERVAL: u64 = 1024;

/// Outcome of a cover search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverOutcome<T> {
    /// A cover of proven minimum size
    Optimal(Vec<T>),
    /// The search was stopped early; this is the best cover found so far
    BestEffort(Vec<T>),
    /// No combination of providers reaches the target
    Infeasible,
    /// The search was stopped before any cover was found
    Interrupted,
}

impl<T> CoverOutcome<T> {
    /// The selected providers, if a cover was found
    pub fn selection(&self) -> Option<&[T]> {
        match self {
            CoverOutcome::Optimal(selection) | CoverOutcome::BestEffort(selection) => {
                Some(selection)
            }
            CoverOutcome::Infeasible | CoverOutcome::Interrupted => None,
        }
    }

    /// Consume the outcome, keeping the selection
    pub fn into_selection(self) -> Option<Vec<T>> {
        match self {
            CoverOutcome::Optimal(selection) | CoverOutcome::BestEffort(selection) => {
                Some(selection)
            }
            CoverOutcome::Infeasible | CoverOutcome::Interrupted => None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self, CoverOutcome::Optimal(_))
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, CoverOutcome::Infeasible)
    }

    /// Translate the provider identifiers
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> CoverOutcome<U> {
        match self {
            CoverOutcome::Optimal(selection) => {
                CoverOutcome::Optimal(selection.into_iter().map(f).collect())
            }
            CoverOutcome::BestEffort(selection) => {
                CoverOutcome::BestEffort(selection.into_iter().map(f).collect())
            }
            CoverOutcome::Infeasible => CoverOutcome::Infeasible,
            CoverOutcome::Interrupted => CoverOutcome::Interrupted,
        }
    }
}

/// Counters collected during one search
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub provider_count: usize,
    pub target_bits: u32,
    pub greedy_len: Option<usize>,
    pub best_len: Option<usize>,
    pub nodes_expanded: u64,
    pub depth_prunes: u64,
    pub bound_prunes: u64,
    pub dead_ends: u64,
    pub improvements: u64,
    pub completed: bool,
    pub solve_time: Duration,
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cover Search Statistics:")?;
        writeln!(f, "  Providers: {}", self.provider_count)?;
        writeln!(f, "  Target items: {}", self.target_bits)?;
        match self.greedy_len {
            Some(len) => writeln!(f, "  Greedy bound: {}", len)?,
            None => writeln!(f, "  Greedy bound: none")?,
        }
        match self.best_len {
            Some(len) => writeln!(f, "  Best cover: {}", len)?,
            None => writeln!(f, "  Best cover: none")?,
        }
        writeln!(f, "  Nodes expanded: {}", self.nodes_expanded)?;
        writeln!(
            f,
            "  Pruned: {} by depth, {} by bound, {} dead ends",
            self.depth_prunes, self.bound_prunes, self.dead_ends
        )?;
        writeln!(f, "  Search completed: {}", self.completed)?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        Ok(())
    }
}

/// Exact minimum set cover solver.
///
/// Seeds an upper bound with a greedy cover, then runs a depth-first
/// search that always branches on the uncovered bit with the fewest
/// covering providers and prunes with `ceil(remaining / max_cover)`.
#[derive(Debug, Clone, Default)]
pub struct ExactCoverSolver {
    timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl ExactCoverSolver {
    /// Create a solver without time limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop searching after `timeout` and return the best cover found
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Stop searching once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Find a minimum-size subset of `providers` whose masks OR to `target`
    pub fn solve<T: Clone>(&self, providers: &[(T, Mask)], target: Mask) -> CoverOutcome<T> {
        self.solve_with_stats(providers, target).0
    }

    /// Like [`solve`](Self::solve), also returning search statistics
    pub fn solve_with_stats<T: Clone>(
        &self,
        providers: &[(T, Mask)],
        target: Mask,
    ) -> (CoverOutcome<T>, SolverStatistics) {
        let start_time = Instant::now();
        let masks: Vec<Mask> = providers.iter().map(|(_, mask)| *mask).collect();

        let deadline = self.timeout.map(|timeout| start_time + timeout);
        let mut search = Search::new(&masks, target, deadline, self.cancel.as_deref());
        let outcome = search.run();

        let mut stats = search.stats;
        stats.solve_time = start_time.elapsed();
        log::debug!(
            "Cover search finished: {} nodes, best {:?}, completed {}",
            stats.nodes_expanded,
            stats.best_len,
            stats.completed
        );

        (outcome.map(|i| providers[i].0.clone()), stats)
    }

    /// Solve independent instances in parallel
    pub fn solve_batch<T>(&self, instances: &[(Vec<(T, Mask)>, Mask)]) -> Vec<CoverOutcome<T>>
    where
        T: Clone + Send + Sync,
    {
        instances
            .par_iter()
            .map(|(providers, target)| self.solve(providers, *target))
            .collect()
    }
}

/// One level of the explicit search stack
struct Frame {
    covered: Mask,
    candidates: Vec<usize>,
    cursor: usize,
}

impl Frame {
    fn next_candidate(&mut self) -> Option<usize> {
        let candidate = self.candidates.get(self.cursor).copied();
        self.cursor += 1;
        candidate
    }
}

/// Search state owned by a single solve call
struct Search<'a> {
    masks: &'a [Mask],
    target: Mask,
    coverage: Vec<Vec<usize>>,
    max_cover: u32,
    best: Option<Vec<usize>>,
    best_len: usize,
    deadline: Option<Instant>,
    cancel: Option<&'a AtomicBool>,
    stats: SolverStatistics,
}

impl<'a> Search<'a> {
    fn new(
        masks: &'a [Mask],
        target: Mask,
        deadline: Option<Instant>,
        cancel: Option<&'a AtomicBool>,
    ) -> Self {
        let mut coverage = vec![Vec::new(); MAX_ITEMS];
        for (i, &mask) in masks.iter().enumerate() {
            for (bit, providers) in coverage.iter_mut().enumerate() {
                if mask & (1 << bit) != 0 {
                    providers.push(i);
                }
            }
        }
        let max_cover = masks
            .iter()
            .map(|mask| (mask & target).count_ones())
            .max()
            .unwrap_or(0);

        Self {
            masks,
            target,
            coverage,
            max_cover,
            best: None,
            best_len: usize::MAX,
            deadline,
            cancel,
            stats: SolverStatistics {
                provider_count: masks.len(),
                target_bits: target.count_ones(),
                ..SolverStatistics::default()
            },
        }
    }

    fn run(&mut self) -> CoverOutcome<usize> {
        if self.target == 0 {
            self.stats.completed = true;
            self.stats.best_len = Some(0);
            return CoverOutcome::Optimal(Vec::new());
        }

        let greedy = greedy_cover(self.masks, self.target);
        if greedy.complete {
            self.stats.greedy_len = Some(greedy.selection.len());
            self.best_len = greedy.selection.len();
            self.best = Some(greedy.selection);
        } else {
            log::debug!(
                "Greedy pass covered {} of {} target bits, searching without bound",
                greedy.covered.count_ones(),
                self.target.count_ones()
            );
        }

        let completed = self.search();
        self.stats.completed = completed;
        self.stats.best_len = self.best.as_ref().map(Vec::len);

        match (self.best.take(), completed) {
            (Some(selection), true) => CoverOutcome::Optimal(selection),
            (Some(selection), false) => CoverOutcome::BestEffort(selection),
            (None, true) => CoverOutcome::Infeasible,
            (None, false) => CoverOutcome::Interrupted,
        }
    }

    /// Depth-first search; returns false if it was stopped early
    fn search(&mut self) -> bool {
        let mut path: Vec<usize> = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();

        if let Some(root) = self.expand(0, &path) {
            stack.push(root);
        }

        while let Some(frame) = stack.last_mut() {
            if self.should_stop() {
                return false;
            }

            match frame.next_candidate() {
                Some(candidate) => {
                    let covered = (frame.covered | self.masks[candidate]) & self.target;
                    path.push(candidate);
                    match self.expand(covered, &path) {
                        Some(child) => stack.push(child),
                        None => {
                            path.pop();
                        }
                    }
                }
                None => {
                    stack.pop();
                    path.pop();
                }
            }
        }

        true
    }

    /// Enter the node reached by `path`; returns its frame if it needs branching
    fn expand(&mut self, covered: Mask, path: &[usize]) -> Option<Frame> {
        self.stats.nodes_expanded += 1;
        let depth = path.len();

        if covered == self.target {
            if depth < self.best_len {
                log::trace!("Improved cover: {} -> {} providers", self.best_len, depth);
                self.best_len = depth;
                self.best = Some(path.to_vec());
                self.stats.improvements += 1;
            }
            return None;
        }

        if depth >= self.best_len {
            self.stats.depth_prunes += 1;
            return None;
        }

        let remaining = self.target & !covered;
        if depth + self.lower_bound(remaining) >= self.best_len {
            self.stats.bound_prunes += 1;
            return None;
        }

        let bit = self.most_constrained_bit(remaining);
        let mut candidates: Vec<(usize, u32)> = self.coverage[bit]
            .iter()
            .map(|&i| (i, (self.masks[i] & remaining).count_ones()))
            .filter(|&(_, gain)| gain > 0)
            .collect();

        if candidates.is_empty() {
            self.stats.dead_ends += 1;
            return None;
        }

        // Stable sort keeps input order among equal gains.
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        Some(Frame {
            covered,
            candidates: candidates.into_iter().map(|(i, _)| i).collect(),
            cursor: 0,
        })
    }

    /// Providers still needed, at least: no provider adds more than `max_cover` bits.
    fn lower_bound(&self, remaining: Mask) -> usize {
        match self.max_cover {
            0 => usize::MAX / 2,
            max_cover => remaining.count_ones().div_ceil(max_cover) as usize,
        }
    }

    /// The remaining bit covered by the fewest providers; lowest bit wins ties.
    fn most_constrained_bit(&self, remaining: Mask) -> usize {
        let mut best_bit = remaining.trailing_zeros() as usize;
        let mut best_count = self.coverage[best_bit].len();
        let mut bits = remaining & (remaining - 1);

        while bits != 0 && best_count > 0 {
            let bit = bits.trailing_zeros() as usize;
            let count = self.coverage[bit].len();
            if count < best_count {
                best_bit = bit;
                best_count = count;
            }
            bits &= bits - 1;
        }

        best_bit
    }

    fn should_stop(&self) -> bool {
        if let Some(flag) = self.cancel {
            if flag.load(Ordering::Relaxed) {
                log::debug!("Cover search cancelled");
                return true;
            }
        }
        if let Some(deadline) = self.deadline {
            if self.stats.nodes_expanded % DEADLINE_POLL_INTERVAL == 0 && Instant::now() >= deadline {
                log::debug!("Cover search hit its deadline");
                return true;
            }
        }
        false
    }
}
