//! Greedy set cover, used to seed the exact search with an upper bound

use super::mask::Mask;

/// Result of a greedy pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreedyCover {
    /// Indices of the chosen providers, in pick order
    pub selection: Vec<usize>,
    /// Union of the chosen masks restricted to the target
    pub covered: Mask,
    /// Whether the whole target was covered
    pub complete: bool,
}

/// Repeatedly pick the provider that covers the most uncovered target bits.
///
/// Ties go to the provider that appears first in `masks`. Stops when the
/// target is covered or no provider adds anything.
pub fn greedy_cover(masks: &[Mask], target: Mask) -> GreedyCover {
    let mut remaining = target;
    let mut selection = Vec::new();

    while remaining != 0 {
        let best = masks
            .iter()
            .enumerate()
            .map(|(i, mask)| (i, (mask & remaining).count_ones()))
            .filter(|&(_, gain)| gain > 0)
            .fold(None, |best: Option<(usize, u32)>, (i, gain)| match best {
                Some((_, best_gain)) if best_gain >= gain => best,
                _ => Some((i, gain)),
            });

        let Some((chosen, _)) = best else {
            break;
        };
        selection.push(chosen);
        remaining &= !masks[chosen];
    }

    GreedyCover {
        selection,
        covered: target & !remaining,
        complete: remaining == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greedy_picks_largest_gain_first() {
        let masks = [0b0001, 0b0111, 0b1000];
        let cover = greedy_cover(&masks, 0b1111);
        assert_eq!(cover.selection, vec![1, 2]);
        assert!(cover.complete);
        assert_eq!(cover.covered, 0b1111);
    }

    #[test]
    fn test_greedy_ties_prefer_earlier_provider() {
        let masks = [0b0011, 0b1100, 0b0110];
        let cover = greedy_cover(&masks, 0b1111);
        assert_eq!(cover.selection, vec![0, 1]);
    }

    #[test]
    fn test_greedy_can_be_suboptimal() {
        // Classic trap: the big middle set looks best but the two halves suffice.
        let masks = [0b000111, 0b111000, 0b011110];
        let cover = greedy_cover(&masks, 0b111111);
        assert_eq!(cover.selection, vec![2, 0, 1]);
        assert!(cover.complete);
    }

    #[test]
    fn test_greedy_reports_incomplete_cover() {
        let masks = [0b0011];
        let cover = greedy_cover(&masks, 0b0111);
        assert!(!cover.complete);
        assert_eq!(cover.covered, 0b0011);
        assert_eq!(cover.selection, vec![0]);
    }

    #[test]
    fn test_greedy_empty_target() {
        let cover = greedy_cover(&[0b1], 0);
        assert!(cover.selection.is_empty());
        assert!(cover.complete);
    }
}
