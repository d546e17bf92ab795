//! Per-enchantment price lookups over a set of villagers

use super::{Catalog, OfferPolicy, Villager};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One villager selling one enchantment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub enchantment: String,
    pub villager: String,
    pub price: u32,
}

/// Cheapest usable offer of each required enchantment among `villagers`.
///
/// Ties go to the villager whose name sorts first. Enchantments none of
/// the given villagers sell are absent from the result.
pub fn cheapest_offers<'a, I>(catalog: &Catalog, villagers: I, policy: OfferPolicy) -> BTreeMap<String, Offer>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted: HashSet<&str> = villagers.into_iter().collect();
    let pool: Vec<&Villager> = catalog
        .villagers
        .iter()
        .filter(|v| wanted.contains(v.name.as_str()))
        .collect();

    catalog
        .required
        .iter()
        .filter_map(|enchantment| {
            pool.iter()
                .filter(|v| policy.is_usable(v, enchantment))
                .filter_map(|v| v.price(enchantment).map(|price| (v, price)))
                .min_by(|(a, a_price), (b, b_price)| {
                    a_price.cmp(b_price).then_with(|| a.name.cmp(&b.name))
                })
                .map(|(v, price)| {
                    (
                        enchantment.clone(),
                        Offer {
                            enchantment: enchantment.clone(),
                            villager: v.name.clone(),
                            price,
                        },
                    )
                })
        })
        .collect()
}

/// Villagers outside `selected` that undercut the selected price by more than `margin`.
///
/// For each enchantment at most one bargain is reported: the cheapest
/// outside offer. Results are ordered by enchantment name.
pub fn bargain_keeps(
    catalog: &Catalog,
    selected: &[String],
    policy: OfferPolicy,
    margin: u32,
) -> Vec<Offer> {
    let chosen = cheapest_offers(catalog, selected.iter().map(String::as_str), policy);
    let outsiders: Vec<&str> = catalog
        .villagers
        .iter()
        .map(|v| v.name.as_str())
        .filter(|name| !selected.iter().any(|s| s == name))
        .collect();
    let outside = cheapest_offers(catalog, outsiders, policy);

    chosen
        .into_iter()
        .filter_map(|(enchantment, current)| {
            let candidate = outside.get(&enchantment)?;
            if current.price.saturating_sub(candidate.price) > margin {
                log::debug!(
                    "{} sells {} for {} vs {} from {}",
                    candidate.villager, enchantment, candidate.price, current.price, current.villager
                );
                Some(candidate.clone())
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Villager::new("Ash", [("Mending", 30), ("Silk Touch", 10)]),
                Villager::new("Birch", [("Mending", 12)]),
                Villager::new("Cedar", [("Mending", 12), ("Silk Touch", 8)]),
            ],
            vec!["Mending".to_string(), "Silk Touch".to_string()],
        )
    }

    #[test]
    fn test_cheapest_offers_tie_breaks_by_name() {
        let catalog = catalog();
        let offers = cheapest_offers(&catalog, ["Ash", "Birch", "Cedar"], OfferPolicy::default());
        assert_eq!(offers["Mending"].villager, "Birch");
        assert_eq!(offers["Mending"].price, 12);
        assert_eq!(offers["Silk Touch"].villager, "Cedar");
    }

    #[test]
    fn test_cheapest_offers_respects_selection_and_policy() {
        let catalog = catalog();
        let offers = cheapest_offers(&catalog, ["Ash"], OfferPolicy::new(Some(20)));
        assert!(!offers.contains_key("Mending"));
        assert_eq!(offers["Silk Touch"].price, 10);
    }

    #[test]
    fn test_bargain_keeps() {
        let catalog = catalog();
        let bargains = bargain_keeps(&catalog, &["Ash".to_string()], OfferPolicy::default(), 5);
        // Mending: 30 vs 12 is a bargain; Silk Touch: 10 vs 8 is not.
        assert_eq!(
            bargains,
            vec![Offer {
                enchantment: "Mending".to_string(),
                villager: "Birch".to_string(),
                price: 12,
            }]
        );
    }

    #[test]
    fn test_bargain_margin_is_strict() {
        let catalog = catalog();
        let bargains = bargain_keeps(&catalog, &["Ash".to_string()], OfferPolicy::default(), 18);
        assert!(bargains.is_empty());
    }
}
