//! Loading villager and enchantment data from JSON files
//!
//! Villager file format, keyed by villager name:
//! `{"Steve": {"enchantments": {"Mending": 12, "Silk Touch": 20}}}`
//!
//! Enchantment file format:
//! `{"villager_enchantments": ["Mending", "Silk Touch"]}`
//!
//! Enchantment-keyed format, a single file with villager IDs under each
//! enchantment; every key is required:
//! `{"Mending": {"12": 9, "17": 14}, "Depth Strider III": {}}`

use super::{Catalog, Villager};
use crate::config::{InputConfig, InputFormat};
use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct VillagerRecord {
    enchantments: BTreeMap<String, u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnchantmentList {
    villager_enchantments: Vec<String>,
}

/// Canonical name of an enchantment: alias if one matches, otherwise the trimmed key
pub fn normalize_name(name: &str, aliases: &BTreeMap<String, String>) -> String {
    let trimmed = name.trim();
    if let Some(canonical) = aliases.get(trimmed) {
        return canonical.clone();
    }
    aliases
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map(|(_, canonical)| canonical.clone())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Record one offer, keeping the cheaper price when aliasing makes it a repeat
fn insert_offer(offers: &mut BTreeMap<String, u32>, villager: &str, enchantment: String, price: u32) {
    match offers.get(&enchantment).copied() {
        Some(existing) => {
            let kept = existing.min(price);
            log::warn!(
                "{} lists {} twice ({} and {}), keeping price {}",
                villager, enchantment, existing, price, kept
            );
            offers.insert(enchantment, kept);
        }
        None => {
            offers.insert(enchantment, price);
        }
    }
}

/// Parse a villager file
pub fn parse_villagers(content: &str, aliases: &BTreeMap<String, String>) -> Result<Vec<Villager>> {
    let records: BTreeMap<String, VillagerRecord> =
        serde_json::from_str(content).context("Invalid villager JSON")?;

    let villagers = records
        .into_iter()
        .map(|(name, record)| {
            let name = name.trim().to_string();
            let mut enchantments: BTreeMap<String, u32> = BTreeMap::new();
            for (raw, price) in record.enchantments {
                insert_offer(&mut enchantments, &name, normalize_name(&raw, aliases), price);
            }
            Villager { name, enchantments }
        })
        .collect();

    Ok(villagers)
}

/// Parse an enchantment-keyed file into villagers and the required list
pub fn parse_enchantment_keyed(
    content: &str,
    aliases: &BTreeMap<String, String>,
) -> Result<(Vec<Villager>, Vec<String>)> {
    let records: BTreeMap<String, BTreeMap<String, u32>> =
        serde_json::from_str(content).context("Invalid enchantment-keyed JSON")?;

    let mut by_villager: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
    let mut required = Vec::with_capacity(records.len());

    for (raw, sellers) in records {
        let enchantment = normalize_name(&raw, aliases);
        for (villager, price) in sellers {
            let villager = villager.trim().to_string();
            let offers = by_villager.entry(villager.clone()).or_default();
            insert_offer(offers, &villager, enchantment.clone(), price);
        }
        required.push(enchantment);
    }

    let villagers = by_villager
        .into_iter()
        .map(|(name, enchantments)| Villager { name, enchantments })
        .collect();

    Ok((villagers, required.into_iter().unique().collect()))
}

/// Parse an enchantment file into the list of required enchantments
pub fn parse_required(content: &str, aliases: &BTreeMap<String, String>) -> Result<Vec<String>> {
    let list: EnchantmentList =
        serde_json::from_str(content).context("Invalid enchantment JSON")?;

    Ok(list
        .villager_enchantments
        .iter()
        .map(|name| normalize_name(name, aliases))
        .collect())
}

/// Load and validate the catalog described by the input settings
pub fn load_catalog(input: &InputConfig) -> Result<Catalog> {
    let villager_content = std::fs::read_to_string(&input.villagers_file).with_context(|| {
        format!("Failed to read villager file: {}", input.villagers_file.display())
    })?;

    let (villagers, required) = match input.format {
        InputFormat::VillagerKeyed => {
            let villagers = parse_villagers(&villager_content, &input.aliases).with_context(|| {
                format!("Failed to parse villager file: {}", input.villagers_file.display())
            })?;

            let required_content =
                std::fs::read_to_string(&input.enchantments_file).with_context(|| {
                    format!("Failed to read enchantment file: {}", input.enchantments_file.display())
                })?;
            let required = parse_required(&required_content, &input.aliases).with_context(|| {
                format!("Failed to parse enchantment file: {}", input.enchantments_file.display())
            })?;
            (villagers, required)
        }
        InputFormat::EnchantmentKeyed => parse_enchantment_keyed(&villager_content, &input.aliases)
            .with_context(|| {
                format!("Failed to parse villager file: {}", input.villagers_file.display())
            })?,
    };

    log::info!(
        "Loaded {} villagers and {} required enchantments",
        villagers.len(),
        required.len()
    );

    let catalog = Catalog::new(villagers, required);
    catalog.validate().context("Invalid catalog")?;
    Ok(catalog)
}

/// Write a catalog back out in the two-file format
pub fn save_catalog<P: AsRef<Path>>(catalog: &Catalog, villagers_path: P, enchantments_path: P) -> Result<()> {
    let records: BTreeMap<&str, VillagerRecord> = catalog
        .villagers
        .iter()
        .map(|v| {
            (
                v.name.as_str(),
                VillagerRecord {
                    enchantments: v.enchantments.clone(),
                },
            )
        })
        .collect();
    let list = EnchantmentList {
        villager_enchantments: catalog.required.clone(),
    };

    for path in [villagers_path.as_ref(), enchantments_path.as_ref()] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    std::fs::write(&villagers_path, serde_json::to_string_pretty(&records)?).with_context(|| {
        format!("Failed to write villager file: {}", villagers_path.as_ref().display())
    })?;
    std::fs::write(&enchantments_path, serde_json::to_string_pretty(&list)?).with_context(|| {
        format!("Failed to write enchantment file: {}", enchantments_path.as_ref().display())
    })?;

    Ok(())
}

/// A small catalog used by `setup` and in tests
pub fn example_catalog() -> Catalog {
    Catalog::new(
        vec![
            Villager::new("Ash", [("Mending", 14), ("Silk Touch", 22), ("Efficiency V", 30)]),
            Villager::new("Birch", [("Unbreaking III", 17), ("Protection IV", 25)]),
            Villager::new("Cedar", [("Mending", 9), ("Unbreaking III", 11)]),
            Villager::new("Dusk", [("Protection IV", 19), ("Feather Falling IV", 21)]),
            Villager::new("Elm", [("Efficiency V", 12), ("Fortune III", 28), ("Sharpness V", 33)]),
            Villager::new("Fern", [("Sharpness V", 18), ("Looting III", 24)]),
            Villager::new("Gale", [("Silk Touch", 15)]),
        ],
        [
            "Mending",
            "Silk Touch",
            "Efficiency V",
            "Unbreaking III",
            "Protection IV",
            "Feather Falling IV",
            "Fortune III",
            "Sharpness V",
            "Looting III",
            "Depth Strider III",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    )
}

/// Create example data files for a fresh project
pub fn create_example_data<P: AsRef<Path>>(output_dir: P) -> Result<()> {
    let dir = output_dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    save_catalog(
        &example_catalog(),
        dir.join("named_villagers.json"),
        dir.join("enchantments.json"),
    )
    .context("Failed to write example data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn aliases() -> BTreeMap<String, String> {
        BTreeMap::from([("Unbreaking 3".to_string(), "Unbreaking III".to_string())])
    }

    #[test]
    fn test_normalize_name() {
        let aliases = aliases();
        assert_eq!(normalize_name(" Unbreaking 3 ", &aliases), "Unbreaking III");
        assert_eq!(normalize_name("unbreaking 3", &aliases), "Unbreaking III");
        assert_eq!(normalize_name("Mending", &aliases), "Mending");
    }

    #[test]
    fn test_parse_villagers_applies_aliases() {
        let content = r#"{
            "Steve": {"enchantments": {"Mending": 12, "Unbreaking 3": 20}},
            "Alex": {"enchantments": {}}
        }"#;
        let villagers = parse_villagers(content, &aliases()).unwrap();

        assert_eq!(villagers.len(), 2);
        assert_eq!(villagers[0].name, "Alex");
        assert_eq!(villagers[1].price("Unbreaking III"), Some(20));
        assert!(!villagers[1].offers("Unbreaking 3"));
    }

    #[test]
    fn test_aliased_duplicate_keeps_cheaper_offer() {
        // Cheaper spelling read second, then first.
        let content = r#"{
            "Steve": {"enchantments": {"Unbreaking III": 9, "Unbreaking 3": 20}},
            "Alex": {"enchantments": {"Unbreaking III": 30, "Unbreaking 3": 7}}
        }"#;
        let villagers = parse_villagers(content, &aliases()).unwrap();
        assert_eq!(villagers[0].name, "Alex");
        assert_eq!(villagers[0].price("Unbreaking III"), Some(7));
        assert_eq!(villagers[1].price("Unbreaking III"), Some(9));
        assert_eq!(villagers[1].enchantments.len(), 1);
    }

    #[test]
    fn test_parse_required() {
        let content = r#"{"villager_enchantments": ["Mending", "Unbreaking 3"]}"#;
        let required = parse_required(content, &aliases()).unwrap();
        assert_eq!(required, vec!["Mending", "Unbreaking III"]);
    }

    #[test]
    fn test_invalid_input() {
        assert!(parse_villagers("not json", &BTreeMap::new()).is_err());
        assert!(parse_villagers(r#"{"Steve": {"enchantments": {"Mending": -1}}}"#, &BTreeMap::new()).is_err());
        assert!(parse_required(r#"{"other": []}"#, &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_example_data_loads() {
        let temp_dir = tempdir().unwrap();
        create_example_data(temp_dir.path()).unwrap();

        let input = InputConfig {
            format: InputFormat::VillagerKeyed,
            villagers_file: temp_dir.path().join("named_villagers.json"),
            enchantments_file: temp_dir.path().join("enchantments.json"),
            aliases: BTreeMap::new(),
        };
        let catalog = load_catalog(&input).unwrap();

        assert_eq!(catalog, example_catalog());
        assert_eq!(catalog.missing_enchantments(), vec!["Depth Strider III"]);
    }

    #[test]
    fn test_load_rejects_duplicate_required() {
        let temp_dir = tempdir().unwrap();
        let villagers_file = temp_dir.path().join("v.json");
        let enchantments_file = temp_dir.path().join("e.json");
        std::fs::write(&villagers_file, r#"{"Steve": {"enchantments": {"Mending": 1}}}"#).unwrap();
        std::fs::write(
            &enchantments_file,
            r#"{"villager_enchantments": ["Mending", "Unbreaking 3", "Unbreaking III"]}"#,
        )
        .unwrap();

        let input = InputConfig {
            format: InputFormat::VillagerKeyed,
            villagers_file,
            enchantments_file,
            aliases: aliases(),
        };
        assert!(load_catalog(&input).is_err());
    }

    #[test]
    fn test_parse_enchantment_keyed() {
        let content = r#"{
            "Mending": {"12": 9, "17": 14},
            "Unbreaking 3": {"17": 11},
            "Unbreaking III": {"17": 8, "3": 30},
            "Depth Strider III": {}
        }"#;
        let (villagers, required) = parse_enchantment_keyed(content, &aliases()).unwrap();

        assert_eq!(villagers.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(), vec!["12", "17", "3"]);
        assert_eq!(villagers[1].price("Mending"), Some(14));
        assert_eq!(villagers[1].price("Unbreaking III"), Some(8));
        assert_eq!(villagers[2].price("Unbreaking III"), Some(30));
        assert_eq!(required.len(), 3);
        assert!(required.contains(&"Depth Strider III".to_string()));
    }

    #[test]
    fn test_load_enchantment_keyed_catalog() {
        let temp_dir = tempdir().unwrap();
        let villagers_file = temp_dir.path().join("trades.json");
        std::fs::write(
            &villagers_file,
            r#"{"Mending": {"12": 9}, "Silk Touch": {"12": 20, "40": 15}, "Looting III": {}}"#,
        )
        .unwrap();

        let input = InputConfig {
            format: InputFormat::EnchantmentKeyed,
            villagers_file,
            enchantments_file: temp_dir.path().join("not_read.json"),
            aliases: BTreeMap::new(),
        };
        let catalog = load_catalog(&input).unwrap();

        assert_eq!(catalog.villagers.len(), 2);
        assert_eq!(catalog.required.len(), 3);
        assert_eq!(catalog.missing_enchantments(), vec!["Looting III"]);
        assert_eq!(catalog.villager("40").and_then(|v| v.price("Silk Touch")), Some(15));
    }
}
