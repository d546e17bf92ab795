//! Configuration settings for the villager optimizer

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub input: InputConfig,
    pub solver: SolverConfig,
    pub pricing: PricingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Layout of `villagers_file`
    #[serde(default)]
    pub format: InputFormat,
    pub villagers_file: PathBuf,
    /// Required enchantment list; unused for the enchantment-keyed layout
    pub enchantments_file: PathBuf,
    /// Alternative spellings mapped to canonical enchantment names
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// How the villager file is keyed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// `{"Steve": {"enchantments": {"Mending": 12}}}` plus a separate required list
    #[default]
    VillagerKeyed,
    /// `{"Mending": {"12": 9}}`; every key is required
    EnchantmentKeyed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub strategy: SolverStrategy,
    /// Search time limit; 0 disables it
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolverStrategy {
    Exact,
    Greedy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Offers above this price are treated as unavailable
    #[serde(default)]
    pub max_price: Option<u32>,
    /// Extra villagers are recommended when they undercut the plan by more than this
    pub bargain_margin: u32,
    pub keep_bargains: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub save: bool,
    pub output_directory: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: InputConfig {
                format: InputFormat::VillagerKeyed,
                villagers_file: PathBuf::from("data/named_villagers.json"),
                enchantments_file: PathBuf::from("data/enchantments.json"),
                aliases: BTreeMap::new(),
            },
            solver: SolverConfig {
                strategy: SolverStrategy::Exact,
                timeout_seconds: 60,
            },
            pricing: PricingConfig {
                max_price: None,
                bargain_margin: 5,
                keep_bargains: false,
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                save: false,
                output_directory: PathBuf::from("output"),
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    ///
    /// Only parses; call [`validate`](Self::validate) once overrides are merged.
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.pricing.max_price == Some(0) {
            anyhow::bail!("Maximum price must be positive when set");
        }

        if !self.input.villagers_file.exists() {
            anyhow::bail!(
                "Villager file does not exist: {}",
                self.input.villagers_file.display()
            );
        }

        if self.input.format == InputFormat::VillagerKeyed && !self.input.enchantments_file.exists() {
            anyhow::bail!(
                "Enchantment file does not exist: {}",
                self.input.enchantments_file.display()
            );
        }

        for (alias, canonical) in &self.input.aliases {
            if alias.trim().is_empty() || canonical.trim().is_empty() {
                anyhow::bail!("Aliases cannot map to or from an empty name");
            }
        }

        Ok(())
    }

    /// Search time limit, if any
    pub fn timeout(&self) -> Option<Duration> {
        match self.solver.timeout_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(input_format) = cli_overrides.input_format {
            self.input.format = input_format;
        }
        if let Some(ref villagers_file) = cli_overrides.villagers_file {
            self.input.villagers_file = villagers_file.clone();
        }
        if let Some(ref enchantments_file) = cli_overrides.enchantments_file {
            self.input.enchantments_file = enchantments_file.clone();
        }
        if let Some(strategy) = cli_overrides.strategy {
            self.solver.strategy = strategy;
        }
        if let Some(timeout_seconds) = cli_overrides.timeout_seconds {
            self.solver.timeout_seconds = timeout_seconds;
        }
        if let Some(max_price) = cli_overrides.max_price {
            self.pricing.max_price = Some(max_price);
        }
        if cli_overrides.keep_bargains {
            self.pricing.keep_bargains = true;
        }
        if let Some(format) = cli_overrides.format {
            self.output.format = format;
        }
        if let Some(ref output_dir) = cli_overrides.output_dir {
            self.output.output_directory = output_dir.clone();
            self.output.save = true;
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub input_format: Option<InputFormat>,
    pub villagers_file: Option<PathBuf>,
    pub enchantments_file: Option<PathBuf>,
    pub strategy: Option<SolverStrategy>,
    pub timeout_seconds: Option<u64>,
    pub max_price: Option<u32>,
    pub keep_bargains: bool,
    pub format: Option<OutputFormat>,
    pub output_dir: Option<PathBuf>,
}
