//! Main CLI application for the villager enchantment optimizer

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use villager_optimizer::{
    config::{CliOverrides, InputFormat, OutputFormat, Settings, SolverStrategy},
    market::{create_example_data, load_catalog},
    optimize::{OptimizationProblem, Plan, PlanValidator},
    utils::{ColorOutput, PlanFormatter},
};

#[derive(Parser)]
#[command(name = "villager_optimizer")]
#[command(about = "Keep the fewest villagers that still sell every enchantment")]
#[command(version = "0.1.0")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the smallest set of villagers covering all enchantments
    Optimize {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Villager file (overrides config)
        #[arg(long)]
        villagers: Option<PathBuf>,

        /// Enchantment file (overrides config)
        #[arg(long)]
        enchantments: Option<PathBuf>,

        /// Villager file layout: villager-keyed or enchantment-keyed (overrides config)
        #[arg(long, value_parser = parse_input_format)]
        input_format: Option<InputFormat>,

        /// Use the greedy heuristic instead of the exact search
        #[arg(long)]
        greedy: bool,

        /// Search time limit in seconds, 0 for none (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Ignore offers above this price (overrides config)
        #[arg(long)]
        max_price: Option<u32>,

        /// Recommend extra villagers with much cheaper offers
        #[arg(long)]
        bargains: bool,

        /// Console and saved plan format: text, json or csv (csv is saved only, console shows text)
        #[arg(long, value_parser = parse_format)]
        format: Option<OutputFormat>,

        /// Save the plan to this directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show search statistics
        #[arg(long)]
        stats: bool,
    },

    /// Show which villagers sell each required enchantment
    Coverage {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Villager file (overrides config)
        #[arg(long)]
        villagers: Option<PathBuf>,

        /// Enchantment file (overrides config)
        #[arg(long)]
        enchantments: Option<PathBuf>,

        /// Villager file layout (overrides config)
        #[arg(long, value_parser = parse_input_format)]
        input_format: Option<InputFormat>,
    },

    /// Check a selection of villagers
    Validate {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Comma-separated villager names
        #[arg(short, long, value_delimiter = ',', required_unless_present = "plan")]
        keep: Vec<String>,

        /// Check the kept villagers of a saved plan.json instead
        #[arg(short, long, conflicts_with = "keep")]
        plan: Option<PathBuf>,
    },

    /// Create example configuration and data files
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        "csv" => Ok(OutputFormat::Csv),
        other => Err(format!("unknown format '{}', expected text, json or csv", other)),
    }
}

fn parse_input_format(value: &str) -> Result<InputFormat, String> {
    match value {
        "villager-keyed" => Ok(InputFormat::VillagerKeyed),
        "enchantment-keyed" => Ok(InputFormat::EnchantmentKeyed),
        other => Err(format!(
            "unknown input format '{}', expected villager-keyed or enchantment-keyed",
            other
        )),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Optimize {
            config,
            villagers,
            enchantments,
            input_format,
            greedy,
            timeout,
            max_price,
            bargains,
            format,
            output,
            stats,
        } => {
            let overrides = CliOverrides {
                input_format,
                villagers_file: villagers,
                enchantments_file: enchantments,
                strategy: greedy.then_some(SolverStrategy::Greedy),
                timeout_seconds: timeout,
                max_price,
                keep_bargains: bargains,
                format,
                output_dir: output,
            };
            optimize_command(&config, &overrides, stats)
        }
        Commands::Coverage {
            config,
            villagers,
            enchantments,
            input_format,
        } => {
            let overrides = CliOverrides {
                input_format,
                villagers_file: villagers,
                enchantments_file: enchantments,
                ..CliOverrides::default()
            };
            coverage_command(&config, &overrides)
        }
        Commands::Validate { config, keep, plan } => validate_command(&config, &keep, plan.as_deref()),
        Commands::Setup { directory, force } => setup_command(directory, force),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Load the config file if present, apply overrides and validate
fn load_settings(config_path: &Path, overrides: &CliOverrides) -> Result<Settings> {
    let mut settings = if config_path.exists() {
        Settings::from_file(&config_path.to_path_buf())
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        log::warn!("Config file {} not found, using defaults", config_path.display());
        Settings::default()
    };

    settings.merge_with_cli(overrides);
    settings.validate().context("Configuration validation failed")?;
    Ok(settings)
}

fn optimize_command(config_path: &Path, overrides: &CliOverrides, show_stats: bool) -> Result<()> {
    let settings = load_settings(config_path, overrides)?;
    let problem = OptimizationProblem::new(settings.clone()).context("Failed to set up problem")?;
    let json_console = settings.output.format == OutputFormat::Json;

    if show_stats {
        if json_console {
            log::info!("{}", problem.statistics());
        } else {
            println!("{}", problem.statistics());
        }
    }

    log::info!("Optimizing villager set...");
    let (plan, stats) = problem.solve().context("Failed to optimize villagers")?;

    if !json_console {
        println!(
            "{}",
            ColorOutput::success("Optimized villager set (minimum number of villagers to cover all enchantments):")
        );
    }
    println!(
        "{}",
        PlanFormatter::render_plan(&plan, problem.catalog(), settings.output.format)?
    );

    if show_stats {
        let summary = PlanFormatter::format_plan_summary(&plan);
        if json_console {
            log::info!("{}", summary);
        } else {
            println!("{}", summary);
            if let Some(stats) = stats {
                println!("\n{}", stats);
            }
        }
    }

    if settings.output.save {
        PlanFormatter::save_plan(
            &plan,
            problem.catalog(),
            &settings.output.output_directory,
            settings.output.format,
        )
        .context("Failed to save plan")?;
        let message = format!("Plan saved to {}", settings.output.output_directory.display());
        if json_console {
            log::info!("{}", message);
        } else {
            println!("{}", ColorOutput::success(&message));
        }
    }

    Ok(())
}

fn coverage_command(config_path: &Path, overrides: &CliOverrides) -> Result<()> {
    let settings = load_settings(config_path, overrides)?;
    let catalog = load_catalog(&settings.input)?;

    println!("{}", PlanFormatter::format_missing(&catalog));
    println!("\n{}", ColorOutput::info("Enchantment coverage:"));
    print!("{}", PlanFormatter::format_coverage(&catalog));

    Ok(())
}

/// Names to validate: the `--keep` list, or the kept villagers of a saved plan
fn selection_to_validate(keep: &[String], plan_path: Option<&Path>) -> Result<Vec<String>> {
    match plan_path {
        Some(path) => {
            let plan = Plan::load_from_file(path)
                .with_context(|| format!("Failed to load plan from {}", path.display()))?;
            Ok(plan.kept_names().into_iter().map(str::to_string).collect())
        }
        None => Ok(keep.iter().map(|name| name.trim().to_string()).collect()),
    }
}

fn validate_command(config_path: &Path, keep: &[String], plan_path: Option<&Path>) -> Result<()> {
    let settings = load_settings(config_path, &CliOverrides::default())?;
    let problem = OptimizationProblem::new(settings)?;

    let selection = selection_to_validate(keep, plan_path)?;
    let result = PlanValidator::new(problem.masks())
        .validate(&selection)
        .context("Validation failed")?;

    println!("{}", result);

    if result.is_valid {
        println!("{}", ColorOutput::success("Selection is minimal and complete!"));
    } else {
        println!("{}", ColorOutput::error("Selection is not a minimal cover"));
    }

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("Setting up project structure..."));

    let config_dir = directory.join("config");
    let data_dir = directory.join("data");
    let output_dir = directory.join("output");

    for dir in [&config_dir, &data_dir, &output_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        let mut settings = Settings::default();
        settings.input.villagers_file = data_dir.join("named_villagers.json");
        settings.input.enchantments_file = data_dir.join("enchantments.json");
        settings.output.output_directory = output_dir.clone();
        settings
            .to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    if !data_dir.join("named_villagers.json").exists() || force {
        create_example_data(&data_dir).context("Failed to create example data")?;
        println!("Created example data in: {}", data_dir.display());
    } else {
        println!("Skipped: example data (already exists)");
    }

    println!("\n{}", ColorOutput::success("Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit your villagers in {}", data_dir.join("named_villagers.json").display());
    println!("2. List the enchantments you need in {}", data_dir.join("enchantments.json").display());
    println!("3. Run: villager_optimizer optimize --config {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "villager_optimizer",
            "optimize",
            "--config",
            "test.yaml",
            "--max-price",
            "20",
            "--format",
            "json",
        ]);
        assert!(cli.is_ok());

        let cli = Cli::try_parse_from(["villager_optimizer", "-vv", "validate", "--keep", "Ash,Elm"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Validate { keep, .. } => assert_eq!(keep, vec!["Ash", "Elm"]),
            _ => panic!("expected validate command"),
        }
    }

    #[test]
    fn test_bad_format_rejected() {
        let cli = Cli::try_parse_from(["villager_optimizer", "optimize", "--format", "csv"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_setup_then_optimize() {
        let temp_dir = tempdir().unwrap();
        setup_command(temp_dir.path().to_path_buf(), false).unwrap();

        let config_path = temp_dir.path().join("config/default.yaml");
        assert!(config_path.exists());
        assert!(temp_dir.path().join("data/named_villagers.json").exists());

        let settings = load_settings(&config_path, &CliOverrides::default()).unwrap();
        let problem = OptimizationProblem::new(settings).unwrap();
        let (plan, _) = problem.solve().unwrap();
        assert_eq!(plan.kept.len(), 5);
    }

    #[test]
    fn test_file_overrides_apply_before_validation() {
        let temp_dir = tempdir().unwrap();
        setup_command(temp_dir.path().to_path_buf(), false).unwrap();

        let config_path = temp_dir.path().join("config/default.yaml");
        let moved = temp_dir.path().join("elsewhere.json");
        std::fs::rename(temp_dir.path().join("data/named_villagers.json"), &moved).unwrap();
        assert!(load_settings(&config_path, &CliOverrides::default()).is_err());

        let overrides = CliOverrides {
            villagers_file: Some(moved.clone()),
            ..CliOverrides::default()
        };
        let settings = load_settings(&config_path, &overrides).unwrap();
        assert_eq!(settings.input.villagers_file, moved);
    }

    #[test]
    fn test_input_format_and_plan_flags() {
        let cli = Cli::try_parse_from([
            "villager_optimizer",
            "coverage",
            "--input-format",
            "enchantment-keyed",
        ])
        .unwrap();
        match cli.command {
            Commands::Coverage { input_format, .. } => {
                assert_eq!(input_format, Some(InputFormat::EnchantmentKeyed))
            }
            _ => panic!("expected coverage command"),
        }

        assert!(Cli::try_parse_from(["villager_optimizer", "validate"]).is_err());
        assert!(Cli::try_parse_from(["villager_optimizer", "validate", "--plan", "plan.json"]).is_ok());
        assert!(Cli::try_parse_from(["villager_optimizer", "optimize", "--format", "csv"]).is_ok());
    }

    #[test]
    fn test_selection_from_saved_plan() {
        let temp_dir = tempdir().unwrap();
        setup_command(temp_dir.path().to_path_buf(), false).unwrap();
        let config_path = temp_dir.path().join("config/default.yaml");
        let problem =
            OptimizationProblem::new(load_settings(&config_path, &CliOverrides::default()).unwrap()).unwrap();
        let (plan, _) = problem.solve().unwrap();

        let plan_path = temp_dir.path().join("output/plan.json");
        plan.save_to_file(&plan_path).unwrap();

        let selection = selection_to_validate(&[], Some(plan_path.as_path())).unwrap();
        assert_eq!(selection.len(), 5);
        let result = PlanValidator::new(problem.masks()).validate(&selection).unwrap();
        assert!(result.is_valid);

        let typed = selection_to_validate(&[" Ash ".to_string()], None).unwrap();
        assert_eq!(typed, vec!["Ash"]);
    }
}
