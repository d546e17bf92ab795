//! Display and output formatting utilities

use crate::config::OutputFormat;
use crate::market::{Catalog, Offer};
use crate::optimize::{Plan, PlanStatus};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::path::Path;

/// Format plans and catalog coverage for display
pub struct PlanFormatter;

impl PlanFormatter {
    /// Format a plan for console output
    pub fn format_plan(plan: &Plan, catalog: &Catalog) -> String {
        let mut output = String::new();
        let width = catalog
            .villagers
            .iter()
            .map(|v| v.name.len())
            .max()
            .unwrap_or(0);

        output.push_str(&format!("Status: {}\n", Self::status_label(plan.status)));
        output.push_str(&format!(
            "Kept {} of {} villagers, solve time {:.3}s\n",
            plan.kept.len(),
            catalog.villagers.len(),
            plan.solve_time.as_secs_f64()
        ));

        output.push_str("\nKept villagers:\n");
        for (i, kept) in plan.kept.iter().enumerate() {
            let offers = kept
                .enchantments
                .iter()
                .map(|(enchantment, price)| format!("{} ({})", enchantment, price))
                .join(", ");
            output.push_str(&format!("{:>2}. {:<width$} : {}\n", i + 1, kept.name, offers));
        }

        output.push_str("\nRemoved villagers:\n");
        if plan.removed.is_empty() {
            output.push_str("    (none)\n");
        }
        for (i, name) in plan.removed.iter().enumerate() {
            let offers = catalog
                .villager(name)
                .map(|v| {
                    v.enchantments
                        .iter()
                        .map(|(enchantment, price)| format!("{} ({})", enchantment, price))
                        .join(", ")
                })
                .unwrap_or_default();
            output.push_str(&format!("{:>2}. {:<width$} : {}\n", i + 1, name, offers));
        }

        if !plan.missing.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                ColorOutput::warning("Not sold by any villager:")
            ));
            for enchantment in &plan.missing {
                output.push_str(&format!("  - {}\n", enchantment));
            }
        }

        if !plan.bargains.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                ColorOutput::emphasis("Also worth keeping for the price:")
            ));
            output.push_str(&Self::format_offers(&plan.bargains));
        }

        output.push_str(&format!(
            "\nCheapest kept offers ({} emeralds total):\n",
            plan.total_price()
        ));
        output.push_str(&Self::format_offers(&plan.assignments));

        output
    }

    /// One line per offer
    pub fn format_offers(offers: &[Offer]) -> String {
        let width = offers.iter().map(|o| o.enchantment.len()).max().unwrap_or(0);
        offers
            .iter()
            .map(|o| format!("  {:<width$} : {} ({})\n", o.enchantment, o.villager, o.price))
            .collect()
    }

    /// Short one-line description of a plan
    pub fn format_plan_summary(plan: &Plan) -> String {
        let summary = plan.summary();
        format!(
            "{} | kept {} | removed {} | covered {} | missing {} | {} emeralds | {}ms",
            Self::status_label(summary.status),
            summary.kept_count,
            summary.removed_count,
            summary.covered_count,
            summary.missing_count,
            summary.total_price,
            summary.solve_time_ms
        )
    }

    /// Numbered table of who sells each required enchantment
    pub fn format_coverage(catalog: &Catalog) -> String {
        let mut output = String::new();
        let coverage = catalog.coverage();
        let width = coverage
            .iter()
            .map(|entry| entry.enchantment.len())
            .max()
            .unwrap_or(0);

        for (i, entry) in coverage.iter().enumerate() {
            let holders = if entry.is_missing() {
                ColorOutput::error("None")
            } else {
                entry
                    .holders
                    .iter()
                    .map(|(villager, price)| format!("{} ({})", villager, price))
                    .join(", ")
            };
            output.push_str(&format!(
                "{:>2}. {:<width$} : {}\n",
                i + 1,
                entry.enchantment,
                holders
            ));
        }

        output
    }

    /// List of required enchantments nobody sells, or a success line
    pub fn format_missing(catalog: &Catalog) -> String {
        let missing = catalog.missing_enchantments();
        if missing.is_empty() {
            return ColorOutput::success("All enchantments are covered by the villagers!");
        }

        let mut output = ColorOutput::warning("Missing enchantments from villagers:");
        output.push('\n');
        for enchantment in missing {
            output.push_str(&format!("- {}\n", enchantment));
        }
        output
    }

    fn status_label(status: PlanStatus) -> &'static str {
        match status {
            PlanStatus::Optimal => "optimal",
            PlanStatus::BestEffort => "best effort (not proven minimal)",
            PlanStatus::Greedy => "greedy",
            PlanStatus::Empty => "nothing to cover",
        }
    }

    /// Render a plan for the console in the configured format; CSV is file-only and prints as text
    pub fn render_plan(plan: &Plan, catalog: &Catalog, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => plan.to_json().context("Failed to serialize plan"),
            OutputFormat::Text | OutputFormat::Csv => Ok(Self::format_plan(plan, catalog)),
        }
    }

    /// Save a plan to the output directory in the configured format
    pub fn save_plan<P: AsRef<Path>>(
        plan: &Plan,
        catalog: &Catalog,
        output_dir: P,
        format: OutputFormat,
    ) -> Result<()> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

        match format {
            OutputFormat::Text => {
                let content = Self::format_plan(plan, catalog);
                std::fs::write(output_dir.join("plan.txt"), content)
                    .context("Failed to write plan.txt")?;
            }
            OutputFormat::Json => {
                plan.save_to_file(output_dir.join("plan.json"))
                    .context("Failed to write plan.json")?;

                std::fs::write(
                    output_dir.join("removed_villagers.json"),
                    serde_json::to_string_pretty(&plan.removed)?,
                )
                .context("Failed to write removed_villagers.json")?;

                std::fs::write(
                    output_dir.join("missing_enchantments.json"),
                    serde_json::to_string_pretty(&plan.missing)?,
                )
                .context("Failed to write missing_enchantments.json")?;
            }
            OutputFormat::Csv => {
                let mut optimized = String::from("Enchantment,Villager,Cost\n");
                for offer in &plan.assignments {
                    optimized.push_str(&format!(
                        "{},{},{}\n",
                        csv_field(&offer.enchantment),
                        csv_field(&offer.villager),
                        offer.price
                    ));
                }
                std::fs::write(output_dir.join("optimized_villagers.csv"), optimized)
                    .context("Failed to write optimized_villagers.csv")?;

                std::fs::write(
                    output_dir.join("disposable_villagers.csv"),
                    csv_column("Villager", &plan.removed),
                )
                .context("Failed to write disposable_villagers.csv")?;

                std::fs::write(
                    output_dir.join("missing_enchantments.csv"),
                    csv_column("Enchantment", &plan.missing),
                )
                .context("Failed to write missing_enchantments.csv")?;
            }
        }

        Ok(())
    }
}

/// Quote a CSV field when it holds a separator, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Single-column CSV with a header row
fn csv_column(header: &str, values: &[String]) -> String {
    std::iter::once(header.to_string())
        .chain(values.iter().map(|value| csv_field(value)))
        .map(|line| line + "\n")
        .collect()
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    /// Check if terminal supports color
    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() && (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }

    /// Highlight for recommendations
    pub fn emphasis(text: &str) -> String {
        Self::colored(text, Color::Cyan)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
            Color::Cyan => 36,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::market::example_catalog;
    use crate::optimize::OptimizationProblem;
    use tempfile::tempdir;

    fn solved() -> (Plan, Catalog) {
        let catalog = example_catalog();
        let problem = OptimizationProblem::with_catalog(Settings::default(), catalog.clone()).unwrap();
        let (plan, _) = problem.solve().unwrap();
        (plan, catalog)
    }

    #[test]
    fn test_plan_formatting() {
        let (plan, catalog) = solved();
        let text = PlanFormatter::format_plan(&plan, &catalog);

        assert!(text.contains("Status: optimal"));
        assert!(text.contains("Kept 5 of 7 villagers"));
        assert!(text.contains("Removed villagers:"));
        assert!(text.contains("Depth Strider III"));
        assert!(text.contains(" 1. "));
    }

    #[test]
    fn test_coverage_formatting() {
        let catalog = example_catalog();
        let text = PlanFormatter::format_coverage(&catalog);

        assert_eq!(text.lines().count(), catalog.required.len());
        assert!(text.contains("Mending"));
        assert!(text.contains("Cedar (9)"));
        assert!(text.contains("None"));
    }

    #[test]
    fn test_missing_formatting() {
        let text = PlanFormatter::format_missing(&example_catalog());
        assert!(text.contains("- Depth Strider III"));
    }

    #[test]
    fn test_summary_line() {
        let (plan, _) = solved();
        let line = PlanFormatter::format_plan_summary(&plan);
        assert!(line.starts_with("optimal | kept 5"));
    }

    #[test]
    fn test_save_plan_json() {
        let (plan, catalog) = solved();
        let temp_dir = tempdir().unwrap();
        PlanFormatter::save_plan(&plan, &catalog, temp_dir.path(), OutputFormat::Json).unwrap();

        assert!(temp_dir.path().join("plan.json").exists());
        let removed: Vec<String> = serde_json::from_str(
            &std::fs::read_to_string(temp_dir.path().join("removed_villagers.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(removed, plan.removed);
    }

    #[test]
    fn test_save_plan_text() {
        let (plan, catalog) = solved();
        let temp_dir = tempdir().unwrap();
        PlanFormatter::save_plan(&plan, &catalog, temp_dir.path(), OutputFormat::Text).unwrap();
        assert!(temp_dir.path().join("plan.txt").exists());
    }

    #[test]
    fn test_save_plan_csv() {
        let (plan, catalog) = solved();
        let temp_dir = tempdir().unwrap();
        PlanFormatter::save_plan(&plan, &catalog, temp_dir.path(), OutputFormat::Csv).unwrap();

        let optimized =
            std::fs::read_to_string(temp_dir.path().join("optimized_villagers.csv")).unwrap();
        let mut lines = optimized.lines();
        assert_eq!(lines.next(), Some("Enchantment,Villager,Cost"));
        assert_eq!(lines.count(), plan.assignments.len());
        assert!(optimized.contains("Looting III,Fern,24"));

        let disposable =
            std::fs::read_to_string(temp_dir.path().join("disposable_villagers.csv")).unwrap();
        assert_eq!(disposable.lines().count(), plan.removed.len() + 1);

        let missing =
            std::fs::read_to_string(temp_dir.path().join("missing_enchantments.csv")).unwrap();
        assert_eq!(missing, "Enchantment\nDepth Strider III\n");
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("Mending"), "Mending");
        assert_eq!(csv_field("Smith, the elder"), "\"Smith, the elder\"");
        assert_eq!(csv_field("Say \"hi\""), "\"Say \"\"hi\"\"\"");
    }

    #[test]
    fn test_render_plan_json() {
        let (plan, catalog) = solved();
        let json = PlanFormatter::render_plan(&plan, &catalog, OutputFormat::Json).unwrap();
        let parsed = Plan::from_json(&json).unwrap();
        assert_eq!(parsed.kept, plan.kept);

        let text = PlanFormatter::render_plan(&plan, &catalog, OutputFormat::Csv).unwrap();
        assert!(text.contains("Status: optimal"));
    }

    #[test]
    fn test_color_output() {
        let colored = ColorOutput::colored("test", Color::Red);
        assert!(colored.contains("test"));

        let success = ColorOutput::success("OK");
        assert!(success.contains("OK"));
    }
}
