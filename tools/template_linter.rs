/// Template Linter — checks a base template against the replacement rules.
///
/// Usage: template_linter <template.md> [--rules <rules.ron>] [--marker <text>]

use clap::Parser;
use heroine_builder::core::lint::lint_template;
use heroine_builder::core::splice::DEFAULT_MARKER;
use heroine_builder::schema::rule::RuleSet;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "template_linter", about = "Validate a base template against the rule table")]
struct Cli {
    /// Base template to check
    template: PathBuf,

    /// RON rule table (default: built-in table)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Section marker expected exactly once
    #[arg(long)]
    marker: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let template = std::fs::read_to_string(&cli.template).unwrap_or_else(|e| {
        eprintln!("ERROR: Failed to read template '{}': {}", cli.template.display(), e);
        process::exit(1);
    });

    let rules = match &cli.rules {
        Some(path) => RuleSet::load_from_ron(path),
        None => RuleSet::builtin(),
    }
    .unwrap_or_else(|e| {
        eprintln!("ERROR: Failed to load rules: {}", e);
        process::exit(1);
    });

    let marker = cli.marker.as_deref().unwrap_or(DEFAULT_MARKER);
    println!("Loaded {} replacement rules", rules.len());

    let report = lint_template(&template, &rules, marker);
    let (errors, warnings) = (&report.errors, &report.warnings);

    println!("\n=== Template Lint Report ===\n");

    if report.is_clean() {
        println!("All checks passed!");
    }

    for warning in warnings {
        println!("WARNING: {}", warning);
    }

    for error in errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
}
