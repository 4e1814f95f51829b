//! Analyze command - Code-quality review of one C# file

use crate::config::load_app_config;
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use csjava_core::{AnalysisResult, Converter};
use std::path::Path;

pub async fn run(file: &Path) -> Result<()> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    if code.trim().is_empty() {
        anyhow::bail!("{} is empty", file.display());
    }
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    println!("{}", format!("🔍 Analyzing {}...", filename).cyan().bold());

    let config = load_app_config()?;
    let converter = Converter::from_config(&config).context("Failed to create converter")?;

    let analysis = converter
        .analyze(&code, &filename)
        .await
        .context("An error occurred during analysis")?;

    print_analysis(&analysis);
    Ok(())
}

fn severity(level: &str) -> ColoredString {
    match level {
        "high" => level.red().bold(),
        "medium" => level.yellow(),
        _ => level.green(),
    }
}

fn print_analysis(analysis: &AnalysisResult) {
    println!();
    println!(
        "  Complexity: {}/10  Quality: {}/100",
        analysis.complexity_score.to_string().cyan(),
        analysis.quality_score.to_string().cyan()
    );
    if !analysis.summary.is_empty() {
        println!("  {}", analysis.summary);
    }

    if !analysis.code_patterns.is_empty() {
        println!();
        println!("{}", "Patterns:".cyan().bold());
        println!("  {}", analysis.code_patterns.join(", "));
    }

    if !analysis.issues.is_empty() {
        println!();
        println!("{}", "Potential issues:".cyan().bold());
        for issue in &analysis.issues {
            println!(
                "  [{}] {}: {}",
                severity(&issue.severity),
                issue.kind,
                issue.description
            );
            if !issue.line_info.is_empty() {
                println!("      {}", issue.line_info.dimmed());
            }
        }
    }

    if !analysis.suggestions.is_empty() {
        println!();
        println!("{}", "Refactoring suggestions:".cyan().bold());
        for suggestion in &analysis.suggestions {
            println!(
                "  [{}] {}: {}",
                severity(&suggestion.priority),
                suggestion.category,
                suggestion.text
            );
            if !suggestion.benefit.is_empty() {
                println!("      💡 {}", suggestion.benefit.dimmed());
            }
        }
    }

    if !analysis.java_conversion_notes.is_empty() {
        println!();
        println!("{}", "Java conversion notes:".cyan().bold());
        for (i, note) in analysis.java_conversion_notes.iter().enumerate() {
            println!("  {}. {}", i + 1, note);
        }
    }

    let metrics = &analysis.metrics;
    let fields = [
        ("Lines of code", metrics.lines_of_code.map(|v| v.to_string())),
        ("Methods", metrics.methods_count.map(|v| v.to_string())),
        ("Classes", metrics.classes_count.map(|v| v.to_string())),
        ("Maintainability", metrics.estimated_maintainability.clone()),
    ];
    if fields.iter().any(|(_, value)| value.is_some()) {
        println!();
        println!("{}", "Metrics:".cyan().bold());
        for (label, value) in fields {
            if let Some(value) = value {
                println!("  {}: {}", label, value);
            }
        }
    }
}
