//! Convert command - Translate C# files or project archives to Java

use crate::config::load_app_config;
use anyhow::{Context, Result};
use colored::Colorize;
use csjava_core::archive::{extract_uploads, package_translations_only, repackage};
use csjava_core::{ConversionBatch, ConversionOptions, Converter, CoreError, Upload};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct ConvertOptions {
    pub paths: Vec<PathBuf>,
    pub out: PathBuf,
    pub java_only: bool,
    pub conversion: ConversionOptions,
}

pub async fn run(options: ConvertOptions) -> Result<()> {
    println!("{}", "☕ Converting C# to Java...".cyan().bold());

    let config = load_app_config()?;
    let converter = Converter::from_config(&config).context("Failed to create converter")?;

    let uploads = read_uploads(&options.paths).await?;
    let extraction = extract_uploads(&uploads, converter.suffixes(), &config.text_extensions);
    for warning in &extraction.warnings {
        println!("  {} {}", "⚠️".yellow(), warning.yellow());
    }
    println!(
        "  📄 {} source file(s) found",
        extraction.units.len().to_string().cyan()
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let progress = ProgressBar::new(extraction.units.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    let result = converter
        .convert_batch(
            extraction,
            &options.conversion,
            |p| {
                progress.set_position(p.completed as u64);
                progress.set_message(p.current.clone());
            },
            Some(&cancel),
        )
        .await;
    progress.finish_and_clear();

    let batch = match result {
        Ok(batch) => batch,
        Err(CoreError::EmptyInput) => anyhow::bail!("No C# source files found in the given paths"),
        Err(e) => return Err(e.into()),
    };

    print_summary(&batch);
    let written = write_outputs(&batch, &converter, &options.out, options.java_only)?;
    for path in written {
        println!("  {} {}", "📦".green(), path.display().to_string().dimmed());
    }

    if batch.stats.succeeded == batch.stats.total_files {
        println!("{}", "✅ Conversion completed successfully!".green().bold());
    } else {
        println!(
            "{}",
            format!(
                "⚠️ {} of {} file(s) failed to convert",
                batch.stats.total_files - batch.stats.succeeded,
                batch.stats.total_files
            )
            .yellow()
            .bold()
        );
    }

    Ok(())
}

/// Read every path fully; the upload name is the file name
pub async fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read {} ({} bytes)", name, bytes.len());
        uploads.push(Upload::new(name, bytes));
    }
    Ok(uploads)
}

fn print_summary(batch: &ConversionBatch) {
    println!();
    for result in &batch.results {
        if result.is_failure() {
            println!("  {} {}", "❌".red(), result.source_name.red());
        } else {
            println!(
                "  {} {} → {}",
                "✅".green(),
                result.source_name,
                result.target_name.cyan()
            );
        }
        for warning in &result.warnings {
            println!("      {} {}", "•".yellow(), warning.dimmed());
        }
    }

    let stats = &batch.stats;
    println!();
    println!(
        "  Files: {}  Succeeded: {}  Success rate: {:.1}%  Warnings: {}",
        stats.total_files,
        stats.succeeded.to_string().green(),
        stats.success_rate,
        stats.total_warnings
    );
    if stats.used_project_context {
        println!("  {}", "Project context was used".dimmed());
    }
    println!();
}

/// File names written for a batch
pub fn output_names(base: &str, has_layout: bool, java_only: bool) -> Vec<String> {
    let project = format!("{}_project.zip", base);
    let java = format!("{}_java.zip", base);
    match (java_only, has_layout) {
        (true, _) => vec![java],
        (false, true) => vec![project, java],
        (false, false) => vec![project],
    }
}

fn write_outputs(
    batch: &ConversionBatch,
    converter: &Converter,
    out: &Path,
    java_only: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    let suffixes = converter.suffixes();
    let translations = batch.translations();
    let base = batch.download_base_name(suffixes);
    let mut written = Vec::new();

    for name in output_names(&base, batch.layout.is_some(), java_only) {
        let packaged = match &batch.layout {
            Some(layout) if name.ends_with("_project.zip") => {
                repackage(&layout.entries, &translations, suffixes)?
            }
            _ => package_translations_only(&translations, suffixes)?,
        };
        for warning in &packaged.warnings {
            println!("  {} {}", "⚠️".yellow(), warning.yellow());
        }

        let path = out.join(&name);
        std::fs::write(&path, &packaged.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}
