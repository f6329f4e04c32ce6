use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;

use tidydrop::cli::{Cli, Commands, FileArgs, HistoryArgs, OrganizeArgs, ScanArgs, StatsArgs};
use tidydrop::colors;
use tidydrop::config::Config;
use tidydrop::describe::Describer;
use tidydrop::history::HistoryStore;
use tidydrop::organizer::{OrganizeSummary, Organizer};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Disable colors if requested
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Handle help and version commands first
    match cli.command {
        Commands::ShowHelp => {
            Cli::print_help();
            return Ok(());
        }
        Commands::Version => {
            Cli::print_version();
            return Ok(());
        }
        _ => {}
    }

    // Handle detailed help flag
    if cli.detailed_help {
        Cli::print_command_help(&cli.command);
        return Ok(());
    }

    // Handle safe mode
    if cli.safe {
        println!("{}", "🔒 SAFE MODE ENABLED".bold().color(colors::WARNING));
        println!("   Showing previews only - no files will be moved");
        println!();
    }

    // Load or create config
    let config = Config::load().context("Failed to load configuration")?;

    // Handle command
    match cli.command {
        Commands::Scan(args) => handle_scan(&config, &args)?,

        Commands::Organize(args) => handle_organize(&config, &args, cli.safe, cli.verbose)?,

        Commands::File(args) => handle_file(&config, &args, cli.safe)?,

        Commands::History(args) => handle_history(&config, &args)?,

        Commands::Stats(args) => handle_stats(&config, &args)?,

        Commands::Config => config.display(),

        Commands::ShowHelp | Commands::Version => unreachable!(),
    }

    Ok(())
}

fn resolve_root(config: &Config, path: &Option<PathBuf>) -> PathBuf {
    // DOWNLOADS_PATH already landed in `path` through clap's env support.
    path.clone().unwrap_or_else(|| config.source_root.clone())
}

fn build_describer(config: &Config, no_describe: bool) -> Result<Option<Describer>> {
    if no_describe || !config.describe_enabled {
        return Ok(None);
    }
    let describer = Describer::from_env(&config.model, config.describe_timeout())
        .context("Failed to set up description client")?;
    if describer.is_none() {
        println!(
            "{} No API key found - records will have no description",
            "ℹ️".cyan()
        );
    }
    Ok(describer)
}

fn handle_scan(config: &Config, args: &ScanArgs) -> Result<()> {
    let root = resolve_root(config, &args.path);

    println!("{} {}", "🔍 Previewing:".color(colors::HEADER), root.display());

    let organizer = Organizer::new(root, None)
        .context("Failed to open source folder")?
        .with_limit(args.limit);
    let summary = organizer.run(true).context("Preview pass failed")?;

    print_plan(&summary);
    println!();
    println!(
        "{} Would move {} files, skip {}",
        "📊".cyan(),
        summary.moved.to_string().color(colors::SUCCESS),
        summary.skipped.to_string().color(colors::WARNING)
    );
    println!(
        "{} Run {} to apply",
        "💡".cyan(),
        "tidydrop organize".bold()
    );
    Ok(())
}

fn handle_organize(
    config: &Config,
    args: &OrganizeArgs,
    safe_mode: bool,
    verbose: bool,
) -> Result<()> {
    let root = resolve_root(config, &args.path);
    let dry_run = args.dry_run || safe_mode;

    println!("{} {}", "🗂️  Organizing:".color(colors::HEADER), root.display());

    if !dry_run && !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Organize files under {}?", root.display()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{} Organization cancelled", "ℹ️".cyan());
            return Ok(());
        }
    }

    let describer = if dry_run {
        None
    } else {
        build_describer(config, args.no_describe)?
    };

    let organizer = Organizer::new(root, describer)
        .context("Failed to open source folder")?
        .with_limit(args.limit);
    let summary = organizer.run(dry_run).context("Organization pass failed")?;

    if dry_run {
        println!("{} DRY RUN: Showing what would be done", "🌵".yellow());
        print_plan(&summary);
    } else if verbose {
        print_plan(&summary);
    }

    print_summary(&summary, dry_run);
    Ok(())
}

fn handle_file(config: &Config, args: &FileArgs, safe_mode: bool) -> Result<()> {
    let describer = if safe_mode {
        None
    } else {
        build_describer(config, args.no_describe)?
    };

    let organizer =
        Organizer::new(config.source_root.clone(), describer).context("Failed to open source folder")?;
    let summary = organizer
        .organize_file(&args.file, safe_mode)
        .context("Failed to organize file")?;

    if let Some(planned) = summary.planned.first() {
        println!(
            "{} {} {} {}",
            "✅".green(),
            args.file.display().to_string().color(colors::PATH),
            "→".dimmed(),
            format!("{}/{}", planned.category, planned.new_name).color(colors::SUCCESS)
        );
    }
    print_summary(&summary, safe_mode);
    Ok(())
}

fn handle_history(config: &Config, args: &HistoryArgs) -> Result<()> {
    let store = HistoryStore::open(&config.source_root);
    let records = store.list_recent(args.limit).context("Failed to read history")?;

    if records.is_empty() {
        println!("{} No operations recorded yet", "📭".cyan());
        return Ok(());
    }

    println!();
    println!("{}", "📜 RECENT OPERATIONS".bold().color(colors::HEADER));
    println!("{}", "─".repeat(50).color(colors::PATH));

    for record in &records {
        println!(
            "{} {} {} {}  [{}]",
            record
                .timestamp
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed(),
            record.original_name.color(colors::PATH),
            "→".dimmed(),
            record.new_name.color(colors::SUCCESS),
            record.category.color(colors::CATEGORY)
        );
        if let Some(description) = &record.description {
            println!("     {}", description.dimmed());
        }
    }
    Ok(())
}

fn handle_stats(config: &Config, args: &StatsArgs) -> Result<()> {
    let root = resolve_root(config, &args.path);
    let organizer = Organizer::new(root, None).context("Failed to open source folder")?;

    let stats = organizer.history().stats().context("Failed to read history")?;
    let (per_folder, pending) = organizer
        .folder_counts()
        .context("Failed to count category folders")?;

    println!();
    println!("{}", "📊 ORGANIZATION STATISTICS".bold().color(colors::HEADER));
    println!("{}", "─".repeat(50).color(colors::PATH));

    println!(
        "📦 Total moves recorded: {}",
        stats.total_moved.to_string().color(colors::SUCCESS)
    );
    if let Some(last) = stats.last_operation {
        println!(
            "⏱️  Last operation: {}",
            last.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }

    println!();
    println!("{}", "🗂️  FILES PER CATEGORY".bold().color(colors::HEADER));
    for (label, count) in &per_folder {
        let recorded = stats.per_category.get(*label).copied().unwrap_or(0);
        println!(
            "   {:<14} {} on disk, {} recorded",
            label.color(colors::CATEGORY),
            count.to_string().color(colors::SUCCESS),
            recorded
        );
    }

    println!();
    println!(
        "📥 Pending (unorganized): {}",
        pending.to_string().color(colors::WARNING)
    );
    Ok(())
}

fn print_plan(summary: &OrganizeSummary) {
    for planned in &summary.planned {
        println!(
            "   {} {} {}",
            planned.source.display().to_string().color(colors::PATH),
            "→".dimmed(),
            format!("{}/{}", planned.category, planned.new_name).color(colors::SUCCESS)
        );
    }
}

fn print_summary(summary: &OrganizeSummary, dry_run: bool) {
    println!();
    println!("{}", "🗂️  PASS COMPLETE".bold().color(colors::HEADER));
    println!("{}", "─".repeat(50).color(colors::PATH));

    let verb = if dry_run { "Would move" } else { "Moved" };
    println!(
        "✅ {} {} files",
        verb,
        summary.moved.to_string().color(colors::SUCCESS)
    );
    println!(
        "⏭️  Skipped {} (already organized or junk)",
        summary.skipped.to_string().color(colors::WARNING)
    );

    if !summary.failures.is_empty() {
        println!(
            "{} {} files failed:",
            "⚠️".yellow(),
            summary.failed.to_string().color(colors::WARNING)
        );
        for (path, reason) in &summary.failures {
            println!("   • {}: {}", path.display(), reason);
        }
        println!("   Failed files stay in place; the next pass retries them.");
    }
}
