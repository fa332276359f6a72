use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use strata_loader::{ArchiveLoader, LoadState, LoaderConfig, Project, ReadySource};
use strata_pack::{embed, ArchiveWriter};
use strata_store::{BuildFeatures, PropertyUsage, StaticFeatures};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::Get(args) => cmd_get(&cli, args, false),
        Command::Resolve(args) => cmd_get(&cli, args, true),
        Command::List(args) => cmd_list(&cli, args),
        Command::Localize(args) => cmd_localize(&cli, args),
        Command::Globalize(args) => cmd_globalize(&cli, args),
        Command::Pack(args) => cmd_pack(args),
        Command::Embed(args) => cmd_embed(args),
        Command::Features(args) => cmd_features(&cli, args),
        Command::Save(args) => cmd_save(&cli, args),
    }
}

fn loader_config(cli: &Cli) -> anyhow::Result<LoaderConfig> {
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::from_toml_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => LoaderConfig::default(),
    };
    if let Some(project) = &cli.project {
        config.project_dir = project.clone();
    }
    if let Ok(dir) = std::fs::canonicalize(&config.project_dir) {
        config.project_dir = dir;
    }
    if cli.main_pack.is_some() {
        config.main_pack = cli.main_pack.clone();
    }
    config.upwards |= cli.upwards;
    if config.executable.is_none() {
        config.executable = std::env::current_exe().ok();
    }
    Ok(config)
}

fn open_project(cli: &Cli) -> anyhow::Result<Project> {
    let config = loader_config(cli)?;
    let features = StaticFeatures::new(cli.features.iter().cloned());
    let mut project = Project::from_config(&config, Arc::new(features));
    let report = ArchiveLoader::new(config)
        .load(&mut project)
        .context("loading project")?;

    if report.states.last() == Some(&LoadState::Ready(ReadySource::Empty)) {
        eprintln!("{} no project settings found", "warning:".yellow().bold());
    }
    tracing::debug!(settings_file = ?report.settings_file, probes = report.probes.len(), "project opened");
    Ok(project)
}

fn cmd_get(cli: &Cli, args: &NameArgs, resolve: bool) -> anyhow::Result<()> {
    let project = open_project(cli)?;
    let store = project.store();
    let value = if resolve {
        store.resolve(&args.name)?
    } else {
        store.get(&args.name)?
    };
    match cli.format {
        OutputFormat::Text => println!("{value}"),
        OutputFormat::Json => {
            let out = serde_json::json!({ "name": args.name, "value": value });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

fn cmd_list(cli: &Cli, args: &ListArgs) -> anyhow::Result<()> {
    let project = open_project(cli)?;
    let listing: Vec<_> = project
        .store()
        .enumerate_ordered()
        .into_iter()
        .filter(|p| args.prefix.as_deref().map_or(true, |prefix| p.name.starts_with(prefix)))
        .collect();

    match cli.format {
        OutputFormat::Text => {
            for info in &listing {
                let mut tags = Vec::new();
                if info.usage.contains(PropertyUsage::BASIC) {
                    tags.push("basic".green().to_string());
                }
                if info.usage.contains(PropertyUsage::INTERNAL) {
                    tags.push("internal".dimmed().to_string());
                }
                if info.usage.contains(PropertyUsage::RESTART_IF_CHANGED) {
                    tags.push("restart".yellow().to_string());
                }
                println!(
                    "{:>5}  {}  {}  {}",
                    info.order.to_string().dimmed(),
                    info.name.bold(),
                    info.value_type.to_string().cyan(),
                    tags.join(" ")
                );
            }
        }
        OutputFormat::Json => {
            let rows: Vec<_> = listing
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "type": p.value_type,
                        "order": p.order,
                        "usage": p.usage.bits(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

fn cmd_localize(cli: &Cli, args: &PathArgs) -> anyhow::Result<()> {
    let project = open_project(cli)?;
    match project.localize_path(&args.path) {
        Some(path) => println!("{path}"),
        None => anyhow::bail!("cannot localize {}", args.path),
    }
    Ok(())
}

fn cmd_globalize(cli: &Cli, args: &PathArgs) -> anyhow::Result<()> {
    let project = open_project(cli)?;
    println!("{}", project.globalize_path(&args.path));
    Ok(())
}

fn cmd_pack(args: &PackArgs) -> anyhow::Result<()> {
    let mut writer = ArchiveWriter::new().with_level(args.level);
    let added = writer
        .add_directory(&args.source)
        .with_context(|| format!("reading {}", args.source.display()))?;
    let file = writer.finish(&args.output)?;
    println!(
        "{} Packed {} files into {} ({} bytes)",
        "✓".green().bold(),
        added.to_string().bold(),
        file.path.display().to_string().yellow(),
        file.byte_len
    );
    println!("  Checksum: {}", hex::encode(file.checksum).dimmed());
    Ok(())
}

fn cmd_embed(args: &EmbedArgs) -> anyhow::Result<()> {
    let offset = embed(&args.executable, &args.archive, &args.output)?;
    println!(
        "{} Embedded {} into {} at offset {}",
        "✓".green().bold(),
        args.archive.display(),
        args.output.display().to_string().yellow(),
        offset
    );
    Ok(())
}

fn cmd_features(cli: &Cli, args: &FeaturesArgs) -> anyhow::Result<()> {
    let project = open_project(cli)?;
    let build = BuildFeatures {
        double_precision: args.double_precision,
        ..Default::default()
    };

    if args.trim {
        let trimmed = build.trim_to_supported(&project.project_features());
        println!("{}", trimmed.join(", "));
        return Ok(());
    }

    let missing = project.unsupported_features(&build);
    if missing.is_empty() {
        println!("{} All project features are supported.", "✓".green().bold());
    } else {
        println!("{} Unsupported features:", "✗".red().bold());
        for feature in &missing {
            println!("  {}", feature.red());
        }
    }
    Ok(())
}

fn cmd_save(cli: &Cli, args: &SaveArgs) -> anyhow::Result<()> {
    let project = open_project(cli)?;
    let written = project.save_custom(&args.path)?;
    println!(
        "{} Saved {} settings to {}",
        "✓".green().bold(),
        written.to_string().bold(),
        args.path.yellow()
    );
    Ok(())
}
