//! Tree inventory preparation pipeline.
//!
//! Assembles the region polygon set (cached), classifies every record's
//! coordinates into a region, applies the row-wise cleaning transforms, and
//! writes the timestamped base and marker tables.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use hashbrown::HashSet;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use treebase::classify::classify;
use treebase::config::Config;
use treebase::prep::{
    build_base_record, marker_table, points, read_records, write_base_table, write_marker_table,
};
use treebase::regions::assemble;

#[derive(Parser, Debug)]
#[command(name = "prepare")]
#[command(about = "Clean and region-assign a tree inventory export")]
struct Args {
    /// Pipeline configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Delete the region cache before assembly
    #[arg(long)]
    rebuild_regions: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = Config::load_from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    if args.rebuild_regions {
        let cache = config.regions.cache_path();
        if cache.exists() {
            info!("Removing region cache {}", cache.display());
            fs::remove_file(&cache)
                .with_context(|| format!("failed to remove {}", cache.display()))?;
        }
    }

    let regions = assemble(&config.regions).context("region assembly failed")?;
    info!("Region set ready with {} regions", regions.len());

    let records =
        read_records(&config.input.trees_csv).context("failed to read tree records")?;
    info!(
        "Loaded {} tree records from {}",
        records.len(),
        config.input.trees_csv.display()
    );

    let assignments = classify(&points(&records), &regions).context("classification failed")?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut base_rows = Vec::with_capacity(records.len());
    for record in &records {
        // classify is total over the input id set, so this lookup holds for
        // every record.
        let assignment = assignments
            .get(&record.id)
            .with_context(|| format!("no assignment for record {}", record.id))?;
        base_rows.push(build_base_record(record, assignment));
        pb.inc(1);
    }
    pb.finish_with_message("Row transforms complete");

    let markers = marker_table(&records);

    fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("failed to create {}", config.output.dir.display()))?;
    let stamp = Local::now().format("%d-%m-%Y_%H%M");
    let base_path = config.output.dir.join(format!("base_table_{stamp}.csv"));
    let marker_path = config.output.dir.join(format!("marker_table_{stamp}.csv"));

    write_base_table(&base_path, &base_rows)?;
    info!(
        "Base table saved with {} tree records to {}",
        base_rows.len(),
        base_path.display()
    );

    write_marker_table(&marker_path, &markers)?;
    let marked_trees: HashSet<&str> = markers.iter().map(|m| m.id.as_str()).collect();
    info!(
        "Marker table saved with {} markers across {} trees to {}",
        markers.len(),
        marked_trees.len(),
        marker_path.display()
    );

    Ok(())
}
