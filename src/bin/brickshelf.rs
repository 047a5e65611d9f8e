//! Inspect the local catalog and print report tables.
//!
//! Usage:
//!   brickshelf resolve-boxes part_box.csv
//!   brickshelf report box-index
//!   brickshelf report set 75159-1
//!   brickshelf export elements
//!
//! Tables are written to stdout as NDJSON, one object per row.

use anyhow::{Context, Result};
use brickshelf::config::ENV_LOG;
use brickshelf::{Catalog, Config, Table, pipeline, resolve_file, split_list};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "brickshelf")]
#[command(about = "Local Lego collection catalog: box assignment and report tables")]
struct Cli {
    /// Store directory; defaults to $BRICKSHELF_STORE_DIR or ./shelves.
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Log debug detail to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assign boxes to parts from a `part,box` file.
    ResolveBoxes {
        file: PathBuf,
        /// Marker for parts without a box.
        #[arg(long)]
        unassigned: Option<String>,
        /// Box codes meaning "not in any box" (comma separated).
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Print one report table.
    Report {
        #[command(subcommand)]
        report: Report,
    },
    /// Print the exported table of one collection.
    Export { collection: Collection },
    /// Print the number of records per collection.
    Stats,
    /// Rewrite every collection log with one line per key.
    Compact,
}

#[derive(Subcommand, Debug)]
enum Report {
    /// One row per part and box.
    BoxIndex,
    /// Parts and colours stored in one box.
    Box { box_num: String },
    /// One row per owned set.
    SetIndex,
    /// Parts and colours of one set.
    Set { set_num: String },
    /// The joined element table behind the box reports.
    BoxTable,
    /// The joined set table behind the set reports.
    SetTable,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Collection {
    Colours,
    Themes,
    PartCategories,
    Parts,
    Elements,
    Sets,
    Boxes,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::from_env().context("reading configuration")?;
    if let Some(store) = cli.store {
        config.store_dir = store;
    }
    let mut catalog = Catalog::open(&config.store_dir)
        .with_context(|| format!("opening catalog at {}", config.store_dir.display()))?;

    match cli.command {
        Command::ResolveBoxes {
            file,
            unassigned,
            exclude,
        } => {
            let mut policy = config.box_policy.clone();
            if let Some(marker) = unassigned {
                policy.unassigned = marker;
            }
            if let Some(codes) = exclude {
                policy.excluded = split_list(&codes).into_iter().collect();
            }
            let summary = resolve_file(&mut catalog, &file, &policy)
                .with_context(|| format!("resolving boxes from {}", file.display()))?;
            print_json(&summary)
        }
        Command::Report { report } => {
            let table = match report {
                Report::BoxIndex => pipeline::box_index(&catalog),
                Report::Box { box_num } => pipeline::box_detail(&catalog, &box_num),
                Report::SetIndex => pipeline::set_index(&catalog),
                Report::Set { set_num } => pipeline::set_detail(&catalog, &set_num),
                Report::BoxTable => pipeline::box_table(&catalog),
                Report::SetTable => pipeline::set_table(&catalog),
            }
            .context("building report table")?;
            print_table(&table)
        }
        Command::Export { collection } => {
            let table = match collection {
                Collection::Colours => catalog.colours.export_table(),
                Collection::Themes => catalog.themes.export_table(),
                Collection::PartCategories => catalog.part_categories.export_table(),
                Collection::Parts => catalog.parts.export_table(),
                Collection::Elements => catalog.elements.export_table(),
                Collection::Sets => catalog.sets.export_table(),
                Collection::Boxes => catalog.boxes.export_table(),
            }
            .context("exporting collection")?;
            print_table(&table)
        }
        Command::Stats => print_json(&catalog.counts()),
        Command::Compact => {
            catalog.compact().context("compacting catalog")?;
            print_json(&catalog.counts())
        }
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_table(table: &Table) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for row in table.to_json_rows() {
        serde_json::to_writer(&mut out, &row).context("writing table row")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
