use anyhow::{anyhow, Context};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use scour::coerce::{self, DateTimeOptions, NumericOptions};
use scour::dedupe::{self, Keep};
use scour::filter;
use scour::frame::Cell;
use scour::io;
use scour::report;
use scour::Pipeline;

#[derive(Parser)]
#[command(name = "scour")]
#[command(about = "CSV cleaning pipeline: typed coercion, dedup, filtering")]
struct Args {
    /// Input CSV file
    input: PathBuf,

    /// Output directory for cleaned CSV/JSON (default: ./outputs)
    #[arg(short, long, default_value = "outputs")]
    out_dir: PathBuf,

    /// Columns to coerce to numeric (comma separated)
    #[arg(long, value_delimiter = ',')]
    numeric: Vec<String>,

    /// Columns to coerce to datetime (comma separated)
    #[arg(long, value_delimiter = ',')]
    datetime: Vec<String>,

    /// Columns to coerce to boolean (comma separated)
    #[arg(long, value_delimiter = ',')]
    boolean: Vec<String>,

    /// Read ambiguous two-digit dates day-first
    #[arg(long)]
    dayfirst: bool,

    /// Fill missing cells in a text column: COLUMN=VALUE (repeatable)
    #[arg(long)]
    fill: Vec<String>,

    /// Drop duplicate rows, keeping the first occurrence of each key.
    /// Comma-separated key columns; an empty value keys on the whole row
    #[arg(long, value_delimiter = ',')]
    dedupe_key: Option<Vec<String>>,

    /// Keep rows where a numeric column is at least N: COLUMN=N (repeatable)
    #[arg(long)]
    min: Vec<String>,
}

fn parse_assignment(raw: &str) -> anyhow::Result<(String, String)> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected COLUMN=VALUE, got '{}'", raw))?;
    Ok((column.to_string(), value.to_string()))
}

fn build_pipeline(args: &Args) -> anyhow::Result<Pipeline> {
    let mut pipeline = Pipeline::new();

    if !args.numeric.is_empty() {
        let columns = args.numeric.clone();
        pipeline = pipeline.stage("coerce numeric", move |mut store| {
            for name in &columns {
                store = coerce::to_numeric(&store, name, NumericOptions::default())?;
            }
            Ok(store)
        });
    }

    if !args.datetime.is_empty() {
        let columns = args.datetime.clone();
        let options = DateTimeOptions {
            dayfirst: args.dayfirst,
        };
        pipeline = pipeline.stage("coerce datetime", move |mut store| {
            for name in &columns {
                store = coerce::to_datetime(&store, name, options)?;
            }
            Ok(store)
        });
    }

    if !args.boolean.is_empty() {
        let columns = args.boolean.clone();
        pipeline = pipeline.stage("coerce boolean", move |mut store| {
            for name in &columns {
                store = coerce::to_boolean(&store, name)?;
            }
            Ok(store)
        });
    }

    if !args.fill.is_empty() {
        let fills: Vec<(String, String)> = args
            .fill
            .iter()
            .map(|raw| parse_assignment(raw))
            .collect::<anyhow::Result<_>>()?;
        pipeline = pipeline.stage("fill defaults", move |mut store| {
            for (name, value) in &fills {
                store = coerce::fill_null(&store, name, &Cell::Text(value.clone()))?;
            }
            Ok(store)
        });
    }

    if let Some(keys) = &args.dedupe_key {
        // an empty key list keys on the whole row
        let keys: Vec<String> = keys.iter().filter(|k| !k.is_empty()).cloned().collect();
        pipeline = pipeline.stage("drop duplicates", move |store| {
            dedupe::drop_duplicates(&store, &keys, Keep::First)
        });
    }

    for raw in &args.min {
        let (column, value) = parse_assignment(raw)?;
        let threshold: f64 = value
            .parse()
            .with_context(|| format!("--min {}: '{}' is not a number", column, value))?;
        pipeline = pipeline.stage(format!("{} >= {}", column, threshold), move |store| {
            let mask = filter::min_mask(&store, &column, threshold)?;
            filter::apply(&store, &mask)
        });
    }

    Ok(pipeline)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    info!("scour starting on {}", args.input.display());

    let store = io::read_csv(&args.input)?;
    let pipeline = build_pipeline(&args)?;
    info!("pipeline has {} stage(s)", pipeline.len());

    match pipeline.run(&store) {
        Ok((cleaned, reports)) => {
            report::log_reports(&reports);
            println!("{}", report::render_reports(&reports));

            fs::create_dir_all(&args.out_dir)?;
            let csv_out = args.out_dir.join("cleaned.csv");
            let json_out = args.out_dir.join("cleaned.json");
            io::write_csv(&cleaned, &csv_out)?;
            io::write_json_records(&cleaned, &json_out)?;

            println!("\nSaved cleaned CSV: {}", csv_out.display());
            println!("Saved cleaned JSON: {}", json_out.display());
            Ok(())
        }
        Err(failure) => {
            // show what completed before the failing stage
            if !failure.completed.is_empty() {
                println!("{}", report::render_reports(&failure.completed));
            }
            error!("{}", failure);
            Err(failure.into())
        }
    }
}
