use std::{env, fs, path::Path};

use anyhow::{bail, Context};
use ems_rust::{decode, Config, RawTable};
use log::{info, warn};

const DEFAULT_LOG_FILTER: &str = "ems_rust=info";

fn setup_logging() {
    let directives = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());

    env_logger::Builder::new()
        .format_target(false)
        .parse_filters(&directives)
        .init();
}

fn main() -> anyhow::Result<()> {
    setup_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let (table_path, output_path, config_path) = match args.as_slice() {
        [table, output] => (table, output, None),
        [table, output, config] => (table, output, Some(config)),
        _ => bail!("usage: ems-rust <table.json> <output.mid> [config.toml]"),
    };

    let config = match config_path {
        Some(path) => {
            let source = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            Config::from_toml_str(&source).with_context(|| format!("parsing {path}"))?
        }
        None => Config::default(),
    };

    let source = fs::read_to_string(table_path).with_context(|| format!("reading {table_path}"))?;
    let table = RawTable::from_json_str(&source).with_context(|| format!("parsing {table_path}"))?;
    info!("loaded {} rows from {table_path}", table.rows.len());

    let decoded = decode(&table, &config, Some(Path::new(output_path)))
        .with_context(|| format!("decoding {table_path}"))?;

    if !decoded.warnings.is_empty() {
        warn!("{} warnings while decoding", decoded.warnings.len());
    }
    info!("wrote {} parts to {output_path}", decoded.score.parts.len());

    Ok(())
}
