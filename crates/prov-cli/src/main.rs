use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

mod config;
mod doc_io;
mod scenario;
mod telemetry;

use config::{Command, GenerateArgs, SearchArgs};
use prov_core::model::Document;

fn main() -> Result<()> {
    let args = config::Args::parse().map_err(|e| anyhow::anyhow!(e))?;
    telemetry::init(args.json_logs)?;

    match args.command {
        Command::Generate(g) => run_generate(g),
        Command::Search(s) => run_search(s),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario))?;
    let scenario = scenario::parse(&raw)?;

    let bundles: Vec<prov_core::BundleSpec> = scenario.bundles.into_iter().map(Into::into).collect();
    let updates: Vec<prov_core::Update> = scenario.updates.into_iter().map(Into::into).collect();

    let mut doc = Document::new();
    let diagnostics = prov_core::generate(
        &mut doc,
        &scenario.config,
        &bundles,
        &updates,
        &scenario.invalidate_bundles,
        scenario.start_id,
    )?;

    for d in &diagnostics.items {
        info!(level = d.level.as_str(), code = %d.code, "{}", d.message);
    }

    doc_io::save(Path::new(&args.out), &doc)?;
    info!(out = %args.out, bundles = doc.bundles.len(), "wrote document");
    Ok(())
}

fn run_search(args: SearchArgs) -> Result<()> {
    let doc_path = Path::new(&args.doc);
    if !doc_path.exists() {
        bail!("document not found: {}", args.doc);
    }

    let loader = doc_io::FsDocumentLoader;
    let cfg = prov_core::config::EngineConfig::default();

    let outcome = prov_core::search(&loader, &cfg, doc_path, &args.entity, args.strict)?;

    println!("valid:");
    for (path, bundle, entity) in &outcome.valid {
        println!("  {}::{}::{}", path.display(), bundle, entity);
    }
    println!("low-credibility:");
    for (path, bundle, entity) in &outcome.low {
        println!("  {}::{}::{}", path.display(), bundle, entity);
    }
    println!("invalid:");
    for (path, bundle, entity) in &outcome.invalid {
        println!("  {}::{}::{}", path.display(), bundle, entity);
    }

    for d in &outcome.diagnostics.items {
        info!(level = d.level.as_str(), code = %d.code, "{}", d.message);
    }

    Ok(())
}
