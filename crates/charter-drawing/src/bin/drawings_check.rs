//! Drawing Document Checker
//!
//! Loads a persisted drawing document and reports, entry by entry, whether it
//! would load. Exits with status 1 when any entry would be dropped.
//!
//! Usage: drawings-check <file.json>
//!        drawings-check --symbol <SYMBOL>   (reads from the configured drawings dir)

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use charter_config::Config;
use charter_drawing::persistence::{read_document, restore, JsonFileStore};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let path = match args.get(1).map(String::as_str) {
        Some("--symbol") => {
            let Some(symbol) = args.get(2) else {
                bail!("--symbol needs a value");
            };
            let config = Config::load_default();
            JsonFileStore::new(config.persistence.drawings_dir()).path_for(symbol)
        }
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: {} <file.json>", args[0]);
            eprintln!("       {} --symbol <SYMBOL>", args[0]);
            std::process::exit(2);
        }
    };

    let records =
        read_document(&path).with_context(|| format!("Failed to read drawings from {}", path.display()))?;
    let (drawings, report) = restore(&records);

    let mut dropped = report.dropped.iter().peekable();
    let mut loaded = drawings.iter();
    for index in 0..records.len() {
        if dropped.peek().is_some_and(|d| d.index == index) {
            if let Some(entry) = dropped.next() {
                println!("[{index:>4}] dropped: {}", entry.reason);
            }
        } else if let Some(drawing) = loaded.next() {
            println!(
                "[{index:>4}] ok: {} {} ({} points)",
                drawing.kind(),
                drawing.id(),
                drawing.points().len()
            );
        }
    }

    println!();
    println!(
        "{}: {} loaded, {} dropped",
        path.display(),
        report.loaded,
        report.dropped.len()
    );

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
