//! Fixture runner: every `<dir>/<case>/schema.json` is loaded, each
//! `input*.json` beside it must survive decode → encode → decode unchanged,
//! and each `reject*.json` must fail to decode.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use json_shape::{CodecOptions, Schema};
use serde_json::Value;

fn main() -> Result<()> {
    let root = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("fixtures"));
    let mut cases: Vec<PathBuf> = std::fs::read_dir(&root)
        .with_context(|| format!("failed to read fixture dir {}", root.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.join("schema.json").is_file())
        .collect();
    cases.sort();

    let mut failures = 0usize;
    for case in &cases {
        failures += run_case(case)?;
    }
    if failures > 0 {
        bail!("{failures} fixture check(s) failed");
    }
    eprintln!("{}", format!("all {} cases passed", cases.len()).green());
    Ok(())
}

fn run_case(case: &Path) -> Result<usize> {
    let name = case.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    eprintln!("—— {name} ——");
    let schema = Schema::from_path(case.join("schema.json"), "Root")?;
    let codec = schema.codec(CodecOptions::default());

    let mut files: Vec<PathBuf> = std::fs::read_dir(case)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut failures = 0;
    for file in files {
        let stem = file.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let expect_ok = if stem.starts_with("input") {
            true
        } else if stem.starts_with("reject") {
            false
        } else {
            continue;
        };
        let json: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)
            .with_context(|| format!("failed to parse {}", file.display()))?;

        let outcome = match (codec.decode(schema.root(), &json), expect_ok) {
            (Ok(first), true) => {
                let encoded = codec.encode(&first);
                match codec.decode(schema.root(), &encoded) {
                    Ok(second) if second == first && codec.encode(&second) == encoded => Ok(()),
                    Ok(_) => Err("re-decoded value differs".to_string()),
                    Err(error) => Err(format!("re-encoded JSON no longer decodes: {error}")),
                }
            }
            (Err(error), true) => Err(format!("at {} → {}", error.path(), error.leaf())),
            (Ok(_), false) => Err("decoded, but should have been rejected".to_string()),
            (Err(_), false) => Ok(()),
        };
        match outcome {
            Ok(()) => eprintln!("{} {stem}", "✅".green()),
            Err(why) => {
                failures += 1;
                eprintln!("{} {stem}: {why}", "❌".red());
            }
        }
    }
    Ok(failures)
}
