//! Minimal CLI: schema + JSON documents → (decode | check | shape)
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use json_shape::codec::{CodecOptions, DEFAULT_MAX_DEPTH};
use json_shape::schema::Schema;
use json_shape::shape::Shape;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode JSON documents against a JSON Typedef schema and re-encode them in canonical form
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode each document and print its canonical re-encoding
    Decode(DecodeOut),
    /// decode every document and report which ones conform
    Check(CheckOut),
    /// print the shape tree the schema lowers to
    Shape(ShapeOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// JSON Typedef schema file
    #[arg(long, short)]
    schema: PathBuf,

    /// name given to the root record when the schema's root is an inline record
    #[arg(long, default_value = "Root")]
    root_type: String,

    /// deepest list/map/record nesting to decode
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct DecodeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// only print failures
    #[arg(long, short)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct ShapeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

/// One parsed input document and where it came from.
struct Document {
    label: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> Result<Schema> {
        Schema::from_path(&self.schema, &self.root_type)
            .with_context(|| format!("failed to load schema {}", self.schema.display()))
    }

    fn codec_options(&self) -> CodecOptions {
        CodecOptions { max_depth: self.max_depth }
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|e| anyhow::anyhow!("failed to resolve input file paths: {e}"))?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            if self.ndjson {
                for (index, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let label = format!("{source_path_str}:{}", index + 1);
                    let value = serde_json::from_str::<Value>(line)
                        .with_context(|| format!("failed to parse JSON line ({label})"))?;
                    out.push(Document { label, value });
                }
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                out.push(Document { label: source_path_str, value });
            }
        }
        tracing::debug!(documents = out.len(), "inputs loaded");
        Ok(out)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Decode(target) => {
                let schema = target.schema_settings.load()?;
                let codec = schema.codec(target.schema_settings.codec_options());
                let documents = target.input_settings.load_documents()?;

                let mut rendered = Vec::with_capacity(documents.len());
                for doc in &documents {
                    let canonical = codec
                        .normalize(schema.root(), &doc.value)
                        .map_err(|e| anyhow::anyhow!("{}: at {} → {e}", doc.label, display_path(&e.path())))?;
                    rendered.push(canonical);
                }
                let out_src = match rendered.as_slice() {
                    [single] => serde_json::to_string_pretty(single)?,
                    many => many
                        .iter()
                        .map(serde_json::to_string)
                        .collect::<Result<Vec<_>, _>>()?
                        .join("\n"),
                };
                write_output(target.out.as_deref(), &out_src)
            }
            Command::Check(target) => {
                let schema = target.schema_settings.load()?;
                let codec = schema.codec(target.schema_settings.codec_options());
                let documents = target.input_settings.load_documents()?;

                // decoding is pure; share the codec across the pool
                let results: Vec<_> = documents
                    .par_iter()
                    .map(|doc| (doc, codec.decode(schema.root(), &doc.value)))
                    .collect();

                let mut failed = 0usize;
                for (doc, result) in &results {
                    match result {
                        Ok(_) => {
                            if !target.quiet {
                                eprintln!("{} {}", "✅".green(), doc.label);
                            }
                        }
                        Err(error) => {
                            failed += 1;
                            eprintln!(
                                "{} {}: at {} → {}",
                                "❌".red(),
                                doc.label,
                                display_path(&error.path()),
                                error.leaf()
                            );
                        }
                    }
                }
                if failed > 0 {
                    anyhow::bail!("{failed} of {} documents did not match the schema", results.len());
                }
                eprintln!("{}", format!("all {} documents match", results.len()).green());
                Ok(())
            }
            Command::Shape(target) => {
                let schema = target.schema_settings.load()?;
                let mut out = String::new();
                let mut seen = HashSet::new();
                out.push_str(&format!("root = {}\n", schema.root()));
                describe_records(schema.root(), &mut seen, &mut out);
                for (name, shape) in schema.registry().iter() {
                    out.push_str(&format!("{name} = {shape}\n"));
                    describe_records(shape, &mut seen, &mut out);
                }
                print!("{out}");
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

// List each record's fields once, in declaration order.
fn describe_records(shape: &Shape, seen: &mut HashSet<String>, out: &mut String) {
    if let Shape::Record(record) = shape {
        if seen.insert(record.name.clone()) {
            match &record.description {
                Some(description) => out.push_str(&format!("  record {}  # {description}\n", record.name)),
                None => out.push_str(&format!("  record {}\n", record.name)),
            }
            for field in &record.fields {
                let marker = if field.optional { " (optional key)" } else { "" };
                out.push_str(&format!("    {}: {}{marker}\n", field.name, field.shape));
            }
        }
    }
    for child in shape.children() {
        describe_records(child, seen, out);
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
