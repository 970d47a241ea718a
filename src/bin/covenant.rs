//! Covenant CLI: agreement segmentation and study-record integrity.
//!
//! Usage:
//!   covenant segment <file> [--save] [--json] [--db path]
//!   covenant coverage <file>
//!   covenant import <collection> <records.json> [--db path]
//!   covenant audit <collection> [--category c] [--above field=N] [--db path]
//!   covenant repair <collection> <id> [--hint kw]... [--sibling text] [--apply]
//!   covenant citations <collection> <document> [--fix]
//!   covenant schema

use clap::{Args, Parser, Subcommand};
use covenant::config::parse_numeral_list;
use covenant::integrity::{audit_citations, check, plan, plan_with_evidence, CitationIndex, Evidence};
use covenant::pipeline::{self, apply_repair, audit_collection, repair_citations};
use covenant::segment::{NodeKind, SectionPattern};
use covenant::{
    DerivedRecord, DocumentNode, OpenStore, RecordFilter, RecordStore, SegmentConfig, SqliteStore,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const PAGE_SIZE: usize = 200;

#[derive(Parser)]
#[command(
    name = "covenant",
    version,
    about = "Agreement segmentation and referential integrity auditing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment an agreement into Articles and Sections
    Segment {
        #[command(flatten)]
        source: SourceArgs,
        /// Store the exported rows under the file's name
        #[arg(long)]
        save: bool,
        /// Print rows as JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Report which expected Articles were found
    Coverage {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Import derived records from a JSON array
    Import {
        collection: String,
        path: PathBuf,
    },
    /// Audit answer references in a collection
    Audit {
        collection: String,
        /// Only records of this category
        #[arg(long)]
        category: Option<String>,
        /// Only records whose numeric FIELD exceeds N, as FIELD=N
        #[arg(long, value_name = "FIELD=N")]
        above: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Propose (and optionally apply) a repair for one record
    Repair {
        collection: String,
        id: String,
        /// Keyword the correct option must contain (repeatable)
        #[arg(long = "hint")]
        hints: Vec<String>,
        /// Answer text from a sibling record covering the same clause
        #[arg(long, conflicts_with = "hints")]
        sibling: Option<String>,
        /// Write the repair if one was found
        #[arg(long)]
        apply: bool,
    },
    /// Check record citations against a stored document structure
    Citations {
        collection: String,
        document: String,
        /// Rewrite malformed citations in place
        #[arg(long)]
        fix: bool,
    },
    /// Print the JSON Schema for derived records
    Schema,
}

#[derive(Args)]
struct SourceArgs {
    /// Agreement text file
    file: PathBuf,
    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// First line at which Article headings are accepted
    #[arg(long)]
    min_offset: Option<usize>,
    /// Lines searched for an Article title (at most 4)
    #[arg(long)]
    lookahead: Option<usize>,
    /// Section heading shape: labeled or bare
    #[arg(long)]
    section_pattern: Option<SectionPattern>,
    /// Comma-separated expected numerals
    #[arg(long)]
    expected: Option<String>,
}

impl SourceArgs {
    /// Defaults, then YAML, then environment, then flags.
    fn load_config(&self) -> Result<SegmentConfig, String> {
        let base = match &self.config {
            Some(path) => SegmentConfig::from_yaml_file(path).map_err(|e| e.to_string())?,
            None => SegmentConfig::default(),
        };
        let mut config = base.apply_env().map_err(|e| e.to_string())?;

        if let Some(min_offset) = self.min_offset {
            config.min_offset = min_offset;
        }
        if let Some(lookahead) = self.lookahead {
            config.lookahead = lookahead;
        }
        if let Some(pattern) = self.section_pattern {
            config.section_pattern = pattern;
        }
        if let Some(expected) = &self.expected {
            config.expected_numerals = parse_numeral_list(expected);
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    fn ingest(&self) -> Result<pipeline::Ingestion, String> {
        let config = self.load_config()?;
        let text = std::fs::read_to_string(&self.file)
            .map_err(|e| format!("Failed to read {}: {}", self.file.display(), e))?;
        pipeline::ingest(&document_name(&self.file), &text, &config).map_err(|e| e.to_string())
    }
}

/// Get the default database path (~/.local/share/covenant/covenant.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("covenant").join("covenant.db")
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

fn with_store(db: Option<PathBuf>, run: impl FnOnce(&SqliteStore) -> i32) -> i32 {
    match open_store(db) {
        Ok(store) => run(&store),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_outline(node: &DocumentNode, depth: usize) {
    let end = node.end_line.unwrap_or(node.start_line);
    let label = match node.kind {
        NodeKind::Document => node.title.clone(),
        _ => format!(
            "{} {}",
            node.citation.as_deref().unwrap_or("(orphan section)"),
            node.title
        ),
    };
    println!("{}{} [{}..{})", "  ".repeat(depth), label.trim_end(), node.start_line, end);
    for child in &node.children {
        print_outline(child, depth + 1);
    }
}

fn cmd_segment(source: &SourceArgs, save: bool, json: bool, db: Option<PathBuf>) -> i32 {
    let ingestion = match source.ingest() {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if json {
        match serde_json::to_string_pretty(&ingestion.rows) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        print_outline(&ingestion.segmentation.root, 0);
        for anomaly in &ingestion.segmentation.anomalies {
            println!("  ! {}", anomaly);
        }
    }

    if save {
        let store = match open_store(db) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        };
        match pipeline::store_ingestion(&store, &ingestion) {
            Ok(n) => eprintln!("Saved {} rows as '{}'", n, ingestion.source),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }
    0
}

fn cmd_coverage(source: &SourceArgs) -> i32 {
    let ingestion = match source.ingest() {
        Ok(i) => i,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let report = &ingestion.coverage;
    let found = report.present_numerals.len() - report.extra_numerals.len();
    println!(
        "{} of {} expected articles present ({:.3})",
        found,
        found + report.missing_numerals.len(),
        report.coverage_ratio
    );
    if !report.missing_numerals.is_empty() {
        println!("missing: {}", report.missing_numerals.join(", "));
    }
    if !report.extra_numerals.is_empty() {
        println!("unexpected: {}", report.extra_numerals.join(", "));
    }
    0
}

fn cmd_import(store: &SqliteStore, collection: &str, path: &Path) -> i32 {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", path.display(), e);
            return 1;
        }
    };
    let records: Vec<DerivedRecord> = match serde_json::from_str(&text) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: invalid records file: {}", e);
            return 1;
        }
    };
    for record in &records {
        if let Err(e) = store.save_record(collection, record) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    println!("Imported {} records into '{}'", records.len(), collection);
    0
}

fn parse_above(arg: &str) -> Result<(String, f64), String> {
    let (field, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=N, got '{}'", arg))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid number in '{}': {}", arg, e))?;
    Ok((field.trim().to_string(), value))
}

fn cmd_audit(
    store: &SqliteStore,
    collection: &str,
    category: Option<String>,
    above: Option<String>,
    json: bool,
) -> i32 {
    let mut filter = RecordFilter::new();
    if let Some(category) = category {
        filter = filter.with_category(category);
    }
    if let Some(arg) = above {
        match parse_above(&arg) {
            Ok((field, value)) => filter = filter.with_field_above(field, value),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }

    let audit = match audit_collection(store, collection, &filter, PAGE_SIZE) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let reports = audit.reports();

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        for report in &reports {
            println!("{}", report);
        }
        let summary = audit.summary();
        println!(
            "{} of {} records in violation ({} out of range, {} none marked, {} multiple marked)",
            summary.violations(),
            summary.checked,
            summary.out_of_range,
            summary.none_marked,
            summary.multiple_marked
        );
    }
    0
}

fn cmd_repair(
    store: &SqliteStore,
    collection: &str,
    id: &str,
    hints: &[String],
    sibling: Option<String>,
    apply: bool,
) -> i32 {
    let stored = match store.load_record(collection, id) {
        Ok(Some(s)) => s,
        Ok(None) => {
            eprintln!("Error: record '{}' not found in '{}'", id, collection);
            return 1;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let Some(report) = check(&stored.record) else {
        println!("{}: no violation", id);
        return 0;
    };
    println!("{}", report);

    let action = match sibling {
        Some(text) => plan_with_evidence(&stored.record, &report, &Evidence::SiblingAnswer(text)),
        None => plan(&stored.record, &report, hints),
    };
    println!("proposed: {}", action);

    if !apply || !action.is_resolved() {
        return 0;
    }
    match apply_repair(store, collection, &stored, &action) {
        Ok(Some(version)) => {
            println!("applied (version {})", version);
            0
        }
        Ok(None) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_citations(store: &SqliteStore, collection: &str, document: &str, fix: bool) -> i32 {
    if fix {
        match repair_citations(store, collection, PAGE_SIZE) {
            Ok(outcome) => {
                println!("Repaired {} citations", outcome.changed);
                if !outcome.conflicts.is_empty() {
                    eprintln!(
                        "Skipped {} records changed by another writer: {}",
                        outcome.conflicts.len(),
                        outcome.conflicts.join(", ")
                    );
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }

    let rows = match store.load_structure(document) {
        Ok(rows) if rows.is_empty() => {
            eprintln!("Error: no stored structure for '{}'", document);
            return 1;
        }
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let index = CitationIndex::from_rows(&rows);

    let records = match store.find_records(collection, &RecordFilter::new()) {
        Ok(found) => found.into_iter().map(|s| s.record).collect::<Vec<_>>(),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let issues = audit_citations(&records, &index);
    for issue in &issues {
        match &issue.repaired {
            Some(repaired) => println!(
                "{}: {:?} '{}' -> '{}'",
                issue.record_id, issue.kind, issue.original, repaired
            ),
            None => println!("{}: {:?} '{}'", issue.record_id, issue.kind, issue.original),
        }
    }
    println!("{} citation issues in {} records", issues.len(), records.len());
    0
}

fn cmd_schema() -> i32 {
    let schema = schemars::schema_for!(DerivedRecord);
    match serde_json::to_string_pretty(&schema) {
        Ok(out) => {
            println!("{}", out);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("covenant=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = cli.db;
    let code = match cli.command {
        Commands::Segment { source, save, json } => cmd_segment(&source, save, json, db),
        Commands::Coverage { source } => cmd_coverage(&source),
        Commands::Import { collection, path } => {
            with_store(db, |store| cmd_import(store, &collection, &path))
        }
        Commands::Audit {
            collection,
            category,
            above,
            json,
        } => with_store(db, |store| cmd_audit(store, &collection, category, above, json)),
        Commands::Repair {
            collection,
            id,
            hints,
            sibling,
            apply,
        } => with_store(db, |store| {
            cmd_repair(store, &collection, &id, &hints, sibling, apply)
        }),
        Commands::Citations {
            collection,
            document,
            fix,
        } => with_store(db, |store| cmd_citations(store, &collection, &document, fix)),
        Commands::Schema => cmd_schema(),
    };
    std::process::exit(code);
}
