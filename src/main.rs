//! Soil CLI - run vault commands through the enrich / init / execute lifecycle.

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use soil::{
    CliOptions, EngineCache, LifecycleError, LookupArgs, LookupReport, Note, NotesReport,
    ShowArgs, lookup_command, notes_command, show_command,
};
use std::process;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SOIL_LOG";

#[derive(Parser)]
#[command(name = "soil")]
#[command(about = "Run commands against a note vault")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notes in a vault (single-root engine)
    Notes {
        #[command(flatten)]
        options: CliOptions,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Fuzzy lookup of notes by name or title (multi-vault engine)
    Lookup {
        #[command(flatten)]
        args: LookupArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print a single note (multi-vault engine)
    Show {
        #[command(flatten)]
        args: ShowArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("soil=error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn is_json(format: &str) -> bool {
    format == "json"
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("{}", json!({"error": "serialize_error", "detail": e.to_string()}));
            process::exit(1);
        }
    }
}

fn emit_error(format: &str, err: &LifecycleError) -> ! {
    if is_json(format) {
        eprintln!(
            "{}",
            json!({
                "error": err.code(),
                "phase": err.phase().to_string(),
                "detail": err.to_string(),
            })
        );
    } else {
        eprintln!("{}", format!("Error: {}", err).red());
    }
    process::exit(1);
}

fn print_notes(format: &str, report: &NotesReport) {
    if is_json(format) {
        return print_json(report);
    }
    println!(
        "{}",
        format!("{} notes in {}", report.notes.len(), report.vault.display()).bold()
    );
    for note in &report.notes {
        let indent = "  ".repeat(note.depth + 1);
        println!("{}{} - {}", indent, note.fname.cyan(), note.title);
    }
}

fn print_lookup(format: &str, report: &LookupReport) {
    if is_json(format) {
        return print_json(report);
    }
    if report.results.is_empty() {
        println!("{}", format!("No notes match '{}'", report.query).yellow());
        return;
    }
    println!(
        "{}",
        format!(
            "{} of {} matches for '{}' ({})",
            report.results.len(),
            report.total,
            report.query,
            report.mode
        )
        .dimmed()
    );
    for note in &report.results {
        println!("  {} - {}", note.fname.cyan(), note.title);
    }
}

fn print_note(format: &str, note: &Note) {
    if is_json(format) {
        return print_json(note);
    }
    println!("{}", note.title.bold());
    println!("{}", format!("{} ({})", note.fname, note.path.display()).dimmed());
    if let Some(updated) = note.updated {
        println!("{}", format!("updated {}", updated.to_rfc3339()).dimmed());
    }
    println!();
    print!("{}", note.body);
    if !note.body.is_empty() && !note.body.ends_with('\n') {
        println!();
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to start runtime: {}", e).red());
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Notes { options, format } => {
            let command = notes_command(EngineCache::new());
            match rt.block_on(command.eval(options)) {
                Ok(report) => print_notes(&format, &report),
                Err(e) => emit_error(&format, &e),
            }
        }

        Commands::Lookup { args, format } => {
            let command = lookup_command(tracing::info_span!("engine", command = "lookup"));
            match rt.block_on(command.eval(args)) {
                Ok(report) => print_lookup(&format, &report),
                Err(e) => emit_error(&format, &e),
            }
        }

        Commands::Show { args, format } => {
            let command = show_command(tracing::info_span!("engine", command = "show"));
            match rt.block_on(command.eval(args)) {
                Ok(note) => print_note(&format, &note),
                Err(e) => emit_error(&format, &e),
            }
        }
    }
}
