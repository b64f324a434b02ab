//! Chronon CLI - inspect and regenerate live-coding scripts

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use chronon::codegen::generate_source;
use chronon::timeline_parser::parse_timeline;
use chronon::TimelineData;

#[derive(Parser)]
#[command(name = "chronon")]
#[command(about = "Script/timeline bridge for live-coding buffers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script into its timeline projection (JSON on stdout)
    Parse {
        /// Script file to parse
        input: PathBuf,

        /// Buffer id recorded on every clip
        #[arg(short, long, default_value = "0")]
        buffer: u32,

        /// Fallback bpm when the script has no use_bpm pragma
        #[arg(long, default_value = "120")]
        bpm: u32,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Regenerate a script from a timeline JSON file
    Generate {
        /// Timeline JSON (as produced by `parse`)
        input: PathBuf,
    },
}

fn main() -> Result<(), String> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parse {
            input,
            buffer,
            bpm,
            pretty,
        } => {
            let source = fs::read_to_string(&input)
                .map_err(|e| format!("reading {}: {}", input.display(), e))?;
            let timeline = parse_timeline(&source, buffer, bpm);
            let json = if pretty {
                serde_json::to_string_pretty(&timeline)
            } else {
                serde_json::to_string(&timeline)
            }
            .map_err(|e| format!("serializing timeline: {}", e))?;
            println!("{}", json);
        }
        Commands::Generate { input } => {
            let json = fs::read_to_string(&input)
                .map_err(|e| format!("reading {}: {}", input.display(), e))?;
            let timeline: TimelineData =
                serde_json::from_str(&json).map_err(|e| format!("parsing timeline: {}", e))?;
            print!("{}", generate_source(&timeline));
        }
    }
    Ok(())
}
