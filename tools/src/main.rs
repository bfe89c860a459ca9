use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arena_tools::{
    decode_packet_json, format_decode_pretty, inspect_packet, schema_json, InspectReport,
};
use clap::{Parser, Subcommand, ValueEnum};
use codec::CodecLimits;
use glob::Pattern;

#[derive(Parser)]
#[command(
    name = "arena-tools",
    version,
    about = "arena capture inspection and decoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect packet structure and sizes.
    Inspect {
        /// Packet file, or a directory of captures.
        packet_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected packets.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected packets (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Decode an update packet with field names resolved.
    Decode {
        /// Path to the packet bytes.
        packet_file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Print the compiled field table and its fingerprint as JSON.
    Schema,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let limits = CodecLimits::default();
    match cli.command {
        Command::Inspect {
            packet_path,
            glob,
            sort,
            limit,
        } => {
            if packet_path.is_dir() {
                let mut captures = collect_captures(&packet_path, glob.as_deref())?;
                order_captures(&mut captures, sort);
                // Size sorting defaults to the ten largest.
                if let Some(limit) = limit.or(sort.map(|InspectSort::Size| 10)) {
                    captures.truncate(limit);
                }
                for capture in &captures {
                    let report = inspect_file(&capture.path, &limits)?;
                    println!("== {} ({} bytes) ==", capture.path.display(), capture.size);
                    print_inspect_report(&report);
                }
            } else {
                let report = inspect_file(&packet_path, &limits)?;
                print_inspect_report(&report);
            }
        }
        Command::Decode {
            packet_file,
            format,
        } => {
            let bytes = fs::read(&packet_file)
                .with_context(|| format!("read packet {}", packet_file.display()))?;
            let output = decode_packet_json(&bytes, &limits)
                .with_context(|| format!("decode {}", packet_file.display()))?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&output).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => {
                    print!("{}", format_decode_pretty(&output));
                }
            }
        }
        Command::Schema => {
            let json = serde_json::to_string_pretty(&schema_json()).context("serialize schema")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn inspect_file(path: &Path, limits: &CodecLimits) -> Result<InspectReport> {
    let bytes = fs::read(path).with_context(|| format!("read packet {}", path.display()))?;
    inspect_packet(&bytes, limits).with_context(|| format!("inspect {}", path.display()))
}

/// A capture file found while walking a directory.
struct Capture {
    path: PathBuf,
    size: u64,
}

/// Lists packet files in `dir` by name, skipping JSON side files such as
/// `summary.json`.
fn collect_captures(dir: &Path, glob: Option<&str>) -> Result<Vec<Capture>> {
    let pattern = glob
        .map(Pattern::new)
        .transpose()
        .context("invalid glob pattern")?;
    let mut captures = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        if pattern.as_ref().is_some_and(|pattern| !glob_matches(pattern, &path)) {
            continue;
        }
        captures.push(Capture {
            size: entry.metadata()?.len(),
            path,
        });
    }
    captures.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(captures)
}

/// Accepts either a full-path or a bare file-name match.
fn glob_matches(pattern: &Pattern, path: &Path) -> bool {
    pattern.matches_path(path)
        || path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| pattern.matches(name))
}

fn order_captures(captures: &mut [Capture], sort: Option<InspectSort>) {
    if let Some(InspectSort::Size) = sort {
        captures.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    }
}

fn print_inspect_report(report: &InspectReport) {
    println!(
        "kind: {} (0x{:02x}) total: {} bytes",
        report.kind, report.header, report.total_bytes
    );
    if let Some(tick) = report.tick {
        println!(
            "tick: {tick} deletes: {} updates: {} creations: {}",
            report.deletes, report.updates, report.creations
        );
    }
    if let Some(sizes) = &report.sizes {
        println!("sections:");
        println!("  framing: {} bytes", sizes.framing_bytes);
        println!("  deletes: {} bytes", sizes.delete_bytes);
        println!("  updates: {} bytes", sizes.update_bytes);
        println!("  creations: {} bytes", sizes.creation_bytes);
    }
    if let Some(detail) = &report.detail {
        println!("{detail}");
    }
}
