// A64Mask - AArch64 Logical Immediate Toolkit
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use a64mask_core::{decode_bitmask, move_wide_preferred, EncodingFields, Outcome, RegisterWidth};

mod vectors;
use vectors::VectorRecord;

const EXIT_PASS: u8 = 0;
const EXIT_MISMATCH: u8 = 1;
const EXIT_INPUT_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const REPORT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "AArch64 logical-immediate decoder toolkit",
    long_about = None
)]
struct Cli {
    /// Enable per-decode diagnostics
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a vector file against the decoder.
    Check(CheckArgs),

    /// Decode a single (immN, imms, immr) triple.
    Decode(DecodeArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Vector file: structured YAML, or the legacy whitespace text
    vectors: PathBuf,

    /// Check every record instead of halting at the first mismatch
    #[arg(long)]
    keep_going: bool,

    /// Write a machine-readable run report (JSON)
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// immN field (0 or 1)
    #[arg(long)]
    n: u8,

    /// imms field (0..63)
    #[arg(long)]
    imms: u8,

    /// immr field (0..63)
    #[arg(long)]
    immr: u8,

    /// Decode for a 32-bit W register (sf = 0)
    #[arg(long)]
    w32: bool,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    schema_version: String,
    vector_file: String,
    vector_sha256: String,
    total: usize,
    checked: usize,
    passed: usize,
    mismatches: Vec<Mismatch>,
}

#[derive(Debug, Serialize)]
struct Mismatch {
    index: usize,
    n: u8,
    imms: u8,
    immr: u8,
    expected: String,
    actual: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Decode diagnostics sit at TRACE; the runner itself logs at INFO.
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Commands::Check(args) => run_check(&args),
        Commands::Decode(args) => run_decode(&args),
    }
}

fn run_check(args: &CheckArgs) -> ExitCode {
    let raw = match std::fs::read(&args.vectors) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Failed to read vector file {:?}: {}", args.vectors, e);
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };
    let mut hasher = Sha256::new();
    hasher.update(&raw);
    let digest = format!("{:x}", hasher.finalize());

    let text = match std::str::from_utf8(&raw) {
        Ok(text) => text,
        Err(e) => {
            error!("Vector file {:?} is not UTF-8: {}", args.vectors, e);
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };

    let records = match vectors::parse_vectors(&args.vectors, text) {
        Ok(records) => records,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };
    info!("Loaded {} vectors from {:?}", records.len(), args.vectors);

    let mut mismatches = Vec::new();
    let mut checked = 0usize;

    for (index, record) in records.iter().enumerate() {
        let encoding = match record.encoding() {
            Ok(encoding) => encoding,
            Err(e) => {
                error!("Vector {}: {}", index, e);
                return ExitCode::from(EXIT_INPUT_ERROR);
            }
        };

        checked += 1;
        if let Some(mismatch) = check_record(index, record, encoding) {
            error!(
                "Vector {} mismatch: N={} immr={} imms={} expected {}, got {}",
                index, mismatch.n, mismatch.immr, mismatch.imms, mismatch.expected, mismatch.actual
            );
            mismatches.push(mismatch);
            if !args.keep_going {
                break;
            }
        }
    }

    let report = CheckReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        vector_file: args.vectors.display().to_string(),
        vector_sha256: digest,
        total: records.len(),
        checked,
        passed: checked - mismatches.len(),
        mismatches,
    };

    if let Some(path) = &args.report {
        if let Err(e) = write_report(path, &report) {
            error!("Failed to write report: {:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    if report.mismatches.is_empty() {
        info!("All {} vectors passed", report.checked);
        ExitCode::from(EXIT_PASS)
    } else {
        error!(
            "{} of {} vectors failed",
            report.mismatches.len(),
            report.checked
        );
        ExitCode::from(EXIT_MISMATCH)
    }
}

/// Decodes one record and compares against its expected immediate,
/// truncated to the register width its N field selects.
fn check_record(index: usize, record: &VectorRecord, encoding: EncodingFields) -> Option<Mismatch> {
    let width = encoding.register_width();
    let outcome = decode_bitmask(encoding.n, encoding.imms, encoding.immr, true, width);

    let actual = match outcome {
        Outcome::Valid(value) => {
            let masked = width.mask(value);
            if masked == record.imm {
                return None;
            }
            format!("{masked:#x}")
        }
        // A reserved encoding can never match an expected immediate.
        Outcome::Reserved => "reserved".to_string(),
    };

    Some(Mismatch {
        index,
        n: encoding.n,
        imms: encoding.imms,
        immr: encoding.immr,
        expected: format!("{:#x}", record.imm),
        actual,
    })
}

fn write_report(path: &Path, report: &CheckReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report to {path:?}"))?;
    info!("Report written to {:?}", path);
    Ok(())
}

fn run_decode(args: &DecodeArgs) -> ExitCode {
    let encoding = match EncodingFields::try_new(args.n, args.imms, args.immr) {
        Ok(encoding) => encoding,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };

    let sf = !args.w32;
    let width = RegisterWidth::from_sf(sf);

    match decode_bitmask(encoding.n, encoding.imms, encoding.immr, true, width) {
        Outcome::Valid(value) => {
            println!("imm: {:#x}", width.mask(value));
            let preferred = move_wide_preferred(sf, encoding.n, encoding.imms, encoding.immr);
            println!(
                "move-wide preferred: {}",
                if preferred { "yes" } else { "no" }
            );
        }
        Outcome::Reserved => {
            println!("reserved");
        }
    }

    ExitCode::from(EXIT_PASS)
}
