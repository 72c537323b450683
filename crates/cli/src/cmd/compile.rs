//! Implementation of the `devgen compile` command.
//!
//! Loads a configuration, runs the scheduler, and writes the generated code
//! to `--out` or stdout. The run summary never goes to stdout when stdout
//! carries the generated code.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde_json::json;

use devgen_lib::compile_to;
use devgen_lib::config::load_config;
use devgen_lib::schedule::{BuildOptions, BuildReport};

use crate::output::{
  EmitTarget, format_bytes, format_duration, print_error, print_json, print_stat, print_success, print_warning,
  truncate_hash,
};

use super::error_json;

pub struct CompileArgs {
  pub config: PathBuf,
  pub out: Option<PathBuf>,
  pub format: EmitTarget,
  pub fail_fast: bool,
  pub skip_requirements: bool,
  pub json: bool,
}

pub fn cmd_compile(args: &CompileArgs) -> Result<()> {
  let options = BuildOptions {
    fail_fast: args.fail_fast,
    check_requirements: !args.skip_requirements,
  };
  let started = Instant::now();

  // Load before touching --out so a bad config leaves no empty file behind.
  let tree = load_config(&args.config).with_context(|| format!("Failed to compile config: {}", args.config.display()))?;

  let report = match &args.out {
    Some(out) => {
      let file = File::create(out).with_context(|| format!("Failed to create output file: {}", out.display()))?;
      compile_to(&tree, &options, args.format.into(), BufWriter::new(file))
    }
    None => compile_to(&tree, &options, args.format.into(), io::stdout().lock()),
  }
  .with_context(|| format!("Failed to compile config: {}", args.config.display()))?;

  print_problems(&report);

  if args.json {
    print_json(&report_json(&report))?;
  } else if let Some(out) = &args.out {
    let size = fs::metadata(out).map(|m| m.len()).unwrap_or(0);
    if report.is_success() {
      print_success(&format!("Generated {}", out.display()));
    }
    print_stat("Objects", &report.emitted.len().to_string());
    print_stat("Size", &format_bytes(size));
    print_stat("Fingerprint", truncate_hash(&report.fingerprint.0));
    print_stat("Time", &format_duration(started.elapsed()));
  }

  if !report.is_success() {
    bail!(
      "compilation failed: {} error(s), {} skipped, {} cancelled",
      report.errors.len(),
      report.skipped.len(),
      report.cancelled.len()
    );
  }

  Ok(())
}

fn print_problems(report: &BuildReport) {
  for error in &report.errors {
    print_error(&error.to_string());
  }
  for error in report.skipped_errors() {
    print_warning(&error.to_string());
  }
  for id in &report.cancelled {
    print_warning(&format!("'{}' cancelled", id));
  }
}

fn report_json(report: &BuildReport) -> serde_json::Value {
  json!({
    "success": report.is_success(),
    "fingerprint": report.fingerprint,
    "emitted": report.emitted,
    "errors": report.errors.iter().map(error_json).collect::<Vec<_>>(),
    "failed": report.failed,
    "skipped": report.skipped,
    "cancelled": report.cancelled,
  })
}
