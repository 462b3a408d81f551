//! Subcommand execution
//!
//! Each command loads the snapshot, runs one engine operation, writes its
//! result to `output` and saves the snapshot when the operation changed it.

use crate::cli::args::{CliArgs, Command, PaymentsArgs, PromoteArgs, StrategyType};
use crate::config::SchoolConfig;
use crate::core::promotion::{promote_students, PromotionRequest};
use crate::core::report::{generate_year_end_report, store_report};
use crate::core::FeeEngine;
use crate::io::admission::import_admissions;
use crate::io::csv_format::write_balances_csv;
use crate::io::snapshot::SchoolSnapshot;
use crate::strategy::create_strategy;
use crate::types::{AcademicYearId, SchoolError};
use chrono::Local;
use std::io::Write;
use std::path::Path;
use tracing::info;

fn write_error(e: std::io::Error) -> SchoolError {
    SchoolError::IoError {
        message: format!("Failed to write output: {}", e),
    }
}

/// Run the parsed command line
pub fn run(args: CliArgs, output: &mut dyn Write) -> Result<(), SchoolError> {
    let config = SchoolConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Payments(payments_args) => payments(&config, &payments_args, output),
        Command::Balances { snapshot, year } => balances(&config, &snapshot, year, output),
        Command::Admit {
            snapshot,
            input_file,
        } => admit(&snapshot, &input_file, output),
        Command::Promote(promote_args) => promote(&promote_args, output),
        Command::Report { snapshot, year } => report(&snapshot, year, output),
    }
}

fn payments(
    config: &SchoolConfig,
    args: &PaymentsArgs,
    output: &mut dyn Write,
) -> Result<(), SchoolError> {
    let snapshot = SchoolSnapshot::load(&args.snapshot)?;

    let batch_config = match args.strategy {
        StrategyType::Async => Some(args.to_batch_config(config)),
        StrategyType::Sync => None,
    };
    let strategy = create_strategy(args.strategy, config.payment_rules(), batch_config);
    let snapshot = strategy.process(snapshot, &args.input_file, output)?;

    if args.save {
        snapshot.save(&args.snapshot)?;
    }
    Ok(())
}

fn balances(
    config: &SchoolConfig,
    path: &Path,
    year: Option<AcademicYearId>,
    output: &mut dyn Write,
) -> Result<(), SchoolError> {
    let (registry, ledger) = SchoolSnapshot::load(path)?.into_parts()?;
    let engine = FeeEngine::new(registry, ledger, config.payment_rules());
    write_balances_csv(&engine.balances(year)?, output)
}

fn admit(path: &Path, input: &Path, output: &mut dyn Write) -> Result<(), SchoolError> {
    let (mut registry, ledger) = SchoolSnapshot::load(path)?.into_parts()?;
    let summary = import_admissions(&mut registry, input)?;

    if !summary.inserted.is_empty() {
        SchoolSnapshot::from_parts(&registry, &ledger).save(path)?;
    }

    writeln!(
        output,
        "admitted {} of {} students",
        summary.inserted.len(),
        summary.total()
    )
    .map_err(write_error)?;
    for (line, reason) in &summary.failed {
        writeln!(output, "line {}: {}", line, reason).map_err(write_error)?;
    }
    Ok(())
}

fn promote(args: &PromoteArgs, output: &mut dyn Write) -> Result<(), SchoolError> {
    let (mut registry, ledger) = SchoolSnapshot::load(&args.snapshot)?.into_parts()?;

    let executed_on = args.date.unwrap_or_else(|| Local::now().date_naive());
    let mut request = PromotionRequest::new(args.from_year, args.to_year, executed_on);
    request.retain.extend(args.retain.iter().copied());
    request.transfer.extend(args.transfer.iter().copied());
    request.graduate.extend(args.graduate.iter().copied());

    let outcome = promote_students(&mut registry, &request)?;
    SchoolSnapshot::from_parts(&registry, &ledger).save(&args.snapshot)?;

    let t = &outcome.transition;
    writeln!(
        output,
        "academic year {} -> {}: promoted {}, retained {}, transferred {}, graduated {}",
        t.from_year, t.to_year, t.promoted, t.retained, t.transferred, t.graduated
    )
    .map_err(write_error)?;
    Ok(())
}

fn report(path: &Path, year: AcademicYearId, output: &mut dyn Write) -> Result<(), SchoolError> {
    let (mut registry, ledger) = SchoolSnapshot::load(path)?.into_parts()?;

    let report = generate_year_end_report(&registry, &ledger, year, Local::now().date_naive())?;
    let key = store_report(&mut registry, &report)?;
    SchoolSnapshot::from_parts(&registry, &ledger).save(path)?;
    info!(key = %key, "report saved to snapshot");

    let json = serde_json::to_string_pretty(&report)?;
    writeln!(output, "{}", json).map_err(write_error)?;
    Ok(())
}
