//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use tally_domain::CompletionProvider;
use tally_extractor::{AutoExtractor, Extractor, TesseractExtractor};
use tally_ingest::{DocumentOutcome, DocumentReport, IngestCoordinator, Pipeline};
use tracing::info;

/// Execute the ingest command.
///
/// Every document is attempted; the command fails afterwards if any of them
/// failed. Duplicates are not failures.
pub async fn execute_ingest(args: IngestArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let reports = ingest(super::completion_provider(config), args, config).await?;
    println!("{}", formatter.format_reports(&reports)?);

    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, DocumentOutcome::Failed { .. }))
        .count();
    if failed > 0 {
        return Err(CliError::Ingest {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

async fn ingest<L: CompletionProvider>(
    llm: L,
    args: IngestArgs,
    config: &Config,
) -> Result<Vec<DocumentReport>> {
    config.extractor.validate().map_err(CliError::Config)?;

    let extractor = Extractor::new(
        AutoExtractor::new(TesseractExtractor::new()),
        llm,
        config.extractor.clone(),
    );

    let mut coordinator = IngestCoordinator::new(super::open_store(config)?);
    let export_dir = if args.no_export {
        None
    } else {
        args.export_dir.or_else(|| config.export_dir.clone())
    };
    if let Some(dir) = export_dir {
        coordinator = coordinator.with_export_dir(dir);
    }

    info!("Ingesting {} document(s)", args.files.len());
    let mut pipeline = Pipeline::new(extractor, coordinator);
    Ok(pipeline.ingest_batch(&args.files).await)
}
