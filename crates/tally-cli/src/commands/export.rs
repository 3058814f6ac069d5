//! Export command implementation.

use crate::cli::ExportArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::PathBuf;
use tally_store::{export_tables, ExportSummary};

/// Execute the export command.
pub async fn execute_export(args: ExportArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let summary = export(args, config)?;
    println!("{}", formatter.format_export(&summary)?);
    Ok(())
}

fn export(args: ExportArgs, config: &Config) -> Result<ExportSummary> {
    let dir = export_dir(args.dir, config)?;
    let store = super::open_store(config)?;
    Ok(export_tables(&store, &dir)?)
}

fn export_dir(requested: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    requested.or_else(|| config.export_dir.clone()).ok_or_else(|| {
        CliError::InvalidInput(
            "No export directory configured; pass --dir or set export_dir".to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_domain::{Order, RecordStore};
    use tally_store::load_orders;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config {
            database_path: dir.path().join("tally.db"),
            export_dir: Some(dir.path().join("exports")),
            ..Config::default()
        }
    }

    #[test]
    fn test_export_to_configured_dir() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let mut store = super::super::open_store(&config).unwrap();
        store.create_order(&Order::new("A100")).unwrap();
        drop(store);

        let summary = export(ExportArgs { dir: None }, &config).unwrap();
        assert_eq!(summary.orders, 1);
        assert_eq!(summary.line_items, 0);
        assert!(summary.orders_path.starts_with(dir.path().join("exports")));
        assert_eq!(load_orders(&summary.orders_path).unwrap()[0].order_id, "A100");
    }

    #[test]
    fn test_explicit_dir_wins() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let target = dir.path().join("elsewhere");

        let summary = export(ExportArgs { dir: Some(target.clone()) }, &config).unwrap();
        assert!(summary.orders_path.starts_with(&target));
        assert_eq!(summary.orders, 0);
    }

    #[test]
    fn test_no_dir_configured() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            export_dir: None,
            ..config(&dir)
        };
        assert!(matches!(
            export(ExportArgs { dir: None }, &config),
            Err(CliError::InvalidInput(_))
        ));
    }
}
