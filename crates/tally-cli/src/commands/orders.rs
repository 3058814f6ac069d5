//! Orders command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use tally_domain::RecordStore;

/// Execute the orders command.
pub async fn execute_orders(config: &Config, formatter: &Formatter) -> Result<()> {
    let store = super::open_store(config)?;
    let orders = store.list_orders()?;
    println!("{}", formatter.format_orders(&orders)?);
    Ok(())
}
