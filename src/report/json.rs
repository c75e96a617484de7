//! JSON report: the dashboard view as-is

use crate::dashboard::Dashboard;
use crate::error::Result;
use std::io::Write;

pub fn write<W: Write>(writer: &mut W, dashboard: &Dashboard) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, dashboard)?;
    writeln!(writer)?;
    Ok(())
}
