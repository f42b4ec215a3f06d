//! Audit exports for downstream reporting.

use crate::audit::filter::AuditFilter;
use crate::audit::log::AuditLog;
use crate::core::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Export format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Pretty-printed JSON array
    Json,
    /// One compact JSON object per line
    JsonLines,
}

impl AuditLog {
    /// Export matching records as a JSON array.
    pub fn export_json(&self, filter: &AuditFilter) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export(filter))?)
    }

    /// Export matching records as JSON lines.
    pub fn export_json_lines(&self, filter: &AuditFilter) -> Result<String> {
        let mut output = String::new();
        for record in self.export(filter) {
            output.push_str(&record.to_json()?);
            output.push('\n');
        }
        Ok(output)
    }

    /// Write matching records to a file; returns how many were written.
    pub fn export_to_file(
        &self,
        path: impl AsRef<Path>,
        filter: &AuditFilter,
        format: ExportFormat,
    ) -> Result<usize> {
        let records = self.export(filter);
        let mut writer = BufWriter::new(File::create(path.as_ref())?);

        match format {
            ExportFormat::Json => serde_json::to_writer_pretty(&mut writer, &records)?,
            ExportFormat::JsonLines => {
                for record in &records {
                    serde_json::to_writer(&mut writer, record)?;
                    writer.write_all(b"\n")?;
                }
            }
        }
        writer.flush()?;

        info!(
            path = %path.as_ref().display(),
            records = records.len(),
            ?format,
            "Audit log exported"
        );
        Ok(records.len())
    }
}
