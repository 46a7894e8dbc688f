use crate::error::Result;
use crate::models::{StationSummary, StationTable};
use clap::ValueEnum;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `{name=min/mean/max, ...}` on one line
    #[default]
    Text,
    /// Array of per-station objects
    Json,
}

/// Renders the merged station table.
pub struct SummaryWriter {
    format: OutputFormat,
}

impl SummaryWriter {
    pub fn new() -> Self {
        Self {
            format: OutputFormat::Text,
        }
    }

    pub fn with_format(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn write_summary<W: Write>(&self, stations: &StationTable, out: &mut W) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text(stations, out),
            OutputFormat::Json => self.write_json(stations, out),
        }
    }

    /// Render into memory, e.g. for comparison in tests.
    pub fn render(&self, stations: &StationTable) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(stations.len() * 32 + 2);
        self.write_summary(stations, &mut buffer)?;
        Ok(buffer)
    }

    /// Station names are written as raw bytes; the table is already
    /// ordered by those bytes.
    fn write_text<W: Write>(&self, stations: &StationTable, out: &mut W) -> Result<()> {
        out.write_all(b"{")?;

        for (index, (station, measurements)) in stations.iter().enumerate() {
            let summary = StationSummary::from_measurements(station, measurements)?;
            if index > 0 {
                out.write_all(b", ")?;
            }
            out.write_all(station)?;
            write!(out, "={}/{}/{}", summary.min, summary.mean, summary.max)?;
        }

        out.write_all(b"}\n")?;
        out.flush()?;
        Ok(())
    }

    fn write_json<W: Write>(&self, stations: &StationTable, out: &mut W) -> Result<()> {
        let summaries = stations
            .iter()
            .map(|(station, measurements)| StationSummary::from_measurements(station, measurements))
            .collect::<Result<Vec<_>>>()?;

        serde_json::to_writer_pretty(&mut *out, &summaries)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

impl Default for SummaryWriter {
    fn default() -> Self {
        Self::new()
    }
}
