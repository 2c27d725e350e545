//! CSV rebalance log writer.
//!
//! Writes one row per target weight: `date,code,side,weight`. A rebalance
//! that goes entirely to cash writes a single `cash` row with an empty code
//! so every rebalance date shows up in the log.

use crate::domain::error::MadError;
use crate::domain::sizing::TargetWeights;
use crate::ports::weight_sink::WeightSink;
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub struct CsvWeightSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl CsvWeightSink<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, MadError> {
        let file = File::create(path.as_ref())?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvWeightSink<W> {
    pub fn from_writer(inner: W) -> Result<Self, MadError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer
            .write_record(["date", "code", "side", "weight"])
            .map_err(sink_error)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, MadError> {
        self.writer.into_inner().map_err(|e| MadError::Sink {
            reason: e.to_string(),
        })
    }
}

fn sink_error(e: csv::Error) -> MadError {
    MadError::Sink {
        reason: e.to_string(),
    }
}

impl<W: Write> WeightSink for CsvWeightSink<W> {
    fn submit(&mut self, date: NaiveDate, weights: &TargetWeights) -> Result<(), MadError> {
        let date = date.format("%Y-%m-%d").to_string();

        if weights.is_empty() {
            self.writer
                .write_record([date.as_str(), "", "cash", "0"])
                .map_err(sink_error)?;
            self.rows += 1;
            return Ok(());
        }

        for (code, weight) in weights.iter() {
            let side = if weight > 0.0 { "long" } else { "short" };
            let weight = format!("{:.6}", weight);
            self.writer
                .write_record([date.as_str(), code, side, weight.as_str()])
                .map_err(sink_error)?;
            self.rows += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), MadError> {
        self.writer.flush()?;
        Ok(())
    }
}
