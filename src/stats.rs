//! Per-sample CSV sidecar, ported from `original_source/src/stats.cpp`.
//!
//! Kept as its own module (rather than folded into the CLI) because
//! `original_source` keeps it as its own class independent of the algorithm
//! and the network layer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub drift: f64,
    pub drift_error: f64,
    pub offset: f64,
    pub offset_error: f64,
}

#[derive(Default)]
pub struct SyncStats {
    samples: Vec<Sample>,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sample(&mut self, drift: f64, drift_error: f64, offset: f64, offset_error: f64) {
        self.samples.push(Sample { drift, drift_error, offset, offset_error });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Writes `Sample;Drift;Drift Error;Offset;Offset Error`, one row per
    /// recorded sample, and returns the number of rows written. On write
    /// failure the partial file is removed, matching the original's
    /// catch-and-clean-up behaviour.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        match self.try_write_csv(path) {
            Ok(n) => Ok(n),
            Err(e) => {
                let _ = std::fs::remove_file(path);
                Err(e)
            }
        }
    }

    fn try_write_csv(&self, path: &Path) -> Result<usize> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "Sample;Drift;Drift Error;Offset;Offset Error")?;
        for (i, s) in self.samples.iter().enumerate() {
            writeln!(out, "{};{};{};{};{}", i, s.drift, s.drift_error, s.offset, s.offset_error)?;
        }
        out.flush()?;
        Ok(self.samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn writes_header_and_one_row_per_sample() {
        let mut stats = SyncStats::new();
        stats.add_sample(1.000001, 0.0000002, 120.5, 3.2);
        stats.add_sample(1.000002, 0.0000001, 121.0, 3.1);

        let tmp = NamedTempFile::new().unwrap();
        let n = stats.write_csv(tmp.path()).unwrap();
        assert_eq!(n, 2);

        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "Sample;Drift;Drift Error;Offset;Offset Error");
        assert_eq!(lines.next().unwrap(), "0;1.000001;0.0000002;120.5;3.2");
        assert_eq!(lines.next().unwrap(), "1;1.000002;0.0000001;121;3.1");
    }

    #[test]
    fn empty_stats_writes_header_only() {
        let stats = SyncStats::new();
        let tmp = NamedTempFile::new().unwrap();
        let n = stats.write_csv(tmp.path()).unwrap();
        assert_eq!(n, 0);
        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
