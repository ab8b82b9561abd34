//! Engineering threshold tables for domain-based outlier screening.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A mapping from column name to the inclusive range of physically valid
/// values, supplied by process engineering rather than learned from data.
///
/// The default table covers the ladle furnace export columns; plants with
/// different instrumentation load their own table from JSON:
///
/// ```json
/// {
///   "nhiet_do_vao_tl": [1400.0, 1700.0],
///   "tieu_thu_dien": [0.0, 10000.0]
/// }
/// ```
///
/// # Example
///
/// ```ignore
/// use refinar::DomainThresholds;
///
/// let thresholds = DomainThresholds::default()
///     .with_range("custom_sensor", 0.0, 50.0);
/// assert_eq!(thresholds.get("nhiet_do_vao_tl"), Some((1400.0, 1700.0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainThresholds {
    ranges: BTreeMap<String, (f64, f64)>,
}

impl DomainThresholds {
    /// Creates an empty threshold table.
    pub fn empty() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    /// Loads a threshold table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let thresholds: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::invalid_config(format!("Invalid threshold table: {}", e)))?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Writes the threshold table to a JSON file.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(e, path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| Error::invalid_config(format!("Cannot serialize thresholds: {}", e)))?;
        Ok(())
    }

    /// Adds or replaces the range for a column.
    pub fn insert(&mut self, column: impl Into<String>, lower: f64, upper: f64) {
        self.ranges.insert(column.into(), (lower, upper));
    }

    /// Builder variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with_range(mut self, column: impl Into<String>, lower: f64, upper: f64) -> Self {
        self.insert(column, lower, upper);
        self
    }

    /// Returns the `(lower, upper)` range for a column, if defined.
    pub fn get(&self, column: &str) -> Option<(f64, f64)> {
        self.ranges.get(column).copied()
    }

    /// Returns true when a range is defined for the column.
    pub fn contains(&self, column: &str) -> bool {
        self.ranges.contains_key(column)
    }

    /// Number of columns with a defined range.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true when no ranges are defined.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterates over `(column, (lower, upper))` in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, (f64, f64))> {
        self.ranges.iter().map(|(name, range)| (name.as_str(), *range))
    }

    fn validate(&self) -> Result<()> {
        for (column, (lower, upper)) in &self.ranges {
            if lower > upper {
                return Err(Error::invalid_config(format!(
                    "Invalid range for '{}': lower {} exceeds upper {}",
                    column, lower, upper
                )));
            }
        }
        Ok(())
    }
}

/// The built-in ladle furnace table.
impl Default for DomainThresholds {
    fn default() -> Self {
        let mut t = Self::empty();

        // Temperatures (deg C)
        for col in [
            "nhiet_do_vao_tl",
            "nhiet_do_ra_thep",
            "nhiet_do_lan_1",
            "nhiet_do_duc_yeu_cau",
            "nhiet_do_do_tren_duc",
        ] {
            t.insert(col, 1400.0, 1700.0);
        }

        // Chemical composition (%)
        for col in ["C_truoc", "C_sau"] {
            t.insert(col, 0.0, 0.15);
        }
        for col in ["Si_truoc", "Si_sau", "S_truoc", "S_sau", "P_truoc", "P_sau"] {
            t.insert(col, 0.0, 0.05);
        }
        for col in ["Mn_truoc", "Mn_sau"] {
            t.insert(col, 0.0, 0.5);
        }

        // Trace elements (ppm)
        t.insert("Al", 0.0, 1000.0);
        t.insert("Canxi", 0.0, 200.0);

        // Additives (kg)
        for col in ["FeSi", "FeMn", "SiMn", "huynh_thach"] {
            t.insert(col, 0.0, 500.0);
        }
        t.insert("than", 0.0, 200.0);
        t.insert("voi_song", 0.0, 2000.0);
        t.insert("nhom_thoi", 0.0, 1000.0);
        t.insert("day_ca_dac", 0.0, 1000.0);

        // Durations (minutes); waiting time may be logged negative when
        // the ladle arrives ahead of schedule
        t.insert("processing_time_min", 0.0, 180.0);
        t.insert("wait_time_min", -200.0, 200.0);
        t.insert("thoi_gian_dinh_tre", 0.0, 300.0);

        // Energy (kWh)
        t.insert("tieu_thu_dien", 0.0, 10_000.0);

        // Derived temperature loss (deg C)
        t.insert("temp_loss", -100.0, 100.0);

        t
    }
}
