//! Tabulated spherical-harmonic models.
//!
//! Tables use the published IGRF column layout:
//!
//! ```text
//! # comment
//! c/s deg ord  DGRF      IGRF      SV
//! g/h n m    2010.0    2015.0   2015-20
//! g  1  0 -29496.57 -29442.00     10.30
//! g  1  1  -1586.42  -1501.00     18.10
//! h  1  1   4944.26   4797.10    -26.60
//! ```
//!
//! The `g/h` header names one column per epoch. A label with a `-` after its
//! first character (`2015-20`) is the published secular variation for the last
//! epoch. Rows above degree `MAX_DEGREE` are dropped.
use crate::error::{GeomagError, Result};
use crate::models::coefficients::{Coefficients, Harmonic, MAX_DEGREE, NUM_COEFFICIENTS};
use is_close::is_close;
use itertools::Itertools;
use std::io::BufRead;

/// A model family's main-field coefficients at evenly spaced epochs
#[derive(Debug, Clone)]
pub struct ModelTable {
    epochs: Vec<f64>,
    main_field: Vec<Coefficients>,
    secular_variation: Option<Coefficients>,
    step: Option<f64>,
}

impl ModelTable {
    /// # Errors
    /// Will return `Err` if there are no epochs, if the epochs and coefficient sets differ
    /// in number, or if the epochs are not strictly increasing and evenly spaced.
    pub fn new(
        epochs: Vec<f64>,
        main_field: Vec<Coefficients>,
        secular_variation: Option<Coefficients>,
    ) -> Result<ModelTable> {
        if epochs.is_empty() {
            Err(GeomagError::InvalidTable(
                "Coefficient table has no epochs".to_string(),
            ))?
        }
        if epochs.len() != main_field.len() {
            Err(GeomagError::InvalidTable(format!(
                "Coefficient table has {} epochs but {} coefficient sets",
                epochs.len(),
                main_field.len()
            )))?
        }
        let step = match epochs.as_slice() {
            [first, second, ..] => Some(second - first),
            _ => None,
        };
        if let Some(step) = step {
            if step <= 0.0 {
                Err(GeomagError::InvalidTable(
                    "Epochs must be strictly increasing".to_string(),
                ))?
            }
            for (a, b) in epochs.iter().tuple_windows() {
                if !is_close!(b - a, step) {
                    Err(GeomagError::InvalidTable(format!(
                        "Epochs must be evenly spaced: {a} to {b} breaks the {step} year step"
                    )))?
                }
            }
        }
        Ok(ModelTable {
            epochs,
            main_field,
            secular_variation,
            step,
        })
    }

    /// Reads a table in the IGRF column layout.
    ///
    /// # Errors
    /// Will return `Err` if the text cannot be read or does not follow the layout.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<ModelTable> {
        let mut columns: Option<Vec<Column>> = None;
        let mut values: Vec<[Option<f64>; NUM_COEFFICIENTS]> = vec![];

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("c/s") {
                continue;
            }
            let mut fields = line.split_whitespace();
            let kind = fields.next().unwrap_or_default();

            if kind == "g/h" {
                let header = fields
                    .skip(2)
                    .map(Column::parse)
                    .collect::<Result<Vec<Column>>>()?;
                values = vec![[None; NUM_COEFFICIENTS]; header.len()];
                columns = Some(header);
                continue;
            }

            let Some(columns) = columns.as_ref() else {
                return Err(GeomagError::InvalidTable(format!(
                    "Line {}: coefficients found before the g/h header",
                    line_num + 1
                )));
            };
            let harmonic = match kind {
                "g" => Harmonic::Cosine,
                "h" => Harmonic::Sine,
                _ => Err(GeomagError::InvalidTable(format!(
                    "Line {}: expected g or h, found '{kind}'",
                    line_num + 1
                )))?,
            };
            let (degree, order) = match fields.next_tuple() {
                Some((n, m)) => (
                    parse_index(n, line_num)?,
                    parse_index(m, line_num)?,
                ),
                None => Err(GeomagError::InvalidTable(format!(
                    "Line {}: missing degree and order",
                    line_num + 1
                )))?,
            };
            if degree == 0 || order > degree || (order == 0 && harmonic == Harmonic::Sine) {
                Err(GeomagError::InvalidTable(format!(
                    "Line {}: no such coefficient ({degree}, {order})",
                    line_num + 1
                )))?
            }
            if degree > MAX_DEGREE {
                continue;
            }

            let row = fields
                .map(|v| {
                    v.parse::<f64>().map_err(|_| {
                        GeomagError::InvalidTable(format!(
                            "Line {}: unable to read coefficient '{v}'",
                            line_num + 1
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            if row.len() != columns.len() {
                Err(GeomagError::InvalidTable(format!(
                    "Line {}: expected {} values, found {}",
                    line_num + 1,
                    columns.len(),
                    row.len()
                )))?
            }
            let index = Coefficients::index(degree, order, harmonic);
            for (column, value) in values.iter_mut().zip_eq(row) {
                if column[index].replace(value).is_some() {
                    Err(GeomagError::InvalidTable(format!(
                        "Line {}: coefficient ({degree}, {order}) given twice",
                        line_num + 1
                    )))?
                }
            }
        }

        let columns = columns.ok_or_else(|| {
            GeomagError::InvalidTable("Coefficient table has no g/h header".to_string())
        })?;

        let mut epochs = vec![];
        let mut main_field = vec![];
        let mut secular_variation = None;
        for (column, column_values) in columns.into_iter().zip_eq(values) {
            let coefficients = column_values
                .into_iter()
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| {
                    GeomagError::InvalidTable(format!(
                        "Column {column} is missing coefficients up to degree {MAX_DEGREE}"
                    ))
                })?;
            let coefficients = Coefficients::from_slice(&coefficients)?;
            match column {
                Column::Epoch(epoch) => {
                    if secular_variation.is_some() {
                        Err(GeomagError::InvalidTable(
                            "The secular variation column must be the last column".to_string(),
                        ))?
                    }
                    epochs.push(epoch);
                    main_field.push(coefficients);
                }
                Column::SecularVariation(_) => {
                    if secular_variation.replace(coefficients).is_some() {
                        Err(GeomagError::InvalidTable(
                            "Coefficient table has more than one secular variation column"
                                .to_string(),
                        ))?
                    }
                }
            }
        }
        ModelTable::new(epochs, main_field, secular_variation)
    }

    /// Reads a table from text in the IGRF column layout.
    ///
    /// # Errors
    /// Will return `Err` if the text does not follow the layout.
    pub fn parse(text: &str) -> Result<ModelTable> {
        ModelTable::from_reader(text.as_bytes())
    }

    pub fn epochs(&self) -> &[f64] {
        &self.epochs
    }

    pub fn first_epoch(&self) -> f64 {
        self.epochs[0]
    }

    pub fn last_epoch(&self) -> f64 {
        self.epochs[self.epochs.len() - 1]
    }

    /// Spacing between epochs in years, `None` for a single-epoch table
    pub fn step(&self) -> Option<f64> {
        self.step
    }

    pub fn secular_variation(&self) -> Option<&Coefficients> {
        self.secular_variation.as_ref()
    }

    /// The tabulated epoch at or below `date` on this table's grid. May fall outside the table.
    pub fn lower_epoch(&self, date: f64) -> f64 {
        match self.step {
            Some(step) => {
                let first = self.first_epoch();
                first + ((date - first) / step).floor() * step
            }
            None => self.first_epoch(),
        }
    }

    /// Main-field coefficients tabulated at `epoch`, if the table has that epoch
    pub fn main_field_at(&self, epoch: f64) -> Option<&Coefficients> {
        let index = match self.step {
            Some(step) => {
                let offset = ((epoch - self.first_epoch()) / step).round();
                if offset < 0.0 {
                    return None;
                }
                offset as usize
            }
            None => 0,
        };
        let tabulated = *self.epochs.get(index)?;
        if is_close!(tabulated, epoch) {
            self.main_field.get(index)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Epoch(f64),
    SecularVariation(f64),
}

impl Column {
    fn parse(label: &str) -> Result<Column> {
        let invalid =
            || GeomagError::InvalidTable(format!("Unable to read epoch column '{label}'"));
        match label.char_indices().skip(1).find(|(_, c)| *c == '-') {
            Some((i, _)) => label[..i]
                .parse::<f64>()
                .map(Column::SecularVariation)
                .map_err(|_| invalid()),
            None => label.parse::<f64>().map(Column::Epoch).map_err(|_| invalid()),
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Column::Epoch(epoch) => write!(f, "{epoch}"),
            Column::SecularVariation(epoch) => write!(f, "{epoch} SV"),
        }
    }
}

fn parse_index(field: &str, line_num: usize) -> Result<usize> {
    field.parse::<usize>().map_err(|_| {
        GeomagError::InvalidTable(format!(
            "Line {}: unable to read degree or order '{field}'",
            line_num + 1
        ))
    })
}
