//! Selection of model coefficients for a requested date.
use crate::error::{GeomagError, Result};
use crate::models::coefficients::Coefficients;
use crate::models::table::ModelTable;
use clap::ValueEnum;
use indexmap::IndexMap;
use rust_embed::RustEmbed;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

#[derive(RustEmbed)]
#[folder = "data/"]
struct ModelData;

/// Oldest date any supported model reaches, in years
pub const OLDEST_SUPPORTED_DATE: f64 = -8000.0;
/// Dates before this use the 10k-year paleosecular-variation model by default
pub const HOLOCENE_MODEL_CUTOFF: f64 = -1000.0;
/// First epoch of the modern IGRF/DGRF family
pub const MODERN_ERA_START: f64 = 1900.0;
/// Years covered by a published secular-variation column
pub const SECULAR_VARIATION_SPAN: f64 = 5.0;

/// Spherical-harmonic model families the store can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ModelFamily {
    /// International Geomagnetic Reference Field, 1900 onwards at 5-year steps
    Igrf,
    /// Historical field model of Jackson et al. (2000)
    Gufm1,
    /// Archeomagnetic model covering the last three millennia
    Arch3k,
    /// Continuous archeomagnetic and lake-sediment model covering the last three millennia
    Cals3k,
    /// Continuous archeomagnetic and lake-sediment model covering the last ten millennia
    Cals10k,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 5] = [
        ModelFamily::Igrf,
        ModelFamily::Gufm1,
        ModelFamily::Arch3k,
        ModelFamily::Cals3k,
        ModelFamily::Cals10k,
    ];

    /// Name of the coefficient table file holding this family
    pub fn file_name(&self) -> &'static str {
        match self {
            ModelFamily::Igrf => "igrf.txt",
            ModelFamily::Gufm1 => "gufm1.txt",
            ModelFamily::Arch3k => "arch3k.txt",
            ModelFamily::Cals3k => "cals3k.txt",
            ModelFamily::Cals10k => "cals10k.txt",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFamily::Igrf => write!(f, "IGRF"),
            ModelFamily::Gufm1 => write!(f, "GUFM1"),
            ModelFamily::Arch3k => write!(f, "ARCH3K"),
            ModelFamily::Cals3k => write!(f, "CALS3K"),
            ModelFamily::Cals10k => write!(f, "CALS10K"),
        }
    }
}

/// Coefficients chosen for one date: the main field at `epoch` and the annual rate of change
/// to apply for `date - epoch` years
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCoefficients {
    pub family: ModelFamily,
    pub epoch: f64,
    pub main_field: Coefficients,
    pub secular_variation: Coefficients,
}

/// Read-only registry of coefficient tables, one per model family
#[derive(Debug, Clone, Default)]
pub struct CoefficientStore {
    tables: IndexMap<ModelFamily, ModelTable>,
}

impl CoefficientStore {
    /// An empty store, to be filled with `with_table`
    pub fn new() -> CoefficientStore {
        CoefficientStore::default()
    }

    /// Store holding every table compiled into the crate from `data/`.
    ///
    /// # Errors
    /// Will return `Err` if an embedded table is malformed.
    pub fn embedded() -> Result<CoefficientStore> {
        let mut store = CoefficientStore::new();
        for family in ModelFamily::ALL {
            if let Some(file) = ModelData::get(family.file_name()) {
                let table = ModelTable::from_reader(file.data.as_ref())?;
                store.insert(family, table);
            }
        }
        Ok(store)
    }

    /// The embedded tables, extended or replaced by any `<family>.txt` tables found in `dir`.
    ///
    /// # Errors
    /// Will return `Err` if a table file cannot be read or is malformed.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<CoefficientStore> {
        let mut store = CoefficientStore::embedded()?;
        for family in ModelFamily::ALL {
            let path = dir.as_ref().join(family.file_name());
            if path.is_file() {
                let table = ModelTable::from_reader(BufReader::new(File::open(&path)?))?;
                store.insert(family, table);
            }
        }
        Ok(store)
    }

    pub fn with_table(mut self, family: ModelFamily, table: ModelTable) -> CoefficientStore {
        self.insert(family, table);
        self
    }

    /// Adds or replaces the table of `family`, returning the replaced table.
    pub fn insert(&mut self, family: ModelFamily, table: ModelTable) -> Option<ModelTable> {
        info!(
            family = %family,
            epochs = table.epochs().len(),
            first = table.first_epoch(),
            last = table.last_epoch(),
            "loaded coefficient table"
        );
        self.tables.insert(family, table)
    }

    pub fn table(&self, family: ModelFamily) -> Option<&ModelTable> {
        self.tables.get(&family)
    }

    /// Families with a loaded table, in load order
    pub fn families(&self) -> impl Iterator<Item = ModelFamily> + '_ {
        self.tables.keys().copied()
    }

    /// Epochs tabulated for `family`.
    ///
    /// # Errors
    /// Will return `Err` if no table is loaded for `family`.
    pub fn epochs(&self, family: ModelFamily) -> Result<&[f64]> {
        Ok(self.require(family)?.epochs())
    }

    /// Main-field and secular-variation coefficients for `date` in decimal years.
    ///
    /// Dates from 1900 use the IGRF family: interpolated between its 5-year epochs, or
    /// extrapolated from the latest epoch with its published secular variation. Older dates
    /// use `hint` if given, otherwise CALS10K before -1000 and CALS3K after. A historical
    /// epoch whose successor reaches 1900 takes its secular variation from the IGRF 1900 field.
    ///
    /// # Errors
    /// Will return `Err` if `date` is older than -8000, or if the tables needed for `date`
    /// are not loaded or do not cover it.
    pub fn coefficients(
        &self,
        date: f64,
        hint: Option<ModelFamily>,
    ) -> Result<SelectedCoefficients> {
        if date.is_nan() || date < OLDEST_SUPPORTED_DATE {
            Err(GeomagError::OutOfRange(date))?
        }
        if date >= MODERN_ERA_START {
            return self.modern(date);
        }
        let family = match hint {
            Some(family) if family != ModelFamily::Igrf => family,
            _ if date < HOLOCENE_MODEL_CUTOFF => ModelFamily::Cals10k,
            _ => ModelFamily::Cals3k,
        };
        self.historical(family, date)
    }

    /// Main-field coefficients of the epoch selected for `date`.
    ///
    /// # Errors
    /// Will return `Err` under the same conditions as [`CoefficientStore::coefficients`].
    pub fn main_field(&self, date: f64, hint: Option<ModelFamily>) -> Result<Coefficients> {
        Ok(self.coefficients(date, hint)?.main_field)
    }

    fn require(&self, family: ModelFamily) -> Result<&ModelTable> {
        self.table(family)
            .ok_or(GeomagError::MissingModel(family))
    }

    fn historical(&self, family: ModelFamily, date: f64) -> Result<SelectedCoefficients> {
        let table = self.require(family)?;
        let epoch = table.lower_epoch(date);
        let main_field = table
            .main_field_at(epoch)
            .ok_or(GeomagError::MissingEpoch { family, epoch })?
            .clone();

        let secular_variation = match table.step() {
            Some(step) if epoch + step >= MODERN_ERA_START => {
                let modern = self
                    .require(ModelFamily::Igrf)?
                    .main_field_at(MODERN_ERA_START)
                    .ok_or(GeomagError::MissingEpoch {
                        family: ModelFamily::Igrf,
                        epoch: MODERN_ERA_START,
                    })?;
                debug!(%family, date, epoch, "secular variation bridged to IGRF 1900");
                main_field.rate_towards(modern, MODERN_ERA_START - epoch)
            }
            Some(step) => match table.main_field_at(epoch + step) {
                Some(next) => {
                    debug!(%family, date, epoch, "secular variation interpolated");
                    main_field.rate_towards(next, step)
                }
                None => {
                    debug!(%family, date, epoch, "no later epoch, secular variation flat");
                    Coefficients::zeros()
                }
            },
            None => {
                debug!(%family, date, epoch, "single epoch, secular variation flat");
                Coefficients::zeros()
            }
        };

        Ok(SelectedCoefficients {
            family,
            epoch,
            main_field,
            secular_variation,
        })
    }

    fn modern(&self, date: f64) -> Result<SelectedCoefficients> {
        let family = ModelFamily::Igrf;
        let table = self.require(family)?;
        let latest = table.last_epoch();

        if date >= latest {
            let secular_variation = table
                .secular_variation()
                .ok_or(GeomagError::MissingSecularVariation(family))?
                .clone();
            let main_field = table
                .main_field_at(latest)
                .ok_or(GeomagError::MissingEpoch {
                    family,
                    epoch: latest,
                })?
                .clone();
            if date - latest > SECULAR_VARIATION_SPAN {
                warn!(
                    date,
                    latest, "extrapolating past the span of the published secular variation"
                );
            }
            debug!(%family, date, epoch = latest, "published secular variation");
            return Ok(SelectedCoefficients {
                family,
                epoch: latest,
                main_field,
                secular_variation,
            });
        }

        let epoch = table.lower_epoch(date);
        let main_field = table
            .main_field_at(epoch)
            .ok_or(GeomagError::MissingEpoch { family, epoch })?;
        let step = table
            .step()
            .ok_or(GeomagError::MissingEpoch { family, epoch })?;
        let next = table
            .main_field_at(epoch + step)
            .ok_or(GeomagError::MissingEpoch {
                family,
                epoch: epoch + step,
            })?;
        debug!(%family, date, epoch, "secular variation interpolated");

        Ok(SelectedCoefficients {
            family,
            epoch,
            main_field: main_field.clone(),
            secular_variation: main_field.rate_towards(next, step),
        })
    }
}

static DEFAULT_STORE: OnceLock<Result<CoefficientStore>> = OnceLock::new();

/// Process-wide store of the embedded tables, loaded on first use and never modified.
///
/// # Errors
/// Will return `Err` if an embedded table is malformed.
pub fn default_store() -> Result<&'static CoefficientStore> {
    DEFAULT_STORE
        .get_or_init(CoefficientStore::embedded)
        .as_ref()
        .map_err(|e| {
            GeomagError::InvalidTable(format!("Unable to load embedded coefficient tables: {e}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::coefficients::{Harmonic, NUM_COEFFICIENTS};
    use approx::assert_relative_eq;

    fn uniform(value: f64) -> Coefficients {
        Coefficients::from_slice(&[value; NUM_COEFFICIENTS]).unwrap()
    }

    /// Table whose coefficients all equal `values[i]` at `epochs[i]`
    fn table(epochs: &[f64], values: &[f64], sv: Option<f64>) -> ModelTable {
        ModelTable::new(
            epochs.to_vec(),
            values.iter().map(|v| uniform(*v)).collect(),
            sv.map(uniform),
        )
        .unwrap()
    }

    fn g10(coefficients: &Coefficients) -> f64 {
        coefficients.get(1, 0, Harmonic::Cosine)
    }

    fn store() -> CoefficientStore {
        CoefficientStore::new()
            .with_table(
                ModelFamily::Cals10k,
                table(&[-8000.0, -7950.0, -7900.0], &[1.0, 2.0, 3.0], None),
            )
            .with_table(
                ModelFamily::Cals3k,
                table(&[1750.0, 1800.0, 1850.0], &[1.0, 2.0, 3.0], None),
            )
            .with_table(
                ModelFamily::Arch3k,
                table(&[1800.0, 1850.0], &[5.0, 6.0], None),
            )
            .with_table(
                ModelFamily::Igrf,
                table(&[1900.0, 1905.0, 1910.0], &[10.0, 11.0, 13.0], Some(0.5)),
            )
    }

    #[test]
    fn rejects_dates_before_every_model() {
        assert!(matches!(
            store().coefficients(-8000.5, None),
            Err(GeomagError::OutOfRange(_))
        ));
        assert!(matches!(
            store().coefficients(f64::NAN, None),
            Err(GeomagError::OutOfRange(_))
        ));
        assert!(store().coefficients(-8000.0, None).is_ok());
    }

    #[test]
    fn interpolates_paleo_epochs() {
        let selected = store().coefficients(-7930.0, None).unwrap();
        assert_eq!(selected.family, ModelFamily::Cals10k);
        assert_eq!(selected.epoch, -7950.0);
        assert_eq!(g10(&selected.main_field), 2.0);
        assert_relative_eq!(g10(&selected.secular_variation), 0.02);
    }

    #[test]
    fn last_paleo_epoch_is_flat() {
        let selected = store().coefficients(-7880.0, None).unwrap();
        assert_eq!(selected.epoch, -7900.0);
        assert_eq!(selected.secular_variation, Coefficients::zeros());
    }

    #[test]
    fn bridges_historical_epochs_to_igrf_1900() {
        let selected = store().coefficients(1860.0, None).unwrap();
        assert_eq!(selected.family, ModelFamily::Cals3k);
        assert_eq!(selected.epoch, 1850.0);
        assert_relative_eq!(g10(&selected.secular_variation), (10.0 - 3.0) / 50.0);

        let selected = store().coefficients(1820.0, None).unwrap();
        assert_relative_eq!(g10(&selected.secular_variation), 1.0 / 50.0);
    }

    #[test]
    fn hint_selects_the_paleo_family() {
        let selected = store()
            .coefficients(1810.0, Some(ModelFamily::Arch3k))
            .unwrap();
        assert_eq!(selected.family, ModelFamily::Arch3k);
        assert_eq!(g10(&selected.main_field), 5.0);

        let selected = store()
            .coefficients(1810.0, Some(ModelFamily::Igrf))
            .unwrap();
        assert_eq!(selected.family, ModelFamily::Cals3k);

        let selected = store()
            .coefficients(1910.0, Some(ModelFamily::Arch3k))
            .unwrap();
        assert_eq!(selected.family, ModelFamily::Igrf);
    }

    #[test]
    fn reports_missing_models_and_epochs() {
        assert!(matches!(
            store().coefficients(1810.0, Some(ModelFamily::Gufm1)),
            Err(GeomagError::MissingModel(ModelFamily::Gufm1))
        ));
        assert!(matches!(
            store().coefficients(1700.0, None),
            Err(GeomagError::MissingEpoch {
                family: ModelFamily::Cals3k,
                ..
            })
        ));
        assert!(matches!(
            store().coefficients(-5000.0, None),
            Err(GeomagError::MissingEpoch {
                family: ModelFamily::Cals10k,
                ..
            })
        ));
    }

    #[test]
    fn interpolates_modern_epochs() {
        let selected = store().coefficients(1907.5, None).unwrap();
        assert_eq!(selected.family, ModelFamily::Igrf);
        assert_eq!(selected.epoch, 1905.0);
        assert_eq!(g10(&selected.main_field), 11.0);
        assert_relative_eq!(g10(&selected.secular_variation), 0.4);
    }

    #[test]
    fn tabulated_epochs_return_their_coefficients() {
        let selected = store().coefficients(1905.0, None).unwrap();
        assert_eq!(selected.epoch, 1905.0);
        assert_eq!(selected.main_field, uniform(11.0));
    }

    #[test]
    fn extrapolates_with_published_secular_variation() {
        let selected = store().coefficients(1913.0, None).unwrap();
        assert_eq!(selected.epoch, 1910.0);
        assert_eq!(selected.main_field, uniform(13.0));
        assert_eq!(selected.secular_variation, uniform(0.5));

        let without_sv = CoefficientStore::new().with_table(
            ModelFamily::Igrf,
            table(&[1900.0, 1905.0], &[1.0, 2.0], None),
        );
        assert!(matches!(
            without_sv.coefficients(1906.0, None),
            Err(GeomagError::MissingSecularVariation(ModelFamily::Igrf))
        ));
    }

    #[test]
    fn main_field_matches_selection() {
        assert_eq!(store().main_field(1907.5, None).unwrap(), uniform(11.0));
    }

    #[test]
    fn embedded_store_holds_igrf() {
        let store = CoefficientStore::embedded().unwrap();
        assert_eq!(store.families().collect::<Vec<_>>(), vec![ModelFamily::Igrf]);
        let epochs = store.epochs(ModelFamily::Igrf).unwrap();
        assert_eq!(epochs.len(), 24);
        assert_eq!(epochs[0], MODERN_ERA_START);
        assert_eq!(epochs[epochs.len() - 1], 2015.0);
        assert!(store.epochs(ModelFamily::Cals3k).is_err());

        let selected = store.coefficients(1952.5, None).unwrap();
        assert_eq!(selected.epoch, 1950.0);
        assert_eq!(selected.main_field.get(1, 0, Harmonic::Cosine), -30554.0);
        assert_relative_eq!(
            selected.secular_variation.get(1, 0, Harmonic::Cosine),
            (-30500.0 - -30554.0) / 5.0
        );

        // Pre-1900 dates bridge to the bundled 1900 field once a paleo table is loaded
        assert!(matches!(
            store.coefficients(1890.0, None),
            Err(GeomagError::MissingModel(ModelFamily::Cals3k))
        ));
    }

    #[test]
    fn default_store_is_shared() {
        let first = default_store().unwrap() as *const CoefficientStore;
        let second = default_store().unwrap() as *const CoefficientStore;
        assert_eq!(first, second);
    }
}
