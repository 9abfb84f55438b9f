use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::EdaError;
use crate::schema::*;

/// Holds the two input tables for one analysis run.
///
/// Tables are loaded once, cleaned, and then only read. Every derived frame
/// (sheep species, joined observations) is built fresh from the loaded ones.
pub struct BiodiversityModel {
    base_path: PathBuf,
    species: Option<DataFrame>,
    observations: Option<DataFrame>,
}

impl BiodiversityModel {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            species: None,
            observations: None,
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load the species CSV.
    ///
    /// Required columns: scientific_name, common_names, category, conservation_status.
    /// Missing conservation_status is filled with "No Intervention", and the
    /// is_protected / is_sheep flags are derived.
    pub fn load_species(&mut self) -> Result<DataFrame, EdaError> {
        let fname = files::SPECIES_CSV;
        let raw = self.read_csv_as_strings(fname)?;
        Self::require_columns(&raw, &species::REQUIRED)?;

        let df = Self::clean_species(raw)?;
        info!(rows = df.height(), file = fname, "loaded species table");

        self.species = Some(df.clone());
        Ok(df)
    }

    /// Load the observations CSV.
    ///
    /// Required columns: scientific_name, park_name, observations.
    /// observations is parsed to Int64; unparseable cells become null.
    pub fn load_observations(&mut self) -> Result<DataFrame, EdaError> {
        let fname = files::OBSERVATIONS_CSV;
        let raw = self.read_csv_as_strings(fname)?;
        Self::require_columns(&raw, &observation::REQUIRED)?;

        let df = Self::parse_int_column(raw, observation::OBSERVATIONS)?;
        info!(rows = df.height(), file = fname, "loaded observations table");

        self.observations = Some(df.clone());
        Ok(df)
    }

    // ── Cleaning ────────────────────────────────────────────────────────────

    /// Fill missing conservation_status and add the derived boolean flags.
    pub fn clean_species(raw: DataFrame) -> Result<DataFrame, EdaError> {
        let df = raw
            .lazy()
            .with_columns([col(species::CONSERVATION_STATUS)
                .fill_null(lit(values::NO_INTERVENTION))
                .alias(species::CONSERVATION_STATUS)])
            .with_columns([
                col(species::CONSERVATION_STATUS)
                    .neq(lit(values::NO_INTERVENTION))
                    .alias(derived::IS_PROTECTED),
                col(species::COMMON_NAMES)
                    .str()
                    .contains_literal(lit(values::SHEEP_MARKER))
                    .fill_null(lit(false))
                    .alias(derived::IS_SHEEP),
            ])
            .collect()?;
        Ok(df)
    }

    // ── Filtering / join ────────────────────────────────────────────────────

    /// Species whose common names mention sheep and whose category is Mammal.
    pub fn filter_sheep(species_df: &DataFrame) -> Result<DataFrame, EdaError> {
        let df = species_df
            .clone()
            .lazy()
            .filter(
                col(derived::IS_SHEEP)
                    .and(col(species::CATEGORY).eq(lit(values::MAMMAL))),
            )
            .collect()?;
        Ok(df)
    }

    /// Inner join of observations onto species on scientific_name.
    ///
    /// Produces one row per matching observation row, with the species
    /// attributes repeated, in the row order of the observations table.
    pub fn join_observations(
        observations_df: &DataFrame,
        species_df: &DataFrame,
    ) -> Result<DataFrame, EdaError> {
        let joined = observations_df
            .clone()
            .lazy()
            .with_row_index(derived::ROW_ORDER, None)
            .join(
                species_df.clone().lazy(),
                [col(observation::SCIENTIFIC_NAME)],
                [col(species::SCIENTIFIC_NAME)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort([derived::ROW_ORDER], SortMultipleOptions::default())
            .collect()?;

        Ok(joined.drop(derived::ROW_ORDER)?)
    }

    /// Sheep observations: filtered sheep species joined to the loaded observations.
    pub fn sheep_observations(&self) -> Result<DataFrame, EdaError> {
        let sheep = Self::filter_sheep(self.species_df()?)?;
        debug!(species = sheep.height(), "sheep species selected");

        let joined = Self::join_observations(self.observations_df()?, &sheep)?;
        debug!(rows = joined.height(), "sheep observations joined");
        Ok(joined)
    }

    // ── Properties ──────────────────────────────────────────────────────────

    pub fn species_df(&self) -> Result<&DataFrame, EdaError> {
        self.species
            .as_ref()
            .ok_or_else(|| EdaError::NotLoaded("species".into()))
    }

    pub fn observations_df(&self) -> Result<&DataFrame, EdaError> {
        self.observations
            .as_ref()
            .ok_or_else(|| EdaError::NotLoaded("observations".into()))
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl BiodiversityModel {
    /// Read a CSV file with all columns as String dtype.
    /// Trims whitespace from column names.
    fn read_csv_as_strings(&self, filename: &str) -> Result<DataFrame, EdaError> {
        let path = self.base_path.join(filename);
        debug!(path = %path.display(), "reading csv");
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0)) // all columns as String
            .try_into_reader_with_file_path(Some(path))?
            .finish()?;

        let trimmed: Vec<String> = df
            .get_column_names_str()
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        df.set_column_names(trimmed.as_slice())?;

        Ok(df)
    }

    fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), EdaError> {
        for &col_name in required {
            if df.column(col_name).is_err() {
                return Err(EdaError::MissingColumn(col_name.to_string()));
            }
        }
        Ok(())
    }

    fn parse_int_column(df: DataFrame, column: &str) -> Result<DataFrame, EdaError> {
        let df = df
            .lazy()
            .with_columns([col(column)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::Int64)])
            .collect()?;
        Ok(df)
    }
}
