use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::debug;

use crate::error::EdaError;
use crate::schema::{derived, observation, species};

// ── Protection counts ───────────────────────────────────────────────────────

/// Distinct species count for one conservation status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCount {
    pub conservation_status: String,
    pub species_count: u64,
}

/// Species per conservation status, ascending by count.
#[derive(Debug, Clone, Default)]
pub struct ProtectionCounts {
    rows: Vec<StatusCount>,
}

impl ProtectionCounts {
    /// Group the cleaned species table by conservation_status and count
    /// distinct scientific names. Ties keep first-occurrence order.
    pub fn from_species(species_df: &DataFrame) -> Result<Self, EdaError> {
        let df = species_df
            .clone()
            .lazy()
            .group_by_stable([col(species::CONSERVATION_STATUS)])
            .agg([col(species::SCIENTIFIC_NAME)
                .n_unique()
                .cast(DataType::Int64)
                .alias(derived::SPECIES_COUNT)])
            .sort(
                [derived::SPECIES_COUNT],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;

        let statuses = df.column(species::CONSERVATION_STATUS)?.str()?;
        let counts = df.column(derived::SPECIES_COUNT)?.i64()?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(status) = statuses.get(i) else {
                continue;
            };
            rows.push(StatusCount {
                conservation_status: status.to_string(),
                species_count: counts.get(i).unwrap_or(0).max(0) as u64,
            });
        }
        debug!(statuses = rows.len(), "protection counts computed");
        Ok(Self { rows })
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusCount> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.species_count).sum()
    }
}

// ── Category pivot ──────────────────────────────────────────────────────────

/// One row of the category × protection pivot.
///
/// A bucket with no species at all is `None`, mirroring an empty pivot cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProtection {
    pub category: String,
    pub not_protected: Option<u64>,
    pub protected: Option<u64>,
    /// protected / (protected + not_protected), with an empty bucket counted
    /// as zero. `None` when both buckets are empty.
    pub percent_protected: Option<f64>,
}

impl CategoryProtection {
    fn new(category: String, not_protected: Option<u64>, protected: Option<u64>) -> Self {
        let p = protected.unwrap_or(0);
        let total = p + not_protected.unwrap_or(0);
        let percent_protected = if total == 0 {
            None
        } else {
            Some(p as f64 / total as f64)
        };
        Self {
            category,
            not_protected,
            protected,
            percent_protected,
        }
    }

    pub fn protected_count(&self) -> u64 {
        self.protected.unwrap_or(0)
    }

    pub fn not_protected_count(&self) -> u64 {
        self.not_protected.unwrap_or(0)
    }
}

/// Protection rates per category, ordered by category name.
#[derive(Debug, Clone, Default)]
pub struct CategoryPivot {
    rows: Vec<CategoryProtection>,
}

impl CategoryPivot {
    /// Group by (category, is_protected), count distinct scientific names and
    /// spread is_protected into the not_protected / protected fields.
    pub fn from_species(species_df: &DataFrame) -> Result<Self, EdaError> {
        let df = species_df
            .clone()
            .lazy()
            .group_by([col(species::CATEGORY), col(derived::IS_PROTECTED)])
            .agg([col(species::SCIENTIFIC_NAME)
                .n_unique()
                .cast(DataType::Int64)
                .alias(derived::SPECIES_COUNT)])
            .collect()?;

        let categories = df.column(species::CATEGORY)?.str()?;
        let protected = df.column(derived::IS_PROTECTED)?.bool()?;
        let counts = df.column(derived::SPECIES_COUNT)?.i64()?;

        // category -> (not_protected, protected)
        let mut cells: BTreeMap<String, (Option<u64>, Option<u64>)> = BTreeMap::new();
        for i in 0..df.height() {
            let (Some(category), Some(is_protected)) = (categories.get(i), protected.get(i)) else {
                continue;
            };
            let count = counts.get(i).unwrap_or(0).max(0) as u64;
            let entry = cells.entry(category.to_string()).or_default();
            if is_protected {
                entry.1 = Some(count);
            } else {
                entry.0 = Some(count);
            }
        }

        let rows: Vec<CategoryProtection> = cells
            .into_iter()
            .map(|(category, (not_protected, protected))| {
                CategoryProtection::new(category, not_protected, protected)
            })
            .collect();
        debug!(categories = rows.len(), "category pivot computed");
        Ok(Self { rows })
    }

    pub fn get(&self, category: &str) -> Option<&CategoryProtection> {
        self.rows.iter().find(|r| r.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryProtection> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Observations by park ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ParkObservations {
    pub park_name: String,
    pub observations: i64,
}

/// Summed observations per park, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct ObservationsByPark {
    rows: Vec<ParkObservations>,
}

impl ObservationsByPark {
    /// Sum the observations column per park_name of a joined table.
    pub fn from_joined(joined_df: &DataFrame) -> Result<Self, EdaError> {
        let df = joined_df
            .clone()
            .lazy()
            .group_by_stable([col(observation::PARK_NAME)])
            .agg([col(observation::OBSERVATIONS).sum().cast(DataType::Int64)])
            .collect()?;

        let parks = df.column(observation::PARK_NAME)?.str()?;
        let sums = df.column(observation::OBSERVATIONS)?.i64()?;

        let rows = (0..df.height())
            .filter_map(|i| {
                parks.get(i).map(|park| ParkObservations {
                    park_name: park.to_string(),
                    observations: sums.get(i).unwrap_or(0),
                })
            })
            .collect::<Vec<_>>();
        debug!(parks = rows.len(), "observations grouped by park");
        Ok(Self { rows })
    }

    pub fn get(&self, park_name: &str) -> Option<i64> {
        self.rows
            .iter()
            .find(|r| r.park_name == park_name)
            .map(|r| r.observations)
    }

    /// Like `get`, but a missing park is an error.
    pub fn require(&self, park_name: &str) -> Result<i64, EdaError> {
        self.get(park_name)
            .ok_or_else(|| EdaError::MissingPark(park_name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParkObservations> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> i64 {
        self.rows.iter().map(|r| r.observations).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BiodiversityModel;

    fn species_fixture() -> DataFrame {
        let raw = df!(
            species::SCIENTIFIC_NAME => &[
                "Canis lupus", "Ovis canadensis", "Ursus americanus", "Lynx rufus",
                "Haliaeetus leucocephalus", "Vireo huttoni", "Crotalus oreganus",
            ],
            species::COMMON_NAMES => &[
                "Gray Wolf", "Bighorn Sheep", "Black Bear", "Bobcat",
                "Bald Eagle", "Hutton's Vireo", "Western Rattlesnake",
            ],
            species::CATEGORY => &[
                "Mammal", "Mammal", "Mammal", "Mammal", "Bird", "Bird", "Reptile",
            ],
            species::CONSERVATION_STATUS => &[
                Some("Endangered"), Some("Species of Concern"), None, None,
                Some("Species of Concern"), None, Some("Species of Concern"),
            ],
        )
        .unwrap();
        BiodiversityModel::clean_species(raw).unwrap()
    }

    #[test]
    fn test_protection_counts_ascending() {
        let counts = ProtectionCounts::from_species(&species_fixture()).unwrap();
        let rows: Vec<_> = counts.iter().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].conservation_status, "Endangered");
        assert_eq!(rows[0].species_count, 1);
        assert_eq!(rows[2].species_count, 3);
        assert!(rows.windows(2).all(|w| w[0].species_count <= w[1].species_count));
    }

    #[test]
    fn test_protection_counts_sum_to_distinct_species() {
        let df = species_fixture();
        let counts = ProtectionCounts::from_species(&df).unwrap();
        let distinct = df
            .column(species::SCIENTIFIC_NAME)
            .unwrap()
            .n_unique()
            .unwrap() as u64;
        assert_eq!(counts.total(), distinct);
    }

    #[test]
    fn test_category_pivot_counts_and_rates() {
        let pivot = CategoryPivot::from_species(&species_fixture()).unwrap();
        let categories: Vec<_> = pivot.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["Bird", "Mammal", "Reptile"]);

        let mammal = pivot.get("Mammal").unwrap();
        assert_eq!(mammal.protected, Some(2));
        assert_eq!(mammal.not_protected, Some(2));
        assert_eq!(mammal.percent_protected, Some(0.5));

        let bird = pivot.get("Bird").unwrap();
        assert_eq!(bird.protected, Some(1));
        assert_eq!(bird.not_protected, Some(1));
    }

    #[test]
    fn test_category_with_single_bucket_has_defined_rate() {
        let pivot = CategoryPivot::from_species(&species_fixture()).unwrap();
        let reptile = pivot.get("Reptile").unwrap();
        assert_eq!(reptile.not_protected, None);
        assert_eq!(reptile.protected, Some(1));
        assert_eq!(reptile.percent_protected, Some(1.0));
    }

    #[test]
    fn test_percent_protected_in_unit_interval() {
        let pivot = CategoryPivot::from_species(&species_fixture()).unwrap();
        for row in pivot.iter() {
            let pct = row.percent_protected.unwrap();
            assert!((0.0..=1.0).contains(&pct), "{}: {pct}", row.category);
        }
    }

    #[test]
    fn test_empty_buckets_yield_no_rate() {
        let row = CategoryProtection::new("Fungus".into(), None, None);
        assert_eq!(row.percent_protected, None);
        let row = CategoryProtection::new("Fungus".into(), Some(0), Some(0));
        assert_eq!(row.percent_protected, None);
    }

    #[test]
    fn test_observations_by_park_sums_in_first_occurrence_order() {
        let joined = df!(
            observation::SCIENTIFIC_NAME => &["Ovis canadensis", "Ovis aries", "Ovis canadensis", "Ovis aries"],
            observation::PARK_NAME => &["Yosemite", "Bryce", "Bryce", "Yosemite"],
            observation::OBSERVATIONS => &[3i64, 4, 5, 6],
        )
        .unwrap();
        let by_park = ObservationsByPark::from_joined(&joined).unwrap();

        let parks: Vec<_> = by_park.iter().map(|p| p.park_name.as_str()).collect();
        assert_eq!(parks, vec!["Yosemite", "Bryce"]);
        assert_eq!(by_park.get("Yosemite"), Some(9));
        assert_eq!(by_park.get("Bryce"), Some(9));
        assert_eq!(by_park.total(), 18);
    }

    #[test]
    fn test_join_then_group_matches_expected_parks() {
        let species_df = BiodiversityModel::clean_species(
            df!(
                species::SCIENTIFIC_NAME => &["Ovis canadensis"],
                species::COMMON_NAMES => &["Bighorn Sheep"],
                species::CATEGORY => &["Mammal"],
                species::CONSERVATION_STATUS => &[None::<&str>],
            )
            .unwrap(),
        )
        .unwrap();
        let obs = df!(
            observation::SCIENTIFIC_NAME => &["Ovis canadensis", "Ovis canadensis"],
            observation::PARK_NAME => &["Bryce", "Yosemite"],
            observation::OBSERVATIONS => &[5i64, 3],
        )
        .unwrap();

        let sheep = BiodiversityModel::filter_sheep(&species_df).unwrap();
        let joined = BiodiversityModel::join_observations(&obs, &sheep).unwrap();
        let by_park = ObservationsByPark::from_joined(&joined).unwrap();

        assert_eq!(by_park.len(), 2);
        assert_eq!(by_park.get("Bryce"), Some(5));
        assert_eq!(by_park.get("Yosemite"), Some(3));
    }

    #[test]
    fn test_missing_park_is_an_error() {
        let by_park = ObservationsByPark::default();
        assert!(by_park.is_empty());
        assert!(matches!(
            by_park.require("Bryce"),
            Err(EdaError::MissingPark(p)) if p == "Bryce"
        ));
    }
}
