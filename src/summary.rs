use std::fmt;

use polars::prelude::*;

use crate::error::EdaError;
use crate::schema::species;

/// Descriptive overview of the cleaned species table.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesSummary {
    pub rows: usize,
    pub distinct_species: usize,
    /// Rows per category, ordered by category name.
    pub category_counts: Vec<(String, u64)>,
    pub conservation_statuses: Vec<String>,
}

impl SpeciesSummary {
    pub fn from_species(species_df: &DataFrame) -> Result<Self, EdaError> {
        let distinct_species = species_df.column(species::SCIENTIFIC_NAME)?.n_unique()?;

        let by_category = species_df
            .clone()
            .lazy()
            .group_by([col(species::CATEGORY)])
            .agg([len().cast(DataType::Int64).alias("rows")])
            .sort([species::CATEGORY], SortMultipleOptions::default())
            .collect()?;
        let categories = by_category.column(species::CATEGORY)?.str()?;
        let counts = by_category.column("rows")?.i64()?;
        let category_counts = (0..by_category.height())
            .filter_map(|i| {
                categories
                    .get(i)
                    .map(|c| (c.to_string(), counts.get(i).unwrap_or(0).max(0) as u64))
            })
            .collect();

        let statuses = species_df
            .column(species::CONSERVATION_STATUS)?
            .as_materialized_series()
            .unique_stable()?;
        let conservation_statuses = statuses
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();

        Ok(Self {
            rows: species_df.height(),
            distinct_species,
            category_counts,
            conservation_statuses,
        })
    }
}

impl fmt::Display for SpeciesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} rows, {} distinct species",
            self.rows, self.distinct_species
        )?;
        for (category, count) in &self.category_counts {
            writeln!(f, "  {category}: {count}")?;
        }
        write!(f, "statuses: {}", self.conservation_statuses.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BiodiversityModel;
    use crate::schema::values;

    #[test]
    fn test_summary_counts() {
        let raw = df!(
            species::SCIENTIFIC_NAME => &["Canis lupus", "Canis lupus", "Vireo huttoni", "Crotalus oreganus"],
            species::COMMON_NAMES => &["Gray Wolf", "Wolf", "Hutton's Vireo", "Western Rattlesnake"],
            species::CATEGORY => &["Mammal", "Mammal", "Bird", "Reptile"],
            species::CONSERVATION_STATUS => &[Some("Endangered"), Some("Endangered"), None, Some("In Recovery")],
        )
        .unwrap();
        let df = BiodiversityModel::clean_species(raw).unwrap();
        let summary = SpeciesSummary::from_species(&df).unwrap();

        assert_eq!(summary.rows, 4);
        assert_eq!(summary.distinct_species, 3);
        assert_eq!(
            summary.category_counts,
            vec![
                ("Bird".to_string(), 1),
                ("Mammal".to_string(), 2),
                ("Reptile".to_string(), 1),
            ]
        );
        assert_eq!(
            summary.conservation_statuses,
            vec!["Endangered", values::NO_INTERVENTION, "In Recovery"]
        );
    }
}
