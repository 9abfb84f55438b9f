//! Exploratory analysis of national-park species and sheep sightings.
//!
//! The pipeline loads `species_info.csv` and `observations.csv`, counts
//! species per conservation status, pivots protection rates per category,
//! runs chi-square independence tests between categories, sums sheep
//! sightings per park and estimates how many weeks of observation a
//! sample-size target needs.

pub mod aggregation;
pub mod chi_square;
pub mod error;
pub mod logging;
pub mod model;
pub mod sample_size;
pub mod schema;
pub mod summary;
pub mod visualization;

use tracing::info;

use aggregation::{CategoryPivot, ObservationsByPark, ProtectionCounts};
use chi_square::{chi2_contingency, ChiSquareResult, ContingencyTable};
use error::EdaError;
use model::BiodiversityModel;
use sample_size::WeeksToObserve;
use schema::values;
use summary::SpeciesSummary;

/// Category pairs tested for independence of protection status.
pub const TESTED_PAIRS: [(&str, &str); 2] = [
    (values::MAMMAL, values::BIRD),
    (values::MAMMAL, values::REPTILE),
];

/// One chi-square test between two categories.
#[derive(Debug, Clone)]
pub struct CategoryTest {
    pub first: String,
    pub second: String,
    pub table: ContingencyTable,
    pub result: ChiSquareResult,
}

/// Every aggregate produced by one run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub summary: SpeciesSummary,
    pub protection_counts: ProtectionCounts,
    pub category_pivot: CategoryPivot,
    pub category_tests: Vec<CategoryTest>,
    pub observations_by_park: ObservationsByPark,
    pub weeks_to_observe: Vec<WeeksToObserve>,
}

/// Run the full analysis on a model whose tables are already loaded.
pub fn analyze(model: &BiodiversityModel) -> Result<Analysis, EdaError> {
    let species_df = model.species_df()?;

    let summary = SpeciesSummary::from_species(species_df)?;
    let protection_counts = ProtectionCounts::from_species(species_df)?;
    let category_pivot = CategoryPivot::from_species(species_df)?;

    let category_tests = TESTED_PAIRS
        .iter()
        .map(|(first, second)| -> Result<CategoryTest, EdaError> {
            let table = ContingencyTable::from_pivot(&category_pivot, first, second)?;
            let result = chi2_contingency(&table);
            info!(
                first,
                second,
                %table,
                statistic = result.statistic,
                p_value = result.p_value,
                "independence test"
            );
            Ok(CategoryTest {
                first: first.to_string(),
                second: second.to_string(),
                table,
                result,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let observations_by_park = ObservationsByPark::from_joined(&model.sheep_observations()?)?;
    info!(
        parks = observations_by_park.len(),
        total = observations_by_park.total(),
        "sheep observations by park"
    );

    let weeks_to_observe = sample_size::report(&observations_by_park)?;

    Ok(Analysis {
        summary,
        protection_counts,
        category_pivot,
        category_tests,
        observations_by_park,
        weeks_to_observe,
    })
}
