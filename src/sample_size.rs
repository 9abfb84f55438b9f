use crate::aggregation::ObservationsByPark;
use crate::error::EdaError;
use crate::schema::parks;

/// Sightings needed per variant. Taken from an external sample-size
/// calculator (15% baseline, 33.33% minimum detectable effect, 90%
/// significance); not derived here.
pub const SAMPLE_SIZE_PER_VARIANT: u32 = 510;

/// Parks reported by the run, with the label used on the console.
pub const REPORTED_PARKS: [(&str, &str); 2] = [
    (parks::BRYCE, "Bryce National Park"),
    (parks::YELLOWSTONE, "Yellowstone"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct WeeksToObserve {
    pub park_name: String,
    pub label: String,
    pub weekly_observations: i64,
    pub weeks: f64,
}

/// Weeks of observation needed to reach `required` sightings.
///
/// Zero weekly observations gives `inf`.
pub fn weeks_to_observe(required: u32, weekly_observations: i64) -> f64 {
    f64::from(required) / weekly_observations as f64
}

pub fn weeks_for_park(
    by_park: &ObservationsByPark,
    park_name: &str,
    label: &str,
) -> Result<WeeksToObserve, EdaError> {
    let weekly_observations = by_park.require(park_name)?;
    Ok(WeeksToObserve {
        park_name: park_name.to_string(),
        label: label.to_string(),
        weekly_observations,
        weeks: weeks_to_observe(SAMPLE_SIZE_PER_VARIANT, weekly_observations),
    })
}

/// Weeks-to-observe for every park in `REPORTED_PARKS`, in that order.
pub fn report(by_park: &ObservationsByPark) -> Result<Vec<WeeksToObserve>, EdaError> {
    REPORTED_PARKS
        .iter()
        .map(|(park, label)| weeks_for_park(by_park, park, label))
        .collect()
}
