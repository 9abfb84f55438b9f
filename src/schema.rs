/// Column-name constants and fixed values for the biodiversity tables.
/// Single source of truth for every module that touches a DataFrame.

// ── Species columns ─────────────────────────────────────────────────────────
pub mod species {
    pub const SCIENTIFIC_NAME: &str = "scientific_name";
    pub const COMMON_NAMES: &str = "common_names";
    pub const CATEGORY: &str = "category";
    pub const CONSERVATION_STATUS: &str = "conservation_status";

    pub const REQUIRED: [&str; 4] = [SCIENTIFIC_NAME, COMMON_NAMES, CATEGORY, CONSERVATION_STATUS];
}

// ── Observation columns ─────────────────────────────────────────────────────
pub mod observation {
    pub const SCIENTIFIC_NAME: &str = "scientific_name";
    pub const PARK_NAME: &str = "park_name";
    pub const OBSERVATIONS: &str = "observations";

    pub const REQUIRED: [&str; 3] = [SCIENTIFIC_NAME, PARK_NAME, OBSERVATIONS];
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    pub const IS_PROTECTED: &str = "is_protected";
    pub const IS_SHEEP: &str = "is_sheep";
    pub const SPECIES_COUNT: &str = "species_count";
    pub const ROW_ORDER: &str = "_row_order";
}

// ── Fixed values ────────────────────────────────────────────────────────────
pub mod values {
    /// Fills a missing conservation_status.
    pub const NO_INTERVENTION: &str = "No Intervention";
    pub const SHEEP_MARKER: &str = "Sheep";
    pub const MAMMAL: &str = "Mammal";
    pub const BIRD: &str = "Bird";
    pub const REPTILE: &str = "Reptile";
}

// ── Parks ───────────────────────────────────────────────────────────────────
pub mod parks {
    pub const BRYCE: &str = "Bryce National Park";
    pub const GREAT_SMOKY_MOUNTAINS: &str = "Great Smoky Mountains National Park";
    pub const YELLOWSTONE: &str = "Yellowstone National Park";
    pub const YOSEMITE: &str = "Yosemite National Park";
}

// ── Input / output files ────────────────────────────────────────────────────
pub mod files {
    pub const SPECIES_CSV: &str = "species_info.csv";
    pub const OBSERVATIONS_CSV: &str = "observations.csv";

    pub const CONSERVATION_PNG: &str = "conservation.png";
    pub const OBSERVATIONS_PNG: &str = "observations.png";
    pub const OBSERVATIONS_PIE_PNG: &str = "observations_pie.png";
}
