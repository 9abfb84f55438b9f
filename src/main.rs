use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use biodiversity_eda::logging::init_logging;
use biodiversity_eda::model::BiodiversityModel;
use biodiversity_eda::visualization::{self, ChartConfig};
use biodiversity_eda::{analyze, Analysis};

#[derive(Parser, Debug)]
#[command(
    name = "biodiversity",
    about = "Conservation status and sheep sighting analysis for national park species"
)]
struct Cli {
    /// Directory holding species_info.csv and observations.csv
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory the PNG charts are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip chart rendering
    #[arg(long)]
    skip_charts: bool,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    println!("Biodiversity in National Parks - species protection and sheep sightings");

    let mut model = BiodiversityModel::new(&cli.data_dir);
    model
        .load_species()
        .with_context(|| format!("loading species from {}", cli.data_dir.display()))?;
    model
        .load_observations()
        .with_context(|| format!("loading observations from {}", cli.data_dir.display()))?;

    let analysis = analyze(&model).context("running analysis")?;
    log_overview(&analysis);

    if cli.skip_charts {
        info!("chart rendering skipped");
    } else {
        let written = visualization::render_all(
            &cli.output_dir,
            &analysis.protection_counts,
            &analysis.observations_by_park,
            &ChartConfig::default(),
        )
        .context("rendering charts")?;
        for path in &written {
            info!(path = %path.display(), "chart written");
        }
    }

    print_report(&analysis);
    Ok(())
}

fn log_overview(analysis: &Analysis) {
    info!("species overview:\n{}", analysis.summary);

    for row in analysis.protection_counts.iter() {
        info!(
            status = %row.conservation_status,
            species = row.species_count,
            "protection count"
        );
    }

    for row in analysis.category_pivot.iter() {
        info!(
            category = %row.category,
            not_protected = ?row.not_protected,
            protected = ?row.protected,
            percent_protected = ?row.percent_protected,
            "category protection"
        );
    }
}

fn print_report(analysis: &Analysis) {
    for test in &analysis.category_tests {
        println!(
            "Chi-square {} vs {} {}: chi2 = {:.4}, p = {:.4} ({})",
            test.first,
            test.second,
            test.table,
            test.result.statistic,
            test.result.p_value,
            if test.result.is_significant(0.05) {
                "significant"
            } else {
                "not significant"
            }
        );
    }

    for weeks in &analysis.weeks_to_observe {
        println!("Weeks to observe in {}: {}", weeks.label, weeks.weeks);
    }
}
