//! Visualization module: static PNG charts for the aggregates.
//!
//! Produces three images:
//! - a bar chart of species per conservation status
//! - a bar chart of weekly sheep observations per park
//! - a donut pie of the same observations
//!
//! Data is first extracted into plain bar / slice structs, then drawn with
//! the plotters bitmap backend. Slice geometry is computed here rather than
//! by the backend so labels and percentages can be placed explicitly.

use std::f64::consts::PI;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

use crate::aggregation::{ObservationsByPark, ProtectionCounts};
use crate::error::EdaError;
use crate::schema::files;

const FONT: &str = "sans-serif";
/// Gap kept between a pie label and the canvas edge, in pixels
const LABEL_MARGIN: i32 = 5;

// ── Config ──────────────────────────────────────────────────────────────────

/// Configuration for a vertical bar chart.
#[derive(Debug, Clone)]
pub struct BarChartConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub title: String,
    /// Label drawn along the y axis
    pub y_label: String,
    pub bar_color: RGBColor,
}

impl BarChartConfig {
    pub fn conservation() -> Self {
        Self {
            width: 1000,
            height: 400,
            title: "Conservation Status by Species".to_string(),
            y_label: "Number of Species".to_string(),
            bar_color: RGBColor(0x3F, 0x5D, 0x7D),
        }
    }

    pub fn sheep_observations() -> Self {
        Self {
            width: 1600,
            height: 400,
            title: "Observations of Sheep per Week".to_string(),
            y_label: "Number of Observations".to_string(),
            bar_color: RGBColor(0x3F, 0x5D, 0x7D),
        }
    }
}

/// Configuration for the donut pie chart.
#[derive(Debug, Clone)]
pub struct PieChartConfig {
    pub width: u32,
    pub height: u32,
    /// Slice colours, cycled when there are more slices than colours
    pub colors: Vec<RGBColor>,
    /// Angle of the first slice edge, degrees counter-clockwise from 3 o'clock
    pub start_angle_deg: f64,
    /// Radial offset of every slice, as a fraction of the radius
    pub explode: f64,
    /// Distance of the percentage labels from the centre, as a fraction of the radius
    pub pct_distance: f64,
    /// Distance of the park labels from the centre, as a fraction of the radius
    pub label_distance: f64,
    /// Radius of the white centre circle, as a fraction of the radius
    pub hole_ratio: f64,
}

impl Default for PieChartConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 800,
            colors: vec![
                RGBColor(0xff, 0x99, 0x99),
                RGBColor(0x66, 0xb3, 0xff),
                RGBColor(0x99, 0xff, 0x99),
                RGBColor(0xff, 0xcc, 0x99),
            ],
            start_angle_deg: 90.0,
            explode: 0.05,
            pct_distance: 0.85,
            label_distance: 1.1,
            hole_ratio: 0.70,
        }
    }
}

/// Configuration for all three charts of a run.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub conservation: BarChartConfig,
    pub observations: BarChartConfig,
    pub observations_pie: PieChartConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            conservation: BarChartConfig::conservation(),
            observations: BarChartConfig::sheep_observations(),
            observations_pie: PieChartConfig::default(),
        }
    }
}

// ── Intermediate data structures ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    /// Share of the total, in [0, 1]
    pub fraction: f64,
    pub start_deg: f64,
    pub end_deg: f64,
}

impl PieSlice {
    pub fn mid_deg(&self) -> f64 {
        (self.start_deg + self.end_deg) / 2.0
    }
}

// ── Data extraction ─────────────────────────────────────────────────────────

pub fn conservation_bars(counts: &ProtectionCounts) -> Vec<Bar> {
    counts
        .iter()
        .map(|c| Bar {
            label: c.conservation_status.clone(),
            value: c.species_count,
        })
        .collect()
}

pub fn park_bars(by_park: &ObservationsByPark) -> Vec<Bar> {
    by_park
        .iter()
        .map(|p| Bar {
            label: p.park_name.clone(),
            value: p.observations.max(0) as u64,
        })
        .collect()
}

/// Lay out pie slices counter-clockwise starting at `start_angle_deg`.
///
/// A non-positive total yields zero-width slices.
pub fn pie_slices(bars: &[Bar], start_angle_deg: f64) -> Vec<PieSlice> {
    let total: u64 = bars.iter().map(|b| b.value).sum();
    let mut angle = start_angle_deg;
    bars.iter()
        .map(|b| {
            let fraction = if total > 0 {
                b.value as f64 / total as f64
            } else {
                0.0
            };
            let start_deg = angle;
            angle += fraction * 360.0;
            PieSlice {
                label: b.label.clone(),
                fraction,
                start_deg,
                end_deg: angle,
            }
        })
        .collect()
}

/// Pixel position at `distance` from `center` along `angle_deg`.
/// Screen y grows downward, so the sine term is subtracted.
fn polar_to_pixel(center: (f64, f64), distance: f64, angle_deg: f64) -> (i32, i32) {
    let rad = angle_deg * PI / 180.0;
    (
        (center.0 + distance * rad.cos()).round() as i32,
        (center.1 - distance * rad.sin()).round() as i32,
    )
}

/// Discrete x range with one segment per bar.
///
/// plotters treats integer ranges as inclusive once segmented, so `n` bars
/// need `0..n - 1`.
fn bar_axis(n: usize) -> Range<u32> {
    0..(n.max(1) as u32 - 1)
}

/// Anchor point and horizontal alignment for a slice label placed at
/// `distance` along `angle_deg`, pulled back inside `[0, canvas_width]`.
///
/// Labels on the right half grow rightwards from the anchor, those on the
/// left half grow leftwards.
fn label_anchor(
    origin: (f64, f64),
    distance: f64,
    angle_deg: f64,
    text_width: u32,
    canvas_width: u32,
) -> ((i32, i32), HPos) {
    let (x, y) = polar_to_pixel(origin, distance, angle_deg);
    let width = text_width as i32;
    let right_edge = canvas_width as i32 - LABEL_MARGIN;

    if angle_deg.to_radians().cos() >= 0.0 {
        let max_x = (right_edge - width).max(LABEL_MARGIN);
        ((x.clamp(LABEL_MARGIN, max_x), y), HPos::Left)
    } else {
        let min_x = (LABEL_MARGIN + width).min(right_edge);
        ((x.clamp(min_x, right_edge.max(min_x)), y), HPos::Right)
    }
}

// ── Rendering ───────────────────────────────────────────────────────────────

/// Draw a vertical bar chart with left and bottom axes only.
pub fn draw_bar_chart(path: &Path, bars: &[Bar], config: &BarChartConfig) -> Result<(), EdaError> {
    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = bars.iter().map(|b| b.value).max().unwrap_or(0);
    let y_top = y_max + y_max / 20 + 1;

    let mut chart = ChartBuilder::on(&root)
        .caption(config.title.as_str(), (FONT, 22))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(bar_axis(bars.len()).into_segmented(), 0u64..y_top)?;

    let label_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => bars
            .get(*i as usize)
            .map(|b| b.label.clone())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(bars.len())
        .x_label_formatter(&label_of)
        .y_desc(config.y_label.as_str())
        .label_style((FONT, 14))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(config.bar_color.filled())
            .margin(10)
            .data(bars.iter().enumerate().map(|(i, b)| (i as u32, b.value))),
    )?;

    root.present()?;
    Ok(())
}

/// Draw an exploded donut pie with percentage and park labels.
pub fn draw_pie_chart(path: &Path, bars: &[Bar], config: &PieChartConfig) -> Result<(), EdaError> {
    if config.colors.is_empty() {
        return Err(EdaError::Chart("pie chart needs at least one colour".into()));
    }

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let center = (config.width as f64 / 2.0, config.height as f64 / 2.0);
    let radius = config.width.min(config.height) as f64 * 0.35;

    let slices = pie_slices(bars, config.start_angle_deg);
    let pct_style = TextStyle::from((FONT, 18).into_font()).pos(Pos::new(HPos::Center, VPos::Center));

    for (i, slice) in slices.iter().enumerate() {
        if slice.fraction <= 0.0 {
            continue;
        }
        let color = config.colors[i % config.colors.len()];
        let mid = slice.mid_deg();
        let offset = polar_to_pixel(center, config.explode * radius, mid);
        let origin = (offset.0 as f64, offset.1 as f64);

        let mut points = vec![offset];
        let steps = ((slice.end_deg - slice.start_deg).ceil() as usize).max(1);
        for s in 0..=steps {
            let angle = slice.start_deg + (slice.end_deg - slice.start_deg) * s as f64 / steps as f64;
            points.push(polar_to_pixel(origin, radius, angle));
        }
        root.draw(&Polygon::new(points, color.filled()))?;

        root.draw(&Text::new(
            format!("{:.1}%", slice.fraction * 100.0),
            polar_to_pixel(origin, config.pct_distance * radius, mid),
            pct_style.clone(),
        ))?;

        let label_font = (FONT, 18).into_font();
        let (text_width, _) =
            root.estimate_text_size(&slice.label, &TextStyle::from(label_font.clone()))?;
        let (anchor, h_pos) = label_anchor(
            origin,
            config.label_distance * radius,
            mid,
            text_width,
            config.width,
        );
        let label_style = TextStyle::from(label_font).pos(Pos::new(h_pos, VPos::Center));
        root.draw(&Text::new(slice.label.clone(), anchor, label_style))?;
    }

    let hole = (config.hole_ratio * radius).round() as i32;
    root.draw(&Circle::new(
        (center.0.round() as i32, center.1.round() as i32),
        hole,
        WHITE.filled(),
    ))?;

    root.present()?;
    Ok(())
}

/// Render all three charts into `output_dir`, overwriting existing files.
///
/// Returns the written paths in rendering order.
pub fn render_all(
    output_dir: &Path,
    counts: &ProtectionCounts,
    by_park: &ObservationsByPark,
    config: &ChartConfig,
) -> Result<Vec<PathBuf>, EdaError> {
    std::fs::create_dir_all(output_dir)?;

    let conservation = output_dir.join(files::CONSERVATION_PNG);
    draw_bar_chart(&conservation, &conservation_bars(counts), &config.conservation)?;
    debug!(path = %conservation.display(), "conservation chart drawn");

    let park = park_bars(by_park);

    let observations = output_dir.join(files::OBSERVATIONS_PNG);
    draw_bar_chart(&observations, &park, &config.observations)?;
    debug!(path = %observations.display(), "observations chart drawn");

    let pie = output_dir.join(files::OBSERVATIONS_PIE_PNG);
    draw_pie_chart(&pie, &park, &config.observations_pie)?;
    debug!(path = %pie.display(), "observations pie drawn");

    Ok(vec![conservation, observations, pie])
}
