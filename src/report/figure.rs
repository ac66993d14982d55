//! Global importance figure
//!
//! SVG output avoids system font dependencies.

use crate::error::{PhenoError, Result};
use crate::explain::AttributionMatrix;
use crate::metrics::MetricsReport;
use crate::report::display_name;
use plotters::prelude::*;
use plotters_svg::SVGBackend;
use std::fs;
use std::path::Path;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 700;

/// Render the global importance bar chart for one target, annotated with
/// the six-metric summary box. Overwrites any previous figure at the same
/// path; a failed render removes the partial file.
pub fn write_importance_figure(
    path: &Path,
    target_code: &str,
    attr: &AttributionMatrix,
    metrics: &MetricsReport,
    units: &str,
    max_features: usize,
) -> Result<()> {
    let result = render(path, target_code, attr, metrics, units, max_features)
        .map_err(|e| PhenoError::ExportError(format!("{}: {}", path.display(), e)));
    if result.is_err() {
        let _ = fs::remove_file(path);
    }
    result
}

fn render(
    path: &Path,
    target_code: &str,
    attr: &AttributionMatrix,
    metrics: &MetricsReport,
    units: &str,
    max_features: usize,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let ranking = attr.importance_ranking();
    let shown: Vec<(String, f64)> = ranking
        .iter()
        .take(max_features.max(1))
        .map(|&(idx, score)| (display_name(&attr.feature_names[idx]), score))
        .collect();

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    if shown.is_empty() {
        root.draw(&Text::new(
            "No predictors to display",
            (WIDTH as i32 / 2, HEIGHT as i32 / 2),
            ("sans-serif", 20).into_font().color(&BLACK),
        ))?;
        root.present()?;
        return Ok(());
    }

    let max_score = shown
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let n = shown.len();

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Global attribution importance – {target_code}"),
            ("sans-serif", 22),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(180)
        .build_cartesian_2d(0.0..max_score * 1.1, (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(format!("Mean |attribution| ({units})"))
        .y_labels(n)
        .y_label_formatter(&|y| {
            if let SegmentValue::CenterOf(idx) = y {
                // Rank 0 is drawn at the top.
                if *idx < n {
                    return shown[n - 1 - *idx].0.clone();
                }
            }
            String::new()
        })
        .draw()?;

    chart.draw_series(shown.iter().enumerate().map(|(rank, (_, score))| {
        let slot = n - 1 - rank;
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(slot)),
                (*score, SegmentValue::Exact(slot + 1)),
            ],
            BLUE.mix(0.7).filled(),
        )
    }))?;

    // Six-metric summary box, top-right.
    let box_left = WIDTH as i32 - 270;
    let box_top = 70;
    root.draw(&Rectangle::new(
        [(box_left - 10, box_top - 10), (WIDTH as i32 - 20, box_top + 128)],
        ShapeStyle {
            color: RGBColor(250, 250, 250).mix(0.9),
            filled: true,
            stroke_width: 1,
        },
    ))?;
    root.draw(&Rectangle::new(
        [(box_left - 10, box_top - 10), (WIDTH as i32 - 20, box_top + 128)],
        BLACK.stroke_width(1),
    ))?;

    let lines = [
        format!("RMSE      : {:.3} {units}", metrics.rmse),
        format!("MAE       : {:.3} {units}", metrics.mae),
        format!("R²        : {:.3}", metrics.r2),
        format!("Slope     : {:.3}", metrics.slope),
        format!("Intercept : {:.3}", metrics.intercept),
        format!("MBE       : {:.3} {units}", metrics.mbe),
    ];
    for (i, line) in lines.iter().enumerate() {
        root.draw(&Text::new(
            line.clone(),
            (box_left, box_top + (i as i32) * 21),
            ("monospace", 15).into_font().color(&BLACK),
        ))?;
    }

    root.present()?;
    Ok(())
}
