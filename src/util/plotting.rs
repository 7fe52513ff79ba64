// External crates
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

// Local modules
use crate::rnn::step_5_evaluation::EvaluationReport;

const PREDICTED_COLOR: RGBColor = RED;
const ACTUAL_COLOR: RGBColor = BLUE;

/// Line plot of mean training loss per epoch.
pub fn plot_training_loss(losses: &[f64], name: &str, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = losses.len().max(1) as f64;
    let y_max = losses.iter().copied().fold(f64::MIN, f64::max).max(1e-6);
    let y_min = losses.iter().copied().fold(f64::MAX, f64::min).min(0.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Training Loss for {}", name), ("sans-serif", 24))
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0.0..x_max, y_min..(y_max * 1.05))?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc("Loss")
        .draw()?;

    chart.draw_series(LineSeries::new(
        losses.iter().enumerate().map(|(i, &loss)| (i as f64, loss)),
        &PREDICTED_COLOR,
    ))?;

    root.present()?;
    Ok(())
}

/// Histogram of per-example L2 distances over `bins` equal-width buckets.
pub fn plot_l2_histogram(distances: &[f64], bins: usize, path: &Path) -> Result<()> {
    let bins = bins.max(1);
    let max = distances.iter().copied().fold(0.0f64, f64::max);
    let min = distances.iter().copied().fold(f64::MAX, f64::min).min(max);
    let range = if (max - min) > 1e-9 { max - min } else { 1.0 };

    let mut counts = vec![0u32; bins];
    for &distance in distances {
        let mut index = ((distance - min) / range * bins as f64) as usize;
        if index >= bins {
            index = bins - 1;
        }
        counts[index] += 1;
    }
    let y_max = counts.iter().copied().max().unwrap_or(1).max(1);

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "L2 distance between Actual and Predicted Points",
            ("sans-serif", 24),
        )
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(min..(min + range), 0u32..(y_max + y_max / 10 + 1))?;

    chart
        .configure_mesh()
        .x_desc("L2 Distance")
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let x0 = min + range * i as f64 / bins as f64;
        let x1 = min + range * (i + 1) as f64 / bins as f64;
        Rectangle::new([(x0, 0), (x1, count)], ACTUAL_COLOR.mix(0.6).filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Three scatter panels sharing axis bounds: predicted only, actual only,
/// and both overlaid.
pub fn plot_scatter_panels(report: &EvaluationReport, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (1500, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 3));

    let bounds = point_bounds(&report.actual, &report.predicted);
    let predicted = ("Predicted", report.predicted.as_slice(), PREDICTED_COLOR.mix(0.5));
    let actual = ("Actual", report.actual.as_slice(), ACTUAL_COLOR.mix(0.7));

    draw_panel(&panels[0], "Predicted", bounds, &[predicted])?;
    draw_panel(&panels[1], "Actual", bounds, &[actual])?;
    draw_panel(&panels[2], "Actual + Predicted", bounds, &[actual, predicted])?;

    root.present()?;
    Ok(())
}

fn point_bounds(actual: &[[f32; 2]], predicted: &[[f32; 2]]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;
    for point in actual.iter().chain(predicted.iter()) {
        x_min = x_min.min(point[0] as f64);
        x_max = x_max.max(point[0] as f64);
        y_min = y_min.min(point[1] as f64);
        y_max = y_max.max(point[1] as f64);
    }
    if x_min > x_max {
        return (0.0, 1.0, 0.0, 1.0);
    }
    let x_pad = ((x_max - x_min) * 0.05).max(0.5);
    let y_pad = ((y_max - y_min) * 0.05).max(0.5);
    (x_min - x_pad, x_max + x_pad, y_min - y_pad, y_max + y_pad)
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    bounds: (f64, f64, f64, f64),
    series: &[(&str, &[[f32; 2]], RGBAColor)],
) -> Result<()> {
    let (x_min, x_max, y_min, y_max) = bounds;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 50)
        .set_label_area_size(LabelAreaPosition::Bottom, 35)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart.configure_mesh().draw()?;

    for &(label, points, color) in series {
        chart
            .draw_series(
                points
                    .iter()
                    .map(|p| Circle::new((p[0] as f64, p[1] as f64), 3, color.filled())),
            )?
            .label(label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.7))
        .border_style(&BLACK.mix(0.3))
        .draw()?;

    Ok(())
}
