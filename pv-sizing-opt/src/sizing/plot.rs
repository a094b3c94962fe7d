use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use pv_model::{DailyIndicator, NpvPoint, ProfilePoint};
use tracing::{info, warn};

use crate::error::{Result, SizingError};
use crate::general::indicators::DailyIndicators;
use crate::general::profile::ProfileSet;

type PlotResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Y axis range covering every value with a little headroom; never empty
fn value_range(values: impl Iterator<Item = f64> + Clone) -> Range<f64> {
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let low = min.min(0.0);
    let high = if max > low { max * 1.1 } else { low + 1.0 };
    low..high
}

/// Consumption vs production over one profile, x axis labelled with the profile's buckets
pub fn plot_profile(points: &[ProfilePoint], title: &str, filename: &Path) -> PlotResult {
    let root = BitMapBackend::new(filename, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let y_range = value_range(points.iter().flat_map(|p| [p.consumption_w, p.production_w]));
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..points.len().max(2) as f64 - 1.0, y_range)?;

    let label_at = |x: &f64| -> String {
        points
            .get(x.round().max(0.0) as usize)
            .map(|p| p.label.clone())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_desc("Period")
        .y_desc("Energy (Wh)")
        .x_labels(12)
        .x_label_formatter(&label_at)
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            points.iter().enumerate().map(|(i, p)| (i as f64, p.consumption_w)),
            RED.stroke_width(2),
        ))?
        .label("Consumption")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], RED.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            points.iter().enumerate().map(|(i, p)| (i as f64, p.production_w)),
            BLUE.stroke_width(2),
        ))?
        .label("PV Production")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], BLUE.stroke_width(2)));

    // Markers only where they stay readable
    if points.len() <= 24 {
        chart.draw_series(
            points
                .iter()
                .enumerate()
                .map(|(i, p)| Circle::new((i as f64, p.consumption_w), 3, RED.filled())),
        )?;
        chart.draw_series(
            points
                .iter()
                .enumerate()
                .map(|(i, p)| Circle::new((i as f64, p.production_w), 3, BLUE.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn indicator_points(values: &[DailyIndicator]) -> impl Iterator<Item = (f64, f64)> + Clone + '_ {
    values.iter().enumerate().map(|(i, d)| (i as f64, d.value))
}

/// Daily self-consumption and self-sufficiency on top, daily NEEG below
pub fn plot_daily_indicators(indicators: &DailyIndicators, filename: &Path) -> PlotResult {
    let root = BitMapBackend::new(filename, (1200, 1000)).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((2, 1));
    let days = indicators.neeg_kwh.len().max(2) as f64 - 1.0;

    let mut ratios = ChartBuilder::on(&areas[0])
        .caption("Daily Self-Consumption / Self-Sufficiency", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..days, 0f64..1.05f64)?;
    ratios.configure_mesh().x_desc("Day").y_desc("Ratio").draw()?;

    ratios
        .draw_series(LineSeries::new(indicator_points(&indicators.self_consumption), &GREEN))?
        .label("Self-consumption")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &GREEN));
    ratios
        .draw_series(LineSeries::new(indicator_points(&indicators.self_sufficiency), &MAGENTA))?
        .label("Self-sufficiency")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], &MAGENTA));
    ratios.configure_series_labels().draw()?;

    let mut neeg = ChartBuilder::on(&areas[1])
        .caption("Daily NEEG", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            0f64..days,
            value_range(indicators.neeg_kwh.iter().map(|d| d.value)),
        )?;
    neeg.configure_mesh().x_desc("Day").y_desc("Energy (kWh)").draw()?;
    neeg.draw_series(
        indicators
            .neeg_kwh
            .iter()
            .enumerate()
            .map(|(i, d)| Rectangle::new([(i as f64 - 0.4, 0.0), (i as f64 + 0.4, d.value)], RED.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Cumulative discounted value month by month
pub fn plot_npv_trace(trace: &[NpvPoint], filename: &Path) -> PlotResult {
    let root = BitMapBackend::new(filename, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let min = trace.iter().map(|p| p.cumulative_npv).fold(0.0f64, f64::min);
    let max = trace.iter().map(|p| p.cumulative_npv).fold(0.0f64, f64::max);
    let pad = ((max - min) * 0.1).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Net Present Value", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(1f64..trace.len().max(2) as f64, (min - pad)..(max + pad))?;

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Cumulative NPV")
        .x_label_formatter(&|x: &f64| {
            trace
                .get((x.round() as usize).saturating_sub(1))
                .map(|p| format!("{}-{:02}", p.year, p.month))
                .unwrap_or_default()
        })
        .draw()?;

    chart.draw_series(LineSeries::new(
        trace
            .iter()
            .enumerate()
            .map(|(i, p)| ((i + 1) as f64, p.cumulative_npv)),
        BLUE.stroke_width(3),
    ))?;

    // Break-even line
    chart.draw_series(LineSeries::new(
        [(1.0, 0.0), (trace.len().max(2) as f64, 0.0)],
        &BLACK,
    ))?;

    root.present()?;
    Ok(())
}

/// Renders every chart of a sizing run into `dir` and returns the written files
pub fn write_charts(
    dir: &Path,
    profiles: &ProfileSet,
    indicators: &DailyIndicators,
    trace: &[NpvPoint],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    let to_error = |name: &str, e: Box<dyn std::error::Error>| {
        SizingError::Plot(format!("{name}: {e}"))
    };

    let profile_charts: [(&str, &str, &[ProfilePoint]); 4] = [
        ("profile_annual.png", "Annual Profile", &profiles.annual),
        ("profile_monthly.png", "Monthly Averaged Profile", &profiles.monthly),
        ("profile_weekly.png", "Weekly Averaged Profile", &profiles.weekly),
        ("profile_daily.png", "Daily Averaged Profile", &profiles.daily),
    ];
    for (name, title, points) in profile_charts {
        if points.is_empty() {
            warn!(chart = name, "no data, skipping chart");
            continue;
        }
        let path = dir.join(name);
        plot_profile(points, title, &path).map_err(|e| to_error(name, e))?;
        written.push(path);
    }

    if indicators.neeg_kwh.is_empty() {
        warn!(chart = "daily_indicators.png", "no data, skipping chart");
    } else {
        let path = dir.join("daily_indicators.png");
        plot_daily_indicators(indicators, &path).map_err(|e| to_error("daily_indicators.png", e))?;
        written.push(path);
    }

    if trace.is_empty() {
        warn!(chart = "npv_trace.png", "no data, skipping chart");
    } else {
        let path = dir.join("npv_trace.png");
        plot_npv_trace(trace, &path).map_err(|e| to_error("npv_trace.png", e))?;
        written.push(path);
    }

    info!(count = written.len(), dir = %dir.display(), "charts written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_is_never_empty() {
        assert_eq!(value_range(std::iter::empty()), 0.0..1.0);
        assert_eq!(value_range([0.0, 0.0].into_iter()), 0.0..1.0);

        let range = value_range([-2.0, 10.0].into_iter());
        assert_eq!(range.start, -2.0);
        assert!(range.end > 10.0);
    }

    #[test]
    fn test_empty_inputs_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_charts(
            dir.path(),
            &ProfileSet::default(),
            &DailyIndicators::default(),
            &[],
        )
        .unwrap();
        assert!(written.is_empty());
    }
}
