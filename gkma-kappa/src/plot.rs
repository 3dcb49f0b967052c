use anyhow::{anyhow, Result};
use gpumd_util_rust::Direction;
use plotters::prelude::*;
use std::path::Path;

const PLOT_WIDTH: u32 = 800;
const PLOT_HEIGHT: u32 = 600;

fn direction_color(direction: Direction) -> RGBColor {
    match direction {
        Direction::X => RED,
        Direction::Y => BLUE,
        Direction::Z => BLACK,
    }
}

/// Accumulated conductivity against lag time, one line per direction.
pub fn plot_kappa(path: &Path, tau: &[f64], curves: &[(Direction, Vec<f64>)]) -> Result<()> {
    let t_max = tau.last().copied().unwrap_or(0.0).max(f64::MIN_POSITIVE);
    let (k_min, k_max) = curves
        .iter()
        .flat_map(|(_, k)| k.iter().copied())
        .fold((0.0f64, 0.0f64), |(lo, hi), k| (lo.min(k), hi.max(k)));
    let pad = ((k_max - k_min) * 0.05).max(f64::MIN_POSITIVE);

    let drawing_area = BitMapBackend::new(path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    drawing_area.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&drawing_area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, (k_min - pad)..(k_max + pad))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("Correlation time (ns)")
        .y_desc("k (W/m/K)")
        .axis_style(BLACK)
        .label_style(("sans-serif", 16).into_font().color(&BLACK))
        .draw()?;
    for &(direction, ref kappa) in curves {
        let color = direction_color(direction);
        chart
            .draw_series(LineSeries::new(
                tau.iter().copied().zip(kappa.iter().copied()),
                &color,
            ))?
            .label(format!("k{direction}"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE)
        .border_style(&BLACK)
        .draw()?;
    drawing_area
        .present()
        .map_err(|err| anyhow!("writing {}: {err}", path.to_string_lossy()))?;
    Ok(())
}
