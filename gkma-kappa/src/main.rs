use anyhow::{anyhow, Result};
use clap::Parser;
use gpumd_util_rust::{
    get_gkma_kappa, gpumd_out::load_heatmode, math::MeanStd, parse_directions, Dataset,
    Direction, GkmaParams, OutputOptions, TAU_KEY,
};
use itertools::Itertools;
use log::info;
use std::{env, path::PathBuf};

mod plot;
use plot::plot_kappa;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Modal heat current file written by GPUMD
    #[arg(default_value = "heatmode.out")]
    heatmode_file: PathBuf,

    /// Number of frequency bins
    #[arg(short, long)]
    nbins: usize,

    /// Number of modal heat current samples
    #[arg(short = 's', long)]
    nsamples: usize,

    /// Timestep (fs)
    #[arg(long)]
    dt: f64,

    /// Timesteps per modal heat current sample
    #[arg(short = 'i', long, default_value_t = 1)]
    sample_interval: usize,

    /// Temperature (K)
    #[arg(short, long, default_value_t = 300.0)]
    temperature: f64,

    /// Volume (A^3)
    #[arg(short, long, default_value_t = 1.0)]
    volume: f64,

    /// Correlation time to integrate up to (ns), whole run if omitted
    #[arg(short, long)]
    max_tau: Option<f64>,

    /// Directions to analyze, any subset of "xyz"
    #[arg(short, long, default_value = "xyz")]
    directions: String,

    /// Save the augmented dataset
    #[arg(long)]
    save: bool,

    /// Directory where to save the dataset and plot
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// File name of the saved dataset
    #[arg(long, default_value = "heatmode.bin")]
    output_file: String,

    /// Trailing fraction of the lag window averaged as the plateau value
    #[arg(long, default_value_t = 0.2)]
    plateau: f64,

    /// Plot accumulated conductivity to kappa.png
    #[arg(long)]
    plot: bool,
}

/// Conductivity summed over modes and in/out components, per lag.
fn total_kappa(data: &Dataset, direction: Direction) -> Result<Vec<f64>> {
    direction
        .components()
        .iter()
        .map(|c| {
            data.matrix(c.kappa_key)
                .map(|m| m.row_sum())
                .ok_or_else(|| anyhow!("result is missing '{}'", c.kappa_key))
        })
        .reduce(|a, b| Ok(a? + b?))
        .unwrap_or_else(|| Err(anyhow!("direction {direction} has no components")))
        .map(|sum| sum.iter().copied().collect())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let directions = parse_directions(&cli.directions)?;
    let data = load_heatmode(&cli.heatmode_file, cli.nbins, cli.nsamples, &directions)?;

    let params = GkmaParams::new(cli.nbins, cli.nsamples, cli.dt, cli.sample_interval)
        .with_temperature(cli.temperature)
        .with_volume(cli.volume)
        .with_max_tau(cli.max_tau)
        .with_directions(&cli.directions);
    let mut options = OutputOptions::default();
    if cli.save {
        options = options.saved_to(cli.output_dir.clone(), &cli.output_file);
    }
    let output = get_gkma_kappa(data, &params, &options)?;
    if let Some(path) = &output.path {
        info!("dataset saved to {}", path.to_string_lossy());
    }
    let data = output
        .data
        .ok_or_else(|| anyhow!("analysis returned no data"))?;

    let tau = data
        .vector(TAU_KEY)
        .ok_or_else(|| anyhow!("result is missing '{TAU_KEY}'"))?
        .iter()
        .copied()
        .collect::<Vec<_>>();
    let curves = directions
        .iter()
        .map(|&d| total_kappa(&data, d).map(|k| (d, k)))
        .collect::<Result<Vec<_>>>()?;

    let table = tau
        .iter()
        .enumerate()
        .map(|(i, t)| {
            std::iter::once(t)
                .chain(curves.iter().map(|(_, k)| &k[i]))
                .map(|x| format!("{x:12.6e}"))
                .join("\t")
        })
        .join("\n");
    let header = curves.iter().map(|(d, _)| format!("k{d}")).join(" ");
    println!("# tau(ns) {header} (W/m/K)\n{table}");

    let skip = ((1.0 - cli.plateau.clamp(0.0, 1.0)) * tau.len() as f64).floor() as usize;
    for (direction, kappa) in &curves {
        let stats = kappa.iter().skip(skip).copied().collect::<MeanStd>();
        if let (Some(avg), Some(std)) = (stats.mean(), stats.std()) {
            println!("# k{direction} plateau: {avg:.4} +- {std:.4} W/m/K");
        }
    }

    if cli.plot {
        let dir = match cli.output_dir {
            Some(dir) => dir,
            None => env::current_dir()?,
        };
        plot_kappa(&dir.join("kappa.png"), &tau, &curves)?;
    }
    Ok(())
}
