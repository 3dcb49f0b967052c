use anyhow::{anyhow, Result};
use clap::Parser;
use gpumd_util_rust::{
    gpumd_out::{load_kappa, KAPPA_COLUMNS},
    running_average, units::FS_PER_NS,
};
use itertools::Itertools;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Running HNEMD conductivity written by GPUMD
    #[arg(default_value = "kappa.out")]
    kappa_file: PathBuf,

    /// Timestep (fs)
    #[arg(long)]
    dt: f64,

    /// Timesteps between rows of the file
    #[arg(short = 'i', long, default_value_t = 1000)]
    output_interval: usize,
}

/// Sample times (ns) of the file rows, starting from the origin.
fn time_axis(rows: usize, dt: f64, output_interval: usize) -> Vec<f64> {
    let sample_time = output_interval as f64 * dt / FS_PER_NS;
    (0..rows).map(|n| n as f64 * sample_time).collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let kappa = load_kappa(&cli.kappa_file)?;
    let rows = kappa.vector(KAPPA_COLUMNS[0]).map_or(0, |v| v.len());
    let time = time_axis(rows, cli.dt, cli.output_interval);

    let averages = KAPPA_COLUMNS
        .iter()
        .map(|key| -> Result<Vec<f64>> {
            let column = kappa
                .vector(key)
                .ok_or_else(|| anyhow!("missing column '{key}'"))?;
            Ok(running_average(column.as_slice(), &time)?)
        })
        .collect::<Result<Vec<_>>>()?;

    let table = (0..rows)
        .map(|i| {
            std::iter::once(time[i])
                .chain(averages.iter().map(|a| a[i]))
                .map(|x| format!("{x:12.6e}"))
                .join("\t")
        })
        .join("\n");
    println!("# t(ns) {} (W/m/K)\n{table}", KAPPA_COLUMNS.join(" "));
    Ok(())
}
