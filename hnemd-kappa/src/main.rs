use anyhow::{anyhow, Result};
use clap::Parser;
use gpumd_util_rust::{gpumd_out::load_shc, hnemd_spectral_kappa, math::trapz, Dataset};
use itertools::{izip, Itertools};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Spectral heat current file written by GPUMD
    #[arg(default_value = "shc.out")]
    shc_file: PathBuf,

    /// Number of correlation points used by the run
    #[arg(short = 'c', long)]
    num_corr_points: usize,

    /// Number of frequency points used by the run
    #[arg(short = 'w', long)]
    num_omega: usize,

    /// HNEMD driving force (1/A)
    #[arg(short, long, allow_negative_numbers = true)]
    fe: f64,

    /// Temperature (K)
    #[arg(short, long, default_value_t = 300.0)]
    temperature: f64,

    /// Volume (A^3)
    #[arg(short, long)]
    volume: f64,

    /// Save the run with its spectral conductivity to this file
    #[arg(short, long)]
    save: Option<PathBuf>,
}

fn column<'a>(data: &'a Dataset, key: &str) -> Result<&'a [f64]> {
    data.vector(key)
        .map(|v| v.as_slice())
        .ok_or_else(|| anyhow!("run is missing '{key}'"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut shc = load_shc(&cli.shc_file, cli.num_corr_points, cli.num_omega)?;
    hnemd_spectral_kappa(&mut shc, cli.fe, cli.temperature, cli.volume)?;

    let nu = column(&shc, "nu")?;
    let k_in = column(&shc, "k_in")?;
    let k_out = column(&shc, "k_out")?;
    let table = izip!(nu, k_in, k_out)
        .map(|(nu, k_in, k_out)| {
            [nu, k_in, k_out]
                .into_iter()
                .map(|x| format!("{x:12.6e}"))
                .join("\t")
        })
        .join("\n");
    println!("# nu(THz) k_in k_out (W/m/K/THz)\n{table}");
    if nu.len() > 1 {
        let total_in = trapz(k_in, nu)?;
        let total_out = trapz(k_out, nu)?;
        println!(
            "# k_in: {total_in:.4} k_out: {total_out:.4} k: {:.4} W/m/K",
            total_in + total_out
        );
    }

    if let Some(path) = cli.save {
        shc.save(&path)?;
        info!("spectral conductivity saved to {}", path.to_string_lossy());
    }
    Ok(())
}
