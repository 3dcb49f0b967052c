//! Readers for the plain-text tables GPUMD writes during a run.

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::dataset::Dataset;
use crate::direction::Direction;
use crate::parser::RowReader;

/// Column order of `heatmode.out`.
pub const HEATMODE_COLUMNS: [&str; 5] = ["jmxi", "jmxo", "jmyi", "jmyo", "jmz"];
/// Column order of the HNEMD `kappa.out`.
pub const KAPPA_COLUMNS: [&str; 5] = ["kxi", "kxo", "kyi", "kyo", "kz"];

fn open_rows(path: &Path) -> Result<RowReader> {
    let file = File::open(path).with_context(|| format!("Reading {}", path.to_string_lossy()))?;
    Ok(RowReader::new(BufReader::new(file)))
}

fn count_trailing(rows: RowReader, path: &Path) {
    let extra = rows.count();
    if extra > 0 {
        warn!(
            "{}: ignoring {extra} trailing rows",
            path.to_string_lossy()
        );
    }
}

/// Reads modal heat currents, `nsamples` blocks of `nbins` rows each.
///
/// Only the channels needed by `directions` are kept; each becomes a
/// `nbins x nsamples` matrix.
pub fn load_heatmode(
    path: &Path,
    nbins: usize,
    nsamples: usize,
    directions: &[Direction],
) -> Result<Dataset> {
    let wanted = HEATMODE_COLUMNS
        .iter()
        .enumerate()
        .filter(|(_, name)| directions.iter().any(|d| d.channels().any(|c| c == **name)))
        .map(|(j, name)| (j, *name))
        .collect::<Vec<_>>();
    let mut channels = vec![DMatrix::<f64>::zeros(nbins, nsamples); wanted.len()];
    let mut rows = open_rows(path)?;
    for s in 0..nsamples {
        for m in 0..nbins {
            let values = rows
                .next_columns(HEATMODE_COLUMNS.len())
                .ok_or_else(|| {
                    anyhow!(
                        "{}: expected {} rows, file ends at sample {s}, bin {m}",
                        path.to_string_lossy(),
                        nbins * nsamples
                    )
                })?
                .with_context(|| format!("Parsing {}", path.to_string_lossy()))?;
            for (channel, &(j, _)) in channels.iter_mut().zip(&wanted) {
                channel[(m, s)] = values[j];
            }
        }
    }
    count_trailing(rows, path);
    debug!(
        "loaded {} channels of {nbins} bins x {nsamples} samples",
        wanted.len()
    );
    let mut data = Dataset::new();
    for (channel, (_, name)) in channels.into_iter().zip(wanted) {
        data.insert(name, channel);
    }
    Ok(data)
}

/// Reads a spectral heat current run: `2 * num_corr_points - 1` rows of
/// `t K_in K_out`, then `num_omega` rows of `nu J_in J_out`.
pub fn load_shc(path: &Path, num_corr_points: usize, num_omega: usize) -> Result<Dataset> {
    if num_corr_points == 0 {
        return Err(anyhow!("number of correlation points must be positive"));
    }
    let mut rows = open_rows(path)?;
    let mut read_block = |count: usize, keys: [&str; 3]| -> Result<[Vec<f64>; 3]> {
        let mut columns: [Vec<f64>; 3] = Default::default();
        for i in 0..count {
            let values = rows
                .next_columns(3)
                .ok_or_else(|| {
                    anyhow!(
                        "{}: missing row {i} of block '{}'",
                        path.to_string_lossy(),
                        keys[0]
                    )
                })?
                .with_context(|| format!("Parsing {}", path.to_string_lossy()))?;
            columns
                .iter_mut()
                .zip(values)
                .for_each(|(column, v)| column.push(v));
        }
        Ok(columns)
    };
    let corr_keys = ["t", "K_in", "K_out"];
    let spectral_keys = ["nu", "J_in", "J_out"];
    let corr = read_block(2 * num_corr_points - 1, corr_keys)?;
    let spectral = read_block(num_omega, spectral_keys)?;
    count_trailing(rows, path);

    let mut data = Dataset::new();
    for (key, column) in corr_keys
        .into_iter()
        .zip(corr)
        .chain(spectral_keys.into_iter().zip(spectral))
    {
        data.insert(key, DVector::from_vec(column));
    }
    Ok(data)
}

/// Reads the running HNEMD conductivity, one row per output interval.
pub fn load_kappa(path: &Path) -> Result<Dataset> {
    let mut columns: [Vec<f64>; 5] = Default::default();
    let mut rows = open_rows(path)?;
    while let Some(values) = rows.next_columns(KAPPA_COLUMNS.len()) {
        let values = values.with_context(|| format!("Parsing {}", path.to_string_lossy()))?;
        columns
            .iter_mut()
            .zip(values)
            .for_each(|(column, v)| column.push(v));
    }
    let mut data = Dataset::new();
    for (key, column) in KAPPA_COLUMNS.into_iter().zip(columns) {
        data.insert(key, DVector::from_vec(column));
    }
    Ok(data)
}
