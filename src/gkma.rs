//! Green-Kubo modal analysis: per-mode heat-current correlations integrated
//! into accumulated thermal conductivity.

use log::{debug, info};
use nalgebra::{DMatrix, DVector, RowDVector};
use rayon::prelude::*;
use std::path::PathBuf;
use std::{env, error, fmt};

use crate::correlate::corr;
use crate::dataset::{Dataset, Fields};
use crate::direction::{parse_directions, Component, Direction};
use crate::error::{KappaError, KappaResult};
use crate::integrate::cumtrapz;
use crate::math::linspace;
use crate::units::{check_positive, gpumd_tc_scale, FS_PER_NS};

/// Key of the lag-time axis, in ns once the analysis returns.
pub const TAU_KEY: &str = "tau";

#[derive(Debug, Clone)]
pub struct GkmaParams {
    pub nbins: usize,
    pub nsamples: usize,
    /// Timestep (fs).
    pub dt: f64,
    /// Timesteps per modal heat-current sample.
    pub sample_interval: usize,
    /// K
    pub temperature: f64,
    /// Å^3
    pub volume: f64,
    /// Correlation time to integrate up to (ns); the whole run when unset.
    pub max_tau: Option<f64>,
    pub directions: String,
}

impl GkmaParams {
    pub fn new(nbins: usize, nsamples: usize, dt: f64, sample_interval: usize) -> Self {
        Self {
            nbins,
            nsamples,
            dt,
            sample_interval,
            temperature: 300.0,
            volume: 1.0,
            max_tau: None,
            directions: "xyz".to_string(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_max_tau(mut self, max_tau: Option<f64>) -> Self {
        self.max_tau = max_tau;
        self
    }

    pub fn with_directions(mut self, directions: &str) -> Self {
        self.directions = directions.to_string();
        self
    }
}

/// Where the augmented dataset goes once the analysis is done.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub save: bool,
    pub outputfile: String,
    /// Defaults to the current working directory.
    pub directory: Option<PathBuf>,
    pub return_data: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            save: false,
            outputfile: "heatmode.bin".to_string(),
            directory: None,
            return_data: true,
        }
    }
}

impl OutputOptions {
    pub fn saved_to(mut self, directory: Option<PathBuf>, outputfile: &str) -> Self {
        self.save = true;
        self.directory = directory;
        self.outputfile = outputfile.to_string();
        self
    }

    pub fn with_return_data(mut self, return_data: bool) -> Self {
        self.return_data = return_data;
        self
    }

    fn resolve_path(&self) -> KappaResult<Option<PathBuf>> {
        if !self.save {
            return Ok(None);
        }
        let directory = match &self.directory {
            Some(directory) => directory.clone(),
            None => env::current_dir()?,
        };
        Ok(Some(directory.join(&self.outputfile)))
    }
}

#[derive(Debug)]
pub struct GkmaOutput {
    pub path: Option<PathBuf>,
    pub data: Option<Dataset>,
}

/// Failed modal analysis. Owns the dataset that was passed in so the caller
/// keeps its heat currents.
#[derive(Debug)]
pub struct GkmaError {
    error: KappaError,
    data: Dataset,
}

impl GkmaError {
    pub fn error(&self) -> &KappaError {
        &self.error
    }

    pub fn into_data(self) -> Dataset {
        self.data
    }

    pub fn into_parts(self) -> (KappaError, Dataset) {
        (self.error, self.data)
    }
}

impl fmt::Display for GkmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl error::Error for GkmaError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        error::Error::source(&self.error)
    }
}

impl From<GkmaError> for KappaError {
    fn from(err: GkmaError) -> Self {
        err.error
    }
}

/// Sampling and lag parameters resolved from [`GkmaParams`], times in fs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagGrid {
    pub sample_time: f64,
    pub max_lag: usize,
}

impl LagGrid {
    pub fn resolve(params: &GkmaParams) -> KappaResult<Self> {
        check_positive("timestep", params.dt)?;
        if params.sample_interval == 0 || params.nsamples == 0 {
            return Err(KappaError::invalid(
                "sample interval and sample count must be positive",
            ));
        }
        let sample_time = params.sample_interval as f64 * params.dt;
        let total_time = sample_time * (params.nsamples - 1) as f64;
        let max_lag = match params.max_tau {
            None => params.nsamples - 1,
            Some(ns) if ns >= 0.0 && ns.is_finite() => {
                let max_tau = ns * FS_PER_NS;
                let max_lag = (max_tau / sample_time).floor() as usize;
                if max_lag >= params.nsamples {
                    return Err(KappaError::invalid(format!(
                        "max correlation time {max_tau} fs exceeds the {total_time} fs of sampled data"
                    )));
                }
                max_lag
            }
            Some(ns) => {
                return Err(KappaError::invalid(format!(
                    "max correlation time must be non-negative, got {ns} ns"
                )))
            }
        };
        Ok(Self {
            sample_time,
            max_lag,
        })
    }

    /// Lag times `0, dt_s, ..., max_lag * dt_s` (fs).
    pub fn tau(&self) -> DVector<f64> {
        let size = self.max_lag + 1;
        DVector::from_iterator(
            size,
            linspace(0.0, self.max_lag as f64 * self.sample_time, size),
        )
    }
}

fn check_shape(
    data: &Dataset,
    direction: Direction,
    nbins: usize,
    nsamples: usize,
) -> KappaResult<()> {
    let context = format!("{direction} direction data is missing");
    for channel in direction.channels() {
        let m = data.require_matrix(channel, &context)?;
        if m.shape() != (nbins, nsamples) {
            return Err(KappaError::invalid(format!(
                "channel '{channel}' is {:?}, expected ({nbins}, {nsamples})",
                m.shape()
            )));
        }
    }
    Ok(())
}

/// Per-sample sum over all bins of every channel of `direction`.
fn reference_current(data: &Dataset, direction: Direction) -> KappaResult<Vec<f64>> {
    let context = format!("{direction} direction data is missing");
    let mut total: Option<RowDVector<f64>> = None;
    for channel in direction.channels() {
        let sum = data.require_matrix(channel, &context)?.row_sum();
        total = Some(match total {
            Some(total) => total + sum,
            None => sum,
        });
    }
    Ok(total.map(|t| t.iter().copied().collect()).unwrap_or_default())
}

/// Correlation and accumulated conductivity of every mode of one channel.
fn modal_component(
    series: &DMatrix<f64>,
    reference: &[f64],
    tau: &[f64],
    max_lag: usize,
    scale: f64,
) -> KappaResult<(DMatrix<f64>, DMatrix<f64>)> {
    let nbins = series.nrows();
    let size = max_lag + 1;
    let rows = (0..nbins)
        .into_par_iter()
        .map(|m| -> KappaResult<(Vec<f64>, Vec<f64>)> {
            let mode = series.row(m).iter().copied().collect::<Vec<_>>();
            let c = corr::<f64>(&mode, reference, max_lag)?;
            let k = cumtrapz(&c, tau)?
                .into_iter()
                .map(|v| v * scale)
                .collect::<Vec<_>>();
            Ok((c, k))
        })
        .collect::<KappaResult<Vec<_>>>()?;
    let mut corr = DMatrix::zeros(nbins, size);
    let mut kappa = DMatrix::zeros(nbins, size);
    for (m, (c, k)) in rows.into_iter().enumerate() {
        corr.row_mut(m).copy_from_slice(&c);
        kappa.row_mut(m).copy_from_slice(&k);
    }
    Ok((corr, kappa))
}

/// Correlation and conductivity fields of one direction.
pub fn direction_fields(
    data: &Dataset,
    direction: Direction,
    tau: &[f64],
    max_lag: usize,
    scale: f64,
) -> KappaResult<Fields> {
    let context = format!("{direction} direction data is missing");
    let reference = reference_current(data, direction)?;
    let mut fields = Fields::new();
    for &Component {
        channel,
        corr_key,
        kappa_key,
    } in direction.components()
    {
        let series = data.require_matrix(channel, &context)?;
        let (corr, kappa) = modal_component(series, &reference, tau, max_lag, scale)?;
        fields.push(corr_key, corr);
        fields.push(kappa_key, kappa);
    }
    drop(reference);
    Ok(fields)
}

/// Every field the analysis adds to `data`, together with the save path.
fn modal_fields(
    data: &Dataset,
    params: &GkmaParams,
    output: &OutputOptions,
) -> KappaResult<(Fields, Option<PathBuf>)> {
    if !output.save && !output.return_data {
        return Err(KappaError::InvalidConfig(
            "results would be neither saved nor returned".to_string(),
        ));
    }
    let directions = parse_directions(&params.directions)?;
    for &direction in &directions {
        check_shape(data, direction, params.nbins, params.nsamples)?;
    }
    let out_path = output.resolve_path()?;
    let scale = gpumd_tc_scale(params.temperature, params.volume)?;
    let grid = LagGrid::resolve(params)?;
    let tau = grid.tau();
    info!(
        "sample time {} fs, max lag {} ({} fs), scale {scale:e}",
        grid.sample_time,
        grid.max_lag,
        tau[grid.max_lag]
    );

    let mut fields = Fields::new();
    for direction in directions {
        debug!("correlating {direction} direction over {} bins", params.nbins);
        fields.extend(direction_fields(
            data,
            direction,
            tau.as_slice(),
            grid.max_lag,
            scale,
        )?);
    }
    fields.push(TAU_KEY, tau / FS_PER_NS);
    Ok((fields, out_path))
}

/// Green-Kubo modal thermal conductivity from modal heat currents.
///
/// Adds `tau` (ns) and, per requested direction, the `corr_*` correlations
/// and `km*` accumulated conductivities (W/m/K) to `data`. Every requested
/// direction must have its channels, otherwise nothing is computed. On
/// failure the dataset comes back inside the [`GkmaError`], unchanged unless
/// only the final save failed.
pub fn get_gkma_kappa(
    mut data: Dataset,
    params: &GkmaParams,
    output: &OutputOptions,
) -> Result<GkmaOutput, GkmaError> {
    let (fields, out_path) = match modal_fields(&data, params, output) {
        Ok(res) => res,
        Err(error) => return Err(GkmaError { error, data }),
    };
    data.merge(fields);

    if let Some(path) = &out_path {
        if let Err(error) = data.save(path) {
            return Err(GkmaError { error, data });
        }
        info!("saved modal conductivity to {}", path.to_string_lossy());
    }
    Ok(GkmaOutput {
        path: out_path,
        data: output.return_data.then_some(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::assert_f64_near;
    use tempfile::tempdir;

    fn z_dataset() -> Dataset {
        let mut data = Dataset::new();
        data.insert(
            "jmz",
            DMatrix::from_row_slice(
                2,
                5,
                &[1.0, 0.0, -1.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0],
            ),
        );
        data
    }

    fn xyz_dataset(nbins: usize, nsamples: usize) -> Dataset {
        let mut data = Dataset::new();
        for (c, name) in ["jmxi", "jmxo", "jmyi", "jmyo", "jmz"].iter().enumerate() {
            let m = DMatrix::from_fn(nbins, nsamples, |m, s| {
                ((s * (m + 1) + c) as f64 * 0.7).sin()
            });
            data.insert(name, m);
        }
        data
    }

    #[test]
    fn test_z_scenario() {
        let params = GkmaParams::new(2, 5, 1.0, 1).with_directions("z");
        let out = get_gkma_kappa(z_dataset(), &params, &OutputOptions::default()).unwrap();
        assert!(out.path.is_none());
        let data = out.data.unwrap();

        let tau = data.vector(TAU_KEY).unwrap();
        assert_eq!(tau.len(), 5);
        assert_f64_near!(tau[4], 4.0 / FS_PER_NS);

        let corr = data.matrix("corr_zm_z").unwrap();
        assert_eq!(corr.shape(), (2, 5));
        // reference z current is [1, 1, -1, -1, 1]
        assert_f64_near!(corr[(0, 0)], (1.0 + 1.0 + 1.0) / 5.0);
        assert_f64_near!(corr[(1, 0)], (1.0 + 1.0) / 5.0);
        assert_f64_near!(corr[(0, 1)], (1.0 + 1.0) / 4.0);

        let kmz = data.matrix("kmz").unwrap();
        assert_eq!(kmz.shape(), (2, 5));
        assert_eq!(kmz[(0, 0)], 0.0);
        assert_eq!(kmz[(1, 0)], 0.0);
        let scale = gpumd_tc_scale(300.0, 1.0).unwrap();
        let want = (corr[(0, 0)] + corr[(0, 1)]) / 2.0 * scale;
        assert!(((kmz[(0, 1)] - want) / want).abs() < 1e-12);
        assert!(!data.contains("kmxi"));
    }

    #[test]
    fn test_in_plane_directions_split_in_and_out() {
        let params = GkmaParams::new(3, 40, 0.5, 2)
            .with_directions("yx")
            .with_max_tau(Some(10.0e-6));
        let out = get_gkma_kappa(xyz_dataset(3, 40), &params, &OutputOptions::default()).unwrap();
        let data = out.data.unwrap();
        for key in [
            "corr_xmi_x", "corr_xmo_x", "kmxi", "kmxo", "corr_ymi_y", "corr_ymo_y", "kmyi",
            "kmyo",
        ] {
            assert_eq!(data.matrix(key).unwrap().shape(), (3, 11), "{key}");
        }
        assert!(!data.contains("kmz"));
        assert_eq!(data.vector(TAU_KEY).unwrap().len(), 11);

        // in + out correlations over all modes add up to the total autocorrelation
        let jx = data.matrix("jmxi").unwrap().row_sum() + data.matrix("jmxo").unwrap().row_sum();
        let jx = jx.iter().copied().collect::<Vec<_>>();
        let acf = corr(&jx, &jx, 10).unwrap();
        let total = data.matrix("corr_xmi_x").unwrap().row_sum()
            + data.matrix("corr_xmo_x").unwrap().row_sum();
        total.iter().zip(&acf).for_each(|(&got, &want)| {
            assert!((got - want).abs() < 1e-10);
        });
    }

    #[test]
    fn test_missing_channel_fails_fast() {
        let mut data = xyz_dataset(2, 5);
        data.insert("jmxi", DVector::from_vec(vec![1.0]));
        let params = GkmaParams::new(2, 5, 1.0, 1).with_directions("zx");
        let mut incomplete = Dataset::new();
        incomplete.insert("jmz", data.matrix("jmz").unwrap().clone());
        incomplete.insert("jmxo", data.matrix("jmxo").unwrap().clone());
        match gkma_error(incomplete, &params, &OutputOptions::default()) {
            KappaError::MissingData { key, .. } => assert_eq!(key, "jmxi"),
            other => panic!("unexpected {other:?}"),
        }
        match gkma_error(data, &params, &OutputOptions::default()) {
            KappaError::MissingData { key, .. } => assert_eq!(key, "jmxi"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_failed_analysis_returns_dataset() {
        let mut data = xyz_dataset(2, 5);
        data.insert("jmyo", DVector::from_vec(vec![1.0]));
        let before = data.clone();
        let params = GkmaParams::new(2, 5, 1.0, 1).with_directions("zy");
        let err = get_gkma_kappa(data, &params, &OutputOptions::default()).unwrap_err();
        assert!(matches!(err.error(), KappaError::MissingData { key, .. } if key == "jmyo"));
        assert!(err.to_string().contains("jmyo"));
        assert_eq!(err.into_data(), before);

        let params = GkmaParams::new(2, 5, 1.0, 1)
            .with_directions("z")
            .with_max_tau(Some(-1.0));
        let (error, data) = get_gkma_kappa(z_dataset(), &params, &OutputOptions::default())
            .unwrap_err()
            .into_parts();
        assert!(matches!(error, KappaError::InvalidInput(_)));
        assert_eq!(data, z_dataset());
    }

    #[test]
    fn test_existing_tau_is_replaced() {
        let mut data = z_dataset();
        data.insert(TAU_KEY, DVector::from_vec(vec![9.0, 9.0]));
        let params = GkmaParams::new(2, 5, 1.0, 1).with_directions("z");
        let data = get_gkma_kappa(data, &params, &OutputOptions::default())
            .unwrap()
            .data
            .unwrap();
        let tau = data.vector(TAU_KEY).unwrap();
        assert_eq!(tau.len(), 5);
        assert_eq!(tau[0], 0.0);
        assert_f64_near!(tau[2], 2.0 / FS_PER_NS);
    }

    #[test]
    fn test_modal_correlation_matches_complex_correlator() {
        use num_complex::Complex64;

        let params = GkmaParams::new(3, 12, 1.0, 1).with_directions("z");
        let data = get_gkma_kappa(xyz_dataset(3, 12), &params, &OutputOptions::default())
            .unwrap()
            .data
            .unwrap();
        let jmz = data.matrix("jmz").unwrap();
        let reference = jmz
            .row_sum()
            .iter()
            .map(|&x| Complex64::new(x, 0.0))
            .collect::<Vec<_>>();
        let corr_z = data.matrix("corr_zm_z").unwrap();
        for m in 0..3 {
            let mode = jmz
                .row(m)
                .iter()
                .map(|&x| Complex64::new(x, 0.0))
                .collect::<Vec<_>>();
            let want = corr(&mode, &reference, 11).unwrap();
            corr_z.row(m).iter().zip(&want).for_each(|(&got, want)| {
                assert!((got - want.re).abs() < 1e-12);
                assert_eq!(want.im, 0.0);
            });
        }
    }

    fn gkma_error(data: Dataset, params: &GkmaParams, options: &OutputOptions) -> KappaError {
        get_gkma_kappa(data, params, options).unwrap_err().into()
    }

    #[test]
    fn test_invalid_parameters() {
        let options = OutputOptions::default();
        let params = GkmaParams::new(2, 5, 1.0, 1).with_directions("z");
        assert!(matches!(
            gkma_error(z_dataset(), &params.clone().with_max_tau(Some(-1.0)), &options),
            KappaError::InvalidInput(_)
        ));
        assert!(matches!(
            gkma_error(z_dataset(), &params.clone().with_max_tau(Some(1.0)), &options),
            KappaError::InvalidInput(_)
        ));
        assert!(matches!(
            gkma_error(z_dataset(), &GkmaParams::new(3, 5, 1.0, 1).with_directions("z"), &options),
            KappaError::InvalidInput(_)
        ));
        assert!(matches!(
            gkma_error(z_dataset(), &params.clone().with_temperature(0.0), &options),
            KappaError::InvalidInput(_)
        ));
        assert!(matches!(
            gkma_error(z_dataset(), &params, &options.clone().with_return_data(false)),
            KappaError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_lag_grid() {
        let params = GkmaParams::new(1, 101, 0.5, 10).with_max_tau(Some(2.0e-4));
        let grid = LagGrid::resolve(&params).unwrap();
        assert_f64_near!(grid.sample_time, 5.0);
        assert_eq!(grid.max_lag, 40);
        let tau = grid.tau();
        assert_eq!(tau.len(), 41);
        assert_f64_near!(tau[40], 200.0);

        let grid = LagGrid::resolve(&params.with_max_tau(None)).unwrap();
        assert_eq!(grid.max_lag, 100);
    }

    #[test]
    fn test_save_and_reload_is_exact() {
        let dir = tempdir().unwrap();
        let params = GkmaParams::new(3, 30, 1.0, 5)
            .with_temperature(250.0)
            .with_volume(1.0e4);
        let options = OutputOptions::default()
            .saved_to(Some(dir.path().to_path_buf()), "modal.bin")
            .with_return_data(true);
        let out = get_gkma_kappa(xyz_dataset(3, 30), &params, &options).unwrap();
        let path = out.path.unwrap();
        assert_eq!(path, dir.path().join("modal.bin"));
        let reloaded = Dataset::load(&path).unwrap();
        assert_eq!(reloaded, out.data.unwrap());

        let options = options.with_return_data(false);
        let out = get_gkma_kappa(xyz_dataset(3, 30), &params, &options).unwrap();
        assert!(out.data.is_none());
        assert_eq!(Dataset::load(&out.path.unwrap()).unwrap(), reloaded);
    }
}
