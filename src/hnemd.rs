use crate::dataset::{Dataset, Fields};
use crate::error::{KappaError, KappaResult};
use crate::units::{check_positive, SHC_TO_W_M_K_THZ};

const CONTEXT: &str = "spectral heat current run needs in/out heat currents";

/// Spectral conductivity `k_in`, `k_out` (W/m/K/THz) of an HNEMD run.
///
/// `fe` is the driving force (1/Å), `temperature` in K, `volume` in Å^3.
pub fn spectral_kappa_fields(
    shc: &Dataset,
    fe: f64,
    temperature: f64,
    volume: f64,
) -> KappaResult<Fields> {
    let j_in = shc.require_vector("J_in", CONTEXT)?;
    let j_out = shc.require_vector("J_out", CONTEXT)?;
    check_positive("temperature", temperature)?;
    check_positive("volume", volume)?;
    if fe == 0.0 || !fe.is_finite() {
        return Err(KappaError::invalid(format!(
            "driving force must be finite and non-zero, got {fe}"
        )));
    }
    let scale = SHC_TO_W_M_K_THZ / (fe * temperature * volume);
    let mut fields = Fields::new();
    fields.push("k_in", j_in * scale);
    fields.push("k_out", j_out * scale);
    Ok(fields)
}

/// Adds `k_in` and `k_out` to a spectral heat current run.
pub fn hnemd_spectral_kappa(
    shc: &mut Dataset,
    fe: f64,
    temperature: f64,
    volume: f64,
) -> KappaResult<()> {
    let fields = spectral_kappa_fields(shc, fe, temperature, volume)?;
    shc.merge(fields);
    Ok(())
}
