//! Conversion constants from GPUMD native units (eV, fs, Å, amu) to SI.

use crate::error::{KappaError, KappaResult};

/// eV^3/amu -> J m^2/s^2 per eV.
pub const EV3_PER_AMU_TO_SI: f64 = 1.602176634e-19 * 9.651599e7;
/// fs -> s.
pub const FS_TO_S: f64 = 1.0 / 1.0e15;
/// K/(eV Å^3) -> K/(eV m^3), folded with Boltzmann's constant in eV/K.
pub const INV_KB_ANG3_TO_M3: f64 = 1.0e30 / 8.617333262145e-5;
/// eV Å/ps/THz * 1/Å^3 * 1/K * Å -> W/m/K/THz.
pub const SHC_TO_W_M_K_THZ: f64 = 1602.17662;
/// fs -> ns.
pub const FS_PER_NS: f64 = 1.0e6;

pub(crate) fn check_positive(name: &str, value: f64) -> KappaResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(KappaError::invalid(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

/// Multiplier turning a heat-current correlation integral into W/m/K.
///
/// `temperature` in K, `volume` in Å^3.
pub fn gpumd_tc_scale(temperature: f64, volume: f64) -> KappaResult<f64> {
    check_positive("temperature", temperature)?;
    check_positive("volume", volume)?;
    Ok(EV3_PER_AMU_TO_SI * FS_TO_S * INV_KB_ANG3_TO_M3 / (temperature * temperature * volume))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::assert_f64_near;

    #[test]
    fn test_scale_value() {
        let want = 1.602176634e-19 * 9.651599e7 * 1.0e-15 * 1.0e30 / 8.617333262145e-5;
        let got = gpumd_tc_scale(1.0, 1.0).unwrap();
        assert!(((got - want) / want).abs() < 1e-14);
        let got = gpumd_tc_scale(300.0, 1000.0).unwrap();
        assert!(((got - want / 9.0e7) / got).abs() < 1e-14);
    }

    #[test]
    fn test_scale_decreasing_in_temperature_and_volume() {
        let temps = [1.0, 10.0, 300.0, 1500.0];
        temps.windows(2).for_each(|w| {
            assert!(gpumd_tc_scale(w[0], 5.0).unwrap() > gpumd_tc_scale(w[1], 5.0).unwrap());
        });
        let vols = [0.5, 1.0, 1.0e3, 1.0e6];
        vols.windows(2).for_each(|w| {
            assert!(gpumd_tc_scale(300.0, w[0]).unwrap() > gpumd_tc_scale(300.0, w[1]).unwrap());
        });
    }

    #[test]
    fn test_scale_rejects_non_positive() {
        assert!(matches!(
            gpumd_tc_scale(0.0, 1.0),
            Err(KappaError::InvalidInput(_))
        ));
        assert!(matches!(
            gpumd_tc_scale(300.0, -1.0),
            Err(KappaError::InvalidInput(_))
        ));
        assert!(gpumd_tc_scale(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_shc_constant() {
        assert_f64_near!(SHC_TO_W_M_K_THZ, 1602.17662);
    }
}
