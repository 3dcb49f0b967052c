use itertools::izip;

use crate::error::{KappaError, KappaResult};

fn check_abscissa(f: &[f64], x: &[f64]) -> KappaResult<()> {
    if f.len() != x.len() {
        return Err(KappaError::invalid(format!(
            "integrand has {} samples but abscissa has {}",
            f.len(),
            x.len()
        )));
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(KappaError::invalid("abscissa must be strictly increasing"));
    }
    Ok(())
}

/// Running trapezoidal integral of `f` over `x`, seeded with an exact zero.
pub fn cumtrapz(f: &[f64], x: &[f64]) -> KappaResult<Vec<f64>> {
    check_abscissa(f, x)?;
    let mut out = Vec::with_capacity(f.len());
    if f.is_empty() {
        return Ok(out);
    }
    out.push(0.0);
    let mut acc = 0.0;
    for (f_pair, x_pair) in f.windows(2).zip(x.windows(2)) {
        acc += (x_pair[1] - x_pair[0]) * (f_pair[0] + f_pair[1]) / 2.0;
        out.push(acc);
    }
    Ok(out)
}

/// Running average `F(n) / x[n]` of a time-dependent quantity.
///
/// Where `x[n]` is zero the average is the limit of `F(t) / t` at the origin,
/// `f[n]`, so the output never carries a non-finite leading sample.
pub fn running_average(f: &[f64], time: &[f64]) -> KappaResult<Vec<f64>> {
    let integral = cumtrapz(f, time)?;
    Ok(izip!(integral, f, time)
        .map(|(acc, &f, &t)| if t == 0.0 { f } else { acc / t })
        .collect())
}
