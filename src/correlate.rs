use num_complex::Complex64;
use std::ops::{Add, Div, Mul};

use crate::error::{KappaError, KappaResult};

/// Sample type accepted by [`corr`]. Real samples conjugate to themselves.
pub trait Sample:
    Copy + Default + Add<Output = Self> + Mul<Output = Self> + Div<f64, Output = Self>
{
    fn conj(self) -> Self;
}

impl Sample for f64 {
    #[inline]
    fn conj(self) -> Self {
        self
    }
}

impl Sample for Complex64 {
    #[inline]
    fn conj(self) -> Self {
        Complex64::conj(&self)
    }
}

/// Normalized cross-correlation of `a` against `b` for lags `0..=max_lag`:
///
/// `C(k) = 1/(N-k) * sum_{t=0}^{N-k-1} conj(a[t]) * b[t+k]`
///
/// The left operand is the one conjugated, so swapping `a` and `b` is not
/// symmetric for complex series.
pub fn corr<T: Sample>(a: &[T], b: &[T], max_lag: usize) -> KappaResult<Vec<T>> {
    let n = a.len();
    if n != b.len() {
        return Err(KappaError::invalid(format!(
            "correlated series differ in length ({n} vs {})",
            b.len()
        )));
    }
    if max_lag >= n {
        return Err(KappaError::invalid(format!(
            "max lag {max_lag} needs at least {} samples, got {n}",
            max_lag + 1
        )));
    }
    Ok((0..=max_lag)
        .map(|k| {
            let sum = a[..n - k]
                .iter()
                .zip(&b[k..])
                .fold(T::default(), |acc, (&x, &y)| acc + x.conj() * y);
            sum / (n - k) as f64
        })
        .collect())
}
