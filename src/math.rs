use crate::error::KappaResult;
use crate::integrate::cumtrapz;

/// `count` evenly spaced points from `begin` to `end`. The last point is
/// `end` itself, not an accumulated approximation of it.
pub fn linspace(begin: f64, end: f64, count: usize) -> impl Iterator<Item = f64> {
    let last = count.saturating_sub(1);
    let step = if last == 0 {
        0.0
    } else {
        (end - begin) / last as f64
    };
    (0..count).map(move |i| {
        if i == last && last > 0 {
            end
        } else {
            (i as f64).mul_add(step, begin)
        }
    })
}

/// Total trapezoidal integral of `f` over `x`.
pub fn trapz(f: &[f64], x: &[f64]) -> KappaResult<f64> {
    Ok(cumtrapz(f, x)?.last().copied().unwrap_or(0.0))
}

/// Single-pass mean and population standard deviation (Welford).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeanStd {
    count: usize,
    mean: f64,
    m2: f64,
}

impl MeanStd {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    pub fn std(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.m2 / self.count as f64).sqrt())
    }
}

impl FromIterator<f64> for MeanStd {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::default();
        iter.into_iter().for_each(|x| stats.push(x));
        stats
    }
}
