use numstat_common::{Algorithm, RANKS};

/// Samples kept in ascending order.
///
/// Every insert places the value at its sorted position, so the slice handed
/// to the percentile functions never needs a separate sort pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet(Vec<f64>);

impl SampleSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a set from samples in arbitrary order.
    pub fn from_unsorted(mut samples: Vec<f64>) -> Self {
        samples.sort_by(f64::total_cmp);
        Self(samples)
    }

    /// Insert `value` after any equal samples already present.
    pub fn insert(&mut self, value: f64) {
        let idx = self.0.partition_point(|x| x.total_cmp(&value).is_le());
        self.0.insert(idx, value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Nearest-rank percentile: `v[floor(l * n / 100) - 1]`, clamped into range.
/// Returns 0 for an empty slice.
pub fn nearest_rank(sorted: &[f64], n: u32) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let l = sorted.len();
    let idx = (l * n as usize / 100).saturating_sub(1);
    sorted[idx.min(l - 1)]
}

/// Linear-interpolation percentile over the fractional rank `n / 100 * (l - 1)`.
/// Returns 0 for an empty slice and never extrapolates past the maximum.
pub fn linear_interpolation(sorted: &[f64], n: u32) -> f64 {
    let l = sorted.len();
    match l {
        0 => return 0.0,
        1 => return sorted[0],
        _ => {}
    }

    let rank = n as f64 / 100.0 * (l - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = lower + 1;
    if upper >= l {
        return sorted[l - 1];
    }

    let fraction = rank - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

pub fn percentile(algorithm: Algorithm, sorted: &[f64], n: u32) -> f64 {
    match algorithm {
        Algorithm::Simple => nearest_rank(sorted, n),
        Algorithm::LinearInterpolation => linear_interpolation(sorted, n),
    }
}

/// One value per entry of [`RANKS`], ascending by rank.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileReport {
    pub entries: Vec<(u32, f64)>,
}

impl PercentileReport {
    pub fn compute(samples: &SampleSet, algorithm: Algorithm) -> Self {
        let sorted = samples.as_slice();
        let entries = RANKS
            .iter()
            .map(|&rank| (rank, percentile(algorithm, sorted, rank)))
            .collect();
        Self { entries }
    }

    /// Look up the value computed for `rank`.
    pub fn value(&self, rank: u32) -> Option<f64> {
        self.entries.iter().find(|(r, _)| *r == rank).map(|(_, v)| *v)
    }

    /// Render as `"<rank>%:\t<value>\n"` lines.
    pub fn to_lines(&self, precision: usize) -> Vec<String> {
        self.entries
            .iter()
            .map(|(rank, value)| format!("{rank}%:\t{}\n", format_significant(*value, precision)))
            .collect()
    }
}

/// Format `value` with at most `digits` significant digits, dropping trailing
/// zeros. Switches to exponent form (`1.5e+20`) when the decimal exponent is
/// below -4 or at least `digits`.
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
