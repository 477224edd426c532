use thiserror::Error;

use crate::uncertain::Uncertain;

/// One standard component-value series: base values covering a single decade
/// plus the relative manufacturing tolerance of parts from that series.
#[derive(Debug, Clone, Copy)]
pub struct Series {
    pub name: &'static str,
    pub tolerance: f64,
    values: &'static [f64],
}

pub static E3: Series = Series {
    name: "E3",
    tolerance: 0.4,
    values: &[1.0, 2.2, 4.7],
};

pub static E6: Series = Series {
    name: "E6",
    tolerance: 0.2,
    values: &[1.0, 1.5, 2.2, 3.3, 4.7, 6.8],
};

pub static E12: Series = Series {
    name: "E12",
    tolerance: 0.1,
    values: &[1.0, 1.2, 1.5, 1.8, 2.2, 2.7, 3.3, 3.9, 4.7, 5.6, 6.8, 8.2],
};

pub static E24: Series = Series {
    name: "E24",
    tolerance: 0.05,
    values: &[
        1.0, 1.1, 1.2, 1.3, 1.5, 1.6, 1.8, 2.0, 2.2, 2.4, 2.7, 3.0, 3.3, 3.6, 3.9, 4.3, 4.7, 5.1,
        5.6, 6.2, 6.8, 7.5, 8.2, 9.1,
    ],
};

pub static E48: Series = Series {
    name: "E48",
    tolerance: 0.02,
    values: &[
        1.00, 1.05, 1.10, 1.15, 1.21, 1.27, 1.33, 1.40, 1.47, 1.54, 1.62, 1.69, 1.78, 1.87, 1.96,
        2.05, 2.15, 2.26, 2.37, 2.49, 2.61, 2.74, 2.87, 3.01, 3.16, 3.32, 3.48, 3.65, 3.83, 4.02,
        4.22, 4.42, 4.64, 4.87, 5.11, 5.36, 5.62, 5.90, 6.19, 6.49, 6.81, 7.15, 7.50, 7.87, 8.25,
        8.66, 9.09, 9.53,
    ],
};

pub static E96: Series = Series {
    name: "E96",
    tolerance: 0.01,
    values: &[
        1.00, 1.02, 1.05, 1.07, 1.10, 1.13, 1.15, 1.18, 1.21, 1.24, 1.27, 1.30, 1.33, 1.37, 1.40,
        1.43, 1.47, 1.50, 1.54, 1.58, 1.62, 1.65, 1.69, 1.74, 1.78, 1.82, 1.87, 1.91, 1.96, 2.00,
        2.05, 2.10, 2.15, 2.21, 2.26, 2.32, 2.37, 2.43, 2.49, 2.55, 2.61, 2.67, 2.74, 2.80, 2.87,
        2.94, 3.01, 3.09, 3.16, 3.24, 3.32, 3.40, 3.48, 3.57, 3.65, 3.74, 3.83, 3.92, 4.02, 4.12,
        4.22, 4.32, 4.42, 4.53, 4.64, 4.75, 4.87, 4.99, 5.11, 5.23, 5.36, 5.49, 5.62, 5.76, 5.90,
        6.04, 6.19, 6.34, 6.49, 6.65, 6.81, 6.98, 7.15, 7.32, 7.50, 7.68, 7.87, 8.06, 8.25, 8.45,
        8.66, 8.87, 9.09, 9.31, 9.53, 9.76,
    ],
};

pub static E192: Series = Series {
    name: "E192",
    tolerance: 0.005,
    values: &[
        1.00, 1.01, 1.02, 1.04, 1.05, 1.06, 1.07, 1.09, 1.10, 1.11, 1.13, 1.14, 1.15, 1.17, 1.18,
        1.20, 1.21, 1.23, 1.24, 1.26, 1.27, 1.29, 1.30, 1.32, 1.33, 1.35, 1.37, 1.38, 1.40, 1.42,
        1.43, 1.45, 1.47, 1.49, 1.50, 1.52, 1.54, 1.56, 1.58, 1.60, 1.62, 1.64, 1.65, 1.67, 1.69,
        1.72, 1.74, 1.76, 1.78, 1.80, 1.82, 1.84, 1.87, 1.89, 1.91, 1.93, 1.96, 1.98, 2.00, 2.03,
        2.05, 2.08, 2.10, 2.13, 2.15, 2.18, 2.21, 2.23, 2.26, 2.29, 2.32, 2.34, 2.37, 2.40, 2.43,
        2.46, 2.49, 2.52, 2.55, 2.58, 2.61, 2.64, 2.67, 2.71, 2.74, 2.77, 2.80, 2.84, 2.87, 2.91,
        2.94, 2.98, 3.01, 3.05, 3.09, 3.12, 3.16, 3.20, 3.24, 3.28, 3.32, 3.36, 3.40, 3.44, 3.48,
        3.52, 3.57, 3.61, 3.65, 3.70, 3.74, 3.79, 3.83, 3.88, 3.92, 3.97, 4.02, 4.07, 4.12, 4.17,
        4.22, 4.27, 4.32, 4.37, 4.42, 4.48, 4.53, 4.59, 4.64, 4.70, 4.75, 4.81, 4.87, 4.93, 4.99,
        5.05, 5.11, 5.17, 5.23, 5.30, 5.36, 5.42, 5.49, 5.56, 5.62, 5.69, 5.76, 5.83, 5.90, 5.97,
        6.04, 6.12, 6.19, 6.26, 6.34, 6.42, 6.49, 6.57, 6.65, 6.73, 6.81, 6.90, 6.98, 7.06, 7.15,
        7.23, 7.32, 7.41, 7.50, 7.59, 7.68, 7.77, 7.87, 7.96, 8.06, 8.16, 8.25, 8.35, 8.45, 8.56,
        8.66, 8.76, 8.87, 8.98, 9.09, 9.20, 9.31, 9.42, 9.53, 9.65, 9.76, 9.88,
    ],
};

pub static ALL: [&Series; 7] = [&E3, &E6, &E12, &E24, &E48, &E96, &E192];

#[derive(Debug, Error, Clone, PartialEq)]
#[error("series bounds must be positive, got {low} and {high}")]
pub struct RangeError {
    pub low: f64,
    pub high: f64,
}

impl Series {
    pub fn by_name(name: &str) -> Option<&'static Series> {
        ALL.iter().copied().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn base_values(&self) -> &'static [f64] {
        self.values
    }

    /// Expand the series over every decade touching `[min(a,b), max(a,b)]`,
    /// keeping the scaled values inside the bounds (inclusive at both ends).
    pub fn expand(&self, a: f64, b: f64) -> Result<Vec<Uncertain>, RangeError> {
        if a <= 0.0 || b <= 0.0 {
            return Err(RangeError {
                low: a.min(b),
                high: a.max(b),
            });
        }
        let lo = a.min(b);
        let hi = a.max(b);

        let mut out = Vec::new();
        let first = lo.log10().floor() as i32;
        let last = hi.log10().floor() as i32;
        for exp in first..=last {
            let scale = 10f64.powi(exp);
            for &base in self.values {
                let v = base * scale;
                if v >= lo && v <= hi {
                    out.push(Uncertain::with_static(v, v * self.tolerance));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uncertain::Source;
    use float_cmp::assert_approx_eq;

    fn nominals(values: &[Uncertain]) -> Vec<f64> {
        values.iter().map(|v| v.value()).collect()
    }

    #[test]
    fn e3_over_one_decade_includes_both_boundaries() {
        let values = E3.expand(1.0, 10.0).unwrap();
        // the next decade's 1.0 lands exactly on the inclusive upper bound
        assert_eq!(nominals(&values), [1.0, 2.2, 4.7, 10.0]);
    }

    #[test]
    fn bounds_are_order_independent() {
        let forward = E6.expand(100.0, 4700.0).unwrap();
        let backward = E6.expand(4700.0, 100.0).unwrap();
        assert_eq!(forward, backward);
        assert_approx_eq!(f64, forward[0].value(), 100.0);
        assert_approx_eq!(f64, forward.last().unwrap().value(), 4700.0);
    }

    #[test]
    fn values_outside_bounds_are_dropped() {
        let values = E12.expand(300.0, 1200.0).unwrap();
        let expected = [330.0, 390.0, 470.0, 560.0, 680.0, 820.0, 1000.0, 1200.0];
        assert_eq!(values.len(), expected.len());
        for (value, expected) in values.iter().zip(expected) {
            assert_approx_eq!(f64, value.value(), expected, ulps = 2);
        }
    }

    #[test]
    fn expanded_values_carry_the_series_tolerance() {
        let values = E24.expand(10.0, 100.0).unwrap();
        for value in &values {
            assert_approx_eq!(
                f64,
                value.sensitivity(&Source::Static),
                value.value() * 0.05
            );
        }
    }

    #[test]
    fn non_positive_bounds_are_rejected() {
        assert!(E3.expand(-1.0, 10.0).is_err());
        assert!(E3.expand(10.0, -1.0).is_err());
        assert!(E3.expand(0.0, 10.0).is_err());
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Series::by_name("E24").unwrap().name, "E24");
        assert_eq!(Series::by_name("e96").unwrap().name, "E96");
        assert!(Series::by_name("E7").is_none());
    }

    #[test]
    fn table_sizes() {
        let sizes: Vec<usize> = ALL.iter().map(|s| s.base_values().len()).collect();
        assert_eq!(sizes, [3, 6, 12, 24, 48, 96, 192]);
    }
}
