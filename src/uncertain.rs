use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A sensitivity source: either the unattributed static bucket, or a named
/// variable the quantity depends on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    Static,
    Named(String),
}

/// A nominal value plus a partial derivative per sensitivity source.
///
/// The static entry is always present and tracks worst-case interval
/// uncertainty; named entries are signed first-order derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Uncertain {
    v: f64,
    dv: BTreeMap<Source, f64>,
}

fn pair_map(
    f: impl Fn(f64, f64) -> f64,
    a: &BTreeMap<Source, f64>,
    b: &BTreeMap<Source, f64>,
) -> BTreeMap<Source, f64> {
    let mut out = BTreeMap::new();
    for key in a.keys().chain(b.keys()) {
        let da = a.get(key).copied().unwrap_or(0.0);
        let db = b.get(key).copied().unwrap_or(0.0);
        out.insert(key.clone(), f(da, db));
    }
    out
}

impl Uncertain {
    pub fn exact(v: f64) -> Self {
        Self::with_static(v, 0.0)
    }

    pub fn with_static(v: f64, tolerance: f64) -> Self {
        let mut dv = BTreeMap::new();
        dv.insert(Source::Static, tolerance);
        Uncertain { v, dv }
    }

    pub fn value(&self) -> f64 {
        self.v
    }

    pub fn sensitivity(&self, source: &Source) -> f64 {
        self.dv.get(source).copied().unwrap_or(0.0)
    }

    pub fn sources(&self) -> impl Iterator<Item = (&Source, f64)> {
        self.dv.iter().map(|(source, d)| (source, *d))
    }

    fn stat(&self) -> f64 {
        self.sensitivity(&Source::Static)
    }

    /// Raise to a constant real exponent; every sensitivity entry is scaled
    /// by the derivative `p * v^(p-1)`.
    pub fn pow(&self, p: f64) -> Self {
        let scale = p * self.v.powf(p - 1.0);
        Uncertain {
            v: self.v.powf(p),
            dv: self.dv.iter().map(|(k, d)| (k.clone(), scale * d)).collect(),
        }
    }

    pub fn abs(&self) -> Self {
        if self.v >= 0.0 {
            self.clone()
        } else {
            self.clone() * Uncertain::exact(-1.0)
        }
    }

    /// Move the static uncertainty onto an entry named after `name`, e.g.
    /// crediting a parameter's literal tolerance to that parameter before a
    /// sweep. The static bucket resets to zero.
    pub fn attribute_static(&mut self, name: impl Into<String>) {
        let stat = self.dv.insert(Source::Static, 0.0).unwrap_or(0.0);
        self.dv.insert(Source::Named(name.into()), stat);
    }

    /// Worst-case interval half-width: the sum of the absolute values of
    /// every sensitivity entry.
    pub fn total_range(&self) -> f64 {
        self.dv.values().map(|d| d.abs()).sum()
    }

    /// Mean of the square over `[v - range, v + range]`, taking the value as
    /// uniformly distributed over that interval.
    pub fn second_moment(&self) -> f64 {
        let range = self.total_range();
        if range == 0.0 {
            return self.v * self.v;
        }
        ((self.v + range).powi(3) - (self.v - range).powi(3)) / (6.0 * range)
    }
}

impl Add for Uncertain {
    type Output = Uncertain;

    fn add(self, other: Uncertain) -> Uncertain {
        Uncertain {
            v: self.v + other.v,
            dv: pair_map(|da, db| da + db, &self.dv, &other.dv),
        }
    }
}

impl Sub for Uncertain {
    type Output = Uncertain;

    fn sub(self, other: Uncertain) -> Uncertain {
        let mut dv = pair_map(|da, db| da - db, &self.dv, &other.dv);
        // static magnitudes accumulate under subtraction, they do not cancel
        dv.insert(Source::Static, self.stat() + other.stat());
        Uncertain {
            v: self.v - other.v,
            dv,
        }
    }
}

impl Mul for Uncertain {
    type Output = Uncertain;

    fn mul(self, other: Uncertain) -> Uncertain {
        let v = self.v * other.v;
        // (a + b dx + ...)(A + B dx + ...) = aA + (aB + Ab) dx + ...,
        // higher orders dropped
        let mut dv = pair_map(
            |da, db| self.v * db + other.v * da,
            &self.dv,
            &other.dv,
        );
        // relative static tolerances add instead
        dv.insert(
            Source::Static,
            v * (self.stat() / self.v + other.stat() / other.v),
        );
        Uncertain { v, dv }
    }
}

impl Div for Uncertain {
    type Output = Uncertain;

    fn div(self, other: Uncertain) -> Uncertain {
        self * other.pow(-1.0)
    }
}

impl Neg for Uncertain {
    type Output = Uncertain;

    fn neg(self) -> Uncertain {
        self * Uncertain::exact(-1.0)
    }
}

impl Display for Uncertain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{}", self.v)?;
            let stat = self.stat();
            if stat != 0.0 {
                let rel = (stat / self.v).abs();
                if rel < 1.0 {
                    write!(f, " ± {:.2}%", rel * 100.0)?;
                } else {
                    write!(f, " ± {stat}")?;
                }
            }
            for (source, d) in &self.dv {
                let Source::Named(name) = source else {
                    continue;
                };
                if *d >= 0.0 {
                    write!(f, " + {d}*d{name}")?;
                } else {
                    write!(f, " - {}*d{name}", -d)?;
                }
            }
            Ok(())
        } else {
            let range = self.total_range();
            if range == 0.0 {
                return write!(f, "{}", self.v);
            }
            let rel = (range / self.v).abs();
            if rel < 1.0 {
                write!(f, "{} ± {:.2}%", self.v, rel * 100.0)
            } else {
                write!(f, "{} ± {range}", self.v)
            }
        }
    }
}
