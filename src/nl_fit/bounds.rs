pub(super) fn within_bounds<const NPARAMS: usize>(
    x: &[f64; NPARAMS],
    lower: &[f64; NPARAMS],
    upper: &[f64; NPARAMS],
) -> bool {
    for i in 0..NPARAMS {
        if x[i] < lower[i] || x[i] > upper[i] {
            return false;
        }
    }
    true
}

pub(super) fn clamp_to_bounds<const NPARAMS: usize>(
    x: &mut [f64; NPARAMS],
    lower: &[f64; NPARAMS],
    upper: &[f64; NPARAMS],
) {
    for i in 0..NPARAMS {
        x[i] = x[i].max(lower[i]).min(upper[i]);
    }
}

/// Feasible starting point derived from bounds only
///
/// The midpoint for a finite interval, one unit inside a half-open interval, unity for an
/// unbounded parameter.
pub fn feasible_initial_guess<const NPARAMS: usize>(
    lower: &[f64; NPARAMS],
    upper: &[f64; NPARAMS],
) -> [f64; NPARAMS] {
    std::array::from_fn(|i| {
        let (lb, ub) = (lower[i], upper[i]);
        match (lb.is_finite(), ub.is_finite()) {
            (true, true) => 0.5 * (lb + ub),
            (true, false) => lb + 1.0,
            (false, true) => ub - 1.0,
            (false, false) => 1.0,
        }
    })
}

// Internal values this close to a bound keep a non-zero derivative
const BOUND_OFFSET: f64 = 1e-6;

/// Mapping of a bounded parameter onto an unbounded internal variable
///
/// Used by solvers that know nothing about bounds. A two-sided interval is mapped with
/// `x = lb + (ub - lb) (1 + sin u) / 2`, a one-sided one with `x = lb - 1 + sqrt(u² + 1)` or
/// `x = ub + 1 - sqrt(u² + 1)`. Degenerate intervals hold the parameter fixed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum BoundTransform {
    Free,
    Fixed(f64),
    Lower(f64),
    Upper(f64),
    Interval(f64, f64),
}

impl BoundTransform {
    pub(super) fn new(lower: f64, upper: f64) -> Self {
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) if lower >= upper => Self::Fixed(lower),
            (true, true) => Self::Interval(lower, upper),
            (true, false) => Self::Lower(lower),
            (false, true) => Self::Upper(upper),
            (false, false) => Self::Free,
        }
    }

    /// Internal variable of the external value `x`, which is clamped to the bounds first
    pub(super) fn to_internal(self, x: f64) -> f64 {
        match self {
            Self::Free => x,
            Self::Fixed(_) => 0.0,
            Self::Lower(lb) => ((x.max(lb) - lb + 1.0).powi(2) - 1.0).sqrt().max(BOUND_OFFSET),
            Self::Upper(ub) => ((ub - x.min(ub) + 1.0).powi(2) - 1.0).sqrt().max(BOUND_OFFSET),
            Self::Interval(lb, ub) => {
                let s = 2.0 * (x - lb) / (ub - lb) - 1.0;
                s.clamp(-1.0 + BOUND_OFFSET, 1.0 - BOUND_OFFSET).asin()
            }
        }
    }

    pub(super) fn to_external(self, u: f64) -> f64 {
        match self {
            Self::Free => u,
            Self::Fixed(x) => x,
            Self::Lower(lb) => lb - 1.0 + u.hypot(1.0),
            Self::Upper(ub) => ub + 1.0 - u.hypot(1.0),
            Self::Interval(lb, ub) => (lb + 0.5 * (ub - lb) * (1.0 + u.sin())).clamp(lb, ub),
        }
    }

    /// `dx / du`
    pub(super) fn derivative(self, u: f64) -> f64 {
        match self {
            Self::Free => 1.0,
            Self::Fixed(_) => 0.0,
            Self::Lower(_) => u / u.hypot(1.0),
            Self::Upper(_) => -u / u.hypot(1.0),
            Self::Interval(lb, ub) => 0.5 * (ub - lb) * u.cos(),
        }
    }
}
