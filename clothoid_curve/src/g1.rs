use super::*;

use super::fresnel::{generalized_fresnel_cs, generalized_fresnel_moments};
use log::{debug, warn};

#[cfg(feature = "std")]
use argmin::{
    core::{CostFunction, Error, Executor},
    solver::brent::BrentRoot,
};

/// Settings for the G1 root finder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// converged once the end point misses the chord sideways by less than this,
    /// relative to the chord length
    pub tolerance: Float,
    /// Newton iterations per seed, and the budget of the bracketing fallback
    pub max_iterations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
        }
    }
}

/// A fitted segment along with how the solver got there
#[derive(Debug, Clone, PartialEq)]
pub struct G1Fit {
    pub clothoid: Clothoid,
    /// root of the normalized problem, dk * length^2 / 2
    pub a: Float,
    /// solver iterations spent on the accepted root
    pub iterations: usize,
    /// normalized lateral miss at the accepted root
    pub residual: Float,
    /// true if neither Newton run converged and the bracketing solver was needed
    pub used_fallback: bool,
}

// least squares fit of the root as a function of the relative headings,
// from Bertolazzi and Frego "G1 fitting with clothoids"
#[allow(clippy::excessive_precision)]
const GUESS_COEFFICIENTS: [Float; 6] = [
    2.989696028701907,
    0.716228953608281,
    -0.458969738821509,
    -0.502821153340377,
    0.261062141752652,
    -0.045854475238709,
];

/// headings closer than this (after wrapping) count as the same for coincident endpoints
const HEADING_EPSILON: Float = 1e-12;

#[cfg(feature = "std")]
const BRACKET_STEP: Float = 0.25;
#[cfg(feature = "std")]
const BRACKET_STEPS: usize = 64;

/// relative headings of the start and end to the chord
#[derive(Debug, Clone, Copy)]
struct ChordFrame {
    chord: Float,
    phi0: Float,
    delta: Float,
}

struct Root {
    a: Float,
    /// the chord-aligned integral, chord / length
    x: Float,
    iterations: usize,
    residual: Float,
}

fn initial_guess(phi0: Float, phi1: Float) -> Float {
    let c = &GUESS_COEFFICIENTS;
    let x = phi0 / PI;
    let y = phi1 / PI;
    let xy = x * y;
    let x2 = x * x;
    let y2 = y * y;
    (phi0 + phi1)
        * (c[0] + xy * (c[1] + xy * c[2]) + (c[3] + xy * c[4]) * (x2 + y2) + c[5] * (x2 * x2 + y2 * y2))
}

/// how far the end of the normalized clothoid for `a` lands to the side of the unit chord
#[cfg_attr(not(feature = "std"), allow(dead_code))]
fn lateral_miss(a: Float, frame: &ChordFrame) -> Float {
    generalized_fresnel_cs(2.0 * a, frame.delta - a, frame.phi0).1
}

/// lateral miss and its derivative with respect to `a`
fn lateral_miss_slope(a: Float, frame: &ChordFrame) -> (Float, Float) {
    let (int_c, int_s) = generalized_fresnel_moments(2.0 * a, frame.delta - a, frame.phi0);
    (int_s[0], int_c[2] - int_c[1])
}

/// a root is only usable if the clothoid heads towards the end point, giving a positive length
fn accept(a: Float, iterations: usize, frame: &ChordFrame) -> Option<Root> {
    if !a.is_finite() {
        return None;
    }
    let (x, residual) = generalized_fresnel_cs(2.0 * a, frame.delta - a, frame.phi0);
    if x > 0.0 {
        Some(Root {
            a,
            x,
            iterations,
            residual,
        })
    } else {
        debug!("rejecting root a {a:0.6}, it would need a negative length ({x:0.3e})");
        None
    }
}

/// Newton iteration from `seed`, the residual of the last iterate is returned on failure
fn newton(seed: Float, frame: &ChordFrame, options: &FitOptions) -> Result<(Float, usize), Float> {
    let mut a = seed;
    let mut residual = Float::INFINITY;
    for iteration in 0..=options.max_iterations {
        let (miss, slope) = lateral_miss_slope(a, frame);
        residual = miss;
        if !miss.is_finite() {
            break;
        }
        if miss.abs() < options.tolerance {
            return Ok((a, iteration));
        }
        if slope == 0.0 || !slope.is_finite() {
            break;
        }
        a -= miss / slope;
    }
    Err(residual)
}

#[cfg(feature = "std")]
impl CostFunction for ChordFrame {
    type Param = Float;
    type Output = Float;

    fn cost(&self, a: &Self::Param) -> Result<Self::Output, Error> {
        Ok(lateral_miss(*a, self))
    }
}

/// Brent's method on the first sign change found walking outwards from `guess`
#[cfg(feature = "std")]
fn bracketed_root(guess: Float, frame: &ChordFrame, options: &FitOptions) -> Option<Root> {
    let mut left = (guess, lateral_miss(guess, frame));
    let mut right = left;
    for k in 1..=BRACKET_STEPS {
        let offset = k as Float * BRACKET_STEP;
        let next_right = (guess + offset, lateral_miss(guess + offset, frame));
        let next_left = (guess - offset, lateral_miss(guess - offset, frame));
        for (lo, hi) in [(right, next_right), (next_left, left)] {
            if lo.1 * hi.1 > 0.0 || !(lo.1 * hi.1).is_finite() {
                continue;
            }
            let solver = BrentRoot::new(lo.0, hi.0, options.tolerance * 1e-3);
            let res = Executor::new(*frame, solver)
                .configure(|state| state.max_iters(options.max_iterations as u64))
                .run();
            match res {
                Ok(res) => {
                    let Some(a) = res.state.param else {
                        continue;
                    };
                    let iterations = res.state.iter as usize;
                    if let Some(root) = accept(a, iterations, frame) {
                        if root.residual.abs() < options.tolerance {
                            return Some(root);
                        }
                    }
                }
                Err(err) => {
                    debug!("brent root finding in [{:0.3}, {:0.3}] failed: {err}", lo.0, hi.0);
                }
            }
        }
        right = next_right;
        left = next_left;
    }
    None
}

fn invalid(parameter: &'static str, value: Float) -> ClothoidError {
    ClothoidError::InvalidParameter { parameter, value }
}

fn check_pose(parameter: &'static str, pose: &Pose) -> Result<(), ClothoidError> {
    match pose
        .as_array_meter_radian()
        .into_iter()
        .find(|v| !v.is_finite())
    {
        Some(value) => Err(invalid(parameter, value)),
        None => Ok(()),
    }
}

/// Fit a clothoid that leaves `start` and arrives at `end` with its heading (G1 Hermite interpolation)
///
/// Identical poses give a zero length segment.
/// See [`build_g1_with`] for the solver settings and diagnostics.
pub fn build_g1(start: &Pose, end: &Pose) -> Result<Clothoid, ClothoidError> {
    build_g1_with(start, end, &FitOptions::default()).map(|fit| fit.clothoid)
}

/// Fit a clothoid from `start` to `end`
///
/// Headings are taken relative to the chord from start to end and wrapped to (-pi, pi],
/// so the curve turns by less than pi either side of the chord at both ends and the
/// end heading is met modulo 2 pi.
/// The fit is reduced to finding the root `a` of the lateral miss of a unit-chord clothoid,
/// solved with Newton's method seeded with the circular arc (a = 0) and with a closed form estimate.
/// When both converge the shorter curve is kept.
pub fn build_g1_with(
    start: &Pose,
    end: &Pose,
    options: &FitOptions,
) -> Result<G1Fit, ClothoidError> {
    if !(options.tolerance > 0.0 && options.tolerance.is_finite()) {
        return Err(invalid("tolerance", options.tolerance));
    }
    if options.max_iterations == 0 {
        return Err(invalid("max iterations", 0.0));
    }
    check_pose("start pose", start)?;
    check_pose("end pose", end)?;

    let [x0, y0, theta0] = start.as_array_meter_radian();
    let [x1, y1, theta1] = end.as_array_meter_radian();
    let dx = x1 - x0;
    let dy = y1 - y0;
    let chord = hypot(dx, dy);

    // chords at the rounding level of the coordinates have no usable direction
    let scale = x0.abs().max(y0.abs()).max(x1.abs()).max(y1.abs()).max(1.0);
    if chord <= Float::EPSILON * scale {
        let heading_change = wrap_radian(theta1 - theta0);
        if heading_change.abs() <= HEADING_EPSILON {
            debug!("start and end poses are the same, fitting a zero length segment");
            return Ok(G1Fit {
                clothoid: Clothoid::zero_length(start),
                a: 0.0,
                iterations: 0,
                residual: 0.0,
                used_fallback: false,
            });
        }
        return Err(ClothoidError::CoincidentEndpoints { heading_change });
    }

    let phi = atan2(dy, dx);
    let phi0 = wrap_radian(theta0 - phi);
    let phi1 = wrap_radian(theta1 - phi);
    let frame = ChordFrame {
        chord,
        phi0,
        delta: phi1 - phi0,
    };

    let guess = initial_guess(phi0, phi1);
    let seeds: &[Float] = if guess == 0.0 { &[0.0] } else { &[0.0, guess] };

    let mut best: Option<Root> = None;
    let mut residual = Float::INFINITY;
    for &seed in seeds {
        match newton(seed, &frame, options) {
            Ok((a, iterations)) => {
                debug!("newton from {seed:0.6} converged to {a:0.9} in {iterations} iterations");
                let Some(root) = accept(a, iterations, &frame) else {
                    continue;
                };
                // the largest chord projection is the shortest curve
                if best.as_ref().map_or(true, |b| root.x > b.x) {
                    best = Some(root);
                }
            }
            Err(last) => {
                debug!("newton from {seed:0.6} did not converge, residual {last:0.3e}");
                if last.abs() < residual.abs() || !residual.is_finite() {
                    residual = last;
                }
            }
        }
    }

    let mut used_fallback = false;
    #[cfg(feature = "std")]
    if best.is_none() {
        warn!("newton failed for phi0 {phi0:0.6} phi1 {phi1:0.6}, bracketing around {guess:0.6}");
        best = bracketed_root(guess, &frame, options);
        used_fallback = best.is_some();
    }

    let Some(root) = best else {
        warn!("no G1 clothoid found for phi0 {phi0:0.6} phi1 {phi1:0.6}, chord {chord:0.6}");
        return Err(ClothoidError::FitNonConvergence {
            iterations: options.max_iterations,
            residual: residual.abs(),
        });
    };

    let length = frame.chord / root.x;
    let kappa0 = (frame.delta - root.a) / length;
    let dk = 2.0 * root.a / (length * length);
    if !(length.is_finite() && kappa0.is_finite() && dk.is_finite()) {
        warn!("G1 clothoid with length {length}, curvature {kappa0}, rate {dk} is unusable");
        return Err(ClothoidError::FitNonConvergence {
            iterations: root.iterations,
            residual: root.residual.abs(),
        });
    }

    let clothoid = Clothoid::from_pose(
        start,
        Curvature::new::<radian_per_meter>(kappa0),
        curvature_per_meter(dk),
        Length::new::<meter>(length),
    );
    debug!("{clothoid:?}");

    Ok(G1Fit {
        clothoid,
        a: root.a,
        iterations: root.iterations,
        residual: root.residual,
        used_fallback,
    })
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::{FRAC_PI_3, FRAC_PI_4, FRAC_PI_6};
    use finitediff::FiniteDiff;
    use std::vec;

    fn frame_between(start: &Pose, end: &Pose) -> ChordFrame {
        let [x0, y0, theta0] = start.as_array_meter_radian();
        let [x1, y1, theta1] = end.as_array_meter_radian();
        let phi = atan2(y1 - y0, x1 - x0);
        let phi0 = wrap_radian(theta0 - phi);
        let phi1 = wrap_radian(theta1 - phi);
        ChordFrame {
            chord: hypot(x1 - x0, y1 - y0),
            phi0,
            delta: phi1 - phi0,
        }
    }

    #[test]
    fn straight_line() {
        let start = Pose::from([0.0, 0.0, 0.0]);
        let end = Pose::from([5.0, 0.0, 0.0]);
        let fit = build_g1_with(&start, &end, &FitOptions::default()).unwrap();
        assert_eq!(fit.iterations, 0);
        assert!(!fit.used_fallback);
        let clothoid = fit.clothoid;
        assert_eq!(clothoid.curvature().get::<radian_per_meter>(), 0.0);
        assert_eq!(curvature_per_meter_float(clothoid.curvature_rate()), 0.0);
        assert_abs_diff_eq!(clothoid.length().get::<meter>(), 5.0, epsilon = 1e-12);

        let point = clothoid.evaluate(Length::new::<meter>(2.5)).unwrap();
        let [x, y, theta] = point.pose.as_array_meter_radian();
        assert_abs_diff_eq!(x, 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(theta, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(point.curvature.get::<radian_per_meter>(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn quarter_circle() {
        let start = Pose::from([0.0, 0.0, 0.0]);
        let end = Pose::from([1.0, 1.0, FRAC_PI_2]);
        let clothoid = build_g1(&start, &end).unwrap();
        assert_abs_diff_eq!(clothoid.curvature().get::<radian_per_meter>(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(curvature_per_meter_float(clothoid.curvature_rate()), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(clothoid.length().get::<meter>(), FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn car_scenario() {
        let start = Pose::from([2.0, 0.5, FRAC_PI_4]);
        let end = Pose::from([5.0, 3.0, -FRAC_PI_6]);
        let fit = build_g1_with(&start, &end, &FitOptions::default()).unwrap();
        let length = fit.clothoid.length().get::<meter>();
        assert!(length.is_finite() && length > 0.0, "{:?}", fit.clothoid);
        assert!(fit.residual.abs() < 1e-12);

        let reached = fit.clothoid.end_pose().as_array_meter_radian();
        assert_abs_diff_eq!(reached[0], 5.0, epsilon = 1e-8);
        assert_abs_diff_eq!(reached[1], 3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(wrap_radian(reached[2] + FRAC_PI_6), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn identical_poses() {
        let start = Pose::from([2.0, 0.5, FRAC_PI_4]);
        for end in [start, Pose::from([2.0, 0.5, FRAC_PI_4 + 2.0 * PI])] {
            let fit = build_g1_with(&start, &end, &FitOptions::default()).unwrap();
            assert_eq!(fit.clothoid.length(), Length::zero());
            let point = fit.clothoid.evaluate(Length::zero()).unwrap();
            assert_eq!(point.pose, start);
            assert_eq!(point.curvature, Curvature::zero());
        }
    }

    #[test]
    fn same_position_other_heading() {
        let start = Pose::from([1.0, 1.0, 0.0]);
        let end = Pose::from([1.0, 1.0, FRAC_PI_3]);
        let rv = build_g1(&start, &end);
        assert!(matches!(rv, Err(ClothoidError::CoincidentEndpoints { .. })), "{rv:?}");
    }

    #[test]
    fn rejects_bad_input() {
        let good = Pose::from([0.0, 0.0, 0.0]);
        let bad = Pose::from([1.0, Float::NAN, 0.0]);
        assert!(matches!(
            build_g1(&good, &bad),
            Err(ClothoidError::InvalidParameter { parameter: "end pose", .. })
        ));
        assert!(matches!(
            build_g1(&bad, &good),
            Err(ClothoidError::InvalidParameter { parameter: "start pose", .. })
        ));

        let end = Pose::from([1.0, 0.0, 0.0]);
        for options in [
            FitOptions { tolerance: 0.0, ..FitOptions::default() },
            FitOptions { max_iterations: 0, ..FitOptions::default() },
        ] {
            let rv = build_g1_with(&good, &end, &options);
            assert!(matches!(rv, Err(ClothoidError::InvalidParameter { .. })), "{rv:?}");
        }
    }

    #[test]
    fn iteration_budget_is_reported() {
        // a single newton step can't reach this tolerance from the arc or the estimate
        let start = Pose::from([0.0, 0.0, 2.5]);
        let end = Pose::from([1.0, 0.0, 2.5]);
        let options = FitOptions {
            tolerance: 1e-15,
            max_iterations: 1,
        };
        let frame = frame_between(&start, &end);
        assert!(newton(0.0, &frame, &options).is_err());
        assert!(newton(initial_guess(frame.phi0, frame.phi0 + frame.delta), &frame, &options).is_err());
    }

    #[test]
    fn newton_slope_matches_finite_difference() {
        let start = Pose::from([2.0, 0.5, FRAC_PI_4]);
        let end = Pose::from([5.0, 3.0, -FRAC_PI_6]);
        let frame = frame_between(&start, &end);
        // both sides of the series threshold for 2a
        for a in [-3.0, -0.8, 0.0, 0.004, 0.4, 2.5] {
            let (_, slope) = lateral_miss_slope(a, &frame);
            let numeric = vec![a].central_diff(&|p: &std::vec::Vec<f64>| lateral_miss(p[0], &frame));
            assert_abs_diff_eq!(slope, numeric[0], epsilon = 1e-6);
        }
    }

    #[test]
    fn initial_guess_is_close() {
        // the estimate lands near the root for a symmetric s-bend
        let start = Pose::from([0.0, 0.0, 0.5]);
        let end = Pose::from([4.0, 0.0, 0.5]);
        let fit = build_g1_with(&start, &end, &FitOptions::default()).unwrap();
        let frame = frame_between(&start, &end);
        let guess = initial_guess(frame.phi0, frame.phi0 + frame.delta);
        assert!((guess - fit.a).abs() < 0.25, "guess {guess} root {}", fit.a);
        // an s-bend has opposite curvature at its ends
        let kappa_start = fit.clothoid.curvature_at(Length::zero()).get::<radian_per_meter>();
        let kappa_end = fit.clothoid.curvature_at(fit.clothoid.length()).get::<radian_per_meter>();
        assert!(kappa_start * kappa_end < 0.0);
    }

    #[cfg(feature = "std")]
    #[test]
    fn bracketing_near_the_root() {
        let start = Pose::from([2.0, 0.5, FRAC_PI_4]);
        let end = Pose::from([5.0, 3.0, -FRAC_PI_6]);
        let expected = build_g1_with(&start, &end, &FitOptions::default()).unwrap();
        let frame = frame_between(&start, &end);
        let root = bracketed_root(expected.a + 0.1, &frame, &FitOptions::default()).unwrap();
        assert!(root.residual.abs() < 1e-12);
        assert_abs_diff_eq!(root.a, expected.a, epsilon = 1e-9);
    }
}
