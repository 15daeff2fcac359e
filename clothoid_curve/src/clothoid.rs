use core::fmt;
use core::ops::Neg;

use serde::{Deserialize, Serialize};

use typenum::{N2, Z0};
use uom::num_traits::Zero;
use uom::si::marker::AngleKind;
use uom::si::{
    angle::radian, area::square_meter, curvature::radian_per_meter, length::meter, Quantity,
    ISQ, SI,
};

use crate::ClothoidError;
use self::fresnel::generalized_fresnel_cs;

/// put angle into the (-pi, pi] range, an exact -pi becomes +pi
pub fn wrap_radian(angle: Float) -> Float {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let two_pi = 2.0 * PI;
    let mut wrapped = (angle + PI) % two_pi;
    if wrapped < 0.0 {
        wrapped += two_pi;
    }
    let wrapped = wrapped - PI;
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

/// put angle into the (-pi, pi] range
pub fn angle_wrap(angle: Angle) -> Angle {
    Angle::new::<radian>(wrap_radian(angle.get::<radian>()))
}

/*
dimension: ISQ<
        N2,     // length
        Z0,     // mass
        Z0,     // time
        Z0,     // electric current
        Z0,     // thermodynamic temperature
        Z0,     // amount of substance
        Z0>;    // luminous intensity
*/
pub type CurvaturePerLength = Quantity<ISQ<N2, Z0, Z0, Z0, Z0, Z0, Z0, dyn AngleKind>, SI<V>, V>;

// TODO(lucasw) need a custom reciprocal_square_meter unit
pub fn curvature_per_meter(val: Float) -> CurvaturePerLength {
    (1.0 / Area::new::<square_meter>(1.0 / val)).into()
}

/// turn CurvaturePerLength into a float
pub fn curvature_per_meter_float(cpl: CurvaturePerLength) -> Float {
    let area: Area = (1.0 / cpl).into();
    1.0 / area.get::<square_meter>()
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: Length,
    pub y: Length,
}

impl Neg for Position {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Position {
    pub fn from_array_meter(p: [Float; 2]) -> Self {
        Position {
            x: Length::new::<meter>(p[0]),
            y: Length::new::<meter>(p[1]),
        }
    }

    pub fn as_array_meter(&self) -> [Float; 2] {
        [self.x.get::<meter>(), self.y.get::<meter>()]
    }
}

/// Position and heading, the heading is kept as given and not wrapped
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub xy: Position,
    pub theta: Angle,
}

impl Pose {
    pub fn new(x: Length, y: Length, theta: Angle) -> Self {
        Self {
            xy: Position { x, y },
            theta,
        }
    }

    /// x and y in meters, theta in radians
    pub fn from_array_meter_radian(p: [Float; 3]) -> Self {
        Self {
            xy: Position::from_array_meter([p[0], p[1]]),
            theta: Angle::new::<radian>(p[2]),
        }
    }

    pub fn as_array_meter_radian(&self) -> [Float; 3] {
        let [x, y] = self.xy.as_array_meter();
        [x, y, self.theta.get::<radian>()]
    }

    pub fn is_finite(&self) -> bool {
        self.as_array_meter_radian().iter().all(|v| v.is_finite())
    }
}

impl From<[Float; 3]> for Pose {
    fn from(p: [Float; 3]) -> Self {
        Self::from_array_meter_radian(p)
    }
}

/// The state of a clothoid at arc length `s` from its start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub s: Length,
    pub pose: Pose,
    pub curvature: Curvature,
}

/// A single clothoid segment (Euler spiral)
///
/// theta(s) = theta0 + kappa0 * s + 1/2 * dk * s^2
/// kappa(s) = kappa0 + dk * s
///
/// for s in [0, length]. Zero `dk` is a circular arc, zero `kappa0` and `dk` a straight line.
#[derive(Clone, PartialEq)]
pub struct Clothoid {
    /// start point xy
    xy0: Position,
    /// start point theta/yaw/heading
    theta0: Angle,
    /// cached cos and sin of theta
    cos_theta0: Float,
    sin_theta0: Float,
    /// start point curvature 1/r
    kappa0: Curvature,
    /// curvature rate, how much curvature changes per unit length
    dk: CurvaturePerLength,
    /// how long the curve is (end kappa will be kappa0 + length * dk)
    length: Length,
}

impl Default for Clothoid {
    fn default() -> Self {
        Self {
            xy0: Position::default(),
            theta0: Angle::zero(),
            cos_theta0: 1.0,
            sin_theta0: 0.0,
            kappa0: Curvature::zero(),
            dk: CurvaturePerLength::zero(),
            length: Length::zero(),
        }
    }
}

impl fmt::Debug for Clothoid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [x0, y0] = self.xy0.as_array_meter();
        let theta0 = self.theta0.get::<radian>();
        let kappa0 = self.kappa0.get::<radian_per_meter>();
        write!(f, "Clothoid: [")?;
        write!(f, "\n\tx: {x0:0.3}, y: {y0:0.3}")?;
        write!(
            f,
            "\n\ttheta0 (initial yaw/heading): {theta0:0.3} radians ({:0.3}°)",
            theta0.to_degrees()
        )?;
        write!(f, "\n\tkappa0 (curvature 1/r): {kappa0:0.3}")?;
        if kappa0 != 0.0 {
            write!(f, " radius: {:.3}", 1.0 / kappa0)?;
        }
        write!(
            f,
            "\n\tdk (curvature rate, curvature per unit length): {:0.6}",
            self.dk_float()
        )?;
        write!(f, "\n\tlength: {:0.3}\n]", self.length.get::<meter>())
    }
}

impl Clothoid {
    pub fn create(
        x0: Length,
        y0: Length,
        theta0: Angle,
        curvature0: Curvature,
        curvature_rate: CurvaturePerLength,
        length: Length,
    ) -> Self {
        Self {
            xy0: Position { x: x0, y: y0 },
            theta0,
            cos_theta0: cos(theta0.get::<radian>()),
            sin_theta0: sin(theta0.get::<radian>()),
            kappa0: curvature0,
            dk: curvature_rate,
            length,
        }
    }

    pub fn from_pose(
        start: &Pose,
        curvature0: Curvature,
        curvature_rate: CurvaturePerLength,
        length: Length,
    ) -> Self {
        Self::create(
            start.xy.x,
            start.xy.y,
            start.theta,
            curvature0,
            curvature_rate,
            length,
        )
    }

    /// a segment that stays on `pose`, every evaluation returns the pose with zero curvature
    pub fn zero_length(pose: &Pose) -> Self {
        Self::from_pose(
            pose,
            Curvature::zero(),
            CurvaturePerLength::zero(),
            Length::zero(),
        )
    }

    pub fn start_pose(&self) -> Pose {
        Pose {
            xy: self.xy0,
            theta: self.theta0,
        }
    }

    pub fn curvature(&self) -> Curvature {
        self.kappa0
    }

    pub fn curvature_rate(&self) -> CurvaturePerLength {
        self.dk
    }

    pub fn length(&self) -> Length {
        self.length
    }

    fn kappa0_float(&self) -> Float {
        self.kappa0.get::<radian_per_meter>()
    }

    fn dk_float(&self) -> Float {
        curvature_per_meter_float(self.dk)
    }

    // s is length along the curve, x and y will be in same units
    // no range check, s outside of [0, length] extrapolates the same spiral
    pub fn get_xy(&self, s: Length) -> Position {
        let s = s.get::<meter>();
        let (f_c, f_s) = generalized_fresnel_cs(self.dk_float() * s * s, self.kappa0_float() * s, 0.0);
        // rotate from the start heading frame
        let dx = s * (f_c * self.cos_theta0 - f_s * self.sin_theta0);
        let dy = s * (f_c * self.sin_theta0 + f_s * self.cos_theta0);
        Position {
            x: self.xy0.x + Length::new::<meter>(dx),
            y: self.xy0.y + Length::new::<meter>(dy),
        }
    }

    /// heading at s, not wrapped so it stays continuous along the curve
    pub fn theta_at(&self, s: Length) -> Angle {
        let s = s.get::<meter>();
        let theta = self.theta0.get::<radian>() + s * (self.kappa0_float() + 0.5 * self.dk_float() * s);
        Angle::new::<radian>(theta)
    }

    /// curvature changes linearly with curvature_rate
    pub fn curvature_at(&self, s: Length) -> Curvature {
        let s = s.get::<meter>();
        Curvature::new::<radian_per_meter>(self.kappa0_float() + self.dk_float() * s)
    }

    fn point_at(&self, s: Length) -> CurvePoint {
        CurvePoint {
            s,
            pose: Pose {
                xy: self.get_xy(s),
                theta: self.theta_at(s),
            },
            curvature: self.curvature_at(s),
        }
    }

    /// position, heading and curvature at arc length s in [0, length]
    pub fn evaluate(&self, s: Length) -> Result<CurvePoint, ClothoidError> {
        let s_meter = s.get::<meter>();
        let length = self.length.get::<meter>();
        // NaN fails the contains check too
        if !(0.0..=length).contains(&s_meter) {
            return Err(ClothoidError::InvalidEvaluationRange {
                s: s_meter as f64,
                length: length as f64,
            });
        }
        Ok(self.point_at(s))
    }

    /// get a new Clothoid at this location along the current one,
    /// covering what is left of the current one
    pub fn get_clothoid(&self, s: Length) -> Self {
        let point = self.point_at(s);
        let remaining = (self.length.get::<meter>() - s.get::<meter>()).max(0.0);
        Self::from_pose(
            &point.pose,
            point.curvature,
            self.dk, // curvature rate is constant through the clothoid segment
            Length::new::<meter>(remaining),
        )
    }

    pub fn get_end_clothoid(&self) -> Self {
        self.get_clothoid(self.length)
    }

    pub fn end_pose(&self) -> Pose {
        self.point_at(self.length).pose
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::format;

    fn tolerance() -> Float {
        10.0 * sqrt(Float::EPSILON)
    }

    fn quarter_circle() -> Clothoid {
        let curvature = Curvature::new::<radian_per_meter>(1.0);
        let length = Length::new::<meter>(FRAC_PI_2);
        Clothoid::create(
            Length::zero(),
            Length::zero(),
            Angle::zero(),
            curvature,
            CurvaturePerLength::zero(),
            length,
        )
    }

    #[test]
    fn wrap() {
        assert_eq!(wrap_radian(0.0), 0.0);
        assert_eq!(wrap_radian(0.5), 0.5);
        assert_eq!(wrap_radian(PI), PI);
        assert_eq!(wrap_radian(-PI), PI);
        assert!((wrap_radian(3.0 * PI + 0.5) - (0.5 - PI)).abs() < tolerance());
        assert!((wrap_radian(2.0 * PI + 0.5) - 0.5).abs() < tolerance());
        assert!((wrap_radian(-4.0) - (2.0 * PI - 4.0)).abs() < tolerance());
        let wrapped = angle_wrap(Angle::new::<radian>(-2.0 * PI - 0.25)).get::<radian>();
        assert!((wrapped + 0.25).abs() < tolerance());
    }

    #[test]
    fn curvature_rate_round_trip() {
        for dk in [0.0, 0.125, -2.5] {
            let back = curvature_per_meter_float(curvature_per_meter(dk));
            assert!((back - dk).abs() < tolerance(), "{dk} -> {back}");
        }
    }

    #[test]
    fn quarter_circle_end() {
        let c0 = quarter_circle();
        let end = c0.end_pose();
        let [x, y] = end.xy.as_array_meter();
        let msg = format!("{c0:?} ends at {end:?}");
        assert!((x - 1.0).abs() < tolerance(), "{}", msg);
        assert!((y - 1.0).abs() < tolerance(), "{}", msg);
        assert!((end.theta.get::<radian>() - FRAC_PI_2).abs() < tolerance(), "{}", msg);

        // every point is on the unit circle around (0, 1)
        for i in 0..=8 {
            let s = Length::new::<meter>(FRAC_PI_2 * i as Float / 8.0);
            let [x, y] = c0.get_xy(s).as_array_meter();
            let radius = sqrt(x * x + (y - 1.0) * (y - 1.0));
            assert!((radius - 1.0).abs() < tolerance(), "s {s:?} radius {radius}");
        }
    }

    #[test]
    fn curvatures() {
        // radius = 2.0
        let curvature = Curvature::new::<radian_per_meter>(0.5);
        let length = Length::new::<meter>(1.0);
        let clothoid0 = Clothoid::create(
            Length::zero(),
            Length::zero(),
            Angle::zero(),
            curvature,
            CurvaturePerLength::zero(),
            length,
        );

        // sample the clothoid at the end
        let clothoid1 = clothoid0.get_end_clothoid();
        // curvature_rate should not change
        assert!(clothoid0.curvature_rate() == clothoid1.curvature_rate());
        assert_eq!(clothoid1.length(), Length::zero());

        // with no curvature rate, output clothoid curvature should always match input
        let msg = format!(
            "{:?} -> {:?} at rate {}",
            clothoid0.curvature(),
            clothoid1.curvature(),
            curvature_per_meter_float(clothoid0.curvature_rate())
        );
        assert!(clothoid0.curvature() == clothoid1.curvature(), "{}", msg);
    }

    #[test]
    fn spiral_heading_and_curvature() {
        let kappa0 = 0.2;
        let dk = -0.3;
        let clothoid = Clothoid::create(
            Length::new::<meter>(1.0),
            Length::new::<meter>(-2.0),
            Angle::new::<radian>(0.3),
            Curvature::new::<radian_per_meter>(kappa0),
            curvature_per_meter(dk),
            Length::new::<meter>(4.0),
        );
        for s in [0.0, 0.5, 1.7, 4.0] {
            let point = clothoid.evaluate(Length::new::<meter>(s)).unwrap();
            let theta = point.pose.theta.get::<radian>();
            let kappa = point.curvature.get::<radian_per_meter>();
            assert!((theta - (0.3 + kappa0 * s + 0.5 * dk * s * s)).abs() < tolerance(), "s {s}");
            assert!((kappa - (kappa0 + dk * s)).abs() < tolerance(), "s {s}");
        }

        // splitting keeps the curve, the remainder ends where the original does
        let rest = clothoid.get_clothoid(Length::new::<meter>(1.5));
        assert!((rest.length().get::<meter>() - 2.5).abs() < tolerance());
        let [x0, y0] = clothoid.end_pose().xy.as_array_meter();
        let [x1, y1] = rest.end_pose().xy.as_array_meter();
        assert!((x0 - x1).abs() < tolerance());
        assert!((y0 - y1).abs() < tolerance());
    }

    #[test]
    fn start_is_exact() {
        let start = Pose::from_array_meter_radian([3.25, -1.5, 7.0]);
        let clothoid = Clothoid::from_pose(
            &start,
            Curvature::new::<radian_per_meter>(-0.4),
            curvature_per_meter(0.05),
            Length::new::<meter>(2.0),
        );
        let point = clothoid.evaluate(Length::zero()).unwrap();
        assert_eq!(point.pose, start);
        assert_eq!(clothoid.start_pose(), start);
    }

    #[test]
    fn evaluation_range() {
        let clothoid = quarter_circle();
        let length = clothoid.length();
        assert!(clothoid.evaluate(Length::zero()).is_ok());
        assert!(clothoid.evaluate(length).is_ok());
        for s in [-0.01, FRAC_PI_2 + 0.01, Float::NAN] {
            let rv = clothoid.evaluate(Length::new::<meter>(s));
            assert!(
                matches!(rv, Err(ClothoidError::InvalidEvaluationRange { .. })),
                "s {s} -> {rv:?}"
            );
        }
    }

    #[test]
    fn zero_length_stays_put() {
        let pose = Pose::from([1.0, 2.0, -0.5]);
        let clothoid = Clothoid::zero_length(&pose);
        let point = clothoid.evaluate(Length::zero()).unwrap();
        assert_eq!(point.pose, pose);
        assert_eq!(point.curvature, Curvature::zero());
        assert_eq!(clothoid.end_pose(), pose);
    }
}
