// this doesn't have to be no_std, but with no-default-features it should be no_std compatible
#![no_std]

#[cfg(feature = "std")]
extern crate std;

use core::include;

pub mod error;

pub use error::ClothoidError;

pub mod f32 {
    use super::*;

    pub type Float = f32;
    use core::f32::consts::{FRAC_2_SQRT_PI, FRAC_PI_2, PI};
    use libm::cosf as cos;
    use libm::floorf as floor;
    use libm::sinf as sin;
    use libm::sqrtf as sqrt;

    use uom::si::f32::{Angle, Area, Curvature, Length, Time, Velocity, V};

    pub mod fresnel {
        include!("fresnel.rs");
    }

    include!("clothoid.rs");

    #[cfg(feature = "std")]
    pub mod sample {
        include!("sample.rs");
    }

    impl Position {
        pub fn to_f64(&self) -> f64::Position {
            f64::Position {
                // TODO(lucasw) it would be nice if uom provided these
                x: uom::si::f64::Length::new::<meter>(self.x.get::<meter>() as f64),
                y: uom::si::f64::Length::new::<meter>(self.y.get::<meter>() as f64),
            }
        }
    }
}

pub mod f64 {
    use super::*;

    pub type Float = f64;
    use core::f64::consts::{FRAC_2_SQRT_PI, FRAC_PI_2, PI};
    use libm::atan2;
    use libm::cos;
    use libm::floor;
    use libm::hypot;
    use libm::sin;
    use libm::sqrt;

    use uom::si::f64::{Angle, Area, Curvature, Length, Time, Velocity, V};

    pub mod fresnel {
        include!("fresnel.rs");
    }

    include!("clothoid.rs");

    #[cfg(feature = "std")]
    pub mod sample {
        include!("sample.rs");
    }

    // the G1 solver needs more precision than f32 can give
    pub mod g1 {
        include!("g1.rs");
    }

    pub use g1::{build_g1, build_g1_with, FitOptions, G1Fit};

    impl Position {
        pub fn to_f32(&self) -> f32::Position {
            f32::Position {
                // TODO(lucasw) it would be nice if uom provided these
                x: uom::si::f32::Length::new::<meter>(self.x.get::<meter>() as f32),
                y: uom::si::f32::Length::new::<meter>(self.y.get::<meter>() as f32),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use uom::si::curvature::radian_per_meter;
    use uom::si::f64::Curvature;
    use uom::si::f64::ReciprocalLength;
    use uom::si::length::meter;
    use uom::si::reciprocal_length::reciprocal_meter;

    #[test]
    fn curvature_vs_reciprocal_length() {
        let c0 = Curvature::new::<radian_per_meter>(0.5);
        let c1: Curvature = ReciprocalLength::new::<reciprocal_meter>(0.5).into();

        // TODO(lucasw) this passes, would need a newtype to prevent it
        assert_eq!(c0, c1);
    }

    #[test]
    fn position_precision_conversion() {
        let p64 = crate::f64::Position::from_array_meter([1.5, -2.25]);
        let p32 = p64.to_f32();
        assert_eq!(p32.as_array_meter(), [1.5, -2.25]);
        assert_eq!(p32.to_f64(), p64);
        assert_eq!((-p64).x.get::<meter>(), -1.5);
    }
}
