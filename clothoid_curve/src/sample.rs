use super::*;

use std::vec::Vec;
use uom::si::{time::second, velocity::meter_per_second};

/// One step of an agent driving along a clothoid at constant speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    /// time since the start of the segment
    pub t: Time,
    /// arc length travelled
    pub s: Length,
    pub pose: Pose,
    pub curvature: Curvature,
}

fn positive(parameter: &'static str, value: Float) -> Result<Float, ClothoidError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ClothoidError::InvalidParameter {
            parameter,
            value: value as f64,
        })
    }
}

/// Drive along the clothoid at `speed`, taking a sample every `dt`
///
/// Samples are taken at t = k * dt while speed * t is within the segment,
/// then if that falls short of the end one more sample is clamped to the end
/// (at t = length / speed), so arc length strictly increases and the last sample is the end pose.
pub fn sample_path(
    clothoid: &Clothoid,
    speed: Velocity,
    dt: Time,
) -> Result<Vec<PathSample>, ClothoidError> {
    let v = positive("speed", speed.get::<meter_per_second>())?;
    let step = positive("time step", dt.get::<second>())?;
    positive("arc length step", v * step)?;

    let length = clothoid.length().get::<meter>();
    if !(length >= 0.0 && length.is_finite()) {
        return Err(ClothoidError::InvalidParameter {
            parameter: "segment length",
            value: length as f64,
        });
    }
    let to_sample = |t: Float, s: Float| -> Result<PathSample, ClothoidError> {
        let point = clothoid.evaluate(Length::new::<meter>(s))?;
        Ok(PathSample {
            t: Time::new::<second>(t),
            s: point.s,
            pose: point.pose,
            curvature: point.curvature,
        })
    };

    let mut samples = Vec::new();
    // count steps instead of accumulating t to keep float error from building up
    for k in 0_usize.. {
        let t = k as Float * step;
        let s = v * t;
        if s > length {
            break;
        }
        samples.push(to_sample(t, s)?);
    }

    let last_s = samples.last().map_or(0.0, |sample| sample.s.get::<meter>());
    if last_s < length {
        samples.push(to_sample(length / v, length)?);
    }

    log::debug!(
        "{} samples over {:0.3} m at {v:0.3} m/s every {step:0.3} s",
        samples.len(),
        length
    );
    Ok(samples)
}
