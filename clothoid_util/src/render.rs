use clothoid_curve::f64::{sample::PathSample, Pose};
use std::io::Write;
use uom::si::{angle::radian, curvature::radian_per_meter, length::meter, time::second};

/// column names of `write_table`, in order
pub const TABLE_HEADER: &str = "t s x y theta kappa";

/// One whitespace separated row per sample, after a header line
pub fn write_table<W: Write>(w: &mut W, samples: &[PathSample]) -> std::io::Result<()> {
    writeln!(w, "{TABLE_HEADER}")?;
    for sample in samples {
        let [x, y] = sample.pose.xy.as_array_meter();
        writeln!(
            w,
            "{:.6} {:.6} {x:.6} {y:.6} {:.6} {:.6}",
            sample.t.get::<second>(),
            sample.s.get::<meter>(),
            sample.pose.theta.get::<radian>(),
            sample.curvature.get::<radian_per_meter>(),
        )?;
    }
    Ok(())
}

fn write_block<W: Write>(w: &mut W, points: impl Iterator<Item = [f64; 2]>) -> std::io::Result<()> {
    for [x, y] in points {
        writeln!(w, "{x:.6} {y:.6}")?;
    }
    writeln!(w, "e")
}

/// A gnuplot script drawing the path as a line with the start and end poses as points,
/// the data is inline so it can be piped straight into `gnuplot -persist`
pub fn write_gnuplot<W: Write>(
    w: &mut W,
    samples: &[PathSample],
    start: &Pose,
    end: &Pose,
) -> std::io::Result<()> {
    writeln!(w, "set grid")?;
    writeln!(w, "set size ratio -1")?;
    writeln!(
        w,
        "plot '-' with lines lc 'green' title 'Path', \
         '-' with points pt 7 ps 2 lc 'blue' title 'Start', \
         '-' with points pt 7 ps 2 lc 'red' title 'End'"
    )?;
    write_block(w, samples.iter().map(|sample| sample.pose.xy.as_array_meter()))?;
    write_block(w, core::iter::once(start.xy.as_array_meter()))?;
    write_block(w, core::iter::once(end.xy.as_array_meter()))
}
