/// Copyright 2024 Lucas Walter
///
/// Fit a clothoid between two poses, drive along it at constant speed and print the samples
///
/// cargo run --release --bin clothoid_sim -- --format gnuplot | gnuplot -persist
use clap::{Parser, ValueEnum};
use clothoid_curve::f64::{
    build_g1_with, curvature_per_meter_float, sample::sample_path, FitOptions, Pose,
};
use clothoid_util::render::{write_gnuplot, write_table};
use std::error::Error;
use std::f64::consts::{FRAC_PI_4, FRAC_PI_6};
use std::io::Write;
use uom::si::{
    curvature::radian_per_meter,
    f64::{Time, Velocity},
    length::meter,
    time::second,
    velocity::meter_per_second,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// t s x y theta kappa columns
    Table,
    /// script with inline data for gnuplot
    Gnuplot,
}

/// Drive a car along a G1 clothoid from a start pose to an end pose
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
    x0: f64,
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    y0: f64,
    /// start heading in radians
    #[arg(long, default_value_t = FRAC_PI_4, allow_negative_numbers = true)]
    theta0: f64,

    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    x1: f64,
    #[arg(long, default_value_t = 3.0, allow_negative_numbers = true)]
    y1: f64,
    /// end heading in radians
    #[arg(long, default_value_t = -FRAC_PI_6, allow_negative_numbers = true)]
    theta1: f64,

    /// meters per second
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// seconds between samples
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Newton iterations per seed
    #[arg(long, default_value_t = 100)]
    max_iterations: usize,

    /// lateral miss tolerance relative to the chord length
    #[arg(long, default_value_t = 1e-12)]
    tolerance: f64,
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let start = Pose::from([args.x0, args.y0, args.theta0]);
    let end = Pose::from([args.x1, args.y1, args.theta1]);
    let options = FitOptions {
        tolerance: args.tolerance,
        max_iterations: args.max_iterations,
    };

    let fit = build_g1_with(&start, &end, &options)?;
    let clothoid = &fit.clothoid;
    log::info!(
        "length {:0.6} m, curvature {:0.6} 1/m, curvature rate {:0.6} 1/m^2, {} iterations{}",
        clothoid.length().get::<meter>(),
        clothoid.curvature().get::<radian_per_meter>(),
        curvature_per_meter_float(clothoid.curvature_rate()),
        fit.iterations,
        if fit.used_fallback { " (bracketed)" } else { "" },
    );

    let samples = sample_path(
        clothoid,
        Velocity::new::<meter_per_second>(args.speed),
        Time::new::<second>(args.dt),
    )?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Table => write_table(&mut out, &samples)?,
        Format::Gnuplot => write_gnuplot(&mut out, &samples, &start, &end)?,
    }
    out.flush()?;
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::debug!("{args:?}");

    if let Err(err) = run(&args) {
        log::error!("{err}");
        eprintln!("clothoid_sim: {err}");
        std::process::exit(1);
    }
}
