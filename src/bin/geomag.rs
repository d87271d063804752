use clap::{Parser, Subcommand};
use geomag::field::synthesis::QueryPoint;
use geomag::models::store::{CoefficientStore, ModelFamily};
use geomag::utils::calendar::{parse_timestamp, year_fraction};
use geomag::{geomagnetic_field_with, par_geomagnetic_field, sun_compass_declination};
use itertools::Itertools;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    init_logging();
    if let Err(e) = bin_main() {
        eprintln!("error: {e}");
        if let Some(e) = e.source() {
            eprintln!("error: {e}");
        }
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,geomag=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of <family>.txt coefficient tables, extending or replacing the built-in tables
    #[arg(long, global = true)]
    coefficients: Option<PathBuf>,

    /// Model family for dates before 1900
    #[arg(long, global = true, value_enum)]
    model: Option<ModelFamily>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Declination, inclination and intensity at one point
    Field {
        /// Date as a decimal year
        #[arg(long, allow_negative_numbers = true, required_unless_present = "time")]
        date: Option<f64>,

        /// Date as a YYYY:MM:DD:HH:MM timestamp
        #[arg(long, conflicts_with = "date")]
        time: Option<String>,

        /// Altitude above sea level in km
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        altitude: f64,

        /// Latitude in degrees, negative south
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in degrees east
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,
    },

    /// True-north declination of a sun-compass shadow bearing
    Sun {
        /// Local time of the reading as YYYY:MM:DD:HH:MM
        #[arg()]
        timestamp: String,

        /// Hours the local clock is ahead of UTC
        #[arg(long, allow_negative_numbers = true)]
        utc_offset: f64,

        /// Latitude in degrees, negative south
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in degrees, negative west
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,

        /// Bearing of the target measured from the shadow, in degrees
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        shadow_angle: f64,
    },

    /// Field directions for every `date altitude latitude longitude` line of a file
    Batch {
        /// Whitespace-separated points, one per line; `#` starts a comment line
        #[arg()]
        infile: PathBuf,
    },
}

fn bin_main() -> BinResult<()> {
    let args = Args::parse();

    match args.command {
        Command::Sun {
            timestamp,
            utc_offset,
            latitude,
            longitude,
            shadow_angle,
        } => {
            let declination =
                sun_compass_declination(&timestamp, utc_offset, latitude, longitude, shadow_angle)?;
            println!("{declination:.2}");
        }
        Command::Field {
            date,
            time,
            altitude,
            latitude,
            longitude,
        } => {
            let store = load_store(args.coefficients)?;
            let date = match (date, time) {
                (Some(date), _) => date,
                (None, Some(time)) => year_fraction(&parse_timestamp(&time)?)?,
                (None, None) => Err("one of --date or --time is required")?,
            };
            let point = QueryPoint::new(date, altitude, latitude, longitude);
            let direction = geomagnetic_field_with(&store, &point, args.model)?;
            println!(
                "{:.2} {:.2} {:.1}",
                direction.declination, direction.inclination, direction.intensity
            );
        }
        Command::Batch { infile } => {
            let store = load_store(args.coefficients)?;
            let text = fs::read_to_string(&infile)?;

            let mut points = vec![];
            let mut line_numbers = vec![];
            let mut failures = 0;
            for (i, line) in text.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match parse_point(line) {
                    Ok(point) => {
                        points.push(point);
                        line_numbers.push(i + 1);
                    }
                    Err(e) => {
                        eprintln!("error: line {}: {e}", i + 1);
                        failures += 1;
                    }
                }
            }
            info!(points = points.len(), "evaluating batch");

            let results = par_geomagnetic_field(&store, &points, args.model);
            for ((point, line), result) in points.iter().zip_eq(line_numbers).zip_eq(results) {
                match result {
                    Ok(direction) => println!(
                        "{} {} {} {} {:.2} {:.2} {:.1}",
                        point.date,
                        point.altitude,
                        point.latitude,
                        point.longitude,
                        direction.declination,
                        direction.inclination,
                        direction.intensity
                    ),
                    Err(e) => {
                        eprintln!("error: line {line}: {e}");
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                Err(format!("{failures} line(s) of {} failed", infile.display()))?
            }
        }
    }
    Ok(())
}

fn load_store(dir: Option<PathBuf>) -> BinResult<CoefficientStore> {
    Ok(match dir {
        Some(dir) => CoefficientStore::from_dir(dir)?,
        None => CoefficientStore::embedded()?,
    })
}

fn parse_point(line: &str) -> BinResult<QueryPoint> {
    let values = line
        .split_whitespace()
        .map(|v| v.parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()?;
    match values.as_slice() {
        [date, altitude, latitude, longitude] => {
            Ok(QueryPoint::new(*date, *altitude, *latitude, *longitude))
        }
        _ => Err(format!(
            "expected date, altitude, latitude and longitude, found {} values",
            values.len()
        ))?,
    }
}
