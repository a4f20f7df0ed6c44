//! Handling the command line interface
//!
//! This module handles the command line parsing and the conversion of the given arguments into an
//! [`OpticsBench`] as well as the textual report printed by the binary.
use crate::{
    bench::OpticsBench,
    elements::{InputBeam, OpticalElement, ThinLens},
    error::{BeamError, BeamResult},
    micrometer, millimeter, nanometer,
    orientation::{Aspect, Orientation},
    propagation::BeamPropagator,
    utils::unit_format::{format_angle, format_length},
};
use clap::Parser;
use std::{fmt::Write, fs, path::Path};
use uom::si::f64::Length;

/// Validated command line arguments.
#[derive(Debug, Clone)]
pub struct Args {
    /// bench built from the arguments or read from a file
    pub bench: OpticsBench,
    /// positions at which the beam should be reported
    pub positions: Vec<Length>,
}

/// Raw command line arguments as parsed by clap.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct PartialArgs {
    /// vacuum wavelength of the beam in nm
    #[arg(short, long, default_value_t = 1064.0)]
    wavelength: f64,

    /// waist radius (1/e²) of the input beam in µm
    #[arg(long, default_value_t = 100.0)]
    waist: f64,

    /// waist position of the input beam in mm
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    waist_position: f64,

    /// thin lens given as <position_mm>:<focal_length_mm> (can be repeated)
    #[arg(short, long, allow_hyphen_values = true)]
    lens: Vec<String>,

    /// position in mm at which the beam is reported (can be repeated)
    #[arg(short, long, allow_hyphen_values = true)]
    at: Vec<f64>,

    /// YAML file describing the bench. Replaces wavelength, waist and lens arguments.
    #[arg(short, long)]
    bench: Option<String>,
}

/// Parse a lens description of the form `<position_mm>:<focal_length_mm>`.
fn parse_lens(input: &str) -> BeamResult<(Length, Length)> {
    let (position, focal_length) = input.split_once(':').ok_or_else(|| {
        BeamError::Console(format!(
            "invalid lens '{input}': expected <position_mm>:<focal_length_mm>"
        ))
    })?;
    let number = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| BeamError::Console(format!("invalid lens '{input}': {e}")))
    };
    Ok((millimeter!(number(position)?), millimeter!(number(focal_length)?)))
}

fn read_bench(path: &Path) -> BeamResult<OpticsBench> {
    let contents = fs::read_to_string(path).map_err(|e| {
        BeamError::Console(format!("cannot read file {} : {}", path.display(), e))
    })?;
    let bench: OpticsBench = serde_yaml::from_str(&contents)
        .map_err(|e| BeamError::Console(format!("parsing of bench failed: {e}")))?;
    bench.check_layout()?;
    Ok(bench)
}

fn build_bench(args: &PartialArgs) -> BeamResult<OpticsBench> {
    let beam = InputBeam::new(micrometer!(args.waist), millimeter!(args.waist_position))?;
    let mut bench = OpticsBench::new(nanometer!(args.wavelength), beam)?;
    for (i, lens) in args.lens.iter().enumerate() {
        let (position, focal_length) = parse_lens(lens)?;
        bench.add_element(OpticalElement::new(
            &format!("L{}", i + 1),
            position,
            ThinLens::new(focal_length)?.into(),
        )?)?;
    }
    Ok(bench)
}

impl TryFrom<PartialArgs> for Args {
    type Error = BeamError;

    fn try_from(part_args: PartialArgs) -> BeamResult<Self> {
        let bench = if let Some(path) = &part_args.bench {
            read_bench(Path::new(path))?
        } else {
            build_bench(&part_args)?
        };
        let positions = part_args.at.iter().map(|p| millimeter!(*p)).collect();
        Ok(Self { bench, positions })
    }
}

/// Textual report of the beam at the requested positions and of the output waist.
///
/// The vertical plane is only reported separately for astigmatic benches.
///
/// # Errors
///
/// This function will return an error if the beam degenerates on its way.
pub fn report(bench: &OpticsBench, positions: &[Length]) -> BeamResult<String> {
    let astigmatic = bench.elements().any(|e| e.aspect() != Aspect::Spherical);
    let orientations: &[Orientation] = if astigmatic {
        &[Orientation::Horizontal, Orientation::Vertical]
    } else {
        &[Orientation::Horizontal]
    };
    let propagator = BeamPropagator::new(bench);
    let mut report = String::new();
    let _ = writeln!(report, "{}", bench.summary());
    for orientation in orientations {
        if astigmatic {
            let _ = writeln!(report, "\n{orientation} plane");
        }
        for position in positions {
            let beam = propagator.propagate(*position, *orientation)?;
            let _ = writeln!(
                report,
                "z = {:>12}: radius {:>12}, curvature {:>12}, Rayleigh range {:>12}, Gouy phase {}",
                format_length(*position),
                format_length(beam.radius()),
                format_length(beam.curvature()),
                format_length(beam.rayleigh_range()),
                format_angle(beam.gouy_phase())
            );
        }
        let output = propagator.output_beam(*orientation)?;
        let _ = writeln!(
            report,
            "output waist {} at {}",
            format_length(output.waist()),
            format_length(output.waist_position())
        );
    }
    Ok(report)
}
