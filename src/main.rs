//! Command line driver: convert a PLY point cloud into a BBF or PNG image.
//!
//! Exit codes: 0 on success, 2 for generic errors, 3 for OS-level (I/O)
//! failures, -1 when argument parsing fails.

use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use ply2image::core::{
    extract_points, extract_raster_points, Channel, ConsoleProgress, Grid, RasterChannel, Scaling,
};
use ply2image::io::{write_bbf, write_png, PlyFile};
use ply2image::render::{resolve, scatter_points, scatter_raster_points, RasterFilter};

const LONG_ABOUT: &str = "\
This program converts 3D point clouds in PLY file format to 2D image data in \
BBF or PNG file format.

Two of the PLY properties are interpreted as x and y pixel coordinates for \
the 2D image; a third property is interpreted as the value of this pixel. By \
default, the x, y and z properties of the vertex element are used, which \
corresponds exactly to the conversion of a 3D point cloud into a depth map.

The values of the properties can be scaled, and moved before and after \
scaling. The shift before scaling takes place in the unit of the property, \
the shift after scaling in 2D pixels; both are offered purely as a \
convenience since they are equivalent via the scaling factor.

Since the 3D coordinates are usually not integers, each value is distributed \
among the surrounding four 2D pixels. If neighboring 3D coordinates are \
further than one unit apart this leaves gaps. Most 3D measurement methods \
also acquire 2D neighborhood information; when it is stored in the PLY file \
(by default in the properties raster_x and raster_y, integer values only) it \
is used to interpolate densely between pixels that were adjacent at \
measurement time. If one of these properties is not found, the program \
prints a warning and converts without raster interpolation; it can also be \
switched off explicitly.

The raster information additionally separates foreground and background: a \
minimum or maximum reference value is determined per target pixel and only \
values raster-adjacent to that reference contribute. The default is the \
minimum, which selects the foreground for depth values.

By default the output is BBF: 64-bit floating point values in the native \
byte order, empty pixels encoded as NaN, after a 24 byte header. Saving as \
PNG is lossy: the output is a 16 bit grayscale image with alpha channel, \
values truncated to 0 to 65535 and rounded half up. Fixed point values can \
be emulated via the value scaling, but that information is not stored in \
the image.";

#[derive(Parser, Debug)]
#[command(
    name = "ply2image",
    version,
    about = "Converts 3D point clouds in PLY file format to 2D image data in BBF or PNG file format",
    long_about = LONG_ABOUT
)]
struct Cli {
    /// 3D input file in PLY format
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Width of the output image
    #[arg(short = 'w', long)]
    width: usize,

    /// Height of the output image
    #[arg(long)]
    height: usize,

    /// Name of the output image
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// File format of the output (valid values: "bbf", "png")
    #[arg(long, default_value = "bbf")]
    output_format: String,

    /// The PLY element from which the x image positions are taken
    #[arg(long, default_value = "vertex")]
    x_element: String,

    /// The PLY element from which the y image positions are taken
    #[arg(long, default_value = "vertex")]
    y_element: String,

    /// The PLY element from which the image values are taken
    #[arg(long, default_value = "vertex")]
    value_element: String,

    /// The PLY element from which the x raster positions are taken
    #[arg(long, default_value = "vertex")]
    x_raster_element: String,

    /// The PLY element from which the y raster positions are taken
    #[arg(long, default_value = "vertex")]
    y_raster_element: String,

    /// The PLY element property used as x image position (must not be a list type)
    #[arg(short = 'x', long, default_value = "x")]
    x_property: String,

    /// The PLY element property used as y image position (must not be a list type)
    #[arg(short = 'y', long, default_value = "y")]
    y_property: String,

    /// The PLY element property converted to image values (must not be a list type)
    #[arg(short = 'v', long, default_value = "z")]
    value_property: String,

    /// The PLY element property used as x raster position (must not be a list type)
    #[arg(long, default_value = "raster_x")]
    x_raster_property: String,

    /// The PLY element property used as y raster position (must not be a list type)
    #[arg(long, default_value = "raster_y")]
    y_raster_property: String,

    /// Raster filter (valid values: "min", "max", "none")
    #[arg(long, default_value = "min")]
    raster_filter: String,

    /// Explicitly disable gap interpolation via raster
    #[arg(long)]
    disable_raster: bool,

    /// All x values are multiplied by x-scale
    #[arg(long, default_value_t = 1.0)]
    x_scale: f64,

    /// All y values are multiplied by y-scale
    #[arg(long, default_value_t = 1.0)]
    y_scale: f64,

    /// All pixel values are multiplied by value-scale
    #[arg(long, default_value_t = 1.0)]
    value_scale: f64,

    /// All x values are added with x-pre-scale-offset before scaling
    #[arg(long, default_value_t = 0.0)]
    x_pre_scale_offset: f64,

    /// All y values are added with y-pre-scale-offset before scaling
    #[arg(long, default_value_t = 0.0)]
    y_pre_scale_offset: f64,

    /// All pixel values are added with value-pre-scale-offset before scaling
    #[arg(long, default_value_t = 0.0)]
    value_pre_scale_offset: f64,

    /// All x values are added with x-post-scale-offset after scaling
    #[arg(long, default_value_t = 0.0)]
    x_post_scale_offset: f64,

    /// All y values are added with y-post-scale-offset after scaling
    #[arg(long, default_value_t = 0.0)]
    y_post_scale_offset: f64,

    /// All pixel values are added with value-post-scale-offset after scaling
    #[arg(long, default_value_t = 0.0)]
    value_post_scale_offset: f64,
}

/// Raster selector arguments; when any is given explicitly, a missing
/// raster column is a hard error instead of a downgrade. The ids are clap's
/// derive ids (field names); the names are the user-facing flags.
const RASTER_SELECTOR_ARGS: [(&str, &str); 4] = [
    ("x_raster_element", "--x-raster-element"),
    ("y_raster_element", "--y-raster-element"),
    ("x_raster_property", "--x-raster-property"),
    ("y_raster_property", "--y-raster-property"),
];

/// All raster-related arguments; each conflicts with --disable-raster.
const RASTER_ARGS: [(&str, &str); 5] = [
    ("x_raster_element", "--x-raster-element"),
    ("y_raster_element", "--y-raster-element"),
    ("x_raster_property", "--x-raster-property"),
    ("y_raster_property", "--y-raster-property"),
    ("raster_filter", "--raster-filter"),
];

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct UsageError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Bbf,
    Png,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self, UsageError> {
        match value {
            "bbf" => Ok(OutputFormat::Bbf),
            "png" => Ok(OutputFormat::Png),
            _ => Err(UsageError(format!(
                "invalid file format \"{value}\" (valid values: \"bbf\", \"png\")"
            ))),
        }
    }

    fn name(self) -> &'static str {
        match self {
            OutputFormat::Bbf => "bbf",
            OutputFormat::Png => "png",
        }
    }
}

fn main() {
    let matches = match Cli::command().try_get_matches() {
        Ok(matches) => matches,
        Err(error) => {
            // --help and --version arrive here as "errors" with exit 0.
            let code = if error.use_stderr() { -1 } else { 0 };
            let _ = error.print();
            process::exit(code);
        }
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            process::exit(-1);
        }
    };

    if let Err(error) = run(&cli, &matches) {
        eprintln!("Error: {error}");
        process::exit(if has_io_source(error.as_ref()) { 3 } else { 2 });
    }
}

fn run(cli: &Cli, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let output_format = OutputFormat::parse(&cli.output_format)?;
    check_output_extension(cli, output_format)?;
    let filter: RasterFilter = cli.raster_filter.parse().map_err(UsageError)?;

    if cli.disable_raster {
        if let Some(flag) = first_used_arg(matches, &RASTER_ARGS) {
            return Err(UsageError(format!(
                "You cannot use {flag} together with --disable-raster"
            ))
            .into());
        }
    }
    let explicit_selector = first_used_arg(matches, &RASTER_SELECTOR_ARGS);

    let ply = PlyFile::load(&cli.input)?;

    if ply.has_duplicate_element_names() {
        eprintln!(
            "Warning: PLY file contains duplicate element names, \
             when accessed the first element is used"
        );
    }
    print_structure(&ply);

    let raster_enabled = if cli.disable_raster {
        false
    } else if explicit_selector.is_some() {
        true
    } else if ply.contains_property(&cli.x_raster_element, &cli.x_raster_property)
        && ply.contains_property(&cli.y_raster_element, &cli.y_raster_property)
    {
        true
    } else {
        eprintln!(
            "Warning: Disable raster interpolation because element \"{}\" does not contain \
             the properties \"{}\" and \"{}\". Use --disable-raster to disable this warning.",
            cli.x_raster_element, cli.x_raster_property, cli.y_raster_property
        );
        false
    };

    let x = Channel {
        element: cli.x_element.clone(),
        property: cli.x_property.clone(),
        scaling: Scaling {
            pre_offset: cli.x_pre_scale_offset,
            factor: cli.x_scale,
            post_offset: cli.x_post_scale_offset,
        },
    };
    let y = Channel {
        element: cli.y_element.clone(),
        property: cli.y_property.clone(),
        scaling: Scaling {
            pre_offset: cli.y_pre_scale_offset,
            factor: cli.y_scale,
            post_offset: cli.y_post_scale_offset,
        },
    };
    let v = Channel {
        element: cli.value_element.clone(),
        property: cli.value_property.clone(),
        scaling: Scaling {
            pre_offset: cli.value_pre_scale_offset,
            factor: cli.value_scale,
            post_offset: cli.value_post_scale_offset,
        },
    };

    let mut progress = ConsoleProgress::default();
    let image: Grid<f64> = if raster_enabled {
        let rx = RasterChannel {
            element: cli.x_raster_element.clone(),
            property: cli.x_raster_property.clone(),
        };
        let ry = RasterChannel {
            element: cli.y_raster_element.clone(),
            property: cli.y_raster_property.clone(),
        };
        let points = extract_raster_points(&ply, &x, &y, &v, &rx, &ry)?;
        let accumulator =
            scatter_raster_points(cli.width, cli.height, &points, filter, &mut progress)?;
        resolve(&accumulator)?
    } else {
        let points = extract_points(&ply, &x, &y, &v)?;
        let accumulator = scatter_points(cli.width, cli.height, &points);
        resolve(&accumulator)?
    };

    match output_format {
        OutputFormat::Bbf => write_bbf(&image, &cli.output)?,
        OutputFormat::Png => write_png(&image, &cli.output)?,
    }
    Ok(())
}

/// First of the given flags that was set on the command line, if any.
/// Flags left at their defaults do not count.
fn first_used_arg(
    matches: &ArgMatches,
    args: &[(&'static str, &'static str)],
) -> Option<&'static str> {
    args.iter()
        .find(|(id, _)| matches.value_source(id) == Some(ValueSource::CommandLine))
        .map(|&(_, flag)| flag)
}

/// The output file extension must match the selected format.
fn check_output_extension(cli: &Cli, format: OutputFormat) -> Result<(), UsageError> {
    let extension = cli
        .output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    if extension != format.name() {
        return Err(UsageError(format!(
            "file extension of output file \"{extension}\" is different from \
             specified output format \"{}\"",
            format.name()
        )));
    }
    Ok(())
}

/// List the file structure, so selector mistakes are easy to spot.
fn print_structure(ply: &PlyFile) {
    for (i, element) in ply.elements().iter().enumerate() {
        println!(
            "element {} \"{}\" with {} values",
            i,
            element.name(),
            element.count()
        );
        if element.has_duplicate_property_names() {
            eprintln!(
                "    Warning: Element \"{}\" contains duplicate property names, \
                 when accessed the first property is used",
                element.name()
            );
        }
        for (j, property) in element.properties().iter().enumerate() {
            println!(
                "    property {} \"{}\" with type {}",
                j,
                property.name(),
                property.type_name()
            );
        }
    }
}

/// OS-level failures (exit code 3) are recognized by an `std::io::Error`
/// anywhere in the source chain.
fn has_io_source(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if e.is::<std::io::Error>() {
            return true;
        }
        current = e.source();
    }
    false
}
