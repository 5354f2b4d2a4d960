use clap::Parser;
use fieldtrace::{read_trace, FieldAnalysis, FieldTraceResult, PipelineConfig};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Draw the field visits of a single GPS trace as KML.
///
/// Fields are drawn as polygons with their trace points, everything else is put in a separate
/// folder. The report for the trace is printed to the terminal.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "fieldkml")]
#[clap(author, version, about)]
struct FieldKmlOptionsInit {
    /// The CSV trace file to draw.
    trace_file: PathBuf,

    /// The path of a KML file to produce from this run.
    ///
    /// Defaults to the trace file path with a "kml" extension.
    kml_file: Option<PathBuf>,

    /// Also draw each field outline with extra vertices along every edge.
    #[clap(long)]
    hull_outline: bool,

    /// The clustering radius in degrees.
    #[clap(long)]
    #[clap(env = "FIELDTRACE_EPS")]
    #[clap(default_value_t = 0.000025)]
    eps: f64,

    /// The number of points within the clustering radius (including the point) needed to be a
    /// core point of a cluster.
    #[clap(long)]
    #[clap(env = "FIELDTRACE_MIN_POINTS")]
    #[clap(default_value_t = 11)]
    min_points: usize,

    /// The smallest area in gunthas that will be counted as a field.
    #[clap(long)]
    #[clap(env = "FIELDTRACE_MIN_AREA")]
    #[clap(default_value_t = 5.0)]
    min_area: f64,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct FieldKmlOptionsChecked {
    /// The trace to analyze.
    trace_file: PathBuf,

    /// Where to write the KML.
    kml_file: PathBuf,

    /// Draw the densified outline too.
    hull_outline: bool,

    /// Pipeline parameters.
    config: PipelineConfig,

    /// Verbose output
    verbose: bool,
}

impl Display for FieldKmlOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        writeln!(f, "  Trace File: {}", self.trace_file.display())?;
        writeln!(f, "    KML File: {}", self.kml_file.display())?;
        writeln!(f, "Hull Outline: {}", self.hull_outline)?;
        writeln!(f, "         EPS: {} degrees", self.config.eps_degrees)?;
        writeln!(f, "  Min Points: {}", self.config.min_points)?;
        writeln!(f, "    Min Area: {} gunthas", self.config.min_area_guntha)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> FieldTraceResult<FieldKmlOptionsChecked> {
    let FieldKmlOptionsInit {
        trace_file,
        kml_file,
        hull_outline,
        eps,
        min_points,
        min_area,
        verbose,
    } = FieldKmlOptionsInit::parse();

    let config = PipelineConfig {
        eps_degrees: eps,
        min_points,
        min_area_guntha: min_area,
        ..PipelineConfig::default()
    };
    config.validate()?;

    let kml_file = kml_file.unwrap_or_else(|| trace_file.with_extension("kml"));

    Ok(FieldKmlOptionsChecked {
        trace_file,
        kml_file,
        hull_outline,
        config,
        verbose,
    })
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> FieldTraceResult<()> {
    let opts = parse_args()?;

    let crate_level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .with_module_level("fieldtrace", crate_level)
        .with_module_level("fieldkml", crate_level)
        .init()?;

    if opts.verbose {
        info!("{}", opts);
    }

    let points = read_trace(&opts.trace_file)?;
    let analysis = FieldAnalysis::analyze(&points, &opts.config)?;

    println!("{}", analysis.report);

    analysis.save_kml(&opts.kml_file, opts.hull_outline)?;

    info!(
        "Saved {} fields, {} small clusters, and {} stray points to {}",
        analysis.fields.len(),
        analysis.rejected.len(),
        analysis.noise.len(),
        opts.kml_file.display()
    );

    Ok(())
}
