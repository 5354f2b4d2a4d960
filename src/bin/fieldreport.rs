use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use fieldtrace::{
    read_trace, FieldAnalysis, FieldTraceError, FieldTraceResult, PipelineConfig, TracePoint,
};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

const CHANNEL_SIZE: usize = 16;

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Summarize field visits from GPS traces.
///
/// Each CSV trace (columns lat, lon, and time in milliseconds) is clustered into field visits and
/// a table with the area, time, and travel to the next field is printed for each one. Every trace
/// is analyzed on its own.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "fieldreport")]
#[clap(author, version, about)]
struct FieldReportOptionsInit {
    /// CSV trace files, or directories to search for them.
    #[clap(required = true)]
    paths: Vec<PathBuf>,

    /// A directory to save a CSV copy of each report in.
    ///
    /// The report for "trace.csv" is saved as "trace_report.csv".
    #[clap(short, long)]
    csv_dir: Option<PathBuf>,

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
struct FieldReportOptionsChecked {
    /// Files and directories to analyze.
    paths: Vec<PathBuf>,

    /// Where to save CSV reports, if anywhere.
    csv_dir: Option<PathBuf>,

    /// Pipeline parameters.
    config: PipelineConfig,

    /// Verbose output
    verbose: bool,
}

impl Display for FieldReportOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        for path in &self.paths {
            writeln!(f, "       Input: {}", path.display())?;
        }
        if let Some(ref csv_dir) = self.csv_dir {
            writeln!(f, "  CSV Output: {}", csv_dir.display())?;
        }
        writeln!(f, "         EPS: {} degrees", self.config.eps_degrees)?;
        writeln!(f, "  Min Points: {}", self.config.min_points)?;
        writeln!(f, "    Min Area: {} gunthas", self.config.min_area_guntha)?;
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> FieldTraceResult<FieldReportOptionsChecked> {
    let FieldReportOptionsInit {
        paths,
        csv_dir,
        eps,
        min_points,
        min_area,
        verbose,
    } = FieldReportOptionsInit::parse();

    let config = PipelineConfig {
        eps_degrees: eps,
        min_points,
        min_area_guntha: min_area,
        ..PipelineConfig::default()
    };
    config.validate()?;

    if let Some(ref csv_dir) = csv_dir {
        if !csv_dir.is_dir() {
            return Err(FieldTraceError {
                msg: "the CSV output directory does not exist",
            }
            .into());
        }
    }

    Ok(FieldReportOptionsChecked {
        paths,
        csv_dir,
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
        .with_module_level("fieldreport", crate_level)
        .init()?;

    if opts.verbose {
        info!("{}", opts);
    }

    let (to_load_thread, from_path_gen) = bounded(CHANNEL_SIZE);
    let (to_analysis, from_load_thread) = bounded(CHANNEL_SIZE);
    let (to_output, from_analysis) = bounded(CHANNEL_SIZE);

    let path_gen = start_path_generation_thread(opts.paths.clone(), to_load_thread)?;
    let load_thread = start_load_thread(from_path_gen, to_analysis)?;
    let anal_threads = start_analysis_threads(from_load_thread, to_output, opts.config)?;

    let mut num_traces = 0;
    let mut num_fields = 0;
    for (path, analysis) in from_analysis {
        num_traces += 1;
        num_fields += analysis.report.rows.len();

        println!("{}", path.display());
        println!("{}", analysis.report);

        if let Some(ref csv_dir) = opts.csv_dir {
            if let Err(err) = save_csv_report(csv_dir, &path, &analysis) {
                log::error!("Error saving report for {}: {}", path.display(), err);
            }
        }
    }

    for jh in [path_gen, load_thread].into_iter().chain(anal_threads) {
        jh.join().map_err(|_| FieldTraceError {
            msg: "worker thread panicked",
        })?;
    }

    info!("Found {} fields in {} traces.", num_fields, num_traces);

    Ok(())
}

fn save_csv_report(
    csv_dir: &Path,
    trace_path: &Path,
    analysis: &FieldAnalysis,
) -> FieldTraceResult<()> {
    let stem = trace_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "trace".to_owned());

    let out_path = csv_dir.join(format!("{}_report.csv", stem));
    let f = BufWriter::new(File::create(&out_path)?);
    analysis.report.write_csv(f)?;

    log::debug!("saved {}", out_path.display());
    Ok(())
}

fn start_path_generation_thread(
    paths: Vec<PathBuf>,
    to_load_thread: Sender<PathBuf>,
) -> FieldTraceResult<JoinHandle<()>> {
    let jh = thread::Builder::new()
        .name("fieldreport-path_gen".to_owned())
        .spawn(move || {
            for path in paths {
                if path.is_file() {
                    if to_load_thread.send(path).is_err() {
                        return;
                    }
                    continue;
                }

                for entry in walkdir::WalkDir::new(&path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|res| res.ok())
                    // Ignore directories, WalkDir will take care of recursing into them.
                    .filter(|entry| entry.path().is_file())
                    // Only consider CSV files.
                    .filter(|entry| {
                        entry
                            .path()
                            .extension()
                            .map(|ext| ext.eq_ignore_ascii_case("csv"))
                            .unwrap_or(false)
                    })
                {
                    log::debug!("Found {}", entry.path().display());
                    if to_load_thread.send(entry.into_path()).is_err() {
                        return;
                    }
                }
            }
        })?;

    Ok(jh)
}

fn start_load_thread(
    from_path_gen: Receiver<PathBuf>,
    to_analysis: Sender<(PathBuf, Vec<TracePoint>)>,
) -> FieldTraceResult<JoinHandle<()>> {
    let jh = thread::Builder::new()
        .name("fieldreport-load".to_owned())
        .spawn(move || {
            for path in from_path_gen {
                let points = match read_trace(&path) {
                    Ok(points) => points,
                    Err(err) => {
                        log::error!("Error reading {}: {}", path.display(), err);
                        continue;
                    }
                };

                if to_analysis.send((path, points)).is_err() {
                    return;
                }
            }
        })?;

    Ok(jh)
}

fn start_analysis_threads(
    from_load_thread: Receiver<(PathBuf, Vec<TracePoint>)>,
    to_output: Sender<(PathBuf, FieldAnalysis)>,
    config: PipelineConfig,
) -> FieldTraceResult<Vec<JoinHandle<()>>> {
    let num_threads = num_cpus::get().max(1);

    let mut handles = Vec::with_capacity(num_threads);
    for i in 0..num_threads {
        let from_load_thread = from_load_thread.clone();
        let to_output = to_output.clone();

        let jh = thread::Builder::new()
            .name(format!("fieldreport-analysis-{}", i))
            .spawn(move || {
                for (path, points) in from_load_thread {
                    let analysis = match FieldAnalysis::analyze(&points, &config) {
                        Ok(analysis) => analysis,
                        Err(err) => {
                            log::error!("Error analyzing {}: {}", path.display(), err);
                            continue;
                        }
                    };

                    if to_output.send((path, analysis)).is_err() {
                        return;
                    }
                }
            })?;

        handles.push(jh);
    }

    Ok(handles)
}
