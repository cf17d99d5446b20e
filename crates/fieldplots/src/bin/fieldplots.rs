//! fieldplots CLI: plot grids, coordinate transforms and per-plot traits.

use clap::{Args, Parser, Subcommand, ValueEnum};
use fieldplots::io::config::{AnalysisConfig, GridConfig};
use fieldplots::io::{geojson, geotiff};
use fieldplots::pipeline::{self, Analysis};
use fieldplots::roi;
use fieldplots::zonal::{ColorSpaces, PixelOrder, PixelRounding, PixelTransformer};
use fieldplots::{FieldCorners, GridParams};
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "fieldplots")]
#[command(about = "Build field-trial plot grids and extract per-plot traits from georeferenced rasters")]
#[command(version)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Emit JSON log lines (only with the `tracing` feature).
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Grid parameter overrides; unset flags keep the config (or default) value.
#[derive(Args, Debug, Clone, Default)]
struct GridArgs {
    /// Plot extent along the vertical field direction.
    #[arg(long)]
    range_length: Option<f64>,
    /// Plot extent along the horizontal field direction.
    #[arg(long)]
    column_length: Option<f64>,
    /// Alley between ranges.
    #[arg(long)]
    range_spacing: Option<f64>,
    /// Alley between columns.
    #[arg(long)]
    column_spacing: Option<f64>,
    #[arg(long)]
    ranges: Option<usize>,
    #[arg(long)]
    columns: Option<usize>,
    /// Row strips per plot.
    #[arg(long)]
    rows: Option<usize>,
}

impl GridArgs {
    fn apply(&self, p: &mut GridParams) {
        override_with(&mut p.range_length, self.range_length);
        override_with(&mut p.column_length, self.column_length);
        override_with(&mut p.range_spacing, self.range_spacing);
        override_with(&mut p.column_spacing, self.column_spacing);
        override_with(&mut p.num_ranges, self.ranges);
        override_with(&mut p.num_columns, self.columns);
        override_with(&mut p.num_rows, self.rows);
    }
}

/// Inputs shared by the per-region analyses.
#[derive(Args, Debug, Clone)]
struct AnalysisArgs {
    /// JSON analysis config; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Input GeoTIFF.
    #[arg(long)]
    image: Option<PathBuf>,
    /// GeoJSON regions (plots).
    #[arg(long)]
    regions: Option<PathBuf>,
    /// Binary mask GeoTIFF (coverage and color).
    #[arg(long)]
    mask: Option<PathBuf>,
    /// Observations JSON output.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl AnalysisArgs {
    fn load(&self) -> CliResult<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => AnalysisConfig::load_json(path)?,
            None => AnalysisConfig::default(),
        };
        override_path(&mut cfg.image_path, &self.image);
        override_path(&mut cfg.regions_path, &self.regions);
        override_path(&mut cfg.mask_path, &self.mask);
        override_path(&mut cfg.output_path, &self.out);
        Ok(cfg)
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum RoundingArg {
    #[default]
    Truncate,
    Floor,
    Nearest,
}

impl From<RoundingArg> for PixelRounding {
    fn from(r: RoundingArg) -> Self {
        match r {
            RoundingArg::Truncate => PixelRounding::Truncate,
            RoundingArg::Floor => PixelRounding::Floor,
            RoundingArg::Nearest => PixelRounding::Nearest,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OrderArg {
    #[default]
    ColRow,
    RowCol,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a plot grid from a field corner file.
    Grid {
        /// Corner points in click order: bottom-left, bottom-right, top-right[, top-left].
        #[arg(long)]
        corners: Option<PathBuf>,
        /// Output GeoJSON.
        #[arg(long)]
        out: Option<PathBuf>,
        /// JSON grid config; flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        params: GridArgs,
    },

    /// Generate row cells at each plot anchor point.
    Flexible {
        #[arg(long)]
        corners: Option<PathBuf>,
        /// Plot anchor points.
        #[arg(long)]
        anchors: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        params: GridArgs,
    },

    /// Divide a four-corner field into quads by interpolated grid lines.
    LineGrid {
        /// Four field corners.
        #[arg(long)]
        corners: PathBuf,
        /// Divisions along the first edge.
        #[arg(long)]
        first: usize,
        /// Divisions along the second edge.
        #[arg(long)]
        second: usize,
        #[arg(long)]
        out: PathBuf,
    },

    /// Convert region vertices to pixel indices of a raster.
    ///
    /// Writes JSON to `--out` when given, to stdout otherwise.
    Transform {
        #[command(flatten)]
        inputs: AnalysisArgs,
        /// Defaults to the config value (truncate).
        #[arg(long, value_enum)]
        rounding: Option<RoundingArg>,
    },

    /// Turn pixel clicks (JSON `[[u, v], ...]`) into a GeoJSON point file.
    Points {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        clicks: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        order: OrderArg,
        #[arg(long)]
        out: PathBuf,
    },

    /// Buffer point (or polygon center) regions into circles.
    Circles {
        #[arg(long)]
        regions: PathBuf,
        /// Radius in CRS units.
        #[arg(long)]
        radius: f64,
        #[arg(long, default_value_t = roi::DEFAULT_CIRCLE_SEGMENTS)]
        segments: usize,
        #[arg(long)]
        out: PathBuf,
    },

    /// Canopy coverage per region from a binary mask.
    Coverage {
        #[command(flatten)]
        inputs: AnalysisArgs,
    },

    /// Soil/canopy elevation and plot height from a DSM.
    Height {
        #[command(flatten)]
        inputs: AnalysisArgs,
        /// Soil percentile.
        #[arg(long)]
        lower: Option<f64>,
        /// Canopy percentile.
        #[arg(long)]
        upper: Option<f64>,
        #[arg(long)]
        label: Option<String>,
    },

    /// Summary statistics of a single-band index raster.
    Spectral {
        #[command(flatten)]
        inputs: AnalysisArgs,
        /// Index name used as variable suffix, e.g. `ndvi`.
        #[arg(long)]
        index_name: Option<String>,
    },

    /// Hue and color channel statistics of masked pixels.
    Color {
        #[command(flatten)]
        inputs: AnalysisArgs,
        #[arg(long)]
        bins: Option<usize>,
        /// hsv, rgb, lab or all.
        #[arg(long)]
        colorspaces: Option<ColorSpaces>,
        #[arg(long)]
        label: Option<String>,
    },

    /// Subtract two DSMs on the same grid (`dsm1 - dsm0`).
    Subtract {
        #[arg(long)]
        dsm1: PathBuf,
        #[arg(long)]
        dsm0: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn override_path(slot: &mut Option<PathBuf>, value: &Option<PathBuf>) {
    if value.is_some() {
        slot.clone_from(value);
    }
}

fn init_logging(level: LevelFilter, json: bool) {
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        fieldplots::core::init_tracing(level, json);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if json {
            eprintln!("--json-logs needs the `tracing` feature; using plain logs");
        }
        // A second install in the same process is a no-op.
        let _ = fieldplots::core::init_with_level(level);
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Grid {
            corners,
            out,
            config,
            params,
        } => run_grid(config.as_deref(), corners, None, out, &params),
        Commands::Flexible {
            corners,
            anchors,
            out,
            config,
            params,
        } => {
            if anchors.is_none() && config.is_none() {
                return Err("flexible needs --anchors or a config with anchors_path".into());
            }
            run_grid(config.as_deref(), corners, anchors, out, &params)
        }
        Commands::LineGrid {
            corners,
            first,
            second,
            out,
        } => run_line_grid(&corners, [first, second], &out),
        Commands::Transform { inputs, rounding } => {
            let mut cfg = inputs.load()?;
            override_with(&mut cfg.rounding, rounding.map(PixelRounding::from));
            run_transform(&cfg, inputs.out.is_some())
        }
        Commands::Points {
            image,
            clicks,
            order,
            out,
        } => run_points(&image, &clicks, order, &out),
        Commands::Circles {
            regions,
            radius,
            segments,
            out,
        } => run_circles(&regions, radius, segments, &out),
        Commands::Coverage { inputs } => run_analysis(Analysis::Coverage, inputs.load()?),
        Commands::Height {
            inputs,
            lower,
            upper,
            label,
        } => {
            let mut cfg = inputs.load()?;
            override_with(&mut cfg.height.percentiles[0], lower);
            override_with(&mut cfg.height.percentiles[1], upper);
            if label.is_some() {
                cfg.height.label = label;
            }
            run_analysis(Analysis::Height, cfg)
        }
        Commands::Spectral { inputs, index_name } => {
            let mut cfg = inputs.load()?;
            override_with(&mut cfg.index_name, index_name);
            run_analysis(Analysis::Spectral, cfg)
        }
        Commands::Color {
            inputs,
            bins,
            colorspaces,
            label,
        } => {
            let mut cfg = inputs.load()?;
            override_with(&mut cfg.color.bins, bins);
            override_with(&mut cfg.color.colorspaces, colorspaces);
            if label.is_some() {
                cfg.color.label = label;
            }
            run_analysis(Analysis::Color, cfg)
        }
        Commands::Subtract { dsm1, dsm0, out } => {
            let diff = pipeline::subtract_files(&dsm1, &dsm0, &out)?;
            println!(
                "wrote {}x{} height difference to {}",
                diff.width,
                diff.height,
                out.display()
            );
            Ok(())
        }
    }
}

// ── grid / flexible ────────────────────────────────────────────────────

fn run_grid(
    config: Option<&Path>,
    corners: Option<PathBuf>,
    anchors: Option<PathBuf>,
    out: Option<PathBuf>,
    params: &GridArgs,
) -> CliResult<()> {
    let mut cfg = match config {
        Some(path) => GridConfig::load_json(path)?,
        None => GridConfig::default(),
    };
    override_path(&mut cfg.corners_path, &corners);
    override_path(&mut cfg.anchors_path, &anchors);
    override_path(&mut cfg.output_path, &out);
    params.apply(&mut cfg.grid);

    let cells = pipeline::grid_from_files(&cfg)?;
    println!("wrote {} cells to {}", cells.len(), cfg.output_path().display());
    Ok(())
}

fn run_line_grid(corners: &Path, divisions: [usize; 2], out: &Path) -> CliResult<()> {
    let (points, crs) = geojson::read_points(corners)?;
    if points.len() != 4 {
        return Err(format!("line-grid needs 4 corners, got {}", points.len()).into());
    }
    let quad = FieldCorners::from_click_order(&points)?.quad();
    let lines = fieldplots::grid::field_grid_lines(&quad, divisions)?;
    let shapes = fieldplots::grid::polygons_from_grid_lines(&lines.first, &lines.second)?;
    let crs = crs.as_ref().and_then(geojson::crs_from_member);
    geojson::shapes_to_geojson(out, &shapes, crs.as_ref())?;
    println!("wrote {} polygons to {}", shapes.len(), out.display());
    Ok(())
}

// ── transform / points / circles ───────────────────────────────────────

fn run_transform(cfg: &AnalysisConfig, to_file: bool) -> CliResult<()> {
    let (Some(image), Some(regions)) = (&cfg.image_path, &cfg.regions_path) else {
        return Err("transform needs --image and --regions".into());
    };
    let pixels = pipeline::pixel_coordinates(image, regions, cfg.rounding)?;
    if to_file {
        let out = cfg.output_path();
        pipeline::write_pixel_coordinates(&out, &pixels)?;
        println!("wrote {} regions to {}", pixels.len(), out.display());
    } else {
        println!("{}", serde_json::to_string_pretty(&pixels)?);
    }
    Ok(())
}

fn run_points(image: &Path, clicks: &Path, order: OrderArg, out: &Path) -> CliResult<()> {
    let img = geotiff::read_geotiff(image)?;
    let clicks: Vec<[f64; 2]> = serde_json::from_str(&fs::read_to_string(clicks)?)?;
    let order = match order {
        OrderArg::ColRow => PixelOrder::ColRow,
        OrderArg::RowCol => PixelOrder::RowCol,
    };
    let transformer = PixelTransformer::new(img.transform, PixelRounding::default())?;
    let points = transformer.points_to_geo(&clicks, order);
    geojson::points_to_geojson(out, &points, img.crs.as_ref())?;
    println!("wrote {} points to {}", points.len(), out.display());
    Ok(())
}

fn run_circles(regions: &Path, radius: f64, segments: usize, out: &Path) -> CliResult<()> {
    let layer = geojson::read_vector(regions)?;
    let circles = roi::circle_regions(&layer.regions, radius, segments)?;
    geojson::write_regions(out, &circles, layer.crs.as_ref())?;
    println!("wrote {} circles to {}", circles.len(), out.display());
    Ok(())
}

// ── analyses ───────────────────────────────────────────────────────────

fn run_analysis(kind: Analysis, cfg: AnalysisConfig) -> CliResult<()> {
    let obs = pipeline::analyze(kind, &cfg)?;
    let out = cfg.output_path();
    pipeline::write_observations(&out, &obs)?;
    println!(
        "wrote {} observations for {} samples to {}",
        obs.len(),
        obs.samples().count(),
        out.display()
    );
    Ok(())
}
