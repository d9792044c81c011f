//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use projection::CrsTransform;
use raster_common::{CrsCode, DataType, GridModel, MaskedRaster};
use raster_io::{
    read_raster, read_raster_document, write_raster, write_raster_document, write_vector,
    RasterDocument, RasterFormat,
};
use raster_pipeline::{
    collocate, flags_to_raster, merge_with, nodata_footprint, raster_to_flags, sieve,
    valid_footprint, vectorize, vectorize_values, Connectivity, FlagPlane, MergeOptions,
    MergeStrategy, PipelineConfig, ResamplingMethod,
};
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Points sampled per bounds edge when deriving a reprojected grid.
const BOUNDS_DENSIFY: usize = 21;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resample a raster onto another raster's grid, or into a new CRS
    Collocate(CollocateArgs),
    /// Absorb connected regions smaller than a pixel count
    Sieve(SieveArgs),
    /// Write one polygon per region of equal value as GeoJSON
    Vectorize(VectorizeArgs),
    /// Mosaic several rasters onto the union of their extents
    Merge(MergeArgs),
    /// Pack boolean rasters into one integer flag band
    PackFlags(PackFlagsArgs),
    /// Split a flag band into one boolean raster per flag
    UnpackFlags(UnpackFlagsArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Collocate(_) => "collocate",
            Command::Sieve(_) => "sieve",
            Command::Vectorize(_) => "vectorize",
            Command::Merge(_) => "merge",
            Command::PackFlags(_) => "pack-flags",
            Command::UnpackFlags(_) => "unpack-flags",
        }
    }
}

#[derive(Args, Debug)]
pub struct CollocateArgs {
    /// Raster to resample
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output raster (.json or .json.gz)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Raster whose grid is the target
    #[arg(long, conflicts_with = "crs", required_unless_present = "crs")]
    pub reference: Option<PathBuf>,

    /// Target CRS; the grid covers the reprojected input extent
    #[arg(long)]
    pub crs: Option<CrsCode>,

    /// Pixel size in target CRS units (with --crs)
    #[arg(long, requires = "crs")]
    pub resolution: Option<f64>,

    /// Resampling method (nearest, bilinear, cubic, mode)
    #[arg(short, long)]
    pub method: Option<ResamplingMethod>,
}

#[derive(Args, Debug)]
pub struct SieveArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    /// Minimum region size in pixels
    #[arg(long)]
    pub min_pixels: Option<usize>,

    /// Pixel neighbourhood (4 or 8)
    #[arg(long)]
    pub connectivity: Option<Connectivity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Footprint {
    Valid,
    Nodata,
}

#[derive(Args, Debug)]
pub struct VectorizeArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output GeoJSON file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Band to polygonize
    #[arg(short, long, default_value_t = 0)]
    pub band: usize,

    /// Only keep regions with these values
    #[arg(long, value_delimiter = ',', conflicts_with = "footprint")]
    pub values: Vec<f64>,

    /// Polygonize the valid or the masked area instead of band values
    #[arg(long, value_enum)]
    pub footprint: Option<Footprint>,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input rasters, in priority order
    #[arg(short, long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(short, long)]
    pub output: PathBuf,

    /// first-valid, min, max or mean
    #[arg(short, long)]
    pub strategy: Option<MergeStrategy>,

    /// Output CRS, required when the inputs differ
    #[arg(long)]
    pub crs: Option<CrsCode>,

    #[arg(short, long)]
    pub method: Option<ResamplingMethod>,
}

#[derive(Args, Debug)]
pub struct PackFlagsArgs {
    /// Boolean rasters (non-zero is set), one per flag, bit 0 first
    #[arg(short, long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Flag names; defaults to the input file names
    #[arg(long, value_delimiter = ',')]
    pub names: Vec<String>,

    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct UnpackFlagsArgs {
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving one `<name>.json` raster per flag
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// Flag names, bit 0 first; defaults to the names stored in the input
    #[arg(long, value_delimiter = ',')]
    pub names: Vec<String>,
}

/// Run a subcommand.
pub fn run(command: Command, config: &PipelineConfig) -> Result<()> {
    match command {
        Command::Collocate(args) => run_collocate(&args, config),
        Command::Sieve(args) => run_sieve(&args, config),
        Command::Vectorize(args) => run_vectorize(&args),
        Command::Merge(args) => run_merge(&args, config),
        Command::PackFlags(args) => run_pack_flags(&args),
        Command::UnpackFlags(args) => run_unpack_flags(&args),
    }
}

fn load(path: &Path) -> Result<MaskedRaster> {
    read_raster(path).with_context(|| format!("Failed to read raster {:?}", path))
}

fn save(raster: &MaskedRaster, path: &Path) -> Result<()> {
    let format = RasterFormat::from_path(path)?;
    write_raster(raster, path, format).with_context(|| format!("Failed to write raster {:?}", path))
}

/// Grid in `crs` covering the reprojected extent of `source`.
///
/// Without an explicit resolution the pixel count along the finer axis is
/// kept.
fn reprojected_grid(source: &GridModel, crs: CrsCode, resolution: Option<f64>) -> Result<GridModel> {
    let from = source
        .crs
        .context("Input raster has no CRS; use --reference instead of --crs")?;
    let bounds = CrsTransform::new(from, crs).transform_bounds(&source.bounds(), BOUNDS_DENSIFY)?;
    let res = resolution.unwrap_or_else(|| {
        (bounds.width() / source.width as f64).min(bounds.height() / source.height as f64)
    });
    Ok(GridModel::from_bounds(&bounds, res, res, Some(crs))?.with_nodata(source.nodata))
}

fn run_collocate(args: &CollocateArgs, config: &PipelineConfig) -> Result<()> {
    let source = load(&args.input)?;
    let method = args.method.unwrap_or(config.resampling);
    let target = match (&args.reference, args.crs) {
        (Some(reference), _) => load(reference)?.grid().clone(),
        (None, Some(crs)) => reprojected_grid(source.grid(), crs, args.resolution)?,
        (None, None) => bail!("Either --reference or --crs is required"),
    };

    let out = collocate(&source, &target, method)?;
    save(&out, &args.output)?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        method = %method,
        width = target.width,
        height = target.height,
        valid = out.valid_count(),
        "Collocated raster"
    );
    Ok(())
}

fn run_sieve(args: &SieveArgs, config: &PipelineConfig) -> Result<()> {
    let raster = load(&args.input)?;
    let min_pixels = args.min_pixels.unwrap_or(config.sieve_min_pixels);
    let connectivity = args.connectivity.unwrap_or(config.sieve_connectivity);

    let out = sieve(&raster, min_pixels, connectivity)?;
    save(&out, &args.output)?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        min_pixels,
        connectivity = %connectivity,
        masked = raster.valid_count() - out.valid_count(),
        "Sieved raster"
    );
    Ok(())
}

fn run_vectorize(args: &VectorizeArgs) -> Result<()> {
    let raster = load(&args.input)?;
    let features = match args.footprint {
        Some(Footprint::Valid) => valid_footprint(&raster),
        Some(Footprint::Nodata) => nodata_footprint(&raster),
        None if args.values.is_empty() => vectorize(&raster, args.band)?,
        None => vectorize_values(&raster, args.band, &args.values)?,
    };

    write_vector(&features, &args.output, raster.grid().crs)
        .with_context(|| format!("Failed to write GeoJSON {:?}", args.output))?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        features = features.len(),
        "Vectorized raster"
    );
    Ok(())
}

fn run_merge(args: &MergeArgs, config: &PipelineConfig) -> Result<()> {
    let rasters = args
        .inputs
        .iter()
        .map(|p| load(p))
        .collect::<Result<Vec<_>>>()?;
    let options = MergeOptions {
        strategy: args.strategy.unwrap_or(config.merge_strategy),
        crs: args.crs,
        method: args.method.unwrap_or(config.resampling),
    };

    let out = merge_with(&rasters, &options)?;
    save(&out, &args.output)?;
    info!(
        inputs = rasters.len(),
        output = %args.output.display(),
        strategy = %options.strategy,
        width = out.width(),
        height = out.height(),
        "Merged rasters"
    );
    Ok(())
}

/// Flag name from a raster file name, without its extension.
fn flag_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = name.to_lowercase();
    for ext in [RasterFormat::JsonGz.extension(), RasterFormat::Json.extension()] {
        if lower.ends_with(ext) {
            return name[..name.len() - ext.len()].to_string();
        }
    }
    name
}

/// Flag names become file names, so they must be a single plain path component.
fn check_flag_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && !name.contains(['/', '\\'])
        && matches!(
            Path::new(name).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
    if !plain {
        bail!("Invalid flag name {:?}: expected a plain file name", name);
    }
    Ok(())
}

fn run_pack_flags(args: &PackFlagsArgs) -> Result<()> {
    if !args.names.is_empty() && args.names.len() != args.inputs.len() {
        bail!(
            "{} names given for {} inputs",
            args.names.len(),
            args.inputs.len()
        );
    }

    let mut grid: Option<GridModel> = None;
    let mut planes = Vec::with_capacity(args.inputs.len());
    for (i, path) in args.inputs.iter().enumerate() {
        let raster = load(path)?;
        if let Some(g) = &grid {
            if !g.same_footprint(raster.grid()) {
                bail!("{:?} is not on the grid of {:?}", path, args.inputs[0]);
            }
        } else {
            grid = Some(raster.grid().clone().with_nodata(None));
        }
        let band = raster.band(0)?;
        let data: Vec<bool> = (0..band.len())
            .map(|idx| raster.is_valid(idx) && band[idx] != 0.0)
            .collect();
        let name = args.names.get(i).cloned().unwrap_or_else(|| flag_name(path));
        check_flag_name(&name)?;
        planes.push(FlagPlane::new(name, data));
    }
    let grid = grid.context("No input rasters")?;

    let raster = flags_to_raster(&planes, grid)?;
    let names: Vec<String> = planes.iter().map(|p| p.name.clone()).collect();
    let doc = RasterDocument::from_raster(&raster).with_flag_names(names.clone());
    let format = RasterFormat::from_path(&args.output)?;
    write_raster_document(&doc, &args.output, format)
        .with_context(|| format!("Failed to write raster {:?}", args.output))?;
    info!(
        output = %args.output.display(),
        flags = ?names,
        dtype = %raster.dtype(),
        "Packed flags"
    );
    Ok(())
}

fn run_unpack_flags(args: &UnpackFlagsArgs) -> Result<()> {
    let doc = read_raster_document(&args.input)
        .with_context(|| format!("Failed to read raster {:?}", args.input))?;
    let names = if args.names.is_empty() {
        doc.flag_names.clone()
    } else {
        args.names.clone()
    };
    if names.is_empty() {
        bail!("{:?} stores no flag names; pass --names", args.input);
    }
    for name in &names {
        check_flag_name(name)?;
    }

    let raster = doc.to_raster()?;
    let planes = raster_to_flags(&raster, 0, &names)?;
    for plane in &planes {
        let band: Vec<f64> = plane.data.iter().map(|&set| if set { 1.0 } else { 0.0 }).collect();
        let out = MaskedRaster::new(
            vec![band],
            raster.mask().to_vec(),
            raster.grid().clone(),
            DataType::U8,
        )?;
        save(&out, &args.output_dir.join(format!("{}.json", plane.name)))?;
    }
    info!(
        input = %args.input.display(),
        output_dir = %args.output_dir.display(),
        flags = planes.len(),
        "Unpacked flags"
    );
    Ok(())
}
