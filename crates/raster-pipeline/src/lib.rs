//! Raster alignment and cleanup pipeline.
//!
//! Operations on [`MaskedRaster`] values, each a pure function returning a
//! new raster:
//!
//! - **Collocation**: resample (and reproject) onto an exact target grid
//! - **Sieving**: absorb connected regions below a pixel count
//! - **Vectorization**: one polygon with holes per region of equal value
//! - **Bit flags**: pack boolean planes into integers and back
//! - **Merging**: mosaic several rasters onto their union grid
//!
//! # Architecture
//!
//! ```text
//! MaskedRaster ──► collocate(target grid) ──► sieve(k, connectivity) ──► vectorize(band)
//!       │                                                                     │
//!       └──► merge([rasters], strategy)                     Vec<PolygonFeature>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use raster_pipeline::{collocate, sieve, vectorize, Connectivity, ResamplingMethod};
//!
//! let aligned = collocate(&landcover, reference.grid(), ResamplingMethod::Mode)?;
//! let cleaned = sieve(&aligned, 10, Connectivity::Eight)?;
//! let polygons = vectorize(&cleaned, 0)?;
//! ```

pub mod bitflag;
pub mod config;
pub mod labeling;
pub mod merge;
pub mod resample;
pub mod sieve;
pub mod vectorize;

// Re-export commonly used types at crate root
pub use bitflag::{
    flags_to_raster, pack, pack_named, raster_to_flags, read_bit, read_bits, unpack,
    unpack_named, FlagPlane,
};
pub use config::PipelineConfig;
pub use labeling::{label_components, Components, Connectivity, UnionFind};
pub use merge::{merge, merge_with, MergeOptions, MergeStrategy};
pub use raster_common::{MaskedRaster, RasterError, RasterResult};
pub use resample::{collocate, collocate_with, ResamplingMethod};
pub use sieve::sieve;
pub use vectorize::{
    nodata_footprint, ring_area, valid_footprint, vectorize, vectorize_values, PolygonFeature,
};
