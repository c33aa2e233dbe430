//! # Tile Renderer
//!
//! Renders raster map tiles from offline vector map files.
//!
//! ## Current status
//!
//! This crate is a thin layer over a rendering engine. It is stable in terms of behaviour,
//! but not yet in terms of trait and method signatures, and is released as 0.x until the
//! engine interface settles.
//!
//! ## Current features
//!
//! Given a `.map` file (or a directory of them, merged into one deduplicating store) and a
//! render theme, [`TileRenderer`] renders any slippy map tile to a flat buffer of ARGB
//! pixels, or a PNG. Rendered tiles are kept in a bounded in-memory cache, and the theme is
//! compiled once, on first use.
//!
//! ## Known Limitations
//!
//! Drawing is delegated to an implementation of [`RenderEngine`]: this crate decodes no
//! geometry and places no labels itself. Tile coordinates are passed to the engine as given,
//! without checking them against the zoom level.

#![deny(warnings)]

#[macro_use]
extern crate tracing;

pub mod bitmap;
pub mod cache;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod job;
pub mod renderer;
pub mod store;
pub mod theme;
pub mod tile;

pub use bitmap::{extract_pixels, ArgbBitmap, PixelRect, TileBitmap, TileImage};
pub use cache::{CacheStats, TileCache};
pub use config::RendererConfig;
pub use display::{set_device_scale_factor, DisplayModel, DEFAULT_TILE_SIZE, MAX_TILE_SIZE};
pub use engine::{DatabaseRenderer, EngineError, RenderEngine, RenderOptions};
pub use error::{Error, ErrorKind};
pub use job::{JobKey, RendererJob};
pub use renderer::TileRenderer;
pub use store::{open_data_store, DataPolicy, DataStore, MapFile, MultiMapDataStore};
pub use theme::{BuiltinTheme, ThemeHandle, ThemeSource, ThemeState};
pub use tile::{BoundingBox, Tile};

pub type Result<T> = std::result::Result<T, Error>;

/// This is the main trait exported by this crate. It is presently rather barebones,
/// but is open for future expansion if other tile outputs become relevant.
pub trait TileSource {
    /// Edge length of the rendered tiles, in pixels.
    fn tile_size(&self) -> u32;

    /// Renders the raster tile for a slippy map tile in XYZ format, as row-major ARGB pixels.
    /// `None` means the tile is empty.
    fn render_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Option<Vec<u32>>>;
}

impl<E: RenderEngine> TileSource for TileRenderer<E> {
    fn tile_size(&self) -> u32 {
        TileRenderer::tile_size(self)
    }

    fn render_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Option<Vec<u32>>> {
        TileRenderer::render_tile(self, zoom, x, y)
    }
}
