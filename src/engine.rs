//! The boundary with the rasterising engine.
//!
//! Decoding map files, matching theme rules, drawing and label placement all happen behind
//! [`RenderEngine`]. This crate decides *which* tile to render with *what* settings, and
//! caches the results; the engine does the cartography.

use std::io;
use std::sync::Arc;

use crate::bitmap::TileBitmap;
use crate::cache::TileCache;
use crate::display::DisplayModel;
use crate::job::RendererJob;
use crate::theme::ThemeSource;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed map data: {0}")]
    Format(String),
}

/// Flags fixed when the database renderer is set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub render_labels: bool,
    pub cache_labels: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            render_labels: true,
            cache_labels: false,
        }
    }
}

pub trait RenderEngine: Send + Sync {
    /// A compiled theme.
    type Theme: Send + Sync;
    type Bitmap: TileBitmap;

    /// Compiles a theme's rules for the given display.
    fn compile_theme(
        &self,
        source: &ThemeSource,
        display_model: &DisplayModel,
    ) -> Result<Self::Theme, EngineError>;

    /// Renders one tile. `Ok(None)` means there was nothing to draw.
    fn render(
        &self,
        job: &RendererJob<'_, Self::Theme>,
        options: RenderOptions,
    ) -> Result<Option<Self::Bitmap>, EngineError>;
}

/// Runs jobs against an engine and files the results in the tile cache.
pub struct DatabaseRenderer<E: RenderEngine> {
    engine: E,
    tile_cache: Arc<TileCache<E::Bitmap>>,
    options: RenderOptions,
}

impl<E: RenderEngine> DatabaseRenderer<E> {
    pub fn new(
        engine: E,
        tile_cache: Arc<TileCache<E::Bitmap>>,
        options: RenderOptions,
    ) -> DatabaseRenderer<E> {
        DatabaseRenderer {
            engine,
            tile_cache,
            options,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Renders a job and caches the bitmap, if one was produced.
    ///
    /// A bitmap that is not `tile_size` pixels square is rejected as malformed and not cached.
    pub fn execute_job(
        &self,
        job: &RendererJob<'_, E::Theme>,
    ) -> Result<Option<Arc<E::Bitmap>>, EngineError> {
        let bitmap = match self.engine.render(job, self.options)? {
            Some(bitmap) => bitmap,
            None => return Ok(None),
        };

        let size = job.tile.tile_size;
        if bitmap.width() != size || bitmap.height() != size {
            return Err(EngineError::Format(format!(
                "engine drew a {}x{} bitmap for a {}px tile",
                bitmap.width(),
                bitmap.height(),
                size
            )));
        }

        let bitmap = Arc::new(bitmap);

        self.tile_cache.put(job.key(), Arc::clone(&bitmap));
        Ok(Some(bitmap))
    }
}
