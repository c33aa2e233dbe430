use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bitmap::TileImage;
use crate::cache::TileCache;
use crate::config::RendererConfig;
use crate::display::{self, DisplayModel};
use crate::engine::{DatabaseRenderer, RenderEngine, RenderOptions};
use crate::error::Error;
use crate::job::RendererJob;
use crate::store::{open_data_store, DataStore};
use crate::theme::{ThemeHandle, ThemeSource, ThemeState};
use crate::tile::Tile;

/// Renders raster tiles from a map data store with a render theme.
///
/// A renderer is safe to share between threads. The theme is compiled by whichever render
/// call comes first; concurrent first callers wait for that single compilation.
pub struct TileRenderer<E: RenderEngine> {
    // None once closed
    data_store: RwLock<Option<Arc<DataStore>>>,
    display_model: DisplayModel,
    tile_cache: Arc<TileCache<E::Bitmap>>,
    renderer: DatabaseRenderer<E>,
    theme: ThemeHandle<E::Theme>,
    text_scale: f32,
}

impl<E: RenderEngine> TileRenderer<E> {
    /// Creates a renderer for a `.map` file or a directory of them, using a theme name and a
    /// cache of `cache_capacity` tiles.
    pub fn new(
        engine: E,
        map_path: impl AsRef<Path>,
        theme: &str,
        cache_capacity: usize,
    ) -> Result<TileRenderer<E>, Error> {
        let config =
            RendererConfig::new(map_path.as_ref(), theme).with_cache_capacity(cache_capacity);
        TileRenderer::from_config(engine, &config)
    }

    pub fn from_config(engine: E, config: &RendererConfig) -> Result<TileRenderer<E>, Error> {
        config.validate()?;

        // The theme name is checked before any map file is opened
        let theme = ThemeHandle::new(ThemeSource::parse(&config.theme)?);
        let tile_cache = Arc::new(TileCache::new(config.cache_capacity)?);
        let data_store = open_data_store(&config.map_path)?;

        let display_model = match config.device_scale {
            Some(scale) => DisplayModel::with_device_scale(scale)?,
            None => DisplayModel::new(),
        };

        let renderer =
            DatabaseRenderer::new(engine, Arc::clone(&tile_cache), RenderOptions::default());

        info!(
            message = "created tile renderer",
            sources = data_store.source_count(),
            theme = %theme.source(),
            tile_size = display_model.tile_size()
        );

        Ok(TileRenderer {
            data_store: RwLock::new(Some(Arc::new(data_store))),
            display_model,
            tile_cache,
            renderer,
            theme,
            text_scale: config.text_scale,
        })
    }

    /// Sets the process-wide device scale factor. Renderers created before the call keep the
    /// factor they were created with.
    pub fn set_dpi_scale(scale: f32) -> Result<(), Error> {
        display::set_device_scale_factor(scale)
    }

    /// Renders a tile as row-major ARGB pixels, or `None` if there was nothing to draw.
    pub fn render_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Option<Vec<u32>>, Error> {
        Ok(self
            .render_tile_image(zoom, x, y)?
            .map(TileImage::into_pixels))
    }

    pub fn render_tile_image(&self, zoom: u8, x: u32, y: u32) -> Result<Option<TileImage>, Error> {
        let data_store = self.data_store()?;
        let theme = self.theme.force(|source| {
            self.renderer
                .engine()
                .compile_theme(source, &self.display_model)
        })?;

        let tile = Tile::new(x, y, zoom, self.display_model.tile_size());
        let job = RendererJob::new(
            tile,
            &data_store,
            self.theme.id(),
            theme,
            &self.display_model,
        )
        .with_text_scale(self.text_scale);

        let bitmap = match self.tile_cache.get(&job.key()) {
            Some(bitmap) => {
                debug!(message = "tile cache hit", zoom, x, y);
                bitmap
            }
            None => {
                debug!(message = "tile cache miss", zoom, x, y);
                let bitmap = match self.renderer.execute_job(&job)? {
                    Some(bitmap) => bitmap,
                    None => {
                        debug!(message = "empty tile", zoom, x, y);
                        return Ok(None);
                    }
                };

                // A close that ran during the render has already emptied the cache
                if self.is_closed() {
                    self.tile_cache.clear();
                }
                bitmap
            }
        };

        Ok(Some(TileImage::from_bitmap(&*bitmap, job.has_alpha)))
    }

    /// Releases the map files and empties the cache. Later renders fail with
    /// [`Error::Closed`].
    pub fn close(&self) {
        if self.data_store.write().take().is_some() {
            self.tile_cache.clear();
            info!(message = "closed tile renderer");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.data_store.read().is_none()
    }

    pub fn data_store(&self) -> Result<Arc<DataStore>, Error> {
        self.data_store.read().clone().ok_or(Error::Closed)
    }

    pub fn tile_size(&self) -> u32 {
        self.display_model.tile_size()
    }

    pub fn display_model(&self) -> &DisplayModel {
        &self.display_model
    }

    pub fn theme_state(&self) -> ThemeState {
        self.theme.state()
    }

    pub fn cache(&self) -> &TileCache<E::Bitmap> {
        &self.tile_cache
    }

    pub fn engine(&self) -> &E {
        self.renderer.engine()
    }
}
