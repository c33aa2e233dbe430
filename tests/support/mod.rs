#![allow(dead_code)]

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tile_renderer::{
    ArgbBitmap, DisplayModel, EngineError, RenderEngine, RenderOptions, RendererJob, ThemeSource,
    Tile,
};

/// Writes a file with a valid map header and an empty body.
pub fn write_map(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).expect("Unable to create the map file.");
    file.write_all(b"mapsforge binary OSM").unwrap();
    file.write_all(&70u32.to_be_bytes()).unwrap();
    file.write_all(&5u32.to_be_bytes()).unwrap();
    file.write_all(&[0u8; 70]).unwrap();
    path
}

/// RGB colour the mock engine paints a tile with. The alpha byte is left clear so tests can
/// see the renderer make opaque tiles opaque.
pub fn tile_color(tile: Tile) -> u32 {
    (tile.x.wrapping_mul(31) ^ tile.y.wrapping_mul(17) ^ u32::from(tile.zoom)) & 0x00FF_FFFF
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Io,
    Format,
}

#[derive(Debug)]
pub struct MockTheme {
    pub name: String,
}

/// An engine that paints each tile a solid colour and counts what it is asked to do.
#[derive(Clone, Default)]
pub struct MockEngine {
    pub compilations: Arc<AtomicUsize>,
    pub renders: Arc<AtomicUsize>,
    pub compile_delay: Duration,
    pub render_delay: Duration,
    /// Draws bitmaps of this edge instead of the display's tile size.
    pub bitmap_size: Option<u32>,
    pub broken_theme: bool,
    pub failure: Option<Failure>,
}

impl MockEngine {
    pub fn new() -> MockEngine {
        MockEngine::default()
    }

    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::SeqCst)
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl RenderEngine for MockEngine {
    type Theme = MockTheme;
    type Bitmap = ArgbBitmap;

    fn compile_theme(
        &self,
        source: &ThemeSource,
        _display_model: &DisplayModel,
    ) -> Result<MockTheme, EngineError> {
        self.compilations.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.compile_delay);

        if self.broken_theme {
            return Err(EngineError::Format(String::from("unexpected end of theme")));
        }

        Ok(MockTheme {
            name: source.to_string(),
        })
    }

    fn render(
        &self,
        job: &RendererJob<'_, MockTheme>,
        options: RenderOptions,
    ) -> Result<Option<ArgbBitmap>, EngineError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.render_delay);
        assert_eq!(RenderOptions::default(), options);

        match self.failure {
            Some(Failure::Io) => {
                return Err(EngineError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "short read in sub-file",
                )))
            }
            Some(Failure::Format) => {
                return Err(EngineError::Format(String::from("invalid way signature")))
            }
            None => {}
        }

        if job.data_store.is_empty() {
            return Ok(None);
        }

        let size = self
            .bitmap_size
            .unwrap_or_else(|| job.display_model.tile_size());
        Ok(Some(ArgbBitmap::filled(size, size, tile_color(job.tile))))
    }
}
