use crate::display::DisplayModel;
use crate::store::DataStore;
use crate::tile::Tile;

/// Everything an engine needs to render one tile.
#[derive(Debug)]
pub struct RendererJob<'a, T> {
    pub tile: Tile,
    pub data_store: &'a DataStore,
    pub theme: &'a T,
    pub display_model: &'a DisplayModel,
    pub text_scale: f32,
    pub has_alpha: bool,
    pub label_layer: bool,
    theme_id: u64,
}

impl<'a, T> RendererJob<'a, T> {
    /// Creates a job with unit text scale, an opaque background and no separate label layer.
    pub fn new(
        tile: Tile,
        data_store: &'a DataStore,
        theme_id: u64,
        theme: &'a T,
        display_model: &'a DisplayModel,
    ) -> RendererJob<'a, T> {
        RendererJob {
            tile,
            data_store,
            theme,
            display_model,
            text_scale: 1.0,
            has_alpha: false,
            label_layer: false,
            theme_id,
        }
    }

    pub fn with_text_scale(mut self, text_scale: f32) -> Self {
        self.text_scale = text_scale;
        self
    }

    pub fn with_alpha(mut self, has_alpha: bool) -> Self {
        self.has_alpha = has_alpha;
        self
    }

    pub fn with_label_layer(mut self, label_layer: bool) -> Self {
        self.label_layer = label_layer;
        self
    }

    /// The cache key for this job. Jobs with equal keys render identical bitmaps.
    pub fn key(&self) -> JobKey {
        JobKey {
            tile: self.tile,
            data_store_id: self.data_store.id(),
            theme_id: self.theme_id,
            device_scale_bits: self.display_model.device_scale().to_bits(),
            text_scale_bits: self.text_scale.to_bits(),
            has_alpha: self.has_alpha,
            label_layer: self.label_layer,
        }
    }
}

/// Fingerprint of a [`RendererJob`]. Scales are stored as bit patterns so the key can be
/// hashed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub(crate) tile: Tile,
    pub(crate) data_store_id: u64,
    pub(crate) theme_id: u64,
    pub(crate) device_scale_bits: u32,
    pub(crate) text_scale_bits: u32,
    pub(crate) has_alpha: bool,
    pub(crate) label_layer: bool,
}

impl JobKey {
    pub fn tile(&self) -> Tile {
        self.tile
    }
}
