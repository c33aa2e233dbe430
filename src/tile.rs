//! Slippy map tile addressing.
//!
//! Further reading: https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames

use slippy_map_tilenames::tile2lonlat;

/// A tile in the XYZ web mercator scheme, together with its pixel size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
    pub tile_size: u32,
}

/// Geographic extent of a tile, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Tile {
    pub fn new(x: u32, y: u32, zoom: u8, tile_size: u32) -> Tile {
        Tile {
            x,
            y,
            zoom,
            tile_size,
        }
    }

    /// Number of tiles along each axis at this tile's zoom level.
    pub fn tiles_per_axis(&self) -> u64 {
        1u64 << self.zoom.min(63)
    }

    /// Whether x and y fall inside the grid for this zoom level.
    pub fn is_valid(&self) -> bool {
        let n = self.tiles_per_axis();
        u64::from(self.x) < n && u64::from(self.y) < n
    }

    /// The geographic bounds of this tile. Rendering engines use this to query
    /// the data store for the features they need.
    pub fn bounding_box(&self) -> BoundingBox {
        // tile2lonlat gives the north-west corner of a tile
        let (west, north) = tile2lonlat(self.x, self.y, self.zoom);
        let (east, south) = tile2lonlat(
            self.x.saturating_add(1),
            self.y.saturating_add(1),
            self.zoom,
        );

        BoundingBox {
            west,
            south,
            east,
            north,
        }
    }
}
