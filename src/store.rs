//! Map data stores.
//!
//! A renderer reads its features either from a single map file or from every map file in a
//! directory, merged into one store. The binary format itself belongs to the rendering
//! engine; this module only opens the files, checks that they look like map files, and keeps
//! the handles alive for as long as the store exists.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

const MAP_SUFFIX: &str = ".map";
const MAGIC: &[u8; 20] = b"mapsforge binary OSM";
const HEADER_SIZE_MIN: u32 = 70;
const HEADER_SIZE_MAX: u32 = 1_000_000;
const SUPPORTED_VERSIONS: std::ops::RangeInclusive<u32> = 3..=5;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

fn next_store_id() -> u64 {
    NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapFormatError {
    #[error("file is shorter than the map file header")]
    Truncated,
    #[error("missing map file magic bytes")]
    BadMagic,
    #[error("header size {0} is out of range")]
    BadHeaderSize(u32),
    #[error("unsupported map file version {0}")]
    UnsupportedVersion(u32),
}

/// A single map file.
#[derive(Debug)]
pub struct MapFile {
    id: u64,
    path: PathBuf,
    file: File,
    version: u32,
}

impl MapFile {
    /// Opens a map file and validates its header.
    pub fn open(path: impl AsRef<Path>) -> Result<MapFile, Error> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|err| Error::io(path, err))?;
        let version = read_header(&mut file, path)?;

        Ok(MapFile {
            id: next_store_id(),
            path: path.to_path_buf(),
            file,
            version,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The open file handle, for engines that read the file contents.
    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

fn read_header(file: &mut File, path: &Path) -> Result<u32, Error> {
    let format_error = |reason| Error::MapFormat {
        path: path.to_path_buf(),
        reason,
    };

    // magic, remaining header size, file version
    let mut header = [0u8; 28];
    if let Err(err) = file.read_exact(&mut header) {
        return Err(match err.kind() {
            io::ErrorKind::UnexpectedEof => format_error(MapFormatError::Truncated),
            _ => Error::io(path, err),
        });
    }

    if &header[..20] != MAGIC {
        return Err(format_error(MapFormatError::BadMagic));
    }

    let header_size = u32::from_be_bytes([header[20], header[21], header[22], header[23]]);
    if !(HEADER_SIZE_MIN..=HEADER_SIZE_MAX).contains(&header_size) {
        return Err(format_error(MapFormatError::BadHeaderSize(header_size)));
    }

    let version = u32::from_be_bytes([header[24], header[25], header[26], header[27]]);
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(format_error(MapFormatError::UnsupportedVersion(version)));
    }

    Ok(version)
}

/// How a merged store resolves features that appear in more than one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataPolicy {
    /// Only the first source covering a tile contributes.
    ReturnFirst,
    /// Every source contributes, duplicates included.
    ReturnAll,
    /// Every source contributes, identical features are yielded once.
    Deduplicate,
}

#[derive(Debug)]
pub struct MapSource {
    pub map_file: MapFile,
    pub use_start_zoom_level: bool,
    pub use_start_position: bool,
}

/// Several map files merged into one store.
#[derive(Debug)]
pub struct MultiMapDataStore {
    id: u64,
    policy: DataPolicy,
    sources: Vec<MapSource>,
}

impl MultiMapDataStore {
    pub fn new(policy: DataPolicy) -> MultiMapDataStore {
        MultiMapDataStore {
            id: next_store_id(),
            policy,
            sources: Vec::new(),
        }
    }

    /// Appends a source. The flags say whether the map's start zoom level and start
    /// position should seed the merged store's.
    pub fn add_source(
        &mut self,
        map_file: MapFile,
        use_start_zoom_level: bool,
        use_start_position: bool,
    ) {
        self.sources.push(MapSource {
            map_file,
            use_start_zoom_level,
            use_start_position,
        });
    }

    pub fn policy(&self) -> DataPolicy {
        self.policy
    }

    pub fn sources(&self) -> &[MapSource] {
        &self.sources
    }
}

#[derive(Debug)]
pub enum DataStore {
    Single(MapFile),
    Multi(MultiMapDataStore),
}

impl DataStore {
    /// Identity of this store, unique within the process.
    pub fn id(&self) -> u64 {
        match self {
            DataStore::Single(map_file) => map_file.id,
            DataStore::Multi(multi) => multi.id,
        }
    }

    /// The map files backing this store, in source order.
    pub fn map_files(&self) -> Vec<&MapFile> {
        match self {
            DataStore::Single(map_file) => vec![map_file],
            DataStore::Multi(multi) => multi.sources.iter().map(|s| &s.map_file).collect(),
        }
    }

    pub fn source_count(&self) -> usize {
        match self {
            DataStore::Single(_) => 1,
            DataStore::Multi(multi) => multi.sources.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source_count() == 0
    }

    /// The merge policy, if this is a merged store.
    pub fn policy(&self) -> Option<DataPolicy> {
        match self {
            DataStore::Single(_) => None,
            DataStore::Multi(multi) => Some(multi.policy),
        }
    }
}

/// Opens the data store for a path.
///
/// A path ending in `.map` is opened as a single map file. Anything else is treated as a
/// directory, and each `.map` file directly inside it becomes a source of a deduplicating
/// merged store. Subdirectories are not searched.
pub fn open_data_store(path: impl AsRef<Path>) -> Result<DataStore, Error> {
    let path = path.as_ref();

    if has_map_suffix(path.as_os_str()) {
        info!(message = "loading map file", path = %path.display());
        return Ok(DataStore::Single(MapFile::open(path)?));
    }

    let mut multi = MultiMapDataStore::new(DataPolicy::Deduplicate);
    for map_path in list_map_files(path)? {
        info!(message = "loading map file", path = %map_path.display());
        multi.add_source(MapFile::open(&map_path)?, false, false);
    }

    Ok(DataStore::Multi(multi))
}

// read_dir order is filesystem-dependent, so sources are sorted by name
fn list_map_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(dir).map_err(|err| Error::io(dir, err))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::io(dir, err))?;
        if !has_map_suffix(&entry.file_name()) {
            continue;
        }

        let path = entry.path();
        // fs::metadata follows symlinks
        let metadata = fs::metadata(&path).map_err(|err| Error::io(&path, err))?;
        if metadata.is_file() {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

fn has_map_suffix(name: &OsStr) -> bool {
    name.as_encoded_bytes().ends_with(MAP_SUFFIX.as_bytes())
}
