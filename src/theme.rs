//! Render themes.
//!
//! A theme is named either by one of the engine's built-in identifiers or by the path of an
//! external `.xml` theme file. Compiling it is expensive, so a [`ThemeHandle`] defers the
//! work until the first render and then memoises the outcome, success or failure.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::OnceCell;

use crate::engine::EngineError;
use crate::error::Error;

const EXTERNAL_THEME_SUFFIX: &str = ".xml";

static NEXT_THEME_ID: AtomicU64 = AtomicU64::new(1);

/// The themes bundled with the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTheme {
    Default,
    Osmarender,
    Motorider,
    MotoriderDark,
    Biker,
}

impl BuiltinTheme {
    pub const ALL: [BuiltinTheme; 5] = [
        BuiltinTheme::Default,
        BuiltinTheme::Osmarender,
        BuiltinTheme::Motorider,
        BuiltinTheme::MotoriderDark,
        BuiltinTheme::Biker,
    ];

    /// The upper case identifier the engine knows this theme by.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinTheme::Default => "DEFAULT",
            BuiltinTheme::Osmarender => "OSMARENDER",
            BuiltinTheme::Motorider => "MOTORIDER",
            BuiltinTheme::MotoriderDark => "MOTORIDER_DARK",
            BuiltinTheme::Biker => "BIKER",
        }
    }

    /// Location of the theme's rule file among the engine's bundled assets.
    pub fn resource_path(&self) -> &'static str {
        match self {
            BuiltinTheme::Default => "/assets/mapsforge/default.xml",
            BuiltinTheme::Osmarender => "/assets/mapsforge/osmarender.xml",
            BuiltinTheme::Motorider => "/assets/mapsforge/motorider.xml",
            BuiltinTheme::MotoriderDark => "/assets/mapsforge/motorider-dark.xml",
            BuiltinTheme::Biker => "/assets/mapsforge/biker.xml",
        }
    }
}

impl fmt::Display for BuiltinTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinTheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_uppercase();
        BuiltinTheme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == name)
            .ok_or_else(|| Error::UnknownTheme(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThemeSource {
    Builtin(BuiltinTheme),
    External(PathBuf),
}

impl ThemeSource {
    /// Resolves a theme name. Names ending in `.xml` refer to a theme file, which must exist;
    /// anything else must be a built-in identifier.
    pub fn parse(name: &str) -> Result<ThemeSource, Error> {
        if name.ends_with(EXTERNAL_THEME_SUFFIX) {
            let path = Path::new(name);
            let metadata = std::fs::metadata(path).map_err(|err| Error::io(path, err))?;
            if !metadata.is_file() {
                return Err(Error::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
                ));
            }
            return Ok(ThemeSource::External(path.to_path_buf()));
        }

        name.parse().map(ThemeSource::Builtin)
    }
}

impl fmt::Display for ThemeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeSource::Builtin(theme) => fmt::Display::fmt(theme, f),
            ThemeSource::External(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeState {
    Pending,
    Ready,
    Failed,
}

/// A lazily compiled theme.
///
/// Compilation runs at most once. Callers that arrive while it is running block until it
/// finishes, and a failure is remembered: every later call reports the same error.
pub struct ThemeHandle<T> {
    id: u64,
    source: ThemeSource,
    compiled: OnceCell<Result<T, String>>,
}

impl<T> ThemeHandle<T> {
    pub fn new(source: ThemeSource) -> ThemeHandle<T> {
        ThemeHandle {
            id: NEXT_THEME_ID.fetch_add(1, Ordering::Relaxed),
            source,
            compiled: OnceCell::new(),
        }
    }

    /// Identity of this handle, unique within the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> &ThemeSource {
        &self.source
    }

    pub fn state(&self) -> ThemeState {
        match self.compiled.get() {
            None => ThemeState::Pending,
            Some(Ok(_)) => ThemeState::Ready,
            Some(Err(_)) => ThemeState::Failed,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state() != ThemeState::Pending
    }

    /// Returns the compiled theme, running `compile` first if nobody has yet.
    pub fn force<F>(&self, compile: F) -> Result<&T, Error>
    where
        F: FnOnce(&ThemeSource) -> Result<T, EngineError>,
    {
        let compiled = self.compiled.get_or_init(|| match compile(&self.source) {
            Ok(theme) => {
                info!(message = "compiled render theme", theme = %self.source);
                Ok(theme)
            }
            Err(error) => {
                warn!(message = "render theme failed to compile", theme = %self.source, %error);
                Err(error.to_string())
            }
        });

        match compiled {
            Ok(theme) => Ok(theme),
            Err(message) => Err(Error::ThemeCompilation(message.clone())),
        }
    }
}

impl<T> fmt::Debug for ThemeHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeHandle")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("state", &self.state())
            .finish()
    }
}
