//! Durable cart cache.
//!
//! Holds the last known cart line list so a restart resumes the previous
//! cart. Every operation is infallible from the caller's point of view: a
//! missing or corrupt value loads as an empty cart and a storage failure is
//! logged and otherwise ignored, leaving the in-memory cart authoritative.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ecomfront_core::CartLine;
use tracing::{debug, warn};

/// Storage key for the serialized cart lines.
pub const CART_ITEMS_KEY: &str = "cartItems";

/// A persistence slot for the cart line list.
pub trait CartCache: Send + Sync {
    /// Store the full line list, overwriting any previous value.
    fn save(&self, lines: &[CartLine]);

    /// Load the last saved line list, or an empty list.
    fn load(&self) -> Vec<CartLine>;

    /// Delete the stored value.
    fn clear(&self);
}

fn decode(raw: &str) -> Vec<CartLine> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(error = %e, "Discarding unreadable cart cache");
        Vec::new()
    })
}

fn encode(lines: &[CartLine]) -> Option<String> {
    serde_json::to_string(lines)
        .inspect_err(|e| warn!(error = %e, "Failed to serialize cart for cache"))
        .ok()
}

// =============================================================================
// File-backed cache
// =============================================================================

/// Cart cache stored as a JSON file in a directory.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write never leaves a half-written cart behind.
#[derive(Debug, Clone)]
pub struct FileCartCache {
    path: PathBuf,
}

impl FileCartCache {
    /// Create a cache storing `cartItems.json` under `dir`.
    ///
    /// The directory is created lazily on first save.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{CART_ITEMS_KEY}.json")),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)
    }
}

impl CartCache for FileCartCache {
    fn save(&self, lines: &[CartLine]) {
        let Some(contents) = encode(lines) else {
            return;
        };
        match self.write_atomically(&contents) {
            Ok(()) => debug!(path = %self.path.display(), lines = lines.len(), "Cart cache saved"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to save cart cache"),
        }
    }

    fn load(&self) -> Vec<CartLine> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read cart cache");
                Vec::new()
            }
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Cart cache cleared"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to clear cart cache"),
        }
    }
}

// =============================================================================
// In-memory cache
// =============================================================================

/// Cart cache held in memory as serialized JSON.
///
/// Used when no cache directory is configured, and in tests. Values are kept
/// serialized so corrupt data behaves exactly as it does on disk.
#[derive(Debug, Default)]
pub struct MemoryCartCache {
    slot: Mutex<Option<String>>,
}

impl MemoryCartCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the raw stored value.
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw.into());
    }

    /// Whether a value is currently stored.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl CartCache for MemoryCartCache {
    fn save(&self, lines: &[CartLine]) {
        if let Some(contents) = encode(lines) {
            self.set_raw(contents);
        }
    }

    fn load(&self) -> Vec<CartLine> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .map(decode)
            .unwrap_or_default()
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
