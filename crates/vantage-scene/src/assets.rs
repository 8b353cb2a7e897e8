//! Opaque asset references and their liveness registry.

use rustc_hash::FxHashMap;
use tracing::debug;

/// Handle to a renderer-side geometry, material or texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetRef(u64);

impl AssetRef {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What an [`AssetRef`] points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Geometry,
    Material,
    Texture,
}

#[derive(Clone, Debug)]
struct AssetEntry {
    kind: AssetKind,
    label: String,
}

/// Tracks which asset refs are still backed by live renderer resources.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    live: FxHashMap<AssetRef, AssetEntry>,
    next_id: u64,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly created asset and return its ref.
    pub fn create(&mut self, kind: AssetKind, label: impl Into<String>) -> AssetRef {
        let asset = AssetRef(self.next_id);
        self.next_id += 1;
        self.live.insert(
            asset,
            AssetEntry {
                kind,
                label: label.into(),
            },
        );
        asset
    }

    /// Mark an asset as disposed. Returns `false` if it was not live.
    pub fn dispose(&mut self, asset: AssetRef) -> bool {
        match self.live.remove(&asset) {
            Some(entry) => {
                debug!(id = asset.0, label = %entry.label, "asset disposed");
                true
            }
            None => false,
        }
    }

    pub fn is_live(&self, asset: AssetRef) -> bool {
        self.live.contains_key(&asset)
    }

    pub fn kind(&self, asset: AssetRef) -> Option<AssetKind> {
        self.live.get(&asset).map(|e| e.kind)
    }

    pub fn label(&self, asset: AssetRef) -> Option<&str> {
        self.live.get(&asset).map(|e| e.label.as_str())
    }

    /// Number of live assets.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
