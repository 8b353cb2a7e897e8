//! Registry of LOD-tracked objects and the per-frame swap pass.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use vantage_scene::{AssetRegistry, Camera, ObjectId, SceneGraph};

use crate::selector::{LodError, LodLevel, LodSelection, select_level, validate_levels};

/// LOD state for one registered object.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedObject {
    levels: Vec<LodLevel>,
    /// Last selection applied by [`LodManager::update`].
    current: Option<LodSelection>,
}

impl TrackedObject {
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    pub fn current(&self) -> Option<LodSelection> {
        self.current
    }
}

/// Counters from one [`LodManager::update`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LodStats {
    /// Tracked objects evaluated.
    pub evaluated: usize,
    /// Objects whose geometry or material was replaced.
    pub swapped: usize,
    /// Objects hidden for being beyond their last level.
    pub culled: usize,
    /// Objects hidden because the selected level referenced a disposed asset.
    pub stale: usize,
    /// Registrations dropped because the object left the scene.
    pub dropped: usize,
}

/// Swaps geometry/material per tracked object based on camera distance.
pub struct LodManager {
    tracked: FxHashMap<ObjectId, TrackedObject>,
    distance_scale: f32,
    /// Scratch list reused across frames for vanished objects.
    vanished: Vec<ObjectId>,
}

impl LodManager {
    pub fn new() -> Self {
        Self {
            tracked: FxHashMap::default(),
            distance_scale: 1.0,
            vanished: Vec::new(),
        }
    }

    /// Track `object` with `levels`, replacing any previous registration.
    pub fn register(&mut self, object: ObjectId, levels: Vec<LodLevel>) -> Result<(), LodError> {
        validate_levels(&levels)?;
        self.tracked.insert(
            object,
            TrackedObject {
                levels,
                current: None,
            },
        );
        Ok(())
    }

    /// Stop tracking `object`. Returns `false` if it was not registered.
    pub fn unregister(&mut self, object: ObjectId) -> bool {
        self.tracked.remove(&object).is_some()
    }

    pub fn is_tracked(&self, object: ObjectId) -> bool {
        self.tracked.contains_key(&object)
    }

    pub fn tracked(&self, object: ObjectId) -> Option<&TrackedObject> {
        self.tracked.get(&object)
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Multiplier on every threshold. Values above 1 keep detail farther out.
    pub fn set_distance_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.distance_scale = scale;
        } else {
            debug!(scale, "ignoring invalid LOD distance scale");
        }
    }

    pub fn distance_scale(&self) -> f32 {
        self.distance_scale
    }

    /// Pure query: the selection `object` would get at raw `distance`.
    pub fn select_level(&self, object: ObjectId, distance: f32) -> Option<LodSelection> {
        self.tracked
            .get(&object)
            .map(|t| select_level(&t.levels, distance / self.distance_scale))
    }

    /// Run once per frame after the camera transform is final.
    pub fn update(
        &mut self,
        camera: &Camera,
        scene: &mut SceneGraph,
        assets: &AssetRegistry,
    ) -> LodStats {
        let mut stats = LodStats::default();
        self.vanished.clear();

        for (&id, tracked) in &mut self.tracked {
            let Some(object) = scene.get_mut(id) else {
                self.vanished.push(id);
                continue;
            };
            stats.evaluated += 1;

            let distance = camera.distance_to(object.position()) / self.distance_scale;
            let selection = select_level(&tracked.levels, distance);
            tracked.current = Some(selection);

            let level = match selection {
                LodSelection::Culled => {
                    object.visible = false;
                    stats.culled += 1;
                    continue;
                }
                LodSelection::Level(index) => tracked.levels[index],
            };

            if !assets.is_live(level.geometry) || !assets.is_live(level.material) {
                debug!(object = id.raw(), "LOD level references a disposed asset, hiding object");
                object.visible = false;
                stats.stale += 1;
                continue;
            }

            object.visible = true;
            if object.geometry != Some(level.geometry) || object.material != Some(level.material) {
                object.geometry = Some(level.geometry);
                object.material = Some(level.material);
                stats.swapped += 1;
            }
        }

        for id in self.vanished.drain(..) {
            debug!(object = id.raw(), "dropping LOD registration for removed object");
            self.tracked.remove(&id);
            stats.dropped += 1;
        }

        trace!(?stats, "LOD update");
        stats
    }
}

impl Default for LodManager {
    fn default() -> Self {
        Self::new()
    }
}
