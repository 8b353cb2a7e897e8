//! Plain-data scene state shared by culling and LOD.
//!
//! Objects live in a [`SceneGraph`] arena and are addressed by [`ObjectId`].
//! Geometry and materials are referenced through [`AssetRef`] ids whose
//! liveness is tracked by an [`AssetRegistry`], so swapping or disposing an
//! asset out of band never leaves an object pointing at freed renderer state.

mod assets;
mod camera;
mod graph;

pub use assets::{AssetKind, AssetRef, AssetRegistry};
pub use camera::Camera;
pub use graph::{BoundingSphere, ObjectId, SceneGraph, SceneObject};
