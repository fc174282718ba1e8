//! Page-builder scene core: data model, component registry, scene store.
//!
//! This crate owns *where a node can exist* in the scene tree — not how it
//! renders. The interaction layer (hit testing, drag gestures) lives in
//! `pb-editor` and drives the store through its public operations.

pub mod id;
pub mod model;
pub mod registry;
pub mod scene;

pub use id::NodeId;
pub use model::*;
pub use registry::{Category, ComponentSpec, Registry};
pub use scene::{NodePatch, Scene};
