//! AR scene content and rendering
//!
//! - [`content`]: the per-item content contract, normalized at ingestion
//! - [`renderer`]: per-frame draw lists for both placement paths
//! - [`orbit`]: virtual camera rig for the simulated path
//! - [`sway`]: post-placement camera drift
//! - [`persistence`]: transform store boundary and background fetch

pub mod content;
pub mod error;
pub mod orbit;
pub mod persistence;
pub mod renderer;
pub mod sway;

pub use content::{
    ContentRecord, Hotspot, HotspotKind, Primitive, PrimaryVisual, SceneContent, Shape,
};
pub use error::{Error, Result};
pub use orbit::{CameraPose, OrbitConfig, OrbitRig};
pub use persistence::{
    FileTransformStore, HotspotEdit, MemoryTransformStore, PendingTransform, PersistenceBridge,
    SavePayload, TransformStore,
};
pub use renderer::{DrawCommand, FrameContext, RenderFrame, RendererOptions, SceneRenderer};
pub use sway::{CameraSway, SwayConfig};
