//! Interaction layer for the page builder: hit testing, pointer sampling,
//! and the drag state machine. Everything here reads and drives a
//! [`pb_core::Scene`] — no rendering, no platform event loop.

pub mod drag;
pub mod hit;
pub mod sampler;

pub use drag::{CanvasMetrics, DragController, DragState};
pub use hit::{CanvasSize, GeometryProvider, hit_test};
pub use sampler::{FRAME_INTERVAL, PointerSampler};
