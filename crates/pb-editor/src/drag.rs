//! Drag gesture state machine.
//!
//! Turns raw pointer events into scene mutations: dropping a palette item
//! inserts a node under a valid parent (or as a root), releasing a dragged
//! free node repositions it within canvas bounds. The controller never
//! mutates the tree mid-drag — hover and drop-target state update while the
//! pointer moves (rate-limited through the sampler), and the single
//! structural mutation happens on release. Every exit path, including
//! cancellation, lands back in `Idle`.

use crate::hit::{CanvasSize, GeometryProvider, estimated_size, hit_test};
use crate::sampler::PointerSampler;
use log::debug;
use pb_core::{NodeId, NodeKind, NodePatch, Scene, style_keys};
use std::time::Instant;

/// Client-space canvas metrics. Canvas coordinates are client coordinates
/// divided by zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMetrics {
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
}

impl CanvasMetrics {
    pub fn new(width: f32, height: f32, zoom: f32) -> Self {
        Self {
            width,
            height,
            zoom,
        }
    }

    fn safe_zoom(&self) -> f32 {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        }
    }

    /// Canvas-space dimensions.
    pub fn canvas_size(&self) -> CanvasSize {
        let z = self.safe_zoom();
        CanvasSize {
            width: self.width / z,
            height: self.height / z,
        }
    }

    fn to_canvas(&self, client_x: f32, client_y: f32) -> (f32, f32) {
        let z = self.safe_zoom();
        (client_x / z, client_y / z)
    }
}

/// The gesture states. `DraggingNew` carries a palette item not yet in the
/// tree; `DraggingExisting` repositions a free node already in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    DraggingNew {
        kind: NodeKind,
    },
    DraggingExisting {
        id: NodeId,
        /// Client position at gesture start.
        start: (f32, f32),
        /// The node's stored `left`/`top` at gesture start.
        origin: (f32, f32),
        /// Estimated node size, for boundary clamping.
        size: (f32, f32),
    },
}

pub struct DragController {
    state: DragState,
    sampler: PointerSampler,
    canvas: CanvasMetrics,
}

impl DragController {
    pub fn new(canvas: CanvasMetrics) -> Self {
        Self {
            state: DragState::Idle,
            sampler: PointerSampler::default(),
            canvas,
        }
    }

    pub fn with_sampler(canvas: CanvasMetrics, sampler: PointerSampler) -> Self {
        Self {
            state: DragState::Idle,
            sampler,
            canvas,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    /// Update canvas metrics (resize, zoom change). Safe mid-gesture.
    pub fn set_canvas(&mut self, canvas: CanvasMetrics) {
        self.canvas = canvas;
    }

    // ─── Transitions ─────────────────────────────────────────────────────

    /// `idle → dragging-new`: a palette entry started dragging.
    pub fn begin_palette_drag(&mut self, kind: NodeKind) {
        if !self.is_idle() {
            return;
        }
        debug!("drag: palette item {kind:?}");
        self.sampler.reset();
        self.state = DragState::DraggingNew { kind };
    }

    /// `idle → dragging-existing`: pointer-down on a node. Only free nodes
    /// (absolute/fixed) accept this transition; returns whether the drag
    /// started. Selects the node.
    pub fn begin_node_drag(
        &mut self,
        scene: &mut Scene,
        id: NodeId,
        client_x: f32,
        client_y: f32,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        let Some(node) = scene.get(id) else {
            return false;
        };
        if !node.is_free() {
            // Flow nodes are positioned by their container, not the pointer.
            return false;
        }

        let canvas = self.canvas.canvas_size();
        let origin = (
            node.style.px(style_keys::LEFT, canvas.width).unwrap_or(0.0),
            node.style.px(style_keys::TOP, canvas.height).unwrap_or(0.0),
        );
        let size = estimated_size(node, canvas);

        debug!("drag: node {id} from {origin:?}");
        self.sampler.reset();
        self.state = DragState::DraggingExisting {
            id,
            start: (client_x, client_y),
            origin,
            size,
        };
        scene.select_node(Some(id));
        true
    }

    /// Pointer moved while dragging. Rate-limited: positions arriving
    /// faster than the sampling interval coalesce to the most recent one.
    /// Updates hover state, and for palette drags the drop target — the
    /// hit node is a valid target only when it allows the dragged kind.
    pub fn pointer_move(
        &mut self,
        scene: &mut Scene,
        provider: Option<&dyn GeometryProvider>,
        client_x: f32,
        client_y: f32,
        now: Instant,
    ) {
        match self.state {
            DragState::Idle => {}
            DragState::DraggingNew { kind } => {
                if let Some((cx, cy)) = self.sampler.offer(client_x, client_y, now) {
                    self.update_drop_target(scene, provider, kind, cx, cy);
                }
            }
            DragState::DraggingExisting { .. } => {
                if let Some((cx, cy)) = self.sampler.offer(client_x, client_y, now) {
                    let (x, y) = self.canvas.to_canvas(cx, cy);
                    let hit = hit_test(scene, self.canvas.canvas_size(), provider, x, y);
                    scene.hover_node(hit);
                }
            }
        }
    }

    /// Trailing-edge flush: process a coalesced pointer position once the
    /// sampling window has expired. Call from the host's frame tick.
    pub fn flush_pending(
        &mut self,
        scene: &mut Scene,
        provider: Option<&dyn GeometryProvider>,
        now: Instant,
    ) {
        let DragState::DraggingNew { kind } = self.state else {
            return;
        };
        if let Some((cx, cy)) = self.sampler.take_pending(now) {
            self.update_drop_target(scene, provider, kind, cx, cy);
        }
    }

    /// Pointer released: commit the gesture and return to `Idle`.
    ///
    /// A palette drag inserts the new node — under the current drop target
    /// when one is set, as a root otherwise. An existing-node drag applies
    /// the delta from gesture start to the stored position, clamped to the
    /// canvas. Returns the affected node id, if any.
    pub fn pointer_up(
        &mut self,
        scene: &mut Scene,
        client_x: f32,
        client_y: f32,
    ) -> Option<NodeId> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        self.sampler.reset();

        let result = match state {
            DragState::Idle => None,
            DragState::DraggingNew { kind } => {
                let target = scene.drag_target();
                let (x, y) = self.canvas.to_canvas(client_x, client_y);
                debug!("drop: new {kind:?} at ({x}, {y}) target {target:?}");
                Some(scene.add_node(kind, x, y, target))
            }
            DragState::DraggingExisting {
                id,
                start,
                origin,
                size,
            } => {
                let z = self.canvas.safe_zoom();
                let dx = (client_x - start.0) / z;
                let dy = (client_y - start.1) / z;
                let (left, top) = self.clamp_to_canvas(origin.0 + dx, origin.1 + dy, size);
                debug!("drop: move {id} to ({left}, {top})");
                scene.update_node(
                    id,
                    NodePatch::new()
                        .style(style_keys::LEFT, left as f64)
                        .style(style_keys::TOP, top as f64),
                );
                Some(id)
            }
        };

        scene.hover_node(None);
        scene.set_drag_target(None);
        result
    }

    /// Uncontrolled termination (pointer left tracking, focus lost): reach
    /// `Idle` without mutating the tree.
    pub fn cancel(&mut self, scene: &mut Scene) {
        if !self.is_idle() {
            debug!("drag: cancelled");
        }
        self.state = DragState::Idle;
        self.sampler.reset();
        scene.hover_node(None);
        scene.set_drag_target(None);
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn update_drop_target(
        &self,
        scene: &mut Scene,
        provider: Option<&dyn GeometryProvider>,
        kind: NodeKind,
        client_x: f32,
        client_y: f32,
    ) {
        let (x, y) = self.canvas.to_canvas(client_x, client_y);
        let hit = hit_test(scene, self.canvas.canvas_size(), provider, x, y);
        scene.hover_node(hit);

        let valid = hit.filter(|h| {
            scene
                .get(*h)
                .is_some_and(|n| n.constraints.allows_child(kind))
        });
        scene.set_drag_target(valid);
    }

    /// Clamp a free node's position so the node stays inside the canvas:
    /// `left ∈ [0, canvas_width/zoom − width]`, analogously for `top`.
    /// Degenerate cases (node larger than canvas, non-finite input) clamp
    /// to 0.
    fn clamp_to_canvas(&self, left: f32, top: f32, size: (f32, f32)) -> (f32, f32) {
        let canvas = self.canvas.canvas_size();
        let max_left = (canvas.width - size.0).max(0.0);
        let max_top = (canvas.height - size.1).max(0.0);
        let left = if left.is_finite() { left } else { 0.0 };
        let top = if top.is_finite() { top } else { 0.0 };
        (left.clamp(0.0, max_left), top.clamp(0.0, max_top))
    }
}
