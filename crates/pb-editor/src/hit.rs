//! Hit testing: point → node lookup.
//!
//! Walks the tree root-first in child-list order and returns the deepest
//! node containing the point. Geometry comes from two sources: a live
//! `GeometryProvider` when the host has a rendering surface, and a
//! deterministic fallback model otherwise. The fallback keeps the engine
//! correct and testable with no renderer present: free nodes use their
//! stored offsets, flow nodes stack top-to-bottom with per-kind default
//! heights and a fixed inter-node margin.

use pb_core::{Node, NodeId, NodeKind, Rect, Scene, style_keys};
use std::collections::HashMap;

/// Vertical margin between stacked flow siblings in the fallback model.
pub const FLOW_STACK_MARGIN: f32 = 20.0;
/// Width/height used when a node declares no size at all.
pub const DEFAULT_SIZE: f32 = 100.0;
/// Height of a free node whose declared height is `auto`.
pub const FREE_AUTO_HEIGHT: f32 = 200.0;

/// Live geometry source: maps a node id to its rendered bounding box in
/// canvas coordinates. Supplied by the rendering layer; absent entirely in
/// headless use.
pub trait GeometryProvider {
    fn bounds_of(&self, id: NodeId) -> Option<Rect>;
}

impl GeometryProvider for HashMap<NodeId, Rect> {
    fn bounds_of(&self, id: NodeId) -> Option<Rect> {
        self.get(&id).copied()
    }
}

/// Canvas dimensions in canvas space (client size already divided by zoom).
/// Percentage style values resolve against these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

/// Find the deepest node at `(px, py)` in canvas coordinates.
/// Returns `None` when the point hits no root (background).
///
/// Pure function of its inputs: identical scene, provider, and point always
/// resolve to the same id.
pub fn hit_test(
    scene: &Scene,
    canvas: CanvasSize,
    provider: Option<&dyn GeometryProvider>,
    px: f32,
    py: f32,
) -> Option<NodeId> {
    let mut stack_y = 0.0;
    for root in scene.roots() {
        if let Some(hit) = hit_node(scene, canvas, provider, root, (0.0, 0.0), stack_y, px, py) {
            return Some(hit);
        }
        if let Some(node) = scene.get(root)
            && node.layout.is_flow()
        {
            stack_y += estimated_size(node, canvas).1 + FLOW_STACK_MARGIN;
        }
    }
    None
}

#[allow(clippy::too_many_arguments)]
fn hit_node(
    scene: &Scene,
    canvas: CanvasSize,
    provider: Option<&dyn GeometryProvider>,
    id: NodeId,
    origin: (f32, f32),
    stack_y: f32,
    px: f32,
    py: f32,
) -> Option<NodeId> {
    let node = scene.get(id)?;
    let bounds = provider
        .and_then(|p| p.bounds_of(id))
        .unwrap_or_else(|| fallback_bounds(node, canvas, origin, stack_y));

    if !bounds.contains(px, py) {
        return None;
    }

    // Children in list order; the first (deepest) match wins.
    let mut child_stack = 0.0;
    for &child in scene.children(id) {
        if let Some(hit) = hit_node(
            scene,
            canvas,
            provider,
            child,
            (bounds.x, bounds.y),
            child_stack,
            px,
            py,
        ) {
            return Some(hit);
        }
        if let Some(child_node) = scene.get(child)
            && child_node.layout.is_flow()
        {
            child_stack += estimated_size(child_node, canvas).1 + FLOW_STACK_MARGIN;
        }
    }

    Some(id)
}

/// Estimated box for a node with no live measurement.
///
/// Free nodes resolve their stored `left`/`top` (percent against canvas,
/// malformed as 0). Flow nodes sit at their container's origin plus the
/// accumulated stack offset of preceding flow siblings.
pub fn fallback_bounds(node: &Node, canvas: CanvasSize, origin: (f32, f32), stack_y: f32) -> Rect {
    let (width, height) = estimated_size(node, canvas);
    if node.is_free() {
        let left = node.style.px(style_keys::LEFT, canvas.width).unwrap_or(0.0);
        let top = node.style.px(style_keys::TOP, canvas.height).unwrap_or(0.0);
        Rect::new(left, top, width, height)
    } else {
        Rect::new(origin.0, origin.1 + stack_y, width, height)
    }
}

/// Estimated size of a node from its style, with the fallback defaults:
/// missing dimensions are 100, `auto` width is 100, `auto` height is 200
/// for free nodes and kind-dependent for flow nodes (section 300,
/// container 200, everything else 100).
pub fn estimated_size(node: &Node, canvas: CanvasSize) -> (f32, f32) {
    let width = match node.style.get(style_keys::WIDTH) {
        None => DEFAULT_SIZE,
        Some(v) => v.as_px(canvas.width).unwrap_or(DEFAULT_SIZE),
    };
    let auto_height = if node.is_free() {
        FREE_AUTO_HEIGHT
    } else {
        default_flow_height(node.kind)
    };
    let height = match node.style.get(style_keys::HEIGHT) {
        None => DEFAULT_SIZE,
        Some(v) => v.as_px(canvas.height).unwrap_or(auto_height),
    };
    (width, height)
}

/// Default height of a flow node whose declared height is `auto`.
fn default_flow_height(kind: NodeKind) -> f32 {
    match kind {
        NodeKind::Section => 300.0,
        NodeKind::Container => 200.0,
        NodeKind::Flex
        | NodeKind::Grid
        | NodeKind::Div
        | NodeKind::Text
        | NodeKind::Heading
        | NodeKind::Button
        | NodeKind::Input
        | NodeKind::Image => 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pb_core::{NodeKind, Registry, Scene};
    use pretty_assertions::assert_eq;

    const CANVAS: CanvasSize = CanvasSize {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn free_node_hit_uses_stored_offsets() {
        let mut s = Scene::new(Registry::standard());
        let img = s.add_node(NodeKind::Image, 50.0, 50.0, None);

        // Image defaults: 200x150 at (50, 50).
        assert_eq!(hit_test(&s, CANVAS, None, 60.0, 60.0), Some(img));
        assert_eq!(hit_test(&s, CANVAS, None, 250.0, 200.0), Some(img));
        assert_eq!(hit_test(&s, CANVAS, None, 251.0, 60.0), None);
    }

    #[test]
    fn flow_roots_stack_top_to_bottom() {
        let mut s = Scene::new(Registry::standard());
        let a = s.add_node(NodeKind::Section, 0.0, 0.0, None);
        let b = s.add_node(NodeKind::Container, 0.0, 0.0, None);

        // Section: full width, auto height -> 300. Container starts at 320.
        assert_eq!(hit_test(&s, CANVAS, None, 400.0, 150.0), Some(a));
        assert_eq!(hit_test(&s, CANVAS, None, 400.0, 400.0), Some(b));
        // The 20px margin between them hits nothing.
        assert_eq!(hit_test(&s, CANVAS, None, 400.0, 310.0), None);
    }

    #[test]
    fn deepest_descendant_wins() {
        let mut s = Scene::new(Registry::standard());
        let section = s.add_node(NodeKind::Section, 0.0, 0.0, None);
        let div = s.add_node(NodeKind::Div, 0.0, 0.0, Some(section));

        // Div stacks at the section's origin, 100 tall: points inside it
        // resolve to the div, points below it fall back to the section.
        assert_eq!(hit_test(&s, CANVAS, None, 10.0, 50.0), Some(div));
        assert_eq!(hit_test(&s, CANVAS, None, 10.0, 250.0), Some(section));
    }

    #[test]
    fn live_geometry_overrides_fallback() {
        let mut s = Scene::new(Registry::standard());
        let img = s.add_node(NodeKind::Image, 50.0, 50.0, None);

        let mut live: HashMap<NodeId, Rect> = HashMap::new();
        live.insert(img, Rect::new(500.0, 500.0, 50.0, 50.0));

        // The provider moved the node; the stored (50, 50) no longer hits.
        assert_eq!(
            hit_test(&s, CANVAS, Some(&live), 60.0, 60.0),
            None
        );
        assert_eq!(
            hit_test(&s, CANVAS, Some(&live), 520.0, 520.0),
            Some(img)
        );
    }

    #[test]
    fn miss_returns_none() {
        let mut s = Scene::new(Registry::standard());
        s.add_node(NodeKind::Image, 0.0, 0.0, None);
        assert_eq!(hit_test(&s, CANVAS, None, 799.0, 599.0), None);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let mut s = Scene::new(Registry::standard());
        s.add_node(NodeKind::Section, 0.0, 0.0, None);
        s.add_node(NodeKind::Container, 0.0, 0.0, None);
        s.add_node(NodeKind::Image, 100.0, 100.0, None);

        let first = hit_test(&s, CANVAS, None, 120.0, 120.0);
        for _ in 0..10 {
            assert_eq!(hit_test(&s, CANVAS, None, 120.0, 120.0), first);
        }
    }

    #[test]
    fn estimated_size_defaults() {
        let mut s = Scene::new(Registry::standard());
        let section = s.add_node(NodeKind::Section, 0.0, 0.0, None);
        let node = s.get(section).unwrap();
        // width 100% of canvas, height auto -> section default 300.
        assert_eq!(estimated_size(node, CANVAS), (800.0, 300.0));
    }
}
