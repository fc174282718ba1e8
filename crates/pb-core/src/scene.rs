//! The scene store: single source of truth for the node tree and the
//! editor's selection state.
//!
//! A `Scene` is an explicit owned object — one per editor session — passed
//! by reference into the hit-test engine and drag controller. All mutations
//! go through the operations here; they run synchronously on the caller's
//! thread and either succeed or degrade to a no-op (missing ids, forbidden
//! constraints). Every mutation bumps `revision`, the key the rendering
//! layer subscribes on.

use crate::id::NodeId;
use crate::model::{Constraints, Layout, Meta, Node, NodeKind, PositionMode, StyleValue, style_keys};
use crate::registry::Registry;
use indexmap::IndexMap;
use log::{debug, trace};
use smallvec::SmallVec;
use std::collections::HashSet;

/// Offset applied to a duplicated node's stored position.
const DUPLICATE_OFFSET: f32 = 20.0;
/// Bottom margin applied when a node is reconciled into a flow parent.
const FLOW_CHILD_MARGIN: &str = "10px";

/// A partial update for `Scene::update_node`: only the fields present are
/// merged into the node. Style entries merge key-by-key (`None` removes).
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    name: Option<String>,
    layout: Option<Layout>,
    style: Vec<(String, Option<StyleValue>)>,
    text: Option<String>,
    html: Option<String>,
    src: Option<String>,
    constraints: Option<Constraints>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Set one style property.
    pub fn style(mut self, key: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.style.push((key.into(), Some(value.into())));
        self
    }

    /// Remove one style property.
    pub fn clear_style(mut self, key: impl Into<String>) -> Self {
        self.style.push((key.into(), None));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// The scene: node tree, selection/hover state, canvas view settings.
#[derive(Debug)]
pub struct Scene {
    registry: Registry,
    /// Node table in insertion order. Order matters: it fixes root ordering
    /// for flow stacking and hit-test traversal.
    nodes: IndexMap<NodeId, Node>,
    selected: Option<NodeId>,
    hovered: Option<NodeId>,
    drag_target: Option<NodeId>,
    zoom: f32,
    grid_visible: bool,
    guides_visible: bool,
    /// Bumped on every mutation; change-notification key for subscribers.
    revision: u64,
}

impl Scene {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            nodes: IndexMap::new(),
            selected: None,
            hovered: None,
            drag_target: None,
            zoom: 1.0,
            grid_visible: true,
            guides_visible: true,
            revision: 0,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Root nodes: nodes not present in any other node's child list, in
    /// insertion order.
    pub fn roots(&self) -> Vec<NodeId> {
        let mut referenced: HashSet<NodeId> = HashSet::new();
        for node in self.nodes.values() {
            referenced.extend(node.content.children.iter().copied());
        }
        self.nodes
            .keys()
            .copied()
            .filter(|id| !referenced.contains(id))
            .collect()
    }

    /// Ordered children of a node; empty when the id is unknown.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.content.children.as_slice())
            .unwrap_or(&[])
    }

    /// The parent holding `id` in its child list, if any.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|n| n.content.children.contains(&id))
            .map(|n| n.id)
    }

    /// Walk the parent chain of `descendant` looking for `ancestor`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = descendant;
        while let Some(parent) = self.parent_of(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn drag_target(&self) -> Option<NodeId> {
        self.drag_target
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    pub fn guides_visible(&self) -> bool {
        self.guides_visible
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ─── Tree mutations ──────────────────────────────────────────────────

    /// Create a node of `kind` at canvas position `(x, y)`.
    ///
    /// When `parent` names an existing node whose constraints allow `kind`,
    /// the node is appended to that parent's child list; a flow-layout
    /// parent additionally reconciles the child into flow mode (coordinates
    /// stripped, width set to fill, standard bottom margin). When no parent
    /// qualifies the node becomes a root: free kinds keep `(x, y)` as
    /// explicit coordinates, flow kinds enter the document flow.
    ///
    /// The new node is selected. Returns its id.
    pub fn add_node(&mut self, kind: NodeKind, x: f32, y: f32, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::fresh();
        let name = format!("{}-{}", kind.label(), self.nodes.len());
        let mut node = Node::new(id, kind, name);

        if let Some(spec) = self.registry.get(kind) {
            node.layout = spec.default_layout.clone();
            node.style = spec.default_style.clone();
            node.content = spec.default_content.clone();
            node.constraints = spec.default_constraints.clone();
        }

        // Only free nodes carry explicit coordinates.
        if node.is_free() {
            node.style.set(style_keys::LEFT, x as f64);
            node.style.set(style_keys::TOP, y as f64);
        } else {
            node.style.remove(style_keys::LEFT);
            node.style.remove(style_keys::TOP);
        }

        let resolved_parent = parent.filter(|pid| {
            self.nodes
                .get(pid)
                .is_some_and(|p| p.constraints.allows_child(kind))
        });
        if parent.is_some() && resolved_parent.is_none() {
            debug!(
                "add_node: parent {:?} missing or does not allow {kind:?}; placing as root",
                parent
            );
        }

        if let Some(pid) = resolved_parent {
            let parent_is_flow = self
                .nodes
                .get(&pid)
                .is_some_and(|p| p.layout.is_flow());
            if parent_is_flow {
                // Reconcile into flow mode. Runs once, at insertion.
                node.style.remove(style_keys::LEFT);
                node.style.remove(style_keys::TOP);
                node.layout.position = PositionMode::Relative;
                node.style.set(style_keys::WIDTH, "100%");
                node.style.set(style_keys::MARGIN_BOTTOM, FLOW_CHILD_MARGIN);
            }
            if let Some(parent_node) = self.nodes.get_mut(&pid) {
                parent_node.content.children.push(id);
                parent_node.meta.touch();
            }
        }

        debug!("add_node: {kind:?} as {id} (parent {resolved_parent:?})");
        self.nodes.insert(id, node);
        self.selected = Some(id);
        self.bump();
        id
    }

    /// Merge `patch` into the node, bump its version and `updated_at`.
    /// Silently ignored when `id` does not exist.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };

        if let Some(name) = patch.name {
            node.name = name;
        }
        if let Some(layout) = patch.layout {
            node.layout = layout;
        }
        for (key, value) in patch.style {
            match value {
                Some(v) => node.style.set(key, v),
                None => {
                    node.style.remove(&key);
                }
            }
        }
        if let Some(text) = patch.text {
            node.content.text = Some(text);
        }
        if let Some(html) = patch.html {
            node.content.html = Some(html);
        }
        if let Some(src) = patch.src {
            node.content.src = Some(src);
        }
        if let Some(constraints) = patch.constraints {
            node.constraints = constraints;
        }

        node.meta.touch();
        trace!("update_node: {id} now at version {}", node.meta.version);
        self.bump();
    }

    /// Remove the node and its entire subtree, scrubbing the removed ids
    /// from every remaining child list. No-op when the node is missing or
    /// `can_delete` is false.
    pub fn delete_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.constraints.can_delete {
            debug!("delete_node: {id} is protected, ignoring");
            return;
        }

        let mut doomed: Vec<NodeId> = Vec::new();
        self.collect_subtree(id, &mut doomed);
        let doomed_set: HashSet<NodeId> = doomed.iter().copied().collect();

        for nid in &doomed {
            self.nodes.shift_remove(nid);
        }
        for node in self.nodes.values_mut() {
            node.content
                .children
                .retain(|child| !doomed_set.contains(child));
        }

        if self.selected.is_some_and(|s| doomed_set.contains(&s)) {
            self.selected = None;
        }
        if self.hovered.is_some_and(|h| doomed_set.contains(&h)) {
            self.hovered = None;
        }
        if self.drag_target.is_some_and(|t| doomed_set.contains(&t)) {
            self.drag_target = None;
        }

        debug!("delete_node: removed {id} and {} descendants", doomed.len() - 1);
        self.bump();
    }

    /// Structurally copy the node's subtree with fresh ids throughout.
    /// The copy's stored position is offset by `(+20, +20)` when present,
    /// its version and timestamps are reset, and it is inserted as a
    /// sibling directly after the original. No-op when the node is missing
    /// or `can_duplicate` is false. The copy is selected.
    pub fn duplicate_node(&mut self, id: NodeId) -> Option<NodeId> {
        let original = self.nodes.get(&id)?;
        if !original.constraints.can_duplicate {
            debug!("duplicate_node: {id} is protected, ignoring");
            return None;
        }

        let mut clones: Vec<Node> = Vec::new();
        let new_id = self.clone_subtree(id, &mut clones)?;

        // Offset and rename only the top of the copied subtree.
        if let Some(top) = clones.iter_mut().find(|n| n.id == new_id) {
            top.name = format!("{}-copy", top.name);
            for key in [style_keys::LEFT, style_keys::TOP] {
                if let Some(v) = top.style.px(key, 0.0) {
                    top.style.set(key, (v + DUPLICATE_OFFSET) as f64);
                }
            }
        }

        for clone in clones {
            self.nodes.insert(clone.id, clone);
        }

        // Attach as a sibling right after the original; a root stays a root.
        if let Some(parent_id) = self.parent_of(id)
            && let Some(parent) = self.nodes.get_mut(&parent_id)
        {
            let pos = parent
                .content
                .children
                .iter()
                .position(|c| *c == id)
                .map(|p| p + 1)
                .unwrap_or(parent.content.children.len());
            parent.content.children.insert(pos, new_id);
            parent.meta.touch();
        }

        debug!("duplicate_node: {id} -> {new_id}");
        self.selected = Some(new_id);
        self.bump();
        Some(new_id)
    }

    // ─── Selection & canvas state ────────────────────────────────────────

    pub fn select_node(&mut self, id: Option<NodeId>) {
        trace!("select_node: {id:?}");
        self.selected = id.filter(|i| self.nodes.contains_key(i));
        self.bump();
    }

    pub fn hover_node(&mut self, id: Option<NodeId>) {
        self.hovered = id.filter(|i| self.nodes.contains_key(i));
        self.bump();
    }

    pub fn set_drag_target(&mut self, id: Option<NodeId>) {
        self.drag_target = id.filter(|i| self.nodes.contains_key(i));
        self.bump();
    }

    /// Clamp zoom to `[0.1, 3.0]`.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(0.1, 3.0);
        self.bump();
    }

    pub fn toggle_grid(&mut self) {
        self.grid_visible = !self.grid_visible;
        self.bump();
    }

    pub fn toggle_alignment_guides(&mut self) {
        self.guides_visible = !self.guides_visible;
        self.bump();
    }

    /// Clear the tree and all editor state, keeping the registry.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.selected = None;
        self.hovered = None;
        self.drag_target = None;
        self.zoom = 1.0;
        self.grid_visible = true;
        self.guides_visible = true;
        self.bump();
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for child in self.children(id).to_vec() {
            self.collect_subtree(child, out);
        }
    }

    /// Clone `id`'s subtree into `out` with fresh ids; returns the new id
    /// of the subtree top.
    fn clone_subtree(&self, id: NodeId, out: &mut Vec<Node>) -> Option<NodeId> {
        let original = self.nodes.get(&id)?;
        let new_id = NodeId::fresh();
        let mut clone = original.clone();
        clone.id = new_id;
        clone.meta = Meta::now();

        let mut new_children: SmallVec<[NodeId; 4]> = SmallVec::new();
        for child in &original.content.children {
            if let Some(new_child) = self.clone_subtree(*child, out) {
                new_children.push(new_child);
            }
        }
        clone.content.children = new_children;

        out.push(clone);
        Some(new_id)
    }
}
