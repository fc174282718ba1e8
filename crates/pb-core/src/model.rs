//! Core scene-tree data model for the page builder.
//!
//! The document is a forest of positionable nodes: each node carries an
//! ordered list of child ids, so every id appears in at most one parent's
//! child list. Two layout families coexist — "flow" nodes (static/relative)
//! positioned by their container, and "free" nodes (absolute/fixed) carrying
//! explicit `left`/`top` offsets. The scene store (`scene.rs`) is the only
//! writer; everything here is plain data.

use crate::id::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::SystemTime;

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The closed set of node kinds. Every consuming match is exhaustive, so a
/// new kind forces every switch to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Section,
    Container,
    Flex,
    Grid,
    Div,
    Text,
    Heading,
    Button,
    Input,
    Image,
}

impl NodeKind {
    /// Lowercase label, used for generated node names (`text-3`).
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Section => "section",
            NodeKind::Container => "container",
            NodeKind::Flex => "flex",
            NodeKind::Grid => "grid",
            NodeKind::Div => "div",
            NodeKind::Text => "text",
            NodeKind::Heading => "heading",
            NodeKind::Button => "button",
            NodeKind::Input => "input",
            NodeKind::Image => "image",
        }
    }
}

// ─── Layout ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    #[default]
    Block,
    InlineBlock,
    Flex,
    Grid,
}

/// CSS-style positioning scheme. Static/relative nodes sit in document flow;
/// absolute/fixed nodes carry explicit coordinates and are directly draggable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    Static,
    #[default]
    Relative,
    Absolute,
    Fixed,
}

impl PositionMode {
    /// Free nodes (absolute/fixed) carry `left`/`top` and accept direct drag.
    pub fn is_free(&self) -> bool {
        matches!(self, PositionMode::Absolute | PositionMode::Fixed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
    RowReverse,
    ColumnReverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexWrap {
    #[default]
    Nowrap,
    Wrap,
    WrapReverse,
}

/// Layout configuration of a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    pub display: DisplayMode,
    pub position: PositionMode,
    pub flex_direction: Option<FlexDirection>,
    pub flex_wrap: Option<FlexWrap>,
    /// Grid column template, e.g. `repeat(3, 1fr)`.
    pub grid_columns: Option<String>,
    pub grid_rows: Option<String>,
}

impl Layout {
    /// A flow layout positions its children by the document flow algorithm.
    pub fn is_flow(&self) -> bool {
        !self.position.is_free()
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

/// A single style property value: raw number (implicitly px) or a string
/// with a unit (`"100%"`, `"20px"`, `"auto"`, `"#f8f9fa"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
}

impl StyleValue {
    /// Resolve to pixels. `percent_base` is the reference length for `%`
    /// values. Returns `None` for `auto`; malformed or NaN values resolve
    /// to `0.0` rather than propagating.
    pub fn as_px(&self, percent_base: f32) -> Option<f32> {
        match self {
            StyleValue::Number(n) => {
                let v = *n as f32;
                Some(if v.is_finite() { v } else { 0.0 })
            }
            StyleValue::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("auto") {
                    return None;
                }
                let v = if let Some(pct) = s.strip_suffix('%') {
                    pct.trim().parse::<f32>().unwrap_or(0.0) / 100.0 * percent_base
                } else {
                    let raw = s.strip_suffix("px").unwrap_or(s).trim();
                    raw.parse::<f32>().unwrap_or(0.0)
                };
                Some(if v.is_finite() { v } else { 0.0 })
            }
        }
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        StyleValue::Number(n)
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Text(s.to_string())
    }
}

/// Free-form style map: geometry and paint attributes keyed by CSS property
/// name. Insertion order is preserved so emitted style blocks stay stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    #[serde(flatten)]
    props: IndexMap<String, StyleValue>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.props.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StyleValue>) {
        self.props.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        self.props.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.props.contains_key(key)
    }

    /// Resolve a property to pixels; `None` when absent or `auto`.
    pub fn px(&self, key: &str, percent_base: f32) -> Option<f32> {
        self.props.get(key).and_then(|v| v.as_px(percent_base))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

// Well-known style keys used by the store and the hit-test engine.
pub mod style_keys {
    pub const LEFT: &str = "left";
    pub const TOP: &str = "top";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const MARGIN_BOTTOM: &str = "margin-bottom";
}

// ─── Content ─────────────────────────────────────────────────────────────

/// Node payload: text/html/src content plus the ordered child-id list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    pub text: Option<String>,
    pub html: Option<String>,
    /// Media source (images).
    pub src: Option<String>,
    /// Ordered children. The order is significant: it drives hit-test
    /// traversal and flow stacking.
    pub children: SmallVec<[NodeId; 4]>,
}

// ─── Constraints ─────────────────────────────────────────────────────────

/// Editing constraints: what may be done to this node, and which kinds it
/// accepts as children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub can_delete: bool,
    pub can_duplicate: bool,
    pub can_resize: bool,
    pub allowed_children: SmallVec<[NodeKind; 4]>,
}

impl Constraints {
    pub fn allows_child(&self, kind: NodeKind) -> bool {
        self.allowed_children.contains(&kind)
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            can_delete: true,
            can_duplicate: true,
            can_resize: true,
            allowed_children: SmallVec::new(),
        }
    }
}

// ─── Meta ────────────────────────────────────────────────────────────────

/// Bookkeeping: version increments on every mutation and is the change
/// detection key (not a concurrency mechanism).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub version: u64,
}

impl Meta {
    pub fn now() -> Self {
        let t = SystemTime::now();
        Self {
            created_at: t,
            updated_at: t,
            version: 1,
        }
    }

    /// Record a mutation: bump version, refresh `updated_at`.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = SystemTime::now();
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::now()
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A single node in the scene tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Human-readable label assigned at creation (`section-0`, `text-3`).
    pub name: String,
    pub layout: Layout,
    pub style: Style,
    pub content: Content,
    pub constraints: Constraints,
    pub meta: Meta,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            layout: Layout::default(),
            style: Style::new(),
            content: Content::default(),
            constraints: Constraints::default(),
            meta: Meta::now(),
        }
    }

    /// Free nodes (absolute/fixed) carry explicit coordinates.
    pub fn is_free(&self) -> bool {
        self.layout.position.is_free()
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in canvas coordinates. Supplied live by a
/// geometry provider, or estimated by the hit-test fallback model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn position_mode_free_vs_flow() {
        assert!(PositionMode::Absolute.is_free());
        assert!(PositionMode::Fixed.is_free());
        assert!(!PositionMode::Static.is_free());
        assert!(!PositionMode::Relative.is_free());
    }

    #[test]
    fn style_value_px_units() {
        assert_eq!(StyleValue::Number(42.0).as_px(0.0), Some(42.0));
        assert_eq!(StyleValue::from("120px").as_px(0.0), Some(120.0));
        assert_eq!(StyleValue::from("120").as_px(0.0), Some(120.0));
        assert_eq!(StyleValue::from("50%").as_px(300.0), Some(150.0));
        assert_eq!(StyleValue::from("auto").as_px(300.0), None);
    }

    #[test]
    fn style_value_malformed_is_zero() {
        assert_eq!(StyleValue::from("garbage").as_px(100.0), Some(0.0));
        assert_eq!(StyleValue::from("%").as_px(100.0), Some(0.0));
        assert_eq!(StyleValue::Number(f64::NAN).as_px(0.0), Some(0.0));
    }

    #[test]
    fn style_map_set_get_remove() {
        let mut style = Style::new();
        style.set(style_keys::LEFT, 50.0);
        style.set(style_keys::WIDTH, "100%");
        assert_eq!(style.px(style_keys::LEFT, 0.0), Some(50.0));
        assert_eq!(style.px(style_keys::WIDTH, 800.0), Some(800.0));
        style.remove(style_keys::LEFT);
        assert!(!style.contains(style_keys::LEFT));
    }

    #[test]
    fn meta_touch_bumps_version() {
        let mut meta = Meta::now();
        assert_eq!(meta.version, 1);
        meta.touch();
        meta.touch();
        assert_eq!(meta.version, 3);
    }

    #[test]
    fn rect_containment_is_inclusive() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(110.0, 60.0));
        assert!(r.contains(50.0, 30.0));
        assert!(!r.contains(9.9, 30.0));
        assert!(!r.contains(50.0, 60.1));
    }
}
