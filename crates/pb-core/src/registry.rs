//! Component registry: the static catalog of node kinds.
//!
//! Each entry carries the palette metadata and the default layout, style,
//! content, and constraints applied when a node of that kind is created.
//! The registry is pure data — the scene store reads it, nothing writes it.

use crate::model::{
    Constraints, Content, DisplayMode, FlexDirection, FlexWrap, Layout, NodeKind, PositionMode,
    Style, style_keys,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;

/// Palette grouping for registry entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Layout,
    Basic,
    Form,
    Media,
}

/// One catalog entry: a node kind plus its creation defaults.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub kind: NodeKind,
    pub name: &'static str,
    pub icon: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub default_layout: Layout,
    pub default_style: Style,
    pub default_content: Content,
    pub default_constraints: Constraints,
}

/// The catalog of available node kinds, keyed by kind.
#[derive(Debug, Clone)]
pub struct Registry {
    specs: IndexMap<NodeKind, ComponentSpec>,
}

impl Registry {
    /// The standard component library.
    pub fn standard() -> Self {
        let mut specs = IndexMap::new();
        for spec in standard_specs() {
            specs.insert(spec.kind, spec);
        }
        Self { specs }
    }

    pub fn get(&self, kind: NodeKind) -> Option<&ComponentSpec> {
        self.specs.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.specs.values()
    }

    /// Entries of one palette category, in catalog order.
    pub fn by_category(&self, category: Category) -> Vec<&ComponentSpec> {
        self.specs
            .values()
            .filter(|s| s.category == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

fn block_layout() -> Layout {
    Layout {
        display: DisplayMode::Block,
        position: PositionMode::Relative,
        ..Layout::default()
    }
}

fn inline_layout() -> Layout {
    Layout {
        display: DisplayMode::InlineBlock,
        position: PositionMode::Relative,
        ..Layout::default()
    }
}

fn standard_specs() -> Vec<ComponentSpec> {
    vec![
        // Layout components
        ComponentSpec {
            kind: NodeKind::Section,
            name: "Section",
            icon: "📦",
            category: Category::Layout,
            description: "Content section container",
            default_layout: block_layout(),
            default_style: {
                let mut s = Style::new();
                s.set(style_keys::WIDTH, "100%");
                s.set("min-height", "200px");
                s.set(style_keys::HEIGHT, "auto");
                s.set("padding", "20px");
                s.set("background-color", "#f8f9fa");
                s.set(style_keys::MARGIN_BOTTOM, "20px");
                s
            },
            default_content: Content::default(),
            default_constraints: Constraints {
                allowed_children: smallvec![
                    NodeKind::Container,
                    NodeKind::Div,
                    NodeKind::Text,
                    NodeKind::Heading,
                ],
                ..Constraints::default()
            },
        },
        ComponentSpec {
            kind: NodeKind::Container,
            name: "Container",
            icon: "📁",
            category: Category::Layout,
            description: "General-purpose container",
            default_layout: block_layout(),
            default_style: {
                let mut s = Style::new();
                s.set(style_keys::WIDTH, "100%");
                s.set("min-height", "200px");
                s.set(style_keys::HEIGHT, "auto");
                s.set("padding", "16px");
                s.set("background-color", "#ffffff");
                s.set("border", "1px solid #e9ecef");
                s.set("border-radius", "8px");
                s.set(style_keys::MARGIN_BOTTOM, "16px");
                s
            },
            default_content: Content::default(),
            default_constraints: Constraints {
                allowed_children: smallvec![
                    NodeKind::Div,
                    NodeKind::Text,
                    NodeKind::Button,
                    NodeKind::Image,
                ],
                ..Constraints::default()
            },
        },
        ComponentSpec {
            kind: NodeKind::Flex,
            name: "Flex",
            icon: "📐",
            category: Category::Layout,
            description: "Flexbox layout container",
            default_layout: Layout {
                display: DisplayMode::Flex,
                position: PositionMode::Relative,
                flex_direction: Some(FlexDirection::Row),
                flex_wrap: Some(FlexWrap::Nowrap),
                ..Layout::default()
            },
            default_style: {
                let mut s = Style::new();
                s.set(style_keys::WIDTH, "100%");
                s.set("min-height", "200px");
                s.set(style_keys::HEIGHT, "auto");
                s.set("padding", "16px");
                s.set("background-color", "#f8f9fa");
                s.set("gap", "10px");
                s.set(style_keys::MARGIN_BOTTOM, "16px");
                s
            },
            default_content: Content::default(),
            default_constraints: Constraints {
                allowed_children: smallvec![NodeKind::Div, NodeKind::Text, NodeKind::Button],
                ..Constraints::default()
            },
        },
        ComponentSpec {
            kind: NodeKind::Grid,
            name: "Grid",
            icon: "🔲",
            category: Category::Layout,
            description: "CSS grid layout container",
            default_layout: Layout {
                display: DisplayMode::Grid,
                position: PositionMode::Relative,
                grid_columns: Some("repeat(3, 1fr)".to_string()),
                grid_rows: Some("auto".to_string()),
                ..Layout::default()
            },
            default_style: {
                let mut s = Style::new();
                s.set(style_keys::WIDTH, "100%");
                s.set("min-height", "200px");
                s.set(style_keys::HEIGHT, "auto");
                s.set("padding", "16px");
                s.set("background-color", "#f8f9fa");
                s.set("gap", "10px");
                s.set(style_keys::MARGIN_BOTTOM, "16px");
                s
            },
            default_content: Content::default(),
            default_constraints: Constraints {
                allowed_children: smallvec![NodeKind::Div, NodeKind::Text, NodeKind::Image],
                ..Constraints::default()
            },
        },
        // Basic components
        ComponentSpec {
            kind: NodeKind::Div,
            name: "Div",
            icon: "🧱",
            category: Category::Basic,
            description: "Generic block element",
            default_layout: block_layout(),
            default_style: {
                let mut s = Style::new();
                s.set(style_keys::WIDTH, "100%");
                s.set("min-height", "100px");
                s.set(style_keys::HEIGHT, "auto");
                s.set("background-color", "#e9ecef");
                s.set("border", "1px solid #dee2e6");
                s.set("border-radius", "4px");
                s.set(style_keys::MARGIN_BOTTOM, "10px");
                s
            },
            default_content: Content::default(),
            default_constraints: Constraints {
                allowed_children: smallvec![NodeKind::Text, NodeKind::Image, NodeKind::Button],
                ..Constraints::default()
            },
        },
        ComponentSpec {
            kind: NodeKind::Text,
            name: "Text",
            icon: "📝",
            category: Category::Basic,
            description: "Text content",
            default_layout: inline_layout(),
            default_style: {
                let mut s = Style::new();
                s.set("font-size", "14px");
                s.set("color", "#333333");
                s.set("line-height", "1.5");
                s
            },
            default_content: Content {
                text: Some("Sample text".to_string()),
                ..Content::default()
            },
            default_constraints: Constraints::default(),
        },
        ComponentSpec {
            kind: NodeKind::Heading,
            name: "Heading",
            icon: "📋",
            category: Category::Basic,
            description: "Heading text",
            default_layout: block_layout(),
            default_style: {
                let mut s = Style::new();
                s.set("font-size", "24px");
                s.set("font-weight", "bold");
                s.set("color", "#333333");
                s.set("margin", "0 0 16px 0");
                s
            },
            default_content: Content {
                text: Some("Heading".to_string()),
                ..Content::default()
            },
            default_constraints: Constraints::default(),
        },
        // Form components
        ComponentSpec {
            kind: NodeKind::Button,
            name: "Button",
            icon: "🔘",
            category: Category::Form,
            description: "Interactive button",
            default_layout: inline_layout(),
            default_style: {
                let mut s = Style::new();
                s.set("padding", "8px 16px");
                s.set("background-color", "#007bff");
                s.set("color", "#ffffff");
                s.set("border", "none");
                s.set("border-radius", "4px");
                s.set("cursor", "pointer");
                s
            },
            default_content: Content {
                text: Some("Button".to_string()),
                ..Content::default()
            },
            default_constraints: Constraints::default(),
        },
        ComponentSpec {
            kind: NodeKind::Input,
            name: "Input",
            icon: "📱",
            category: Category::Form,
            description: "Text input field",
            default_layout: inline_layout(),
            default_style: {
                let mut s = Style::new();
                s.set(style_keys::WIDTH, "200px");
                s.set("padding", "8px 12px");
                s.set("border", "1px solid #ced4da");
                s.set("border-radius", "4px");
                s.set("font-size", "14px");
                s
            },
            default_content: Content::default(),
            default_constraints: Constraints::default(),
        },
        // Media components
        ComponentSpec {
            kind: NodeKind::Image,
            name: "Image",
            icon: "🖼️",
            category: Category::Media,
            description: "Image display",
            default_layout: Layout {
                display: DisplayMode::InlineBlock,
                position: PositionMode::Absolute,
                ..Layout::default()
            },
            default_style: {
                let mut s = Style::new();
                s.set(style_keys::WIDTH, "200px");
                s.set(style_keys::HEIGHT, "150px");
                s.set("background-color", "#f8f9fa");
                s.set("border", "1px dashed #dee2e6");
                s.set("border-radius", "4px");
                s
            },
            default_content: Content {
                src: Some("https://via.placeholder.com/200x150".to_string()),
                ..Content::default()
            },
            default_constraints: Constraints::default(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn standard_catalog_covers_all_kinds() {
        let reg = Registry::standard();
        assert_eq!(reg.len(), 10);
        for kind in [
            NodeKind::Section,
            NodeKind::Container,
            NodeKind::Flex,
            NodeKind::Grid,
            NodeKind::Div,
            NodeKind::Text,
            NodeKind::Heading,
            NodeKind::Button,
            NodeKind::Input,
            NodeKind::Image,
        ] {
            assert!(reg.get(kind).is_some(), "missing spec for {kind:?}");
        }
    }

    #[test]
    fn image_is_the_only_free_default() {
        let reg = Registry::standard();
        for spec in reg.iter() {
            let free = spec.default_layout.position.is_free();
            if spec.kind == NodeKind::Image {
                assert!(free, "image defaults to absolute positioning");
            } else {
                assert!(!free, "{:?} should default to flow", spec.kind);
            }
        }
    }

    #[test]
    fn section_allows_container_but_not_image() {
        let reg = Registry::standard();
        let section = reg.get(NodeKind::Section).unwrap();
        assert!(section.default_constraints.allows_child(NodeKind::Container));
        assert!(!section.default_constraints.allows_child(NodeKind::Image));
    }

    #[test]
    fn categories_partition_the_catalog() {
        let reg = Registry::standard();
        let total = reg.by_category(Category::Layout).len()
            + reg.by_category(Category::Basic).len()
            + reg.by_category(Category::Form).len()
            + reg.by_category(Category::Media).len();
        assert_eq!(total, reg.len());
    }
}
