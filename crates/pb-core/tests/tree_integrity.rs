//! End-to-end store scenarios: after any sequence of operations the tree
//! stays well formed — every referenced child exists, no id appears in two
//! child lists, and deletions leave no dangling references.

use pb_core::{
    Constraints, NodeId, NodeKind, NodePatch, PositionMode, Registry, Scene, style_keys,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn scene() -> Scene {
    Scene::new(Registry::standard())
}

/// Every child id resolves to a live node, and each id is referenced by at
/// most one parent.
fn assert_well_formed(s: &Scene) {
    let mut seen: HashSet<NodeId> = HashSet::new();
    for id in s.ids() {
        for &child in s.children(id) {
            assert!(s.contains(child), "dangling child {child} under {id}");
            assert!(seen.insert(child), "{child} appears in two child lists");
        }
    }
    // Roots and referenced ids partition the node set.
    let roots: HashSet<NodeId> = s.roots().into_iter().collect();
    assert_eq!(roots.len() + seen.len(), s.len());
    assert!(roots.is_disjoint(&seen));
}

#[test]
fn building_a_page_keeps_the_tree_well_formed() {
    let mut s = scene();

    let section = s.add_node(NodeKind::Section, 0.0, 0.0, None);
    let container = s.add_node(NodeKind::Container, 0.0, 0.0, Some(section));
    let heading = s.add_node(NodeKind::Heading, 0.0, 0.0, Some(section));
    let text = s.add_node(NodeKind::Text, 0.0, 0.0, Some(container));
    let button = s.add_node(NodeKind::Button, 0.0, 0.0, Some(container));
    let logo = s.add_node(NodeKind::Image, 300.0, 40.0, None);

    assert_well_formed(&s);
    assert_eq!(s.roots(), vec![section, logo]);
    assert_eq!(s.children(section), &[container, heading]);
    assert_eq!(s.children(container), &[text, button]);
    assert_eq!(s.len(), 6);
}

#[test]
fn generated_names_count_up_per_scene() {
    let mut s = scene();
    let a = s.add_node(NodeKind::Section, 0.0, 0.0, None);
    let b = s.add_node(NodeKind::Text, 0.0, 0.0, None);
    assert_eq!(s.get(a).unwrap().name, "section-0");
    assert_eq!(s.get(b).unwrap().name, "text-1");
}

#[test]
fn dropping_a_free_node_into_flow_reconciles_it() {
    let mut s = scene();
    let container = s.add_node(NodeKind::Container, 0.0, 0.0, None);
    let image = s.add_node(NodeKind::Image, 120.0, 45.0, Some(container));

    let node = s.get(image).unwrap();
    assert_eq!(node.layout.position, PositionMode::Relative);
    assert!(!node.style.contains(style_keys::LEFT));
    assert!(!node.style.contains(style_keys::TOP));
    assert_eq!(node.style.px(style_keys::WIDTH, 640.0), Some(640.0));
    assert_eq!(node.style.px(style_keys::MARGIN_BOTTOM, 0.0), Some(10.0));
    assert_well_formed(&s);
}

#[test]
fn duplicating_a_subtree_shares_no_ids_with_the_original() {
    let mut s = scene();
    let section = s.add_node(NodeKind::Section, 0.0, 0.0, None);
    let container = s.add_node(NodeKind::Container, 0.0, 0.0, Some(section));
    s.add_node(NodeKind::Text, 0.0, 0.0, Some(container));
    s.add_node(NodeKind::Button, 0.0, 0.0, Some(container));

    let before: HashSet<NodeId> = s.ids().collect();
    let copy = s.duplicate_node(section).unwrap();

    assert_well_formed(&s);
    assert_eq!(s.len(), 8);
    assert_eq!(s.get(copy).unwrap().name, "section-0-copy");

    // The copied subtree is entirely fresh ids.
    let mut copied = Vec::new();
    collect(&s, copy, &mut copied);
    assert_eq!(copied.len(), 4);
    for id in copied {
        assert!(!before.contains(&id), "{id} reused from the original");
    }

    // Editing the copy leaves the original untouched.
    let copied_container = s.children(copy)[0];
    s.update_node(copied_container, NodePatch::new().name("hero"));
    assert_eq!(s.get(container).unwrap().name, "container-1");
}

#[test]
fn deleting_a_mid_tree_node_takes_its_subtree_and_nothing_else() {
    let mut s = scene();
    let section = s.add_node(NodeKind::Section, 0.0, 0.0, None);
    let container = s.add_node(NodeKind::Container, 0.0, 0.0, Some(section));
    let text = s.add_node(NodeKind::Text, 0.0, 0.0, Some(container));
    let heading = s.add_node(NodeKind::Heading, 0.0, 0.0, Some(section));

    s.select_node(Some(text));
    s.delete_node(container);

    assert_well_formed(&s);
    assert!(!s.contains(container));
    assert!(!s.contains(text));
    assert_eq!(s.children(section), &[heading]);
    // Selection pointed into the deleted subtree.
    assert_eq!(s.selected(), None);
}

#[test]
fn protected_node_survives_delete_and_duplicate() {
    let mut s = scene();
    let id = s.add_node(NodeKind::Section, 0.0, 0.0, None);
    s.update_node(
        id,
        NodePatch::new().constraints(Constraints {
            can_delete: false,
            can_duplicate: false,
            ..Constraints::default()
        }),
    );

    s.delete_node(id);
    assert!(s.contains(id));
    assert_eq!(s.duplicate_node(id), None);
    assert_eq!(s.len(), 1);
}

#[test]
fn operations_on_stale_ids_are_noops() {
    let mut s = scene();
    let id = s.add_node(NodeKind::Div, 0.0, 0.0, None);
    s.delete_node(id);

    let len = s.len();
    s.delete_node(id);
    s.update_node(id, NodePatch::new().name("ghost"));
    assert_eq!(s.duplicate_node(id), None);
    s.select_node(Some(id));

    assert_eq!(s.len(), len);
    assert_eq!(s.selected(), None);
    assert_well_formed(&s);
}

#[test]
fn every_mutation_bumps_the_revision() {
    let mut s = scene();
    let mut last = s.revision();

    let id = s.add_node(NodeKind::Text, 0.0, 0.0, None);
    assert!(s.revision() > last);
    last = s.revision();

    s.update_node(id, NodePatch::new().text("hi"));
    assert!(s.revision() > last);
    last = s.revision();

    s.set_zoom(2.0);
    assert!(s.revision() > last);
    last = s.revision();

    s.delete_node(id);
    assert!(s.revision() > last);
}

fn collect(s: &Scene, id: NodeId, out: &mut Vec<NodeId>) {
    out.push(id);
    for &child in s.children(id) {
        collect(s, child, out);
    }
}
