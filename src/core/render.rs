//! Text rendering of a network view.
//!
//! The preferred rendering is the drawn tree (boxes and connectors on a
//! [`TextCanvas`]). When that would not fit in the output budget, the view falls
//! back to an indented outline that carries the same expand markers.

use super::{
    canvas::{BoxStyle, TextCanvas},
    format::truncate,
    geometry::{NODE_WIDTH, TreeLayout},
    tree::NetworkNode,
    view::NetworkTreeView,
};
use std::{fmt::Write, time::Instant};

fn node_label(view: &NetworkTreeView, node: &NetworkNode) -> String {
    format!("{} {}", view.affordance(node).symbol(), node.display_name())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn canvas_size(layout: &TreeLayout) -> (usize, usize) {
    (
        layout.width().ceil().max(0.0) as usize,
        layout.height().ceil().max(0.0) as usize,
    )
}

/// Draws the visible tree with boxes and connector lines.
#[must_use]
pub fn render_canvas(view: &NetworkTreeView, now: Instant) -> String {
    let layout = view.layout();
    let (width, height) = canvas_size(layout);
    let mut canvas = TextCanvas::new(width, height);

    for (_, set) in layout.connectors() {
        for line in set.absolute_lines() {
            canvas.draw_line(line);
        }
    }

    let root = &view.tree().root;
    let root_style = if view.root_info_shown() {
        BoxStyle::Highlighted
    } else {
        BoxStyle::Plain
    };
    canvas.draw_box(layout.root(), &format!("● {}", root.display_name()), root_style);

    for placed in layout.nodes() {
        let Some(node) = view.tree().find(&placed.id) else {
            continue;
        };
        let style = if view.is_highlighted(&node.id, now) {
            BoxStyle::Highlighted
        } else {
            BoxStyle::Plain
        };
        canvas.draw_box(placed.rect, &node_label(view, node), style);
    }

    canvas.render()
}

fn outline_children(
    out: &mut String,
    view: &NetworkTreeView,
    children: &[NetworkNode],
    prefix: &str,
    now: Instant,
) -> std::fmt::Result {
    for (i, node) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let branch = if last { "└─ " } else { "├─ " };
        let highlight = if view.is_highlighted(&node.id, now) { " ◀" } else { "" };
        writeln!(
            out,
            "{prefix}{branch}{} ({}) · L{} · {} referral{}{highlight}",
            node_label(view, node),
            node.id,
            node.level,
            node.total_children,
            if node.total_children == 1 { "" } else { "s" },
        )?;

        if view.expansion().is_expanded(&node.id) && !node.children.is_empty() {
            let nested = format!("{prefix}{}", if last { "   " } else { "│  " });
            outline_children(out, view, &node.children, &nested, now)?;
        }
    }
    Ok(())
}

/// Renders the visible tree as an indented outline.
pub fn render_outline(view: &NetworkTreeView, now: Instant) -> Result<String, std::fmt::Error> {
    let root = &view.tree().root;
    let mut out = String::new();
    writeln!(out, "● {} ({})", root.display_name(), root.id)?;
    outline_children(&mut out, view, &view.tree().network, "", now)?;
    Ok(out)
}

/// Lines describing every open info panel, root first.
pub fn render_info_panels(view: &NetworkTreeView) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let tree = view.tree();
    if view.root_info_shown() {
        writeln!(
            out,
            "ℹ {} ({}) · root · {} direct referral{} · {} loaded member{}",
            tree.root.display_name(),
            tree.root.id,
            tree.network.len(),
            if tree.network.len() == 1 { "" } else { "s" },
            tree.node_count(),
            if tree.node_count() == 1 { "" } else { "s" },
        )?;
    }

    let mut stack: Vec<&NetworkNode> = tree.network.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if view.info_shown(&node.id) {
            writeln!(
                out,
                "ℹ {} ({}) · level {} · {} referral{} ({} loaded)",
                node.display_name(),
                node.id,
                node.level,
                node.total_children,
                if node.total_children == 1 { "" } else { "s" },
                node.children.len(),
            )?;
        }
        stack.extend(node.children.iter().rev());
    }
    Ok(out)
}

/// Renders the view within `max_chars`, preferring the drawn tree.
///
/// Open info panels are appended below the tree. The drawn tree is also skipped
/// when a single node box would not fit in the budget's width.
pub fn render(
    view: &NetworkTreeView,
    now: Instant,
    max_chars: usize,
) -> Result<String, std::fmt::Error> {
    let panels = render_info_panels(view)?;
    let budget = max_chars.saturating_sub(panels.chars().count());

    let canvas = render_canvas(view, now);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let fits = canvas.chars().count() <= budget && max_chars >= NODE_WIDTH as usize;
    let body = if fits {
        canvas
    } else {
        truncate(&render_outline(view, now)?, budget)
    };

    Ok(format!("{body}{panels}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        tree::{LevelBatch, NetworkTree, RootUser},
        view::ExpandStep,
    };

    fn view() -> NetworkTreeView {
        let mut alice = NetworkNode::new("alice", Some("Alice".to_string()), 1);
        alice.children.push(NetworkNode::new("carol", Some("Carol".to_string()), 2));
        alice.total_children = 1;
        let bob = NetworkNode::new("bob", Some("Bob".to_string()), 1);
        let tree = NetworkTree::new(
            RootUser {
                id: "rita".to_string(),
                name: Some("Rita".to_string()),
            },
            vec![alice, bob],
        );
        NetworkTreeView::new(tree, 2).with_lazy_loading(true)
    }

    #[test]
    fn test_render_canvas_shows_visible_nodes() {
        let mut view = view();
        let collapsed = render_canvas(&view, Instant::now());
        assert!(collapsed.contains("● Rita"));
        assert!(collapsed.contains("▸ Alice"));
        assert!(collapsed.contains("• Bob"));
        assert!(!collapsed.contains("Carol"));
        assert!(collapsed.contains('┴'));

        view.begin_expand("alice").unwrap();
        let expanded = render_canvas(&view, Instant::now());
        assert!(expanded.contains("▾ Alice"));
        assert!(expanded.contains("• Carol"));
    }

    #[test]
    fn test_highlighted_node_uses_double_border() {
        let mut view = view();
        let now = Instant::now();
        view.toggle_info("bob", now).unwrap();
        assert!(render_canvas(&view, now).contains('╔'));
    }

    #[test]
    fn test_render_outline() {
        let mut view = view();
        view.begin_expand("alice").unwrap();
        let outline = render_outline(&view, Instant::now()).unwrap();
        let expected = "● Rita (rita)\n\
            ├─ ▾ Alice (alice) · L1 · 1 referral\n\
            │  └─ • Carol (carol) · L2 · 0 referrals\n\
            └─ • Bob (bob) · L1 · 0 referrals\n";
        assert_eq!(outline, expected);
    }

    #[test]
    fn test_pending_marker_in_outline() {
        let mut view = view();
        view.begin_expand("alice").unwrap();
        let ExpandStep::NeedsLoad(load) = view.begin_expand("carol").unwrap() else {
            panic!("carol should need a load");
        };
        let outline = render_outline(&view, Instant::now()).unwrap();
        assert!(outline.contains("… Carol"));

        view.finish_load(&load, LevelBatch::new(3));
        let outline = render_outline(&view, Instant::now()).unwrap();
        assert!(outline.contains("• Carol"));
    }

    #[test]
    fn test_info_panels() {
        let mut view = view();
        view.toggle_root_info();
        view.toggle_info("carol", Instant::now()).unwrap();
        let panels = render_info_panels(&view).unwrap();
        assert_eq!(
            panels,
            "ℹ Rita (rita) · root · 2 direct referrals · 3 loaded members\n\
             ℹ Carol (carol) · level 2 · 0 referrals (0 loaded)\n"
        );
    }

    #[test]
    fn test_render_falls_back_to_outline() {
        let view = view();
        let now = Instant::now();
        let roomy = render(&view, now, 10_000).unwrap();
        assert!(roomy.contains('┌'));

        let tight = render(&view, now, 120).unwrap();
        assert!(tight.starts_with("● Rita (rita)"));
        assert!(tight.chars().count() <= 120);
    }
}
