//! Tree layout and connector geometry.
//!
//! Geometry is computed in two phases. [`TreeLayout::measure`] places every visible
//! node on a fixed-width grid (one unit = one character cell), then
//! [`compute_connectors`] derives the connector lines of each expanded parent from
//! the measured boxes of its children. Connector coordinates are relative to the
//! bounding box of the children container.

use super::{
    expansion::ExpansionState,
    tree::{NetworkNode, NetworkTree},
};
use std::collections::HashMap;

/// Width of a node box
pub const NODE_WIDTH: f32 = 24.0;
/// Height of a node box
pub const NODE_HEIGHT: f32 = 3.0;

/// Spacing between sibling boxes
pub const H_SPACING: f32 = 2.0;
/// Spacing between a parent's bottom edge and its children's top edge
pub const V_SPACING: f32 = 4.0;

/// A point in layout space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal position
    pub x: f32,
    /// Vertical position, growing downwards
    pub y: f32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Creates a rect.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Horizontal centre.
    #[must_use]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Top edge.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Smallest rect containing both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// A straight connector segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Start point
    pub from: Point,
    /// End point
    pub to: Point,
}

impl Line {
    /// Creates a line.
    #[must_use]
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    /// Moves both ends by `offset`.
    #[must_use]
    pub fn translate(self, offset: Point) -> Self {
        Self::new(
            Point::new(self.from.x + offset.x, self.from.y + offset.y),
            Point::new(self.to.x + offset.x, self.to.y + offset.y),
        )
    }
}

/// Connector lines between one parent and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorSet {
    /// Top-left corner of the children container in layout space
    pub origin: Point,
    /// From the parent's bottom-centre down to the bar
    pub parent_line: Line,
    /// Horizontal bar across the children's centres
    pub bar: Line,
    /// From the bar down to each child's top-centre, in child order
    pub stubs: Vec<Line>,
}

impl ConnectorSet {
    /// Total number of lines in the set.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.stubs.len() + 2
    }

    /// All lines translated back into layout space.
    #[must_use]
    pub fn absolute_lines(&self) -> Vec<Line> {
        std::iter::once(self.parent_line)
            .chain(std::iter::once(self.bar))
            .chain(self.stubs.iter().copied())
            .map(|line| line.translate(self.origin))
            .collect()
    }
}

/// Computes the connector lines from measured boxes.
///
/// Returns `None` when there are no children. The bar sits halfway between the
/// parent's bottom edge and the highest child's top edge.
#[must_use]
pub fn compute_connectors(parent: Rect, children: &[Rect]) -> Option<ConnectorSet> {
    let container = children.iter().copied().reduce(Rect::union)?;
    let origin = Point::new(container.x, container.y);
    let relative = |x: f32, y: f32| Point::new(x - origin.x, y - origin.y);

    let anchor = relative(parent.center_x(), parent.bottom());
    let tops: Vec<Point> = children
        .iter()
        .map(|c| relative(c.center_x(), c.top()))
        .collect();

    let highest = tops.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let bar_y = ((anchor.y + highest) / 2.0).floor();
    let min_x = tops.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = tops.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);

    Some(ConnectorSet {
        origin,
        parent_line: Line::new(anchor, Point::new(anchor.x, bar_y)),
        bar: Line::new(Point::new(min_x, bar_y), Point::new(max_x, bar_y)),
        stubs: tops
            .iter()
            .map(|top| Line::new(Point::new(top.x, bar_y), *top))
            .collect(),
    })
}

/// A visible node with its measured box.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    /// Node id
    pub id: String,
    /// Measured box
    pub rect: Rect,
}

/// Measured positions of every visible node plus the connectors of expanded parents.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    root: Rect,
    nodes: Vec<PlacedNode>,
    index: HashMap<String, usize>,
    connectors: Vec<(String, ConnectorSet)>,
    width: f32,
    height: f32,
}

fn visible_children<'a>(node: &'a NetworkNode, expansion: &ExpansionState) -> &'a [NetworkNode] {
    if expansion.is_expanded(&node.id) {
        &node.children
    } else {
        &[]
    }
}

fn span(children: &[NetworkNode], expansion: &ExpansionState) -> f32 {
    if children.is_empty() {
        return 0.0;
    }
    let widths: f32 = children.iter().map(|c| node_width(c, expansion)).sum();
    #[allow(clippy::cast_precision_loss)]
    let gaps = H_SPACING * (children.len() - 1) as f32;
    widths + gaps
}

fn node_width(node: &NetworkNode, expansion: &ExpansionState) -> f32 {
    span(visible_children(node, expansion), expansion).max(NODE_WIDTH)
}

#[allow(clippy::cast_precision_loss)]
fn row_y(depth: u32) -> f32 {
    depth as f32 * (NODE_HEIGHT + V_SPACING)
}

impl TreeLayout {
    /// Places the root and every visible node.
    ///
    /// The root's level-1 children are always visible; any other node's children
    /// are visible only while that node is expanded.
    #[must_use]
    pub fn measure(tree: &NetworkTree, expansion: &ExpansionState) -> Self {
        let width = span(&tree.network, expansion).max(NODE_WIDTH);
        let mut layout = Self {
            root: Rect::new((width - NODE_WIDTH) / 2.0, 0.0, NODE_WIDTH, NODE_HEIGHT),
            nodes: Vec::new(),
            index: HashMap::new(),
            connectors: Vec::new(),
            width,
            height: NODE_HEIGHT,
        };

        let child_rects = layout.place_children(&tree.network, 0.0, width, 1, expansion);
        if let Some(set) = compute_connectors(layout.root, &child_rects) {
            layout.connectors.push((tree.root.id.clone(), set));
        }
        layout
    }

    fn place_children(
        &mut self,
        children: &[NetworkNode],
        left: f32,
        available: f32,
        depth: u32,
        expansion: &ExpansionState,
    ) -> Vec<Rect> {
        let mut cursor = left + (available - span(children, expansion)) / 2.0;
        let mut rects = Vec::with_capacity(children.len());
        for child in children {
            let width = node_width(child, expansion);
            rects.push(self.place(child, cursor, width, depth, expansion));
            cursor += width + H_SPACING;
        }
        rects
    }

    fn place(
        &mut self,
        node: &NetworkNode,
        left: f32,
        width: f32,
        depth: u32,
        expansion: &ExpansionState,
    ) -> Rect {
        let rect = Rect::new(left + (width - NODE_WIDTH) / 2.0, row_y(depth), NODE_WIDTH, NODE_HEIGHT);
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(PlacedNode {
            id: node.id.clone(),
            rect,
        });
        self.height = self.height.max(rect.bottom());

        let child_rects =
            self.place_children(visible_children(node, expansion), left, width, depth + 1, expansion);
        if let Some(set) = compute_connectors(rect, &child_rects) {
            self.connectors.push((node.id.clone(), set));
        }
        rect
    }

    /// Box of the root user.
    #[must_use]
    pub const fn root(&self) -> Rect {
        self.root
    }

    /// Box of a visible node.
    #[must_use]
    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.index.get(id).map(|&i| self.nodes[i].rect)
    }

    /// Visible nodes in depth-first order.
    #[must_use]
    pub fn nodes(&self) -> &[PlacedNode] {
        &self.nodes
    }

    /// Connector sets keyed by parent id (the root id for the root's children).
    #[must_use]
    pub fn connectors(&self) -> &[(String, ConnectorSet)] {
        &self.connectors
    }

    /// Connectors below one parent.
    #[must_use]
    pub fn connectors_for(&self, id: &str) -> Option<&ConnectorSet> {
        self.connectors
            .iter()
            .find(|(parent, _)| parent == id)
            .map(|(_, set)| set)
    }

    /// Overall width.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Overall height.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }
}
