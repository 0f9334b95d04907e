//! The two topology layout engines.
//!
//! Both are pure: they read the cache but never write it (the caller adopts
//! fresh positions afterwards), and a cached coordinate always wins over a
//! computed one, so re-layout never moves a node the user has placed.
//!
//! **Grid** is the position-preserving default: a square-ish row-major
//! grid used only to seed nodes that have no cached coordinate.
//!
//! **Tree** is the hierarchical view: pick roots, BFS-level each tree,
//! stack levels top-down, offset sibling trees laterally, and append
//! fully disconnected nodes in a small grid underneath.

use crate::domain::inventory::DeviceId;
use crate::graph::builder::{TopoEdge, TopoNode};
use crate::graph::positions::{Point, PositionCache, ViewMode};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

// Canvas geometry, sized for ~160 px node cards.
const ORIGIN_X: f64 = 80.0;
const ORIGIN_Y: f64 = 80.0;
const GRID_STEP_X: f64 = 200.0;
const GRID_STEP_Y: f64 = 140.0;
const TREE_LEVEL_STEP: f64 = 150.0;
const TREE_NODE_STEP: f64 = 190.0;
const STRAY_GAP_Y: f64 = 120.0;

/// Number of columns for a square-ish grid of `count` nodes.
fn grid_columns(count: usize) -> usize {
    ((count as f64).sqrt().ceil() as usize).max(1)
}

/// Row-major grid coordinate for slot `index` with `columns` columns.
fn grid_point(index: usize, columns: usize, origin_y: f64) -> Point {
    let row = index / columns;
    let col = index % columns;
    Point::new(
        ORIGIN_X + col as f64 * GRID_STEP_X,
        origin_y + row as f64 * GRID_STEP_Y,
    )
}

/// Grid layout: `columns = ceil(sqrt(n))`, filled row-major in node order.
///
/// Every node keeps its grid slot by index, but the computed coordinate is
/// used only for nodes with no cached entry; cached nodes keep their
/// position unconditionally.
pub fn grid_layout(nodes: &[TopoNode], cache: &PositionCache) -> BTreeMap<DeviceId, Point> {
    let columns = grid_columns(nodes.len());
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let point = cache
                .get(ViewMode::Grid, node.device_id)
                .unwrap_or_else(|| grid_point(index, columns, ORIGIN_Y));
            (node.device_id, point)
        })
        .collect()
}

/// Tree layout: hierarchical BFS levels with cached positions winning.
///
/// When every node already has a cached tree coordinate the cache is
/// returned verbatim and no traversal runs; recomputation only happens
/// when some node lacks an entry (a new device, or a cleared cache).
pub fn tree_layout(
    nodes: &[TopoNode],
    edges: &[TopoEdge],
    cache: &PositionCache,
) -> BTreeMap<DeviceId, Point> {
    if cache.covers(ViewMode::Tree, nodes.iter().map(|n| n.device_id)) {
        return nodes
            .iter()
            .filter_map(|n| cache.get(ViewMode::Tree, n.device_id).map(|p| (n.device_id, p)))
            .collect();
    }

    let fresh = compute_tree(nodes, edges);
    nodes
        .iter()
        .map(|n| {
            let point = cache
                .get(ViewMode::Tree, n.device_id)
                .or_else(|| fresh.get(&n.device_id).copied())
                .unwrap_or_else(|| Point::new(ORIGIN_X, ORIGIN_Y));
            (n.device_id, point)
        })
        .collect()
}

/// Root choice for the tree traversal.
///
/// Candidates are nodes that participate in at least one connection and
/// have no incoming edge. A cyclic graph (every connected node has an
/// incoming edge) falls back to the node(s) of maximum total degree, ties
/// resolved by ascending id. A graph with no connections has no roots at
/// all; every node is then a stray and lands in the grid underneath.
fn select_roots(
    ordered_ids: &[DeviceId],
    in_degree: &HashMap<DeviceId, usize>,
    total_degree: &HashMap<DeviceId, usize>,
) -> Vec<DeviceId> {
    let degree = |id: DeviceId| total_degree.get(&id).copied().unwrap_or(0);
    let incoming = |id: DeviceId| in_degree.get(&id).copied().unwrap_or(0);

    let connected: Vec<DeviceId> =
        ordered_ids.iter().copied().filter(|&id| degree(id) > 0).collect();
    if connected.is_empty() {
        return Vec::new();
    }

    let zero_in: Vec<DeviceId> =
        connected.iter().copied().filter(|&id| incoming(id) == 0).collect();
    if !zero_in.is_empty() {
        return zero_in;
    }

    let max_degree = connected.iter().map(|&id| degree(id)).max().unwrap_or(0);
    connected.into_iter().filter(|&id| degree(id) == max_degree).collect()
}

fn compute_tree(nodes: &[TopoNode], edges: &[TopoEdge]) -> BTreeMap<DeviceId, Point> {
    let ordered_ids: Vec<DeviceId> = nodes.iter().map(|n| n.device_id).collect();
    let known: HashSet<DeviceId> = ordered_ids.iter().copied().collect();

    let mut adjacency: HashMap<DeviceId, Vec<DeviceId>> = HashMap::new();
    let mut in_degree: HashMap<DeviceId, usize> = HashMap::new();
    let mut total_degree: HashMap<DeviceId, usize> = HashMap::new();
    for edge in edges {
        if !known.contains(&edge.source) || !known.contains(&edge.target) {
            continue;
        }
        adjacency.entry(edge.source).or_default().push(edge.target);
        *in_degree.entry(edge.target).or_default() += 1;
        *total_degree.entry(edge.source).or_default() += 1;
        *total_degree.entry(edge.target).or_default() += 1;
    }

    let roots = select_roots(&ordered_ids, &in_degree, &total_degree);

    // BFS from each root in root order; the first traversal to reach a node
    // owns it (no re-leveling). A root swallowed by an earlier tree starts
    // no tree of its own.
    let mut visited: HashSet<DeviceId> = HashSet::new();
    let mut trees: Vec<Vec<Vec<DeviceId>>> = Vec::new();
    for root in roots {
        if !visited.insert(root) {
            continue;
        }
        let mut levels: Vec<Vec<DeviceId>> = Vec::new();
        let mut queue: VecDeque<(DeviceId, usize)> = VecDeque::new();
        queue.push_back((root, 0));
        while let Some((id, level)) = queue.pop_front() {
            if levels.len() <= level {
                levels.push(Vec::new());
            }
            levels[level].push(id);
            if let Some(children) = adjacency.get(&id) {
                for &child in children {
                    if visited.insert(child) {
                        queue.push_back((child, level + 1));
                    }
                }
            }
        }
        trees.push(levels);
    }

    // Geometry: levels run top-down; nodes within a level are spaced evenly
    // and centred on the tree's widest level; sibling trees sit side by side.
    let mut out = BTreeMap::new();
    let mut offset_x = ORIGIN_X;
    let mut max_depth = 0usize;
    for levels in &trees {
        let widest = levels.iter().map(Vec::len).max().unwrap_or(1);
        let tree_width = (widest - 1) as f64 * TREE_NODE_STEP;
        for (depth, level_nodes) in levels.iter().enumerate() {
            let level_width = (level_nodes.len() - 1) as f64 * TREE_NODE_STEP;
            let start_x = offset_x + (tree_width - level_width) / 2.0;
            for (slot, &id) in level_nodes.iter().enumerate() {
                out.insert(
                    id,
                    Point::new(
                        start_x + slot as f64 * TREE_NODE_STEP,
                        ORIGIN_Y + depth as f64 * TREE_LEVEL_STEP,
                    ),
                );
            }
        }
        max_depth = max_depth.max(levels.len());
        offset_x += tree_width + TREE_NODE_STEP;
    }

    // Never-reached nodes go in a wrapped grid underneath all trees.
    let strays: Vec<DeviceId> =
        ordered_ids.iter().copied().filter(|id| !visited.contains(id)).collect();
    if !strays.is_empty() {
        let columns = grid_columns(strays.len());
        let base_y = ORIGIN_Y + max_depth as f64 * TREE_LEVEL_STEP + STRAY_GAP_Y;
        for (index, id) in strays.iter().enumerate() {
            out.insert(*id, grid_point(index, columns, base_y));
        }
    }

    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
