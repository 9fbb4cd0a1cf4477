//! Grid A* with time-indexed dynamic obstacle avoidance (spec §4.4).

use std::collections::HashMap;

use town_core::geometry::{path_position, Path, PathPoint};
use town_core::{AgentId, MinHeap, Point, Timestamp};

use crate::error::SpatialError;
use crate::map::Map;

/// Another player to avoid planning into, for the time-indexed collision
/// check. `path` is the player's currently scheduled path (empty if
/// stationary at `position`): the pathfinder interpolates it to find where
/// that player will be at each candidate's *scheduled arrival time*, not
/// the time of the query.
pub struct OtherPlayer {
    pub agent: AgentId,
    pub position: Point,
    pub path: Path,
}

/// Outcome of a pathfinding query.
pub struct PathResult {
    pub path: Path,
    /// `Some(point)` when the requested destination was unreachable and the
    /// search instead returned the closest explored point, which the caller
    /// should treat as the new effective destination (spec §4.4).
    pub new_destination: Option<Point>,
}

struct NodeRecord {
    point: Point,
    cost: f64,
    parent: Option<(i64, i64)>,
}

/// Candidate neighbours of `p` under the off-grid neighbour-generation rule
/// (spec §4.4): an axis that is not grid-aligned restricts movement to the
/// two adjacent integer points on that axis; a fully aligned position gets
/// the four 4-connected neighbours. Off-grid positions only ever arise at
/// path start, and only on one axis at a time in practice, so checking x
/// before y is sufficient to cover real inputs.
fn neighbors(p: Point) -> Vec<Point> {
    if p.x.fract() != 0.0 {
        vec![Point::new(p.x.floor(), p.y), Point::new(p.x.ceil(), p.y)]
    } else if p.y.fract() != 0.0 {
        vec![Point::new(p.x, p.y.floor()), Point::new(p.x, p.y.ceil())]
    } else {
        vec![
            Point::new(p.x - 1.0, p.y),
            Point::new(p.x + 1.0, p.y),
            Point::new(p.x, p.y - 1.0),
            Point::new(p.x, p.y + 1.0),
        ]
    }
}

/// Quantized key for `HashMap` indexing; positions are exact integers after
/// the first step off a possibly-fractional start, so microtile precision
/// (`1e6`) is far more than needed but cheap and collision-free.
fn pos_key(p: Point) -> (i64, i64) {
    ((p.x * 1_000_000.0).round() as i64, (p.y * 1_000_000.0).round() as i64)
}

fn is_dynamically_blocked(
    position: Point,
    arrival: Timestamp,
    others: &[OtherPlayer],
    collision_threshold: f64,
) -> bool {
    others.iter().any(|other| {
        let other_position = if other.path.is_empty() {
            other.position
        } else {
            path_position(&other.path, arrival).position
        };
        position.distance(other_position) < collision_threshold
    })
}

/// Find a path from `start` to `dest` on `map`, treating `others` as
/// time-indexed dynamic obstacles and walking at `speed` tiles/second.
/// `now` anchors the returned path's timestamps.
pub fn find_path(
    map: &Map,
    start: Point,
    dest: Point,
    now: Timestamp,
    speed: f64,
    others: &[OtherPlayer],
    collision_threshold: f64,
) -> Result<PathResult, SpatialError> {
    if start.eq(dest) {
        return Ok(PathResult { path: vec![PathPoint { t: now, position: start }], new_destination: None });
    }

    let start_key = pos_key(start);
    let mut nodes: HashMap<(i64, i64), NodeRecord> = HashMap::new();
    nodes.insert(start_key, NodeRecord { point: start, cost: 0.0, parent: None });

    // Min-heap ordered by f = g + h (A* priority).
    let mut open: MinHeap<(f64, (i64, i64)), _> = MinHeap::new(|a: &(f64, (i64, i64)), b| a.0 > b.0);
    open.push((start.manhattan_distance(dest), start_key));

    let mut closest_key = start_key;
    let mut closest_dist = start.manhattan_distance(dest);
    let mut reached_key: Option<(i64, i64)> = None;

    while let Some((_, key)) = open.pop() {
        let (point, cost) = {
            let node = &nodes[&key];
            (node.point, node.cost)
        };

        if point.eq(dest) {
            reached_key = Some(key);
            break;
        }

        let md = point.manhattan_distance(dest);
        if md < closest_dist {
            closest_dist = md;
            closest_key = key;
        }

        for neighbor in neighbors(point) {
            if !map.in_bounds(neighbor) || map.is_blocked(neighbor) {
                continue;
            }

            let seg_cost = point.distance(neighbor);
            let new_cost = cost + seg_cost;
            let arrival = now.offset(((new_cost / speed) * 1000.0).round() as u64);

            if is_dynamically_blocked(neighbor, arrival, others, collision_threshold) {
                continue;
            }

            let nkey = pos_key(neighbor);
            // Dominance pruning: discard if an existing candidate already
            // reaches this cell at equal or lower cost.
            if let Some(existing) = nodes.get(&nkey) {
                if existing.cost <= new_cost {
                    continue;
                }
            }

            nodes.insert(nkey, NodeRecord { point: neighbor, cost: new_cost, parent: Some(key) });
            let h = neighbor.manhattan_distance(dest);
            open.push((new_cost + h, nkey));
        }
    }

    let end_key = reached_key.unwrap_or(closest_key);
    if end_key == start_key {
        return Err(SpatialError::NoRoute { from: start, to: dest });
    }

    // Reconstruct the chain of points from `end_key` back to `start`.
    let mut chain = Vec::new();
    let mut cursor = end_key;
    loop {
        let node = &nodes[&cursor];
        chain.push(node.point);
        match node.parent {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
    chain.reverse();

    let final_point = *chain.last().expect("chain always has at least the start point");
    let new_destination = if reached_key.is_some() { None } else { Some(final_point) };

    let mut path = Vec::with_capacity(chain.len());
    let mut acc_dist = 0.0;
    let mut prev = chain[0];
    path.push(PathPoint { t: now, position: prev });
    for p in chain.into_iter().skip(1) {
        acc_dist += prev.distance(p);
        let t = now.offset(((acc_dist / speed) * 1000.0).round() as u64);
        path.push(PathPoint { t, position: p });
        prev = p;
    }

    Ok(PathResult { path, new_destination })
}
