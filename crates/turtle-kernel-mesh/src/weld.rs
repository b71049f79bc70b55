//! Coincident-vertex welding.
//!
//! Vertices are bucketed on a grid whose cell size equals the weld
//! tolerance, so only the 27 surrounding cells need checking per vertex.
//! Clusters are formed greedily in creation order: the earliest vertex of a
//! cluster survives and later ones are merged into it.
//!
//! Between welds the canvas keeps a fixed-cell [`VertexGrid`] in step with
//! every vertex insert, move and removal for proximity lookups.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use turtle_kernel_math::Point3;

use crate::canvas::{edge_key, Canvas, Edge};
use crate::{EdgeId, FaceId, VertexId};

/// Outcome of a weld: which vertices were merged into which survivor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeldReport {
    /// Removed vertex → surviving vertex.
    pub merged: HashMap<VertexId, VertexId>,
}

impl WeldReport {
    /// Whether nothing was merged.
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    /// Number of vertices removed.
    pub fn merged_count(&self) -> usize {
        self.merged.len()
    }

    /// The handle `v` refers to after the weld.
    pub fn resolve(&self, v: VertexId) -> VertexId {
        self.merged.get(&v).copied().unwrap_or(v)
    }
}

impl Canvas {
    pub(crate) fn weld(&mut self, tolerance: f64) -> WeldReport {
        let cell = if tolerance > 0.0 { tolerance } else { 1.0e-9 };
        let mut grid: HashMap<VertexKey, Vec<VertexId>> = HashMap::new();
        let mut merged = HashMap::new();

        for v in self.order.clone() {
            let p = self.vertices[v].point;
            let key = VertexKey::from_point(&p, cell);
            let target = key
                .within(1)
                .filter_map(|k| grid.get(&k))
                .flatten()
                .copied()
                .filter(|r| are_close(&self.vertices[*r].point, &p, tolerance))
                .min_by_key(|r| self.vertices[*r].serial);
            match target {
                Some(survivor) => {
                    merged.insert(v, survivor);
                }
                None => grid.entry(key).or_default().push(v),
            }
        }

        if !merged.is_empty() {
            self.apply_merge(&merged);
            debug!(merged = merged.len(), tolerance, "welded coincident vertices");
        }
        WeldReport { merged }
    }

    /// Rewrite topology through `map` and drop the mapped-away vertices.
    ///
    /// Only edges and faces touching a mapped vertex are rewritten. Edges
    /// collapsing to a point or duplicating another edge are removed. Faces
    /// lose consecutive repeats and are removed once they fall below three
    /// distinct vertices or duplicate another face.
    pub(crate) fn apply_merge(&mut self, map: &HashMap<VertexId, VertexId>) {
        let resolve = |v: VertexId| map.get(&v).copied().unwrap_or(v);
        let moved = |v: &VertexId| map.get(v).is_some_and(|into| into != v);

        let touched: Vec<(EdgeId, Edge)> = self
            .edges
            .iter()
            .filter(|(_, e)| moved(&e.a) || moved(&e.b))
            .map(|(id, e)| (id, *e))
            .collect();
        for (_, e) in &touched {
            self.edge_lookup.remove(&edge_key(e.a, e.b));
        }
        for (id, e) in touched {
            let (a, b) = (resolve(e.a), resolve(e.b));
            let key = edge_key(a, b);
            if a == b || self.edge_lookup.contains_key(&key) {
                self.edges.remove(id);
                continue;
            }
            self.edges[id] = Edge { a, b };
            self.edge_lookup.insert(key, id);
        }

        let touched: Vec<FaceId> = self
            .faces
            .iter()
            .filter(|(_, f)| f.vertices.iter().any(|v| moved(v)))
            .map(|(id, _)| id)
            .collect();
        if !touched.is_empty() {
            let pending: HashSet<FaceId> = touched.iter().copied().collect();
            let mut seen: HashSet<Vec<VertexId>> = self
                .faces
                .iter()
                .filter(|(id, _)| !pending.contains(id))
                .map(|(_, f)| sorted_key(&f.vertices))
                .collect();
            for id in touched {
                let mut ring: Vec<VertexId> = Vec::new();
                for v in self.faces[id].vertices.iter().map(|v| resolve(*v)) {
                    if ring.last() != Some(&v) {
                        ring.push(v);
                    }
                }
                while ring.len() > 1 && ring.first() == ring.last() {
                    ring.pop();
                }
                let key = sorted_key(&ring);
                let mut distinct = key.clone();
                distinct.dedup();
                if ring.len() < 3 || distinct.len() != ring.len() || !seen.insert(key) {
                    self.faces.remove(id);
                } else {
                    self.faces[id].vertices = ring;
                }
            }
        }

        for (from, into) in map {
            if from == into {
                continue;
            }
            let Some(serial) = self.vertices.get(*from).map(|v| v.serial) else {
                continue;
            };
            let vertices = &self.vertices;
            if let Ok(i) = self
                .order
                .binary_search_by_key(&serial, |v| vertices[*v].serial)
            {
                self.order.remove(i);
            }
            if let Some(gone) = self.vertices.remove(*from) {
                self.grid.remove(*from, &gone.point);
            }
        }
        self.selection.remap_vertices(resolve);
        self.prune_selection();
    }
}

fn sorted_key(ring: &[VertexId]) -> Vec<VertexId> {
    let mut key = ring.to_vec();
    key.sort_unstable();
    key
}

fn are_close(a: &Point3, b: &Point3, tolerance: f64) -> bool {
    (a - b).norm_squared() <= tolerance * tolerance
}

/// Side length of a [`VertexGrid`] cell, canvas-local units.
const GRID_CELL: f64 = 0.01;

/// Bucket grid over canvas-local vertex positions, kept in step with the
/// canvas so proximity lookups do not scan every vertex.
#[derive(Debug, Clone, Default)]
pub(crate) struct VertexGrid {
    buckets: HashMap<VertexKey, Vec<VertexId>>,
}

impl VertexGrid {
    pub(crate) fn insert(&mut self, v: VertexId, p: &Point3) {
        self.buckets
            .entry(VertexKey::from_point(p, GRID_CELL))
            .or_default()
            .push(v);
    }

    /// Forget `v`, which must still be filed under `p`.
    pub(crate) fn remove(&mut self, v: VertexId, p: &Point3) {
        let key = VertexKey::from_point(p, GRID_CELL);
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.retain(|u| *u != v);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Vertices filed in cells that can hold a point within `radius` of `p`.
    ///
    /// A superset of the exact hits; callers filter by distance.
    pub(crate) fn candidates(&self, p: &Point3, radius: f64) -> Vec<VertexId> {
        let reach = (radius.max(0.0) / GRID_CELL).ceil().max(1.0);
        let span = 2.0 * reach + 1.0;
        if !reach.is_finite() || span * span * span >= self.buckets.len() as f64 {
            return self.buckets.values().flatten().copied().collect();
        }
        VertexKey::from_point(p, GRID_CELL)
            .within(reach as i64)
            .filter_map(|k| self.buckets.get(&k))
            .flatten()
            .copied()
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VertexKey {
    x: i64,
    y: i64,
    z: i64,
}

impl VertexKey {
    fn from_point(p: &Point3, cell: f64) -> Self {
        Self {
            x: (p.x / cell).floor() as i64,
            y: (p.y / cell).floor() as i64,
            z: (p.z / cell).floor() as i64,
        }
    }

    /// Keys of the cube of cells at most `reach` steps away on each axis.
    fn within(self, reach: i64) -> impl Iterator<Item = VertexKey> {
        (-reach..=reach).flat_map(move |dx| {
            (-reach..=reach).flat_map(move |dy| {
                (-reach..=reach).map(move |dz| VertexKey {
                    x: self.x + dx,
                    y: self.y + dy,
                    z: self.z + dz,
                })
            })
        })
    }
}
