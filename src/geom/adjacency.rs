use ahash::AHashMap;
use anyhow::Result;
use geo::{BoundingRect, Coord, LineString, Relate};
use rstar::AABB;

use crate::geom::Geometries;

/// How rook adjacency between shapes is detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyMethod {
    /// Hash boundary segments after snapping vertices to a grid; shapes sharing a segment are adjacent.
    /// Fast, but requires neighbors to share vertices along common borders.
    #[default]
    SharedSegments,
    /// DE-9IM relate on every bounding-box candidate pair: touching along a line is adjacent.
    Relate,
}

/// Adjacency lists plus shared boundary length for each listed neighbor.
#[derive(Debug, Clone, Default)]
pub struct Adjacencies {
    pub neighbors: Vec<Vec<u32>>,
    pub shared_lengths: Vec<Vec<f64>>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct QuantizedPoint(i64, i64);

/// Undirected segment, stored with canonical (min, max) endpoint order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct Segment(QuantizedPoint, QuantizedPoint);

impl Segment {
    #[inline]
    fn new(a: QuantizedPoint, b: QuantizedPoint) -> Self {
        if (a.0, a.1) <= (b.0, b.1) { Segment(a, b) } else { Segment(b, a) }
    }
}

impl Geometries {
    /// Compute rook adjacencies (shared boundary of positive length) between all shapes.
    /// `scale` is the snapping grid resolution (vertices per coordinate unit).
    pub fn rook_adjacencies(&self, method: AdjacencyMethod, scale: f64) -> Result<Adjacencies> {
        let lengths = self.shared_segment_lengths(scale);

        let mut neighbors = vec![Vec::new(); self.len()];
        let mut shared_lengths = vec![Vec::new(); self.len()];
        let mut push = |i: usize, j: usize, length: f64| {
            neighbors[i].push(j as u32);
            shared_lengths[i].push(length);
            neighbors[j].push(i as u32);
            shared_lengths[j].push(length);
        };

        match method {
            AdjacencyMethod::SharedSegments => {
                let mut pairs = lengths.into_iter().collect::<Vec<_>>();
                pairs.sort_unstable_by_key(|&(pair, _)| pair);
                for ((i, j), length) in pairs { push(i, j, length) }
            }
            AdjacencyMethod::Relate => {
                for (i, shape) in self.shapes().iter().enumerate() {
                    let Some(rect) = shape.bounding_rect() else { continue };
                    let search = AABB::from_corners(rect.min().into(), rect.max().into());

                    let mut candidates = self.query(&search).filter(|&j| j > i).collect::<Vec<_>>();
                    candidates.sort_unstable();

                    for j in candidates {
                        // Boundary/Boundary intersection of dimension 1 is a shared edge.
                        let im = shape.relate(&self.shapes()[j]);
                        if im.is_touches() && im.matches("****1****")? {
                            push(i, j, lengths.get(&(i, j)).copied().unwrap_or(0.0));
                        }
                    }
                }
            }
        }

        for (list, weights) in neighbors.iter_mut().zip(shared_lengths.iter_mut()) {
            let mut pairs = list.iter().copied().zip(weights.iter().copied()).collect::<Vec<_>>();
            pairs.sort_unstable_by_key(|&(j, _)| j);
            (*list, *weights) = pairs.into_iter().unzip();
        }

        Ok(Adjacencies { neighbors, shared_lengths })
    }

    /// Total snapped boundary length shared by each pair of shapes (i < j).
    fn shared_segment_lengths(&self, scale: f64) -> AHashMap<(usize, usize), f64> {
        let quantize = |c: &Coord<f64>| QuantizedPoint((c.x * scale).round() as i64, (c.y * scale).round() as i64);

        // Each segment maps to the shapes containing it, plus its length.
        let mut owners: AHashMap<Segment, (Vec<usize>, f64)> = AHashMap::new();
        let mut add_ring = |ring: &LineString<f64>, idx: usize| {
            for line in ring.lines() {
                let (a, b) = (quantize(&line.start), quantize(&line.end));
                if a == b { continue }
                let entry = owners.entry(Segment::new(a, b))
                    .or_insert_with(|| (Vec::new(), (line.end - line.start).x.hypot((line.end - line.start).y)));
                if entry.0.last() != Some(&idx) { entry.0.push(idx) }
            }
        };

        for (idx, shape) in self.shapes().iter().enumerate() {
            for polygon in &shape.0 {
                add_ring(polygon.exterior(), idx);
                polygon.interiors().iter().for_each(|ring| add_ring(ring, idx));
            }
        }

        let mut lengths = AHashMap::new();
        for (shapes, length) in owners.into_values() {
            for (k, &i) in shapes.iter().enumerate() {
                for &j in &shapes[k + 1..] {
                    *lengths.entry((i.min(j), i.max(j))).or_insert(0.0) += length;
                }
            }
        }
        lengths
    }
}
