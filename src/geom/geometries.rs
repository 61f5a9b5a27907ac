use anyhow::{bail, Result};
use geo::{BoundingRect, Coord, MultiPolygon, Rect, Relate};
use rstar::{RTree, RTreeObject, AABB};

/// Bounding box of one shape in the R-tree, tagged with the shape's index.
#[derive(Debug, Clone)]
pub(super) struct Envelope {
    idx: usize,
    bbox: Rect<f64>,
}

impl Envelope {
    /// Index of the corresponding MultiPolygon.
    #[inline] pub(super) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for Envelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// A collection of MultiPolygons with an R-tree over their bounding boxes.
/// Empty shapes are kept (so indices line up with attribute rows) but are not indexed.
#[derive(Debug, Clone)]
pub struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<Envelope>,
    epsg: Option<u32>, // Geographic EPSG code, or None once projected
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    pub fn new(shapes: Vec<MultiPolygon<f64>>, epsg: Option<u32>) -> Self {
        let envelopes = shapes.iter().enumerate()
            .filter_map(|(idx, shape)| shape.bounding_rect().map(|bbox| Envelope { idx, bbox }))
            .collect();

        Self { rtree: RTree::bulk_load(envelopes), shapes, epsg }
    }

    /// Get the number of MultiPolygons.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no MultiPolygons.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Geographic EPSG code of the coordinates, or None if projected.
    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    /// Query the R-tree for shapes whose bounding boxes intersect the given envelope.
    #[inline]
    pub(super) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> + '_ {
        self.rtree.locate_in_envelope_intersecting(envelope).map(Envelope::idx)
    }

    /// Compute the bounding rectangle of all MultiPolygons.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|polygon| polygon.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            ))
    }

    /// Indices of shapes with no polygons.
    pub fn empty_shapes(&self) -> Vec<usize> {
        self.shapes.iter().enumerate()
            .filter_map(|(i, shape)| shape.0.is_empty().then_some(i))
            .collect()
    }

    /// Pairs of shapes that overlap in area (or one contains the other).
    /// Pure boundary touches (edge or point) are NOT considered overlaps.
    pub fn overlaps(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, shape) in self.shapes.iter().enumerate() {
            let Some(rect) = shape.bounding_rect() else { continue };
            let search = AABB::from_corners(rect.min().into(), rect.max().into());

            for j in self.query(&search).filter(|&j| j > i) {
                let im = shape.relate(&self.shapes[j]);
                if im.is_intersects() && !im.is_touches() { pairs.push((i, j)) }
            }
        }
        pairs.sort_unstable();
        pairs
    }

    /// Validate that the shapes form a clean planar partition (no empty shapes, no overlaps).
    pub fn doctor(&self) -> Result<()> {
        let empty = self.empty_shapes();
        let overlaps = self.overlaps();

        if !empty.is_empty() || !overlaps.is_empty() {
            bail!(
                "[geom::doctor] {} empty shape(s) (first: {:?}), {} overlapping pair(s) (first: {:?})",
                empty.len(), empty.first(), overlaps.len(), overlaps.first(),
            );
        }
        Ok(())
    }
}
