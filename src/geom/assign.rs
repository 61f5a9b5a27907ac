use anyhow::{anyhow, Result};
use geo::{Area, BooleanOps, BoundingRect, Contains, InteriorPoint};
use rstar::AABB;

use crate::geom::Geometries;

impl Geometries {
    /// Assign each shape in `self` to the shape in `targets` it overlaps the most.
    ///
    /// A source inside the only target its bounding box meets is assigned to it
    /// directly. Otherwise the target with the largest intersection area wins, ties
    /// going to the lower index. Sources with no area overlap fall back to the target that
    /// contains their interior point. Errors if a source cannot be placed at all.
    pub fn assign_to(&self, targets: &Geometries) -> Result<Vec<u32>> {
        self.shapes().iter().enumerate()
            .map(|(i, source)| {
                let rect = source.bounding_rect()
                    .ok_or_else(|| anyhow!("[geom::assign] source shape {i} is empty"))?;
                let envelope = AABB::from_corners(rect.min().into(), rect.max().into());

                let mut candidates = targets.query(&envelope).collect::<Vec<_>>();
                candidates.sort_unstable();

                if let [only] = candidates[..] {
                    if targets.shapes()[only].contains(source) { return Ok(only as u32) }
                }

                let best = candidates.iter()
                    .map(|&j| (j, source.intersection(&targets.shapes()[j]).unsigned_area()))
                    .filter(|&(_, area)| area > 0.0)
                    .fold(None, |best: Option<(usize, f64)>, (j, area)| match best {
                        Some((_, best_area)) if best_area >= area => best,
                        _ => Some((j, area)),
                    });

                if let Some((j, _)) = best { return Ok(j as u32) }

                let point = source.interior_point()
                    .ok_or_else(|| anyhow!("[geom::assign] source shape {i} has no interior point"))?;
                candidates.into_iter()
                    .find(|&j| targets.shapes()[j].contains(&point))
                    .map(|j| j as u32)
                    .ok_or_else(|| anyhow!("[geom::assign] source shape {i} does not overlap any target"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    use crate::geom::tests::{rect, square};

    #[test]
    fn contained_sources_map_to_their_container() {
        let targets = Geometries::new(vec![square(0.0, 0.0, 2.0), square(2.0, 0.0, 2.0)], None);
        let sources = Geometries::new(vec![
            square(0.5, 0.5, 0.5),
            square(2.5, 1.0, 0.5),
            square(0.0, 0.0, 1.0),
        ], None);

        assert_eq!(sources.assign_to(&targets).unwrap(), vec![0, 1, 0]);
    }

    #[test]
    fn straddling_source_goes_to_largest_overlap() {
        let targets = Geometries::new(vec![square(0.0, 0.0, 2.0), square(2.0, 0.0, 2.0)], None);
        // 0.5 units inside target 0, 1.0 units inside target 1.
        let sources = Geometries::new(vec![rect(1.5, 0.0, 3.0, 1.0)], None);
        assert_eq!(sources.assign_to(&targets).unwrap(), vec![1]);
    }

    #[test]
    fn equal_overlap_ties_go_to_lower_index() {
        let targets = Geometries::new(vec![square(0.0, 0.0, 2.0), square(2.0, 0.0, 2.0)], None);
        let sources = Geometries::new(vec![rect(1.0, 0.0, 3.0, 1.0)], None);
        assert_eq!(sources.assign_to(&targets).unwrap(), vec![0]);
    }

    #[test]
    fn disjoint_source_is_an_error() {
        let targets = Geometries::new(vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)], None);
        let sources = Geometries::new(vec![square(10.0, 10.0, 1.0)], None);
        assert!(sources.assign_to(&targets).is_err());
    }

    #[test]
    fn corner_contact_with_a_single_target_is_an_error() {
        let targets = Geometries::new(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)], None);
        // Meets target 0 only at the point (1, 1).
        let triangle = MultiPolygon(vec![polygon![(x: 0.5, y: 1.5), (x: 1.5, y: 1.5), (x: 1.5, y: 0.5)]]);
        let sources = Geometries::new(vec![triangle], None);
        assert!(sources.assign_to(&targets).is_err());
    }

    #[test]
    fn partially_covered_single_candidate_still_assigned() {
        let targets = Geometries::new(vec![square(0.0, 0.0, 2.0)], None);
        let sources = Geometries::new(vec![rect(1.0, 1.0, 3.0, 3.0)], None);
        assert_eq!(sources.assign_to(&targets).unwrap(), vec![0]);
    }

    #[test]
    fn assignment_is_total() {
        let targets = Geometries::new((0..3).map(|i| square(i as f64 * 3.0, 0.0, 3.0)).collect(), None);
        let sources = Geometries::new((0..9).map(|i| square(i as f64, 1.0, 1.0)).collect(), None);

        let assignment = sources.assign_to(&targets).unwrap();
        assert_eq!(assignment, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
    }
}
