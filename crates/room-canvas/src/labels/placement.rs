//! Chooses one wall candidate per sensor for the current view.

use super::candidates::Candidate;
use crate::camera::Camera;
use crate::config::{LabelFilters, OrderBy};
use glam::{Mat4, Vec2, Vec3};

/// Offset along the front face used for the viewport and obstacle tests.
const Z_FIGHTING_OFFSET: f32 = 0.1;
/// Maximum distance between a candidate and the surface seen at its pixel.
const OBSTRUCTION_EPSILON: f32 = 0.1;

/// World-space lookup of the nearest surface under a screen pixel.
pub trait DepthProbe {
    /// `x`/`y` are pixel coordinates with the origin at the top left.
    fn world_at(&self, x: f32, y: f32, view_projection_inverse: &Mat4) -> Option<Vec3>;
    /// Size of the probed texture in pixels.
    fn size(&self) -> Vec2;
}

/// Camera state the placement depends on.
#[derive(Clone, Copy, Debug)]
pub struct LabelView {
    pub eye: Vec3,
    pub view_projection: Mat4,
    pub view_projection_inverse: Mat4,
}

impl LabelView {
    pub fn from_camera(camera: &Camera) -> Self {
        let view_projection = camera.view_projection();
        Self {
            eye: camera.eye(),
            view_projection,
            view_projection_inverse: view_projection.inverse(),
        }
    }

    fn ndc(&self, p: Vec3) -> Vec2 {
        self.view_projection.project_point3(p).truncate()
    }
}

/// A candidate that passed all enabled filters, with its ranking keys.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scored {
    pub index: usize,
    pub running_length: f32,
    pub distance_to_eye: f32,
    pub facing: f32,
    pub alignment: f32,
}

impl Scored {
    /// Larger is better for every criterion.
    fn key(&self, order: OrderBy) -> f32 {
        match order {
            OrderBy::RunningLength => self.running_length,
            OrderBy::InverseDistanceToCameraEye => -self.distance_to_eye,
            OrderBy::HowDirectlyFacingCamera => self.facing,
            OrderBy::HowStraightlyAlignedHorizontally => self.alignment,
        }
    }

    /// True when `self` is strictly better than `best` on any criterion.
    fn overrides(&self, best: &Self, order_by: &[OrderBy]) -> bool {
        order_by.iter().any(|order| self.key(*order) > best.key(*order))
    }
}

/// Applies the enabled filters to one candidate.
pub fn score(
    index: usize,
    candidate: &Candidate,
    view: &LabelView,
    filters: &LabelFilters,
    depth: Option<&dyn DepthProbe>,
) -> Option<Scored> {
    let to_eye = view.eye - candidate.position;
    let facing = to_eye.normalize_or_zero().dot(candidate.front_face);
    if filters.must_face_camera && facing < 0.0 {
        return None;
    }

    let offset_position = candidate.position + candidate.front_face * Z_FIGHTING_OFFSET;
    let ndc = view.ndc(offset_position);
    if filters.must_be_inside_viewport && (ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0) {
        return None;
    }

    if filters.must_not_be_behind_obstacles {
        if let Some(depth) = depth {
            let screen = Vec2::splat(0.5) + ndc * 0.5;
            let size = depth.size();
            let x = screen.x * size.x;
            let y = (1.0 - screen.y) * size.y;
            if let Some(seen) = depth.world_at(x, y, &view.view_projection_inverse) {
                if seen.distance(candidate.position) > OBSTRUCTION_EPSILON {
                    return None;
                }
            }
        }
    }

    let up_ndc = view.ndc(candidate.position + candidate.up);
    let alignment = (up_ndc - ndc).normalize_or_zero().dot(Vec2::Y);
    if filters.must_not_be_upside_down && alignment < 0.0 {
        return None;
    }

    Some(Scored {
        index,
        running_length: candidate.running_length,
        distance_to_eye: to_eye.length(),
        facing,
        alignment,
    })
}

/// Folds the surviving candidates in input order. A candidate replaces the
/// current best as soon as it beats it on one of the `order_by` criteria,
/// so the result depends on the order of `candidates`. Otherwise the
/// current best is kept.
pub fn select(
    candidates: &[Candidate],
    view: &LabelView,
    filters: &LabelFilters,
    order_by: &[OrderBy],
    depth: Option<&dyn DepthProbe>,
) -> Option<Scored> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(i, c)| score(i, c, view, filters, depth))
        .fold(None, |best: Option<Scored>, current| match best {
            Some(b) if !current.overrides(&b, order_by) => Some(b),
            _ => Some(current),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraPose, SensorValueLabelsConfig};

    fn view() -> LabelView {
        let camera = Camera::new(
            CameraPose {
                eye: Vec3::new(0.0, 1.0, 10.0),
                center: Vec3::new(0.0, 1.0, 0.0),
                up: Vec3::Y,
            },
            1.0,
        );
        LabelView::from_camera(&camera)
    }

    fn wall(x: f32, z: f32, running_length: f32) -> Candidate {
        Candidate {
            position: Vec3::new(x, 1.0, z),
            running_direction: Vec3::X,
            up: Vec3::Y,
            front_face: Vec3::Z,
            running_length,
        }
    }

    fn order() -> Vec<OrderBy> {
        SensorValueLabelsConfig::default().order_by
    }

    struct FlatWall {
        z: f32,
    }

    impl DepthProbe for FlatWall {
        fn world_at(&self, x: f32, y: f32, inv: &Mat4) -> Option<Vec3> {
            // Intersect the pixel ray with the plane z = self.z.
            let ndc = Vec2::new(x / 100.0 * 2.0 - 1.0, 1.0 - y / 100.0 * 2.0);
            let near = inv.project_point3(ndc.extend(0.0));
            let far = inv.project_point3(ndc.extend(1.0));
            let t = (self.z - near.z) / (far.z - near.z);
            Some(near + (far - near) * t)
        }

        fn size(&self) -> Vec2 {
            Vec2::splat(100.0)
        }
    }

    #[test]
    fn back_facing_candidates_are_rejected() {
        let mut c = wall(0.0, 0.0, 1.0);
        c.front_face = -Vec3::Z;
        assert!(score(0, &c, &view(), &LabelFilters::default(), None).is_none());

        let lenient = LabelFilters {
            must_face_camera: false,
            ..LabelFilters::default()
        };
        assert!(score(0, &c, &view(), &lenient, None).is_some());
    }

    #[test]
    fn outside_viewport_is_rejected() {
        let c = wall(100.0, 0.0, 1.0);
        assert!(score(0, &c, &view(), &LabelFilters::default(), None).is_none());
    }

    #[test]
    fn upside_down_is_rejected() {
        let mut c = wall(0.0, 0.0, 1.0);
        c.up = -Vec3::Y;
        assert!(score(0, &c, &view(), &LabelFilters::default(), None).is_none());
    }

    #[test]
    fn occluded_candidates_are_rejected() {
        let visible = wall(0.0, 0.0, 1.0);
        let probe = FlatWall { z: 0.0 };
        assert!(score(0, &visible, &view(), &LabelFilters::default(), Some(&probe)).is_some());

        let occluder = FlatWall { z: 3.0 };
        assert!(score(0, &visible, &view(), &LabelFilters::default(), Some(&occluder)).is_none());
    }

    #[test]
    fn longer_candidate_replaces_shorter() {
        let cands = [wall(0.0, 0.0, 1.0), wall(0.5, -2.0, 3.0)];
        let best = select(&cands, &view(), &LabelFilters::default(), &order(), None).unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn shorter_but_closer_replaces_longer() {
        let cands = [wall(0.0, -2.0, 3.0), wall(0.0, 1.0, 1.0)];
        let best = select(&cands, &view(), &LabelFilters::default(), &order(), None).unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn replacements_accumulate_in_input_order() {
        // 1 beats 0 on length, then 2 beats 1 on distance.
        let cands = [wall(0.0, 0.0, 1.0), wall(0.5, -2.0, 3.0), wall(-0.5, 0.0, 2.0)];
        let best = select(&cands, &view(), &LabelFilters::default(), &order(), None).unwrap();
        assert_eq!(best.index, 2);
    }

    #[test]
    fn worse_on_every_criterion_keeps_best() {
        let cands = [wall(0.0, 1.0, 3.0), wall(0.0, -2.0, 1.0)];
        let by = [OrderBy::RunningLength, OrderBy::InverseDistanceToCameraEye];
        let best = select(&cands, &view(), &LabelFilters::default(), &by, None).unwrap();
        assert_eq!(best.index, 0);
    }

    #[test]
    fn equal_length_prefers_closer_candidate() {
        let cands = [wall(0.0, -2.0, 2.0), wall(0.0, 1.0, 2.0)];
        let best = select(&cands, &view(), &LabelFilters::default(), &order(), None).unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn equal_length_and_distance_prefers_facing() {
        let mut tilted = wall(0.0, 0.0, 2.0);
        tilted.front_face = Vec3::new(0.6, 0.0, 0.8);
        let cands = [tilted, wall(0.0, 0.0, 2.0)];
        let best = select(&cands, &view(), &LabelFilters::default(), &order(), None).unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn full_ties_keep_first_seen() {
        let cands = [wall(0.0, 0.0, 2.0), wall(0.0, 0.0, 2.0)];
        let best = select(&cands, &view(), &LabelFilters::default(), &order(), None).unwrap();
        assert_eq!(best.index, 0);
    }

    #[test]
    fn only_listed_criteria_can_replace() {
        let cands = [wall(0.0, 0.0, 1.0), wall(0.0, -3.0, 5.0)];
        let by_distance = [OrderBy::InverseDistanceToCameraEye];
        let best = select(&cands, &view(), &LabelFilters::default(), &by_distance, None).unwrap();
        assert_eq!(best.index, 0);
        let best = select(&cands, &view(), &LabelFilters::default(), &order(), None).unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn selection_is_idempotent() {
        let cands = [wall(0.0, 0.0, 1.0), wall(0.5, -2.0, 3.0), wall(-0.5, 0.0, 3.0)];
        let probe = FlatWall { z: 0.0 };
        let first = select(&cands, &view(), &LabelFilters::default(), &order(), Some(&probe));
        let second = select(&cands, &view(), &LabelFilters::default(), &order(), Some(&probe));
        assert_eq!(first, second);
    }

    #[test]
    fn nothing_survives_yields_none() {
        let cands = [wall(100.0, 0.0, 1.0), wall(-100.0, 0.0, 1.0)];
        assert!(select(&cands, &view(), &LabelFilters::default(), &order(), None).is_none());
    }
}
