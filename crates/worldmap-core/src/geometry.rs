//! Region geometry on a cylindrical map.
//!
//! The map's x-axis wraps at the map width: a province touching the right
//! edge is a neighbour of one touching the left edge. Every merge in this
//! module therefore picks the wraparound placement that keeps the merged
//! box narrowest, and centers of mass are averaged on the cylinder.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in map pixels. `x` is kept in `[0, map_width)` after a
/// merge; `x + w` may exceed the map width when the box wraps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.w
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x as f64 + self.w as f64 / 2.0,
            y: self.y as f64 + self.h as f64 / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Derived geometry of a composite entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub bounding_box: BoundingBox,
    pub center_of_mass: Point,
    pub mass: u64,
}

impl Region {
    /// Geometry of a single leaf province.
    pub fn leaf(bounding_box: BoundingBox, mass: u64) -> Self {
        Self {
            bounding_box,
            center_of_mass: bounding_box.center(),
            mass,
        }
    }

    /// The `{0,0,0,0}` region given to entities without valid members.
    pub fn is_empty(&self) -> bool {
        self.mass == 0 && self.bounding_box == BoundingBox::default()
    }
}

/// Union of two boxes, choosing the wraparound placement of `b` that
/// minimizes the merged width. `map_width <= 0` disables wrapping.
pub fn merge_boxes(a: BoundingBox, b: BoundingBox, map_width: i32) -> BoundingBox {
    let top = a.y.min(b.y);
    let bottom = a.bottom().max(b.bottom());

    let shifts: &[i32] = if map_width > 0 {
        &[0, -map_width, map_width]
    } else {
        &[0]
    };

    let mut best: Option<(i32, i32)> = None;
    for &shift in shifts {
        let left = a.x.min(b.x + shift);
        let right = a.right().max(b.right() + shift);
        if best.is_none_or(|(l, r)| right - left < r - l) {
            best = Some((left, right));
        }
    }
    let (mut left, right) = best.unwrap_or((a.x, a.right()));
    let mut width = right - left;

    if map_width > 0 {
        if width >= map_width {
            left = 0;
            width = map_width;
        } else {
            left = left.rem_euclid(map_width);
        }
    }

    BoundingBox::new(left, top, width, bottom - top)
}

/// Reduce member regions into one.
///
/// Mass is the sum of member masses; the center of mass is the
/// mass-weighted centroid with every member's x unwrapped to lie within half
/// a map width of the first member. An empty slice yields the zero region.
pub fn merge_regions(members: &[Region], map_width: i32) -> Region {
    let Some(first) = members.first() else {
        return Region::default();
    };

    let bounding_box = members[1..]
        .iter()
        .fold(first.bounding_box, |acc, m| {
            merge_boxes(acc, m.bounding_box, map_width)
        });

    let mass: u64 = members.iter().map(|m| m.mass).sum();
    let reference_x = first.center_of_mass.x;
    let half = map_width as f64 / 2.0;

    // Zero-mass members still count, with unit weight, when nothing has mass.
    let weight = |m: &Region| {
        if mass == 0 { 1.0 } else { m.mass as f64 }
    };
    let total_weight: f64 = members.iter().map(weight).sum();

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for m in members {
        let mut x = m.center_of_mass.x;
        if map_width > 0 {
            if x - reference_x > half {
                x -= map_width as f64;
            } else if reference_x - x > half {
                x += map_width as f64;
            }
        }
        sum_x += x * weight(m);
        sum_y += m.center_of_mass.y * weight(m);
    }

    let mut cx = sum_x / total_weight;
    if map_width > 0 {
        cx = cx.rem_euclid(map_width as f64);
    }

    Region {
        bounding_box,
        center_of_mass: Point::new(cx, sum_y / total_weight),
        mass,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_without_wrap_is_plain_union() {
        let a = BoundingBox::new(10, 10, 5, 5);
        let b = BoundingBox::new(20, 0, 10, 8);
        assert_eq!(merge_boxes(a, b, 100), BoundingBox::new(10, 0, 20, 15));
    }

    #[test]
    fn merge_prefers_wraparound_span() {
        // a covers 95..105 (wrapping to 5), b covers 2..5.
        let a = BoundingBox::new(95, 0, 10, 4);
        let b = BoundingBox::new(2, 1, 3, 4);
        let merged = merge_boxes(a, b, 100);
        let naive = a.right().max(b.right()) - a.x.min(b.x);
        assert!(merged.w <= 12, "merged width {} not cylindrical", merged.w);
        assert!(merged.w < naive);
        assert_eq!(merged, BoundingBox::new(95, 0, 10, 5));
    }

    #[test]
    fn merge_wrap_normalizes_x_into_map() {
        let a = BoundingBox::new(2, 0, 3, 3);
        let b = BoundingBox::new(97, 0, 2, 3);
        let merged = merge_boxes(a, b, 100);
        assert_eq!(merged, BoundingBox::new(97, 0, 8, 3));
    }

    #[test]
    fn merge_caps_width_at_map_width() {
        let a = BoundingBox::new(0, 0, 60, 1);
        let b = BoundingBox::new(50, 0, 60, 1);
        let merged = merge_boxes(a, b, 100);
        assert_eq!(merged.x, 0);
        assert_eq!(merged.w, 100);
    }

    #[test]
    fn merge_without_map_width_never_wraps() {
        let a = BoundingBox::new(95, 0, 10, 1);
        let b = BoundingBox::new(2, 0, 3, 1);
        assert_eq!(merge_boxes(a, b, 0), BoundingBox::new(2, 0, 103, 1));
    }

    #[test]
    fn empty_members_give_zero_region() {
        let region = merge_regions(&[], 100);
        assert_eq!(region, Region::default());
        assert!(region.is_empty());
    }

    #[test]
    fn mass_is_summed_and_center_weighted() {
        let a = Region::leaf(BoundingBox::new(0, 0, 10, 10), 1);
        let b = Region::leaf(BoundingBox::new(20, 0, 10, 10), 3);
        let merged = merge_regions(&[a, b], 1000);
        assert_eq!(merged.mass, 4);
        assert_eq!(merged.bounding_box, BoundingBox::new(0, 0, 30, 10));
        // (5 * 1 + 25 * 3) / 4 = 20
        assert!((merged.center_of_mass.x - 20.0).abs() < 1e-9);
        assert!((merged.center_of_mass.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn center_of_mass_wraps_around_seam() {
        let a = Region::leaf(BoundingBox::new(96, 0, 2, 2), 1); // center 97
        let b = Region::leaf(BoundingBox::new(2, 0, 2, 2), 1); // center 3
        let merged = merge_regions(&[a, b], 100);
        // Averaged on the cylinder: (97 + 103) / 2 = 100 -> 0.
        assert!(merged.center_of_mass.x.abs() < 1e-9);
        assert!(merged.bounding_box.w <= 8);
    }

    #[test]
    fn single_member_is_returned_unchanged() {
        let a = Region::leaf(BoundingBox::new(4, 5, 6, 7), 2);
        assert_eq!(merge_regions(&[a], 100), a);
    }
}
