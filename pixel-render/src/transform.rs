//! Sprite placement: record → four world-space corners.

use glam::{Affine2, Vec2};

use crate::record::SpriteRecord;

/// Unit-square corners in top-left, top-right, bottom-right, bottom-left order.
const UNIT_CORNERS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Build the sprite's local-to-world transform.
///
/// `translate(position - size * anchor)`, then (only when rotated)
/// `translate(size * anchor) * rotate(rotation) * translate(-size * anchor)`,
/// then `scale(size)` on the unit square. The anchor is both the placement
/// reference and the rotation pivot; changing the order changes where
/// rotated sprites land.
pub fn sprite_transform(record: &SpriteRecord) -> Affine2 {
    let pivot = record.size * record.anchor;
    let mut transform = Affine2::from_translation(record.position - pivot);

    if record.rotation != 0.0 {
        transform = transform
            * Affine2::from_translation(pivot)
            * Affine2::from_angle(record.rotation)
            * Affine2::from_translation(-pivot);
    }

    transform * Affine2::from_scale(record.size)
}

/// World-space corners in top-left, top-right, bottom-right, bottom-left order.
pub fn corners(record: &SpriteRecord) -> [Vec2; 4] {
    let transform = sprite_transform(record);
    UNIT_CORNERS.map(|c| transform.transform_point2(c))
}
