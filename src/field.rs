// Particle field generation - builds every group's population once at mount
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};
use crate::constants::*;
use crate::types::*;

/// Randomized per-particle attributes produced alongside the poses
#[derive(Clone, Copy, Debug)]
pub struct Attributes {
    pub scale: f32,
    pub phase: f32,
    pub speed: f32,
    pub base_color: Option<Color>,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            scale: 1.0,
            phase: 0.0,
            speed: 1.0,
            base_color: None,
        }
    }
}

/// Build `count` particles from an assembled layout, a scattered layout and an
/// attribute sampler. Each particle starts on the rest pose of `initial_mode`.
pub fn generate_field<R, A, S, T>(
    count: usize,
    rng: &mut R,
    initial_mode: TreeMode,
    mut assembled_layout: A,
    mut scattered_layout: S,
    mut attributes: T,
) -> Vec<Particle>
where
    R: Rng,
    A: FnMut(usize, usize, &mut R) -> Pose,
    S: FnMut(usize, usize, &mut R) -> Pose,
    T: FnMut(usize, &mut R) -> Attributes,
{
    let mut particles = Vec::with_capacity(count);
    for i in 0..count {
        let assembled = assembled_layout(i, count, rng);
        let scattered = scattered_layout(i, count, rng);
        let attrs = attributes(i, rng);
        let start = match initial_mode {
            TreeMode::Assembled => assembled,
            TreeMode::Scattered => scattered,
        };

        particles.push(Particle {
            assembled,
            scattered,
            position: start.position,
            orientation: start.orientation,
            scale: attrs.scale,
            phase: attrs.phase,
            speed: attrs.speed,
            base_color: attrs.base_color,
        });
    }
    particles
}

/// Generate the population for one of the built-in groups.
pub fn generate_group(kind: GroupKind, count: usize, seed: u64, initial_mode: TreeMode) -> Vec<Particle> {
    // Mix the kind into the seed so groups sharing a seed do not mirror each other
    let mut rng = StdRng::seed_from_u64(seed ^ ((kind as u64 + 1) << 32));

    match kind {
        GroupKind::Needles => generate_field(
            count,
            &mut rng,
            initial_mode,
            |i, _, rng| cone_spiral_pose(i, rng),
            |_, _, rng| scattered_pose(TREE_SCATTER_RADIUS, rng),
            |_, rng| Attributes {
                scale: rng.gen_range(0.5..1.0),
                phase: rng.gen_range(0.0..PI),
                speed: rng.gen_range(0.02..0.04),
                base_color: None,
            },
        ),
        GroupKind::Ornaments => generate_field(
            count,
            &mut rng,
            initial_mode,
            |i, n, _| helix_pose(i, n),
            |_, _, rng| scattered_pose(ORNAMENT_SCATTER_RADIUS, rng),
            |_, rng| {
                let base_color = if rng.gen::<f32>() < ORNAMENT_RED_CHANCE { CARDINAL_RED } else { GOLD };
                Attributes {
                    scale: rng.gen_range(0.12..0.24),
                    phase: rng.gen_range(0.0..PI),
                    speed: 1.0,
                    base_color: Some(base_color),
                }
            },
        ),
        GroupKind::FairyLights => generate_field(
            count,
            &mut rng,
            initial_mode,
            |_, _, rng| light_pose(rng),
            |_, _, rng| scattered_pose(LIGHT_SCATTER_RADIUS, rng),
            |_, rng| Attributes {
                scale: LIGHT_BASE_SCALE,
                phase: rng.gen_range(0.0..PI),
                speed: rng.gen_range(0.5..1.0),
                base_color: None,
            },
        ),
        GroupKind::Topper => generate_field(
            count,
            &mut rng,
            initial_mode,
            |_, _, _| Pose::at(Vec3::new(0.0, TOPPER_HEIGHT, 0.0)),
            |_, _, rng| scattered_pose(TOPPER_SCATTER_RADIUS, rng),
            |_, _| Attributes {
                scale: TOPPER_SCALE,
                ..default()
            },
        ),
    }
}

/// Cone spiral used by the needles: power-law height bias, radius shrinking
/// toward the tip, and a twist that grows with height. Faces away from the trunk.
pub fn cone_spiral_pose<R: Rng>(index: usize, rng: &mut R) -> Pose {
    // 0 at the top, 1 at the base
    let y_norm = rng.gen::<f32>().powf(TREE_HEIGHT_BIAS);
    let y = (1.0 - y_norm) * TREE_HEIGHT - TREE_HEIGHT / 2.0;

    let radius = y_norm * TREE_BASE_RADIUS;
    let angle = index as f32 * TREE_SPIRAL_STEP + TAU * y;

    let tx = angle.cos() * radius;
    let tz = angle.sin() * radius;

    let position = Vec3::new(
        tx + (rng.gen::<f32>() - 0.5) * TREE_JITTER,
        y,
        tz + (rng.gen::<f32>() - 0.5) * TREE_JITTER,
    );

    Pose::new(position, outward_orientation(position, Vec3::new(tx * 2.0, y, tz * 2.0)))
}

/// Orientation that looks from `position` toward `target`, horizontally away from the trunk.
/// Falls back to identity when the two points coincide (needles on the axis).
pub fn outward_orientation(position: Vec3, target: Vec3) -> Quat {
    let direction = target - position;
    if direction.length_squared() < 1e-8 {
        return Quat::IDENTITY;
    }
    let up = if direction.normalize().dot(Vec3::Y).abs() > 0.999 { Vec3::Z } else { Vec3::Y };
    Transform::from_translation(position).looking_at(target, up).rotation
}

/// Helical placement for ornaments: angle, height and radius all follow the normalized index.
pub fn helix_pose(index: usize, count: usize) -> Pose {
    let t = if count == 0 { 0.0 } else { index as f32 / count as f32 };
    let angle = t * ORNAMENT_TURNS;
    let y = t * ORNAMENT_SPIRAL_HEIGHT - ORNAMENT_SPIRAL_HEIGHT / 2.0;
    let radius = (1.0 - t) * ORNAMENT_BASE_RADIUS + ORNAMENT_MIN_RADIUS;

    Pose::at(Vec3::new(angle.cos() * radius, y, angle.sin() * radius))
}

/// Random height on the cone surface with a random bearing.
pub fn light_pose<R: Rng>(rng: &mut R) -> Pose {
    let half = LIGHT_SPIRAL_HEIGHT / 2.0;
    let h = rng.gen_range(-half..half);
    let r = (1.0 - (h + half) / LIGHT_SPIRAL_HEIGHT) * LIGHT_BASE_RADIUS;
    let angle = rng.gen_range(0.0..TAU);

    Pose::at(Vec3::new(angle.cos() * r, h, angle.sin() * r))
}

/// Uniform position in a cube of side `radius` centred on the origin, uniformly random orientation.
pub fn scattered_pose<R: Rng>(radius: f32, rng: &mut R) -> Pose {
    let position = Vec3::new(
        (rng.gen::<f32>() - 0.5) * radius,
        (rng.gen::<f32>() - 0.5) * radius,
        (rng.gen::<f32>() - 0.5) * radius,
    );
    Pose::new(position, random_rotation(rng))
}

/// Uniformly distributed unit quaternion (Shoemake's subgroup algorithm).
pub fn random_rotation<R: Rng>(rng: &mut R) -> Quat {
    let u1: f32 = rng.gen();
    let u2: f32 = rng.gen_range(0.0..TAU);
    let u3: f32 = rng.gen_range(0.0..TAU);

    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    Quat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos()).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_exactly_n_finite_records() {
        for kind in GroupKind::ALL {
            for count in [0, 1, 17, 90] {
                let particles = generate_group(kind, count, 7, TreeMode::Assembled);
                assert_eq!(particles.len(), count);
                for p in &particles {
                    assert!(p.assembled.is_finite(), "{:?} assembled pose not finite", kind);
                    assert!(p.scattered.is_finite(), "{:?} scattered pose not finite", kind);
                    assert!((p.assembled.orientation.length() - 1.0).abs() < 1e-4);
                    assert!((p.scattered.orientation.length() - 1.0).abs() < 1e-4);
                }
            }
        }
    }

    #[test]
    fn same_seed_reproduces_the_field() {
        let a = generate_group(GroupKind::Needles, 64, 42, TreeMode::Scattered);
        let b = generate_group(GroupKind::Needles, 64, 42, TreeMode::Scattered);
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.assembled, pb.assembled);
            assert_eq!(pa.scattered, pb.scattered);
            assert_eq!(pa.scale, pb.scale);
        }
    }

    #[test]
    fn particles_start_on_the_initial_mode_pose() {
        let assembled = generate_group(GroupKind::Ornaments, 30, 1, TreeMode::Assembled);
        assert!(assembled.iter().all(|p| p.position == p.assembled.position));

        let scattered = generate_group(GroupKind::Ornaments, 30, 1, TreeMode::Scattered);
        assert!(scattered.iter().all(|p| p.position == p.scattered.position
            && p.orientation == p.scattered.orientation));
    }

    #[test]
    fn needles_fill_a_cone() {
        let needles = generate_group(GroupKind::Needles, TREE_NEEDLE_COUNT, 3, TreeMode::Assembled);
        let half = TREE_HEIGHT / 2.0;
        for p in &needles {
            let pos = p.assembled.position;
            assert!(pos.y >= -half - 1e-4 && pos.y <= half + 1e-4);
            // Allowed radius at this height plus the jitter diagonal
            let y_norm = 1.0 - (pos.y + half) / TREE_HEIGHT;
            let radial = Vec2::new(pos.x, pos.z).length();
            assert!(radial <= y_norm * TREE_BASE_RADIUS + TREE_JITTER);
        }

        // Power-law bias: more needles in the lower half than the upper half
        let lower = needles.iter().filter(|p| p.assembled.position.y < 0.0).count();
        assert!(lower > needles.len() / 2);
    }

    #[test]
    fn needles_face_away_from_the_trunk() {
        let needles = generate_group(GroupKind::Needles, 200, 9, TreeMode::Assembled);
        for p in &needles {
            let pos = p.assembled.position;
            let radial = Vec3::new(pos.x, 0.0, pos.z);
            if radial.length() < 0.5 {
                continue;
            }
            // Bevy's forward is -Z
            let forward = p.assembled.orientation * Vec3::NEG_Z;
            assert!(forward.dot(radial) > -0.2, "needle at {:?} faces inward", pos);
        }
    }

    #[test]
    fn scattered_positions_stay_inside_the_cube() {
        for (kind, radius) in [
            (GroupKind::Needles, TREE_SCATTER_RADIUS),
            (GroupKind::Ornaments, ORNAMENT_SCATTER_RADIUS),
            (GroupKind::FairyLights, LIGHT_SCATTER_RADIUS),
        ] {
            for p in generate_group(kind, 120, 5, TreeMode::Assembled) {
                let pos = p.scattered.position;
                assert!(pos.abs().max_element() <= radius / 2.0);
            }
        }
    }

    #[test]
    fn ornament_helix_climbs_and_narrows() {
        let first = helix_pose(0, ORNAMENT_COUNT).position;
        let last = helix_pose(ORNAMENT_COUNT - 1, ORNAMENT_COUNT).position;
        assert!((first.y + ORNAMENT_SPIRAL_HEIGHT / 2.0).abs() < 1e-5);
        assert!(last.y > first.y);
        assert!(Vec2::new(last.x, last.z).length() < Vec2::new(first.x, first.z).length());
    }

    #[test]
    fn ornaments_only_use_the_two_base_colors() {
        let ornaments = generate_group(GroupKind::Ornaments, ORNAMENT_COUNT, 11, TreeMode::Assembled);
        let reds = ornaments.iter().filter(|p| p.base_color == Some(CARDINAL_RED)).count();
        let golds = ornaments.iter().filter(|p| p.base_color == Some(GOLD)).count();
        assert_eq!(reds + golds, ORNAMENT_COUNT);
        assert!(reds > 0 && golds > reds);
    }

    #[test]
    fn random_rotation_is_normalized() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..256 {
            let q = random_rotation(&mut rng);
            assert!((q.length() - 1.0).abs() < 1e-5);
        }
    }
}
