// Ambient scene motion: the whole-tree float, drifting sparkles and the star field
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::TAU;
use crate::constants::*;
use crate::mode::ModeController;
use crate::types::*;

/// Float parameters for one mode. Assembled floats faster and wider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatParams {
    pub speed: f32,
    pub rotation_intensity: f32,
    pub float_intensity: f32,
}

impl FloatParams {
    pub fn for_mode(mode: TreeMode) -> Self {
        match mode {
            TreeMode::Assembled => Self {
                speed: FLOAT_SPEED_ASSEMBLED,
                rotation_intensity: FLOAT_ROTATION_ASSEMBLED,
                float_intensity: FLOAT_INTENSITY_ASSEMBLED,
            },
            TreeMode::Scattered => Self {
                speed: FLOAT_SPEED_SCATTERED,
                rotation_intensity: FLOAT_ROTATION_SCATTERED,
                float_intensity: FLOAT_INTENSITY_SCATTERED,
            },
        }
    }
}

/// Vertical offset and tilt of the float root at `phase`.
pub fn float_pose(params: FloatParams, phase: f32) -> (f32, Quat) {
    let (sin, cos) = phase.sin_cos();
    let tilt = Quat::from_euler(
        EulerRot::XYZ,
        cos / 8.0 * params.rotation_intensity,
        sin / 8.0 * params.rotation_intensity,
        sin / 20.0 * params.rotation_intensity,
    );
    (sin / 10.0 * params.float_intensity, tilt)
}

impl SceneFloat {
    /// Advance by `delta` seconds. The phase is continuous, so a mode switch
    /// changes the pace without a jump.
    pub fn advance(&mut self, mode: TreeMode, delta: f32) -> (f32, Quat) {
        let params = FloatParams::for_mode(mode);
        self.phase = (self.phase + delta.max(0.0) * params.speed / 4.0) % TAU;
        float_pose(params, self.phase)
    }
}

/// System: Float the tree groups as one body, paced by the current mode
pub fn scene_float_system(
    time: Res<Time>,
    controller: Res<ModeController>,
    mut query: Query<(&mut SceneFloat, &mut Transform)>,
) {
    for (mut float, mut transform) in query.iter_mut() {
        let (offset, tilt) = float.advance(controller.mode(), time.delta_secs());
        transform.translation.y = SCENE_OFFSET_Y + offset;
        transform.rotation = tilt;
    }
}

// ============================================================================
// SPARKLES AND STARS
// ============================================================================

/// Sparkle anchors, uniform in a cube of side `extent` centered on the origin.
pub fn sparkle_anchors(count: usize, extent: f32, seed: u64) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    let half = extent / 2.0;
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
            )
        })
        .collect()
}

pub fn sparkle_offset(phase: f32, time: f32) -> Vec3 {
    let t = time * SPARKLE_SPEED + phase;
    Vec3::new(t.cos(), t.sin(), t.cos()) * SPARKLE_DRIFT
}

/// One background star: position, size and brightness.
#[derive(Clone, Copy, Debug)]
pub struct Star {
    pub position: Vec3,
    pub size: f32,
    pub brightness: f32,
}

/// Stars on a shell from `radius` to `radius + depth`, uniform in direction.
/// Deeper stars fade.
pub fn star_shell(count: usize, radius: f32, depth: f32, factor: f32, seed: u64) -> Vec<Star> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let theta = (1.0 - 2.0 * rng.gen::<f32>()).clamp(-1.0, 1.0).acos();
            let phi = rng.gen::<f32>() * TAU;
            let sink = rng.gen::<f32>();
            let r = radius + depth * sink;
            let direction = Vec3::new(theta.sin() * phi.sin(), theta.cos(), theta.sin() * phi.cos());
            Star {
                position: direction * r,
                size: STAR_SIZE * factor * (0.5 + 0.5 * rng.gen::<f32>()),
                brightness: 1.0 - 0.5 * sink,
            }
        })
        .collect()
}

/// Every star as a small octahedron in one mesh, brightness in vertex colors.
pub fn create_star_field_mesh(stars: &[Star]) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD);

    let mut vertices = Vec::with_capacity(stars.len() * 6);
    let mut normals = Vec::with_capacity(stars.len() * 6);
    let mut colors = Vec::with_capacity(stars.len() * 6);
    let mut indices = Vec::with_capacity(stars.len() * 24);
    for star in stars {
        let base = vertices.len() as u32;
        for axis in [Vec3::Y, Vec3::X, Vec3::Z, -Vec3::X, -Vec3::Z, -Vec3::Y] {
            vertices.push((star.position + axis * star.size).to_array());
            normals.push(axis.to_array());
            colors.push([star.brightness, star.brightness, star.brightness, 1.0]);
        }
        for i in 0..4u32 {
            let a = base + 1 + i;
            let b = base + 1 + (i + 1) % 4;
            indices.extend_from_slice(&[base, b, a, base + 5, a, b]);
        }
    }

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

pub fn spawn_ambience(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let sparkle_mesh = meshes.add(Sphere::new(SPARKLE_SIZE).mesh().uv(8, 6));
    let sparkle_material = materials.add(StandardMaterial {
        base_color: STAR_YELLOW.with_alpha(SPARKLE_OPACITY),
        emissive: LinearRgba::from(STAR_YELLOW) * 2.0,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    for anchor in sparkle_anchors(SPARKLE_COUNT, SPARKLE_EXTENT, AMBIENCE_SEED) {
        commands.spawn((
            Mesh3d(sparkle_mesh.clone()),
            MeshMaterial3d(sparkle_material.clone()),
            Transform::from_translation(anchor),
            Sparkle { anchor, phase: (anchor.x * 100.0) % TAU },
        ));
    }

    let stars = star_shell(STAR_COUNT, STAR_RADIUS, STAR_DEPTH, STAR_FACTOR, AMBIENCE_SEED);
    commands.spawn((
        Mesh3d(meshes.add(create_star_field_mesh(&stars))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            unlit: true,
            ..default()
        })),
        Transform::default(),
        StarField,
    ));
    info!("Spawned {} sparkles and {} stars", SPARKLE_COUNT, stars.len());
}

/// System: Drift each sparkle around its anchor
pub fn sparkle_system(time: Res<Time>, mut query: Query<(&Sparkle, &mut Transform)>) {
    let t = time.elapsed_secs();
    for (sparkle, mut transform) in query.iter_mut() {
        transform.translation = sparkle.anchor + sparkle_offset(sparkle.phase, t);
    }
}

/// Brightness multiplier of the star field; every star pulses together.
pub fn star_twinkle(time: f32) -> f32 {
    (3.0 + (time * STAR_TWINKLE_SPEED + 100.0).sin()) / 4.0
}

/// System: Pulse the star field brightness
pub fn star_twinkle_system(
    time: Res<Time>,
    query: Query<&MeshMaterial3d<StandardMaterial>, With<StarField>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Ok(handle) = query.single() else { return };
    let Some(material) = materials.get_mut(&handle.0) else { return };
    let level = star_twinkle(time.elapsed_secs());
    material.base_color = Color::linear_rgb(level, level, level);
}
