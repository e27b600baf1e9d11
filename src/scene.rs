// Scene setup: camera, lights, tree base and one entity per particle slot
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use std::f32::consts::PI;
use crate::audio::SceneAudio;
use crate::constants::*;
use crate::group::{GroupProfile, ParticleGroup, TreeConfig};
use crate::mode::ModeController;
use crate::types::*;

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mode: Res<ModeController>,
) {
    commands.insert_resource(ClearColor(BACKGROUND_COLOR));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.6, 0.55, 0.45),
        brightness: 250.0,
        affects_lightmapped_meshes: false,
    });

    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            ..default()
        }),
        Transform::from_translation(CAMERA_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
        TreeCamera,
    ));

    // Warm key light from above, cool rim from behind
    commands.spawn((
        SpotLight {
            color: Color::srgb(1.0, 0.9, 0.7),
            intensity: 2_000_000.0,
            range: 40.0,
            outer_angle: PI / 6.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(5.0, 12.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        PointLight {
            color: Color::srgb(0.5, 0.6, 1.0),
            intensity: 400_000.0,
            range: 30.0,
            ..default()
        },
        Transform::from_xyz(-6.0, 4.0, -8.0),
    ));

    // Tree base: pot and gold rim, hidden while scattered
    let base_scale = if mode.mode().is_assembled() { 1.0 } else { 0.0 };
    let pot_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.25, 0.05, 0.05),
        metallic: 0.2,
        perceptual_roughness: 0.6,
        ..default()
    });
    let rim_material = materials.add(StandardMaterial {
        base_color: GOLD,
        metallic: 1.0,
        perceptual_roughness: 0.2,
        ..default()
    });
    commands.spawn((
        Mesh3d(meshes.add(Cylinder::new(1.0, 1.2))),
        MeshMaterial3d(pot_material),
        Transform::from_xyz(0.0, BASE_POT_Y + SCENE_OFFSET_Y, 0.0).with_scale(Vec3::splat(base_scale)),
        ModeScaled { smoothing: BASE_VISIBILITY_SMOOTHING },
    ));
    commands.spawn((
        Mesh3d(meshes.add(Torus::new(0.95, 1.1))),
        MeshMaterial3d(rim_material),
        Transform::from_xyz(0.0, BASE_RING_Y + SCENE_OFFSET_Y, 0.0).with_scale(Vec3::splat(base_scale)),
        ModeScaled { smoothing: BASE_VISIBILITY_SMOOTHING },
    ));

    commands.spawn((
        Text::new(help_line(mode.mode())),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::srgb(0.95, 0.85, 0.55)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        HelpText,
    ));
}

/// Help line for `mode`, naming what the toggle key does next.
pub fn help_line(mode: TreeMode) -> String {
    let action = match mode {
        TreeMode::Assembled => "Scatter",
        TreeMode::Scattered => "Assemble",
    };
    format!("Space / Enter: {action} | Hover and click the ornaments | W: Greeting")
}

/// Mount every configured group under one floating root: a group entity that
/// owns the `ParticleGroup` and spins, with one child entity per instance slot.
pub fn spawn_particle_groups(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<TreeConfig>,
    mode: Res<ModeController>,
    audio: Option<Res<SceneAudio>>,
) {
    let sink = audio.map(|a| a.clone()).unwrap_or_else(SceneAudio::silent).0;
    // The base is not part of the float
    let float_root = commands
        .spawn((
            Transform::from_xyz(0.0, SCENE_OFFSET_Y, 0.0),
            Visibility::default(),
            SceneFloat::default(),
        ))
        .id();

    for profile in &config.groups {
        let mut group = ParticleGroup::new(*profile, config.seed, mode.mode(), sink.clone());
        let mesh = meshes.add(group_mesh(profile));
        // Uncolored groups share one material; colored ones get a material per slot
        let shared_material = materials.add(group_material(profile.kind, None));

        let slots: Vec<(Transform, Option<Handle<StandardMaterial>>)> = group
            .particles
            .iter()
            .map(|particle| {
                let pose = particle.rest_pose(mode.mode());
                let transform = Transform::from_translation(pose.position)
                    .with_rotation(pose.orientation)
                    .with_scale(Vec3::splat(particle.scale * group.visibility));
                let material = profile
                    .colored
                    .then(|| materials.add(group_material(profile.kind, particle.base_color)));
                (transform, material)
            })
            .collect();

        group.attach_buffer();
        info!("Mounted {} group with {} instances", profile.kind.label(), group.len());

        let group_root = commands
            .spawn((Transform::default(), Visibility::default(), group))
            .with_children(|parent| {
                for (index, (transform, material)) in slots.into_iter().enumerate() {
                    let mut slot = parent.spawn((Mesh3d(mesh.clone()), transform, InstanceSlot { index }));
                    match material {
                        Some(material) => {
                            slot.insert((MeshMaterial3d(material.clone()), InstanceMaterial(material)));
                        }
                        None => {
                            slot.insert(MeshMaterial3d(shared_material.clone()));
                        }
                    }
                }
            })
            .id();
        commands.entity(float_root).add_child(group_root);
    }
}

fn group_mesh(profile: &GroupProfile) -> Mesh {
    match profile.kind {
        GroupKind::Needles => create_tetrahedron_mesh(NEEDLE_SIZE),
        GroupKind::Ornaments | GroupKind::FairyLights => Sphere::new(1.0).mesh().uv(24, 16),
        GroupKind::Topper => create_octahedron_mesh(TOPPER_SIZE),
    }
}

fn group_material(kind: GroupKind, base_color: Option<Color>) -> StandardMaterial {
    match kind {
        GroupKind::Needles => StandardMaterial {
            base_color: EMERALD,
            metallic: 0.1,
            perceptual_roughness: 0.8,
            ..default()
        },
        GroupKind::Ornaments => StandardMaterial {
            base_color: base_color.unwrap_or(GOLD),
            metallic: 0.9,
            perceptual_roughness: 0.1,
            ..default()
        },
        GroupKind::FairyLights => StandardMaterial {
            base_color: WARM_WHITE,
            emissive: LinearRgba::from(WARM_WHITE) * 8.0,
            unlit: true,
            ..default()
        },
        GroupKind::Topper => StandardMaterial {
            base_color: STAR_YELLOW,
            emissive: LinearRgba::from(STAR_YELLOW) * 4.0,
            metallic: 1.0,
            perceptual_roughness: 0.2,
            ..default()
        },
    }
}

/// Radius of the picking sphere around one instance at scale 1.
pub fn pick_radius(kind: GroupKind) -> f32 {
    match kind {
        GroupKind::Needles => NEEDLE_SIZE,
        GroupKind::Ornaments | GroupKind::FairyLights => 1.0,
        GroupKind::Topper => TOPPER_SIZE,
    }
}

// ============================================================================
// PROCEDURAL MESHES
// ============================================================================

/// Flat-shaded mesh from a triangle list of positions.
fn flat_mesh(triangles: &[[Vec3; 3]]) -> Mesh {
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD);

    let mut vertices = Vec::with_capacity(triangles.len() * 3);
    let mut normals = Vec::with_capacity(triangles.len() * 3);
    for [a, b, c] in triangles {
        let normal = (*b - *a).cross(*c - *a).normalize_or_zero();
        for vertex in [a, b, c] {
            vertices.push(vertex.to_array());
            normals.push(normal.to_array());
        }
    }
    let indices: Vec<u32> = (0..vertices.len() as u32).collect();

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Regular tetrahedron with circumradius `size`.
pub fn create_tetrahedron_mesh(size: f32) -> Mesh {
    let s = size / 3.0_f32.sqrt();
    let p = [
        Vec3::new(s, s, s),
        Vec3::new(-s, -s, s),
        Vec3::new(-s, s, -s),
        Vec3::new(s, -s, -s),
    ];
    flat_mesh(&[
        [p[0], p[1], p[3]],
        [p[0], p[2], p[1]],
        [p[0], p[3], p[2]],
        [p[1], p[2], p[3]],
    ])
}

/// Octahedron with vertices `size` away from the center along each axis.
pub fn create_octahedron_mesh(size: f32) -> Mesh {
    let top = Vec3::Y * size;
    let bottom = -top;
    let ring = [Vec3::X * size, Vec3::Z * size, -Vec3::X * size, -Vec3::Z * size];

    let mut triangles = Vec::with_capacity(8);
    for i in 0..4 {
        let a = ring[i];
        let b = ring[(i + 1) % 4];
        triangles.push([top, b, a]);
        triangles.push([bottom, a, b]);
    }
    flat_mesh(&triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;

    fn outward_faces(mesh: &Mesh) -> bool {
        let Some(VertexAttributeValues::Float32x3(positions)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION) else {
            return false;
        };
        let Some(VertexAttributeValues::Float32x3(normals)) = mesh.attribute(Mesh::ATTRIBUTE_NORMAL) else {
            return false;
        };
        positions.chunks(3).zip(normals.chunks(3)).all(|(tri, n)| {
            let centroid = (Vec3::from_array(tri[0]) + Vec3::from_array(tri[1]) + Vec3::from_array(tri[2])) / 3.0;
            centroid.dot(Vec3::from_array(n[0])) > 0.0
        })
    }

    #[test]
    fn procedural_meshes_face_outward() {
        let tetra = create_tetrahedron_mesh(NEEDLE_SIZE);
        assert_eq!(tetra.count_vertices(), 12);
        assert!(outward_faces(&tetra));

        let octa = create_octahedron_mesh(TOPPER_SIZE);
        assert_eq!(octa.count_vertices(), 24);
        assert!(outward_faces(&octa));
    }

    #[test]
    fn help_line_names_the_next_action() {
        assert!(help_line(TreeMode::Assembled).starts_with("Space / Enter: Scatter"));
        assert!(help_line(TreeMode::Scattered).starts_with("Space / Enter: Assemble"));
    }

    #[test]
    fn only_ornaments_get_per_slot_materials() {
        for kind in GroupKind::ALL {
            assert_eq!(GroupProfile::for_kind(kind).colored, kind == GroupKind::Ornaments);
        }
        let red = group_material(GroupKind::Ornaments, Some(CARDINAL_RED));
        assert_eq!(red.base_color, CARDINAL_RED);
    }
}
