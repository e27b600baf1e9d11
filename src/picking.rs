// Screen-space picking - maps the cursor ray to an instance index
use bevy::prelude::*;
use crate::instance_buffer::InstanceBuffer;

/// Ray-sphere intersection test
/// Returns the distance along the ray to the nearest hit in front of the origin
pub fn ray_sphere_intersection(
    ray_origin: Vec3,
    ray_direction: Vec3,
    sphere_center: Vec3,
    sphere_radius: f32,
) -> Option<f32> {
    let oc = ray_origin - sphere_center;
    let a = ray_direction.dot(ray_direction);
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * oc.dot(ray_direction);
    let c = oc.dot(oc) - sphere_radius * sphere_radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return None;
    }

    // Entry point into the sphere
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t > 0.0 {
        return Some(t);
    }

    // Exit point, in case the origin is inside the sphere
    let t2 = (-b + discriminant.sqrt()) / (2.0 * a);
    if t2 > 0.0 {
        return Some(t2);
    }

    None
}

/// Nearest instance of `buffer` hit by the ray. Instance bounds are spheres of
/// `mesh_radius * scale` around each instance position, placed in world space by `group_transform`.
/// Hidden (zero-scale) instances are never picked.
pub fn pick_instance(
    ray_origin: Vec3,
    ray_direction: Vec3,
    group_transform: &GlobalTransform,
    buffer: &InstanceBuffer,
    mesh_radius: f32,
) -> Option<(usize, f32)> {
    let group_scale = group_transform.compute_transform().scale.max_element();
    let mut best: Option<(usize, f32)> = None;

    for (index, instance) in buffer.instances().iter().enumerate() {
        if instance.scale <= 0.0 {
            continue;
        }
        let center = group_transform.transform_point(Vec3::from_array(instance.position));
        let radius = mesh_radius * instance.scale * group_scale;
        if let Some(distance) = ray_sphere_intersection(ray_origin, ray_direction, center, radius) {
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
    }
    best
}

/// Pointer target currently under the cursor, across all groups.
#[derive(Resource, Default, Debug)]
pub struct PointerState {
    pub hovered: Option<(Entity, usize)>,
}

/// Events a hover change produces: leave the previous group, enter the new instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerRouting {
    pub leave: Option<Entity>,
    pub enter: Option<(Entity, usize)>,
}

impl PointerState {
    /// Update the hovered target and report what has to be sent.
    /// Moving between instances of the same group only enters the new one;
    /// the group's layer drops the previous hover itself.
    pub fn retarget(&mut self, hit: Option<(Entity, usize)>) -> PointerRouting {
        if hit == self.hovered {
            return PointerRouting::default();
        }
        let previous = std::mem::replace(&mut self.hovered, hit);
        let leave = match (previous, hit) {
            (Some((old, _)), Some((new, _))) if old == new => None,
            (Some((old, _)), _) => Some(old),
            (None, _) => None,
        };
        PointerRouting { leave, enter: hit }
    }
}
