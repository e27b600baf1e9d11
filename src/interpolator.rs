// Per-frame transform interpolation for particle groups
use bevy::prelude::*;
use crate::constants::*;
use crate::group::ParticleGroup;
use crate::instance_buffer::InstanceBuffer;
use crate::interaction::{pop_envelope, InteractionLayer};
use crate::types::*;

/// Inputs shared by every particle of a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
    pub mode: TreeMode,
    /// Seconds since startup, drives oscillations and pop timers
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

impl FrameInput {
    pub fn new(mode: TreeMode, elapsed: f32, delta: f32) -> Self {
        Self { mode, elapsed, delta }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No buffer attached yet; nothing was touched
    Skipped,
    Committed,
}

/// Per-frame values derived once and reused for every particle of the group.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameScratch {
    pub alpha: f32,
    pub visibility: f32,
    pub time: f32,
    pub hover_alpha: f32,
}

/// Convert a per-reference-frame smoothing factor to one matching `delta`.
/// Exact at 60 Hz; zero for paused frames.
pub fn smoothing_factor(alpha: f32, delta: f32) -> f32 {
    if delta <= 0.0 || alpha <= 0.0 {
        return 0.0;
    }
    if alpha >= 1.0 {
        return 1.0;
    }
    let frames = delta / REFERENCE_FRAME_SECS;
    (1.0 - (1.0 - alpha).powf(frames)).clamp(0.0, 1.0)
}

/// Move one particle a step toward the rest pose of `mode`.
/// First-order low-pass: never overshoots, distance shrinks by (1 - alpha) each step.
#[inline]
pub fn step_toward(particle: &mut Particle, mode: TreeMode, alpha: f32) {
    let target = *particle.rest_pose(mode);
    particle.position += (target.position - particle.position) * alpha;
    particle.orientation = particle.orientation.slerp(target.orientation, alpha).normalize();
}

/// Cosmetic motion layered over the smoothed pose; never fed back into it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecondaryMotion {
    pub offset: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl SecondaryMotion {
    const NONE: Self = Self { offset: Vec3::ZERO, rotation: Quat::IDENTITY, scale: 0.0 };
}

pub fn secondary_motion(kind: GroupKind, particle: &Particle, mode: TreeMode, time: f32) -> SecondaryMotion {
    match kind {
        GroupKind::Needles => {
            let wave = match mode {
                // Gentle breathing, coherent along the height of the tree
                TreeMode::Assembled => {
                    (time * TREE_BREATH_FREQUENCY + particle.assembled.position.y).sin() * TREE_BREATH_AMPLITUDE
                }
                // Looser drift, independent per needle
                TreeMode::Scattered => {
                    (time * particle.speed * TREE_DRIFT_FREQUENCY + particle.phase).sin() * TREE_DRIFT_AMPLITUDE
                }
            };
            SecondaryMotion { offset: Vec3::Y * wave, ..SecondaryMotion::NONE }
        }
        GroupKind::Ornaments => SecondaryMotion {
            offset: Vec3::Y * (time + particle.phase).sin() * ORNAMENT_BOB_AMPLITUDE,
            rotation: Quat::from_euler(
                EulerRot::XYZ,
                time * ORNAMENT_TUMBLE_X + particle.phase,
                time * ORNAMENT_TUMBLE_Y + particle.phase,
                0.0,
            ),
            scale: 0.0,
        },
        GroupKind::FairyLights => SecondaryMotion {
            scale: (time * particle.speed + particle.phase).sin() * LIGHT_TWINKLE_AMPLITUDE,
            ..SecondaryMotion::NONE
        },
        GroupKind::Topper => SecondaryMotion {
            rotation: Quat::from_rotation_z(time.sin() * TOPPER_ROCK_AMPLITUDE),
            ..SecondaryMotion::NONE
        },
    }
}

/// Hovered ornaments glow: lighter base color, doubled for emission.
pub fn hover_glow(base: Color) -> LinearRgba {
    let hsla = Hsla::from(base);
    let lighter = hsla.with_lightness((hsla.lightness + ORNAMENT_HOVER_LIGHTEN).min(1.0));
    let linear = Color::from(lighter).to_linear();
    LinearRgba::new(
        linear.red * ORNAMENT_HOVER_GLOW,
        linear.green * ORNAMENT_HOVER_GLOW,
        linear.blue * ORNAMENT_HOVER_GLOW,
        linear.alpha,
    )
}

/// Advance one group by a frame and write every slot into its buffer.
pub fn advance_group(group: &mut ParticleGroup, frame: FrameInput, scratch: &mut FrameScratch) -> FrameOutcome {
    let ParticleGroup { profile, particles, buffer, interaction, spin, visibility, hover_levels, .. } = group;
    let Some(buffer) = buffer.as_mut() else {
        return FrameOutcome::Skipped;
    };

    let frames = if frame.delta > 0.0 { frame.delta / REFERENCE_FRAME_SECS } else { 0.0 };
    *spin = (*spin + profile.spin_rate(frame.mode) * frames) % std::f32::consts::TAU;

    let target_visibility = profile.visibility_target(frame.mode);
    *visibility += (target_visibility - *visibility) * smoothing_factor(profile.visibility_smoothing, frame.delta);

    scratch.alpha = smoothing_factor(profile.smoothing, frame.delta);
    scratch.visibility = *visibility;
    scratch.time = frame.elapsed;
    scratch.hover_alpha = smoothing_factor(profile.hover_smoothing, frame.delta);

    for (index, (particle, hover_level)) in particles.iter_mut().zip(hover_levels.iter_mut()).enumerate() {
        step_toward(particle, frame.mode, scratch.alpha);
        write_instance(profile.kind, profile.hover_scale, index, particle, hover_level, frame.mode, interaction, buffer, scratch);
    }

    buffer.commit();
    FrameOutcome::Committed
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn write_instance(
    kind: GroupKind,
    hover_scale: f32,
    index: usize,
    particle: &Particle,
    hover_level: &mut f32,
    mode: TreeMode,
    interaction: &mut InteractionLayer,
    buffer: &mut InstanceBuffer,
    scratch: &FrameScratch,
) {
    let motion = secondary_motion(kind, particle, mode, scratch.time);
    let hovered = interaction.is_hovered(index);

    // 0 = resting, 1 = fully hovered
    let hover_target = if hovered { 1.0 } else { 0.0 };
    *hover_level += (hover_target - *hover_level) * scratch.hover_alpha;
    let mut scale = (particle.scale + motion.scale).max(0.0) * scratch.visibility;
    scale *= 1.0 + (hover_scale - 1.0) * *hover_level;

    let mut rotation = particle.orientation * motion.rotation;
    if let Some(elapsed) = interaction.pop_elapsed(index, scratch.time) {
        scale *= 1.0 + pop_envelope(elapsed, interaction.pop_duration());
        rotation *= Quat::from_rotation_y(elapsed * POP_SPIN_RATE);
    }

    buffer.set_instance_transform(index, particle.position + motion.offset, rotation, scale);

    if let Some(base) = particle.base_color {
        if hovered {
            buffer.set_instance_color(index, hover_glow(base));
        } else {
            buffer.set_instance_color(index, base);
        }
    }
}
