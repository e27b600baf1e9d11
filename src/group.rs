// Particle groups - one population with its buffer, interaction state and spin
use bevy::prelude::*;
use std::sync::Arc;
use crate::audio::AudioSink;
use crate::constants::*;
use crate::field::generate_group;
use crate::instance_buffer::InstanceBuffer;
use crate::interaction::{InteractionLayer, InteractionRules};
use crate::types::*;

/// Tunables for one group. `Default`-built from the constants, overridable through `TreeConfig`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupProfile {
    pub kind: GroupKind,
    pub count: usize,
    pub smoothing: f32,
    pub spin_assembled: f32,
    pub spin_scattered: f32,
    /// Scale factor the group fades to while scattered (topper hides itself)
    pub scattered_visibility: f32,
    pub visibility_smoothing: f32,
    pub hover_scale: f32,
    /// Per-frame easing toward the hover scale; 1 snaps
    pub hover_smoothing: f32,
    pub rules: InteractionRules,
    pub colored: bool,
}

impl GroupProfile {
    pub fn for_kind(kind: GroupKind) -> Self {
        match kind {
            GroupKind::Needles => Self {
                kind,
                count: TREE_NEEDLE_COUNT,
                smoothing: TREE_SMOOTHING,
                spin_assembled: TREE_SPIN_ASSEMBLED,
                spin_scattered: TREE_SPIN_SCATTERED,
                scattered_visibility: 1.0,
                visibility_smoothing: TREE_SMOOTHING,
                hover_scale: 1.0,
                hover_smoothing: 1.0,
                rules: InteractionRules::NONE,
                colored: false,
            },
            GroupKind::Ornaments => Self {
                kind,
                count: ORNAMENT_COUNT,
                smoothing: ORNAMENT_SMOOTHING,
                spin_assembled: ORNAMENT_SPIN_ASSEMBLED,
                spin_scattered: ORNAMENT_SPIN_SCATTERED,
                scattered_visibility: 1.0,
                visibility_smoothing: ORNAMENT_SMOOTHING,
                hover_scale: ORNAMENT_HOVER_SCALE,
                hover_smoothing: 1.0,
                rules: InteractionRules::ORNAMENT,
                colored: true,
            },
            GroupKind::FairyLights => Self {
                kind,
                count: FAIRY_LIGHT_COUNT,
                smoothing: LIGHT_SMOOTHING,
                spin_assembled: LIGHT_SPIN_ASSEMBLED,
                spin_scattered: LIGHT_SPIN_SCATTERED,
                scattered_visibility: 1.0,
                visibility_smoothing: LIGHT_SMOOTHING,
                hover_scale: 1.0,
                hover_smoothing: 1.0,
                rules: InteractionRules::NONE,
                colored: false,
            },
            GroupKind::Topper => Self {
                kind,
                count: TOPPER_COUNT,
                smoothing: TOPPER_SMOOTHING,
                spin_assembled: TOPPER_SPIN_ASSEMBLED,
                spin_scattered: TOPPER_SPIN_SCATTERED,
                scattered_visibility: 0.0,
                visibility_smoothing: TOPPER_VISIBILITY_SMOOTHING,
                hover_scale: TOPPER_HOVER_SCALE,
                hover_smoothing: TOPPER_HOVER_SMOOTHING,
                rules: InteractionRules::TOPPER,
                colored: false,
            },
        }
    }

    /// Whole-group spin in radians per reference frame for `mode`.
    pub fn spin_rate(&self, mode: TreeMode) -> f32 {
        match mode {
            TreeMode::Assembled => self.spin_assembled,
            TreeMode::Scattered => self.spin_scattered,
        }
    }

    pub fn visibility_target(&self, mode: TreeMode) -> f32 {
        match mode {
            TreeMode::Assembled => 1.0,
            TreeMode::Scattered => self.scattered_visibility,
        }
    }
}

/// Scene-wide configuration read at startup.
#[derive(Resource, Clone, Debug)]
pub struct TreeConfig {
    pub seed: u64,
    pub groups: Vec<GroupProfile>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_FIELD_SEED,
            groups: GroupKind::ALL.iter().map(|&kind| GroupProfile::for_kind(kind)).collect(),
        }
    }
}

impl TreeConfig {
    pub fn profile(&self, kind: GroupKind) -> Option<&GroupProfile> {
        self.groups.iter().find(|p| p.kind == kind)
    }
}

/// One mounted population. Dropping the component releases its buffer and cancels its pops.
#[derive(Component)]
pub struct ParticleGroup {
    pub profile: GroupProfile,
    pub particles: Vec<Particle>,
    pub buffer: Option<InstanceBuffer>,
    pub interaction: InteractionLayer,
    /// Accumulated rotation of the whole group about Y
    pub spin: f32,
    pub visibility: f32,
    /// Per-slot hover blend, 0 resting to 1 fully hovered
    pub hover_levels: Vec<f32>,
    mode_revision: u32,
}

impl ParticleGroup {
    pub fn new(profile: GroupProfile, seed: u64, initial_mode: TreeMode, sink: Arc<dyn AudioSink>) -> Self {
        let particles = generate_group(profile.kind, profile.count, seed, initial_mode);
        let interaction = InteractionLayer::new(particles.len(), profile.rules, sink);
        let hover_levels = vec![0.0; particles.len()];
        Self {
            profile,
            particles,
            buffer: None,
            interaction,
            spin: 0.0,
            visibility: profile.visibility_target(initial_mode),
            hover_levels,
            mode_revision: 0,
        }
    }

    /// Allocate the instance buffer once the renderer side exists.
    pub fn attach_buffer(&mut self) {
        if self.buffer.is_none() {
            self.buffer = Some(InstanceBuffer::new(self.particles.len(), self.profile.colored));
        }
    }

    pub fn release_buffer(&mut self) -> Option<InstanceBuffer> {
        self.buffer.take()
    }

    pub fn kind(&self) -> GroupKind {
        self.profile.kind
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Cancel running pops when the mode revision moved since the last call.
    pub fn sync_mode(&mut self, revision: u32) -> bool {
        if revision == self.mode_revision {
            return false;
        }
        self.mode_revision = revision;
        self.interaction.cancel_pops();
        true
    }

    /// Mean distance of the smoothed positions to the rest poses of `mode`.
    pub fn mean_distance_to(&self, mode: TreeMode) -> f32 {
        if self.particles.is_empty() {
            return 0.0;
        }
        let total: f32 = self.particles.iter().map(|p| p.distance_to_rest(mode)).sum();
        total / self.particles.len() as f32
    }

    pub fn max_distance_to(&self, mode: TreeMode) -> f32 {
        self.particles
            .iter()
            .map(|p| p.distance_to_rest(mode))
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentSink;
    use crate::interaction::InteractionEvent;

    #[test]
    fn default_config_covers_every_group() {
        let config = TreeConfig::default();
        assert_eq!(config.groups.len(), GroupKind::ALL.len());
        assert_eq!(config.profile(GroupKind::Needles).unwrap().count, TREE_NEEDLE_COUNT);
        assert_eq!(config.profile(GroupKind::Ornaments).unwrap().count, ORNAMENT_COUNT);
        assert_eq!(config.profile(GroupKind::FairyLights).unwrap().count, FAIRY_LIGHT_COUNT);
        assert_eq!(config.profile(GroupKind::Topper).unwrap().count, TOPPER_COUNT);
    }

    #[test]
    fn assembled_never_spins_slower_than_scattered() {
        for kind in GroupKind::ALL {
            let profile = GroupProfile::for_kind(kind);
            assert!(profile.spin_rate(TreeMode::Assembled) >= profile.spin_rate(TreeMode::Scattered));
        }
        // The topper turns at the same rate in both modes
        let topper = GroupProfile::for_kind(GroupKind::Topper);
        assert_eq!(topper.spin_rate(TreeMode::Assembled), topper.spin_rate(TreeMode::Scattered));
    }

    #[test]
    fn buffer_is_attached_once_and_sized_to_population() {
        let profile = GroupProfile::for_kind(GroupKind::Ornaments);
        let mut group = ParticleGroup::new(profile, 1, TreeMode::Assembled, Arc::new(SilentSink));
        assert!(group.buffer.is_none());
        group.attach_buffer();
        assert_eq!(group.buffer.as_ref().unwrap().len(), ORNAMENT_COUNT);
        assert!(group.buffer.as_ref().unwrap().is_colored());
        assert!(group.release_buffer().is_some());
        assert!(group.buffer.is_none());
    }

    #[test]
    fn mode_switch_cancels_pops() {
        let profile = GroupProfile::for_kind(GroupKind::Ornaments);
        let mut group = ParticleGroup::new(profile, 1, TreeMode::Assembled, Arc::new(SilentSink));
        group.interaction.push(InteractionEvent::Click(4));
        group.interaction.drain(TreeMode::Assembled, 0.0);
        assert_eq!(group.interaction.active_pops(), 1);

        assert!(!group.sync_mode(0));
        assert_eq!(group.interaction.active_pops(), 1);
        assert!(group.sync_mode(1));
        assert_eq!(group.interaction.active_pops(), 0);
    }

    #[test]
    fn empty_population_is_tolerated() {
        let mut profile = GroupProfile::for_kind(GroupKind::FairyLights);
        profile.count = 0;
        let mut group = ParticleGroup::new(profile, 1, TreeMode::Assembled, Arc::new(SilentSink));
        group.attach_buffer();
        assert!(group.is_empty());
        assert_eq!(group.mean_distance_to(TreeMode::Scattered), 0.0);
    }
}
