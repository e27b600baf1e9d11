use bevy::prelude::*;

/// The two configurations every particle group can occupy.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub enum TreeMode {
    #[default]
    Assembled,
    Scattered,
}

impl TreeMode {
    pub fn is_assembled(self) -> bool {
        self == TreeMode::Assembled
    }

    pub fn toggled(self) -> Self {
        match self {
            TreeMode::Assembled => TreeMode::Scattered,
            TreeMode::Scattered => TreeMode::Assembled,
        }
    }
}

/// Which population a group holds; selects layout, motion and interaction rules.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum GroupKind {
    Needles,
    Ornaments,
    FairyLights,
    Topper,
}

impl GroupKind {
    pub const ALL: [GroupKind; 4] = [
        GroupKind::Needles,
        GroupKind::Ornaments,
        GroupKind::FairyLights,
        GroupKind::Topper,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GroupKind::Needles => "needles",
            GroupKind::Ornaments => "ornaments",
            GroupKind::FairyLights => "fairy lights",
            GroupKind::Topper => "topper",
        }
    }
}

/// Position plus orientation of a rest pose.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self { position, orientation }
    }

    pub fn at(position: Vec3) -> Self {
        Self { position, orientation: Quat::IDENTITY }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }
}

/// One instance slot. Rest poses and attributes are fixed at generation;
/// only `position` and `orientation` change afterwards.
#[derive(Clone, Debug)]
pub struct Particle {
    pub assembled: Pose,
    pub scattered: Pose,
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: f32,
    pub phase: f32,
    pub speed: f32,
    pub base_color: Option<Color>,
}

impl Particle {
    pub fn rest_pose(&self, mode: TreeMode) -> &Pose {
        match mode {
            TreeMode::Assembled => &self.assembled,
            TreeMode::Scattered => &self.scattered,
        }
    }

    /// Distance from the current (smoothed) position to the rest pose of `mode`.
    pub fn distance_to_rest(&self, mode: TreeMode) -> f32 {
        self.position.distance(self.rest_pose(mode).position)
    }
}

/// Instance entity spawned for slot `index` of the group stored on its parent.
#[derive(Component, Clone, Copy, Debug)]
pub struct InstanceSlot {
    pub index: usize,
}

/// Per-slot material, present only on groups that carry instance colors.
#[derive(Component, Clone, Debug)]
pub struct InstanceMaterial(pub Handle<StandardMaterial>);

/// Scene part whose scale follows the mode (1 when assembled, 0 when scattered).
#[derive(Component, Clone, Copy, Debug)]
pub struct ModeScaled {
    pub smoothing: f32,
}

#[derive(Component)]
pub struct TreeCamera;

#[derive(Component)]
pub struct HelpText;

/// Root that gently floats every tree group together. `phase` accumulates
/// time scaled by the mode's float speed.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct SceneFloat {
    pub phase: f32,
}

/// One ambient sparkle drifting around its anchor.
#[derive(Component, Clone, Copy, Debug)]
pub struct Sparkle {
    pub anchor: Vec3,
    pub phase: f32,
}

#[derive(Component)]
pub struct StarField;
