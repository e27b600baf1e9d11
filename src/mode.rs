// Mode controller - the single external input driving every particle group
use bevy::prelude::*;
use crate::types::TreeMode;

#[derive(Resource, Debug, Default)]
pub struct ModeController {
    mode: TreeMode,
    revision: u32,
}

/// Sent once per actual mode change.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeChanged {
    pub from: TreeMode,
    pub to: TreeMode,
}

impl ModeController {
    pub fn new(mode: TreeMode) -> Self {
        Self { mode, revision: 0 }
    }

    pub fn mode(&self) -> TreeMode {
        self.mode
    }

    /// Increments on every change; groups compare it to detect switches.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Returns the change when `mode` differs from the current one.
    pub fn set_mode(&mut self, mode: TreeMode) -> Option<ModeChanged> {
        if mode == self.mode {
            return None;
        }
        let change = ModeChanged { from: self.mode, to: mode };
        self.mode = mode;
        self.revision = self.revision.wrapping_add(1);
        Some(change)
    }

    pub fn toggle(&mut self) -> ModeChanged {
        let to = self.mode.toggled();
        // Always a change
        self.set_mode(to).unwrap_or(ModeChanged { from: to, to })
    }
}

/// System: Space or Enter flips between assembled and scattered
pub fn mode_toggle_input_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut controller: ResMut<ModeController>,
    mut changes: EventWriter<ModeChanged>,
) {
    if keyboard.just_pressed(KeyCode::Space) || keyboard.just_pressed(KeyCode::Enter) {
        let change = controller.toggle();
        info!("Tree mode: {:?} -> {:?}", change.from, change.to);
        changes.write(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_assembled() {
        let controller = ModeController::default();
        assert_eq!(controller.mode(), TreeMode::Assembled);
        assert_eq!(controller.revision(), 0);
    }

    #[test]
    fn setting_the_same_mode_is_not_a_change() {
        let mut controller = ModeController::new(TreeMode::Scattered);
        assert_eq!(controller.set_mode(TreeMode::Scattered), None);
        assert_eq!(controller.revision(), 0);
    }

    #[test]
    fn toggle_flips_and_bumps_revision() {
        let mut controller = ModeController::default();
        let change = controller.toggle();
        assert_eq!(change, ModeChanged { from: TreeMode::Assembled, to: TreeMode::Scattered });
        assert_eq!(controller.mode(), TreeMode::Scattered);
        controller.toggle();
        assert_eq!(controller.mode(), TreeMode::Assembled);
        assert_eq!(controller.revision(), 2);
    }
}
