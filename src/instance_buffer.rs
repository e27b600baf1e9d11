//! Per-instance transform buffer
//!
//! CPU-side staging for one group's instance records. The interpolator writes
//! every slot each frame, then `commit` flags the buffer for upload; the
//! renderer takes the flag once per frame and copies the records out.

use bevy::prelude::*;

/// One instance record: 12 floats, no padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceData {
    pub position: [f32; 3],
    pub scale: f32,
    pub rotation: [f32; 4],
    pub color: [f32; 4],
}

impl Default for InstanceData {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            scale: 1.0,
            rotation: Quat::IDENTITY.to_array(),
            color: LinearRgba::WHITE.to_f32_array(),
        }
    }
}

impl InstanceData {
    pub fn transform(&self) -> Transform {
        Transform {
            translation: Vec3::from_array(self.position),
            rotation: Quat::from_array(self.rotation),
            scale: Vec3::splat(self.scale),
        }
    }

    pub fn color(&self) -> LinearRgba {
        LinearRgba::from_f32_array(self.color)
    }
}

pub struct InstanceBuffer {
    instances: Vec<InstanceData>,
    // Slots whose color changed since the last upload
    color_dirty: Vec<bool>,
    colored: bool,
    dirty: bool,
    commits: u64,
}

impl InstanceBuffer {
    pub fn new(capacity: usize, colored: bool) -> Self {
        Self {
            instances: vec![InstanceData::default(); capacity],
            color_dirty: vec![colored; capacity],
            colored,
            dirty: capacity > 0,
            commits: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    pub fn set_instance_transform(&mut self, index: usize, position: Vec3, orientation: Quat, scale: f32) {
        let Some(slot) = self.instances.get_mut(index) else {
            debug!("instance transform write out of range: {} >= {}", index, self.instances.len());
            return;
        };
        slot.position = position.to_array();
        slot.rotation = orientation.to_array();
        slot.scale = scale;
    }

    /// Writes are idempotent: the slot is only flagged when the color actually changes.
    pub fn set_instance_color(&mut self, index: usize, color: impl Into<LinearRgba>) {
        if !self.colored {
            return;
        }
        let Some(slot) = self.instances.get_mut(index) else {
            debug!("instance color write out of range: {} >= {}", index, self.instances.len());
            return;
        };
        let color = color.into().to_f32_array();
        if slot.color != color {
            slot.color = color;
            self.color_dirty[index] = true;
        }
    }

    /// End-of-frame signal: all slots are written and the buffer must be re-uploaded.
    pub fn commit(&mut self) {
        self.dirty = true;
        self.commits += 1;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag. Returns false when nothing was committed since the last take.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Consume the per-slot color flag.
    pub fn take_color_dirty(&mut self, index: usize) -> bool {
        self.color_dirty
            .get_mut(index)
            .map(|flag| std::mem::replace(flag, false))
            .unwrap_or(false)
    }

    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    pub fn get(&self, index: usize) -> Option<&InstanceData> {
        self.instances.get(index)
    }

    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }
}
