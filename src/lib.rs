//! Dual-state particle Christmas tree.
//!
//! Populations of needles, ornaments, fairy lights and a topper each carry an
//! assembled (tree) pose and a scattered (cloud) pose per particle, and glide
//! between them whenever [`mode::ModeController`] flips. Ornaments and the
//! topper respond to hover and click through the interaction layer.

pub mod ambience;
pub mod audio;
pub mod constants;
pub mod field;
pub mod group;
pub mod instance_buffer;
pub mod interaction;
pub mod interpolator;
pub mod mode;
pub mod picking;
pub mod plugin;
pub mod scene;
pub mod types;
pub mod wish;

pub use group::{GroupProfile, ParticleGroup, TreeConfig};
pub use mode::{ModeChanged, ModeController};
pub use plugin::{TreePlugin, TreeSet};
pub use types::{GroupKind, TreeMode};
