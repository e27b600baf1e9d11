use std::f32::consts::PI;

// Population sizes (fixed for the lifetime of a group)
pub const TREE_NEEDLE_COUNT: usize = 1500;
pub const ORNAMENT_COUNT: usize = 90;
pub const FAIRY_LIGHT_COUNT: usize = 200;
pub const TOPPER_COUNT: usize = 1;

// Seed used for every group unless TreeConfig overrides it
pub const DEFAULT_FIELD_SEED: u64 = 0x00A1_2025;

// Frame timing: smoothing factors and spin rates are expressed per reference frame
pub const REFERENCE_FRAME_SECS: f32 = 1.0 / 60.0;

// ===== TREE NEEDLES =====

pub const TREE_HEIGHT: f32 = 7.0;
pub const TREE_BASE_RADIUS: f32 = 2.8;
pub const TREE_HEIGHT_BIAS: f32 = 0.8;      // Power-law exponent, pushes needles toward the base
pub const TREE_SPIRAL_STEP: f32 = 0.1;      // Angular advance per needle index
pub const TREE_JITTER: f32 = 0.2;           // Full width of the x/z jitter
pub const TREE_SCATTER_RADIUS: f32 = 15.0;
pub const TREE_SMOOTHING: f32 = 0.05;
pub const TREE_SPIN_ASSEMBLED: f32 = 0.001;
pub const TREE_SPIN_SCATTERED: f32 = 0.0002;
pub const TREE_BREATH_FREQUENCY: f32 = 2.0;
pub const TREE_BREATH_AMPLITUDE: f32 = 0.02;
pub const TREE_DRIFT_FREQUENCY: f32 = 50.0; // Multiplies the per-needle speed (0.02..0.04)
pub const TREE_DRIFT_AMPLITUDE: f32 = 0.05;
pub const NEEDLE_SIZE: f32 = 0.2;

// ===== ORNAMENTS =====

pub const ORNAMENT_TURNS: f32 = 18.0 * PI;  // Total helix angle from base to top
pub const ORNAMENT_SPIRAL_HEIGHT: f32 = 6.0;
pub const ORNAMENT_BASE_RADIUS: f32 = 2.5;
pub const ORNAMENT_MIN_RADIUS: f32 = 0.3;
pub const ORNAMENT_SCATTER_RADIUS: f32 = 12.0;
pub const ORNAMENT_SMOOTHING: f32 = 0.04;
pub const ORNAMENT_SPIN_ASSEMBLED: f32 = 0.001;
pub const ORNAMENT_SPIN_SCATTERED: f32 = 0.0005;
pub const ORNAMENT_BOB_AMPLITUDE: f32 = 0.02;
pub const ORNAMENT_TUMBLE_X: f32 = 0.5;     // Radians per second
pub const ORNAMENT_TUMBLE_Y: f32 = 0.3;
pub const ORNAMENT_RED_CHANCE: f32 = 0.35;
pub const ORNAMENT_HOVER_SCALE: f32 = 1.4;
pub const ORNAMENT_HOVER_LIGHTEN: f32 = 0.2;
pub const ORNAMENT_HOVER_GLOW: f32 = 2.0;

// ===== FAIRY LIGHTS =====

pub const LIGHT_SPIRAL_HEIGHT: f32 = 6.0;
pub const LIGHT_BASE_RADIUS: f32 = 2.7;
pub const LIGHT_SCATTER_RADIUS: f32 = 14.0;
pub const LIGHT_SMOOTHING: f32 = 0.03;
pub const LIGHT_SPIN_ASSEMBLED: f32 = 0.001;
pub const LIGHT_SPIN_SCATTERED: f32 = 0.0;
pub const LIGHT_BASE_SCALE: f32 = 0.04;
pub const LIGHT_TWINKLE_AMPLITUDE: f32 = 0.02;

// ===== TOPPER =====

pub const TOPPER_HEIGHT: f32 = 3.6;
pub const TOPPER_SCATTER_RADIUS: f32 = 18.0;
pub const TOPPER_SMOOTHING: f32 = 0.05;
pub const TOPPER_VISIBILITY_SMOOTHING: f32 = 0.1;
pub const TOPPER_SPIN_ASSEMBLED: f32 = 0.01;
pub const TOPPER_SPIN_SCATTERED: f32 = 0.01;
pub const TOPPER_ROCK_AMPLITUDE: f32 = 0.1;
pub const TOPPER_SCALE: f32 = 1.2;
pub const TOPPER_HOVER_SCALE: f32 = 1.5 / 1.2;
pub const TOPPER_HOVER_SMOOTHING: f32 = 0.1;      // per frame, toward the hover scale
pub const TOPPER_SIZE: f32 = 0.35;

// ===== TREE BASE (pot) =====

pub const BASE_VISIBILITY_SMOOTHING: f32 = 0.05;
pub const BASE_POT_Y: f32 = -3.5;
pub const BASE_RING_Y: f32 = -2.8;

// ===== INTERACTION =====

pub const POP_DURATION: f32 = 0.8;          // Seconds for a click "pop" to play out
pub const POP_SCALE_BOOST: f32 = 0.6;       // Peak extra scale as a fraction of the base scale
pub const POP_SPIN_RATE: f32 = 20.0;        // Extra radians per second around Y while popping

// ===== AUDIO =====

pub const CHIME_MIN_HZ: f32 = 1500.0;
pub const CHIME_SPREAD_HZ: f32 = 500.0;
pub const CHIME_GAIN: f32 = 0.01;
pub const CHIME_DURATION: f32 = 0.5;
pub const ARPEGGIO_NOTES: [f32; 6] = [523.25, 659.25, 783.99, 1046.50, 1318.51, 1567.98];
pub const ARPEGGIO_STEP: f32 = 0.05;        // Seconds between note onsets
pub const ARPEGGIO_ATTACK: f32 = 0.02;
pub const ARPEGGIO_GAIN: f32 = 0.03;
pub const ARPEGGIO_NOTE_DURATION: f32 = 0.4;
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;
pub const AUDIO_SILENCE_FLOOR: f32 = 0.0001;

// ===== SCENE =====

pub const SCENE_OFFSET_Y: f32 = -0.5;

// Whole-scene float (tree groups only, the base stays put)
pub const FLOAT_SPEED_ASSEMBLED: f32 = 2.0;
pub const FLOAT_SPEED_SCATTERED: f32 = 0.5;
pub const FLOAT_ROTATION_ASSEMBLED: f32 = 0.1;
pub const FLOAT_ROTATION_SCATTERED: f32 = 0.05;
pub const FLOAT_INTENSITY_ASSEMBLED: f32 = 0.2;
pub const FLOAT_INTENSITY_SCATTERED: f32 = 0.1;

// Ambient sparkles drifting around the tree
pub const SPARKLE_COUNT: usize = 200;
pub const SPARKLE_EXTENT: f32 = 10.0;             // side of the cube they fill
pub const SPARKLE_SIZE: f32 = 0.02;
pub const SPARKLE_SPEED: f32 = 0.4;
pub const SPARKLE_OPACITY: f32 = 0.5;
pub const SPARKLE_DRIFT: f32 = 0.1;

// Star field
pub const STAR_COUNT: usize = 5000;
pub const STAR_RADIUS: f32 = 100.0;
pub const STAR_DEPTH: f32 = 50.0;
pub const STAR_FACTOR: f32 = 4.0;
pub const STAR_SIZE: f32 = 0.05;                  // world units per unit of factor
pub const STAR_TWINKLE_SPEED: f32 = 1.0;
pub const AMBIENCE_SEED: u64 = 1225;
pub const CAMERA_POSITION: bevy::prelude::Vec3 = bevy::prelude::Vec3::new(0.0, 2.0, 9.0);
pub const CAMERA_FOV_DEGREES: f32 = 45.0;
pub const BACKGROUND_COLOR: bevy::prelude::Color = bevy::prelude::Color::srgb(0.02, 0.02, 0.02);

// Palette
pub const GOLD: bevy::prelude::Color = bevy::prelude::Color::srgb(1.0, 0.843, 0.0);             // #FFD700
pub const CARDINAL_RED: bevy::prelude::Color = bevy::prelude::Color::srgb(0.769, 0.118, 0.227);  // #C41E3A
pub const EMERALD: bevy::prelude::Color = bevy::prelude::Color::srgb(0.008, 0.176, 0.098);       // #022D19
pub const WARM_WHITE: bevy::prelude::Color = bevy::prelude::Color::srgb(1.0, 0.941, 0.792);      // #FFF0CA
pub const STAR_YELLOW: bevy::prelude::Color = bevy::prelude::Color::srgb(0.976, 0.878, 0.463);   // #F9E076
