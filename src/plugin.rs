// Tree plugin: resources, system sets and per-frame ordering
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, SystemCursorIcon};
use bevy::winit::cursor::CursorIcon;
use crate::ambience::{scene_float_system, sparkle_system, spawn_ambience, star_twinkle_system};
use crate::group::{ParticleGroup, TreeConfig};
use crate::interaction::{CursorAffordance, InteractionEvent};
use crate::interpolator::{advance_group, smoothing_factor, FrameInput, FrameScratch};
use crate::mode::{mode_toggle_input_system, ModeChanged, ModeController};
use crate::picking::{pick_instance, PointerState};
use crate::scene::{help_line, pick_radius, setup_scene, spawn_particle_groups};
use crate::types::*;

/// Frame phases, run in this order every `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeSet {
    Input,
    Drain,
    Interpolate,
    Upload,
}

pub struct TreePlugin;

impl Plugin for TreePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModeController>()
            .init_resource::<TreeConfig>()
            .init_resource::<PointerState>()
            .add_event::<ModeChanged>()
            .configure_sets(
                Update,
                (TreeSet::Input, TreeSet::Drain, TreeSet::Interpolate, TreeSet::Upload).chain(),
            )
            .add_systems(Startup, (setup_scene, spawn_particle_groups, spawn_ambience))
            .add_systems(
                Update,
                (
                    (mode_toggle_input_system, pointer_picking_system)
                        .chain()
                        .in_set(TreeSet::Input),
                    (drain_interaction_system, help_text_system).in_set(TreeSet::Drain),
                    (
                        interpolate_groups_system,
                        mode_scaled_system,
                        scene_float_system,
                        sparkle_system,
                        star_twinkle_system,
                    )
                        .in_set(TreeSet::Interpolate),
                    upload_instances_system.in_set(TreeSet::Upload),
                ),
            );
    }
}

/// System: Cast the cursor ray into the interactive groups and route pointer events
pub fn pointer_picking_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<TreeCamera>>,
    mut groups: Query<(Entity, &GlobalTransform, &mut ParticleGroup)>,
    mut pointer: ResMut<PointerState>,
) {
    let Ok(window) = window_query.single() else { return };
    let Ok((camera, camera_transform)) = camera_query.single() else { return };

    // Cursor outside the window counts as leaving
    let ray = window
        .cursor_position()
        .and_then(|cursor_pos| camera.viewport_to_world(camera_transform, cursor_pos).ok());

    let mut hit: Option<(Entity, usize, f32)> = None;
    if let Some(ray) = ray {
        for (entity, group_transform, group) in groups.iter() {
            if !group.interaction.rules().is_interactive() {
                continue;
            }
            let Some(buffer) = group.buffer.as_ref() else { continue };
            let radius = pick_radius(group.kind());
            if let Some((index, distance)) = pick_instance(ray.origin, *ray.direction, group_transform, buffer, radius) {
                if hit.is_none_or(|(_, _, nearest)| distance < nearest) {
                    hit = Some((entity, index, distance));
                }
            }
        }
    }

    let routing = pointer.retarget(hit.map(|(entity, index, _)| (entity, index)));
    if let Some(entity) = routing.leave {
        if let Ok((_, _, mut group)) = groups.get_mut(entity) {
            group.interaction.push(InteractionEvent::PointerLeave);
        }
    }
    if let Some((entity, index)) = routing.enter {
        if let Ok((_, _, mut group)) = groups.get_mut(entity) {
            group.interaction.push(InteractionEvent::PointerEnter(index));
        }
    }

    if mouse_button.just_pressed(MouseButton::Left) {
        if let Some((entity, index)) = pointer.hovered {
            if let Ok((_, _, mut group)) = groups.get_mut(entity) {
                group.interaction.push(InteractionEvent::Click(index));
            }
        }
    }
}

/// System: Apply queued interaction events before anything moves this frame
pub fn drain_interaction_system(
    mut commands: Commands,
    time: Res<Time>,
    controller: Res<ModeController>,
    mut groups: Query<&mut ParticleGroup>,
    window_query: Query<Entity, With<PrimaryWindow>>,
) {
    let now = time.elapsed_secs();
    let mut cursor_changed = false;
    let mut any_hovered = false;

    for mut group in groups.iter_mut() {
        if group.sync_mode(controller.revision()) {
            debug!("{} pops cancelled by mode change", group.kind().label());
        }
        if group.interaction.drain(controller.mode(), now).is_some() {
            cursor_changed = true;
        }
        any_hovered |= group.interaction.hovered().is_some();
    }

    if !cursor_changed {
        return;
    }
    // Leaving one group and entering another in the same frame still ends on a pointer
    let affordance = if any_hovered { CursorAffordance::Pointer } else { CursorAffordance::Default };
    if let Ok(window) = window_query.single() {
        commands.entity(window).insert(cursor_icon(affordance));
    }
}

fn cursor_icon(affordance: CursorAffordance) -> CursorIcon {
    match affordance {
        CursorAffordance::Pointer => CursorIcon::from(SystemCursorIcon::Pointer),
        CursorAffordance::Default => CursorIcon::from(SystemCursorIcon::Default),
    }
}

/// System: Rewrite the help text whenever the mode changes
pub fn help_text_system(mut changes: EventReader<ModeChanged>, mut query: Query<&mut Text, With<HelpText>>) {
    let Some(change) = changes.read().last() else { return };
    let Ok(mut text) = query.single_mut() else { return };
    text.0 = help_line(change.to);
}

/// System: Step every mounted group toward the current mode's rest poses
pub fn interpolate_groups_system(
    time: Res<Time>,
    controller: Res<ModeController>,
    mut groups: Query<&mut ParticleGroup>,
    mut scratch: Local<FrameScratch>,
) {
    let frame = FrameInput::new(controller.mode(), time.elapsed_secs(), time.delta_secs());
    for mut group in groups.iter_mut() {
        advance_group(&mut group, frame, &mut scratch);
    }
}

/// System: Fade mode-dependent scene parts (tree base) in and out
pub fn mode_scaled_system(
    time: Res<Time>,
    controller: Res<ModeController>,
    mut query: Query<(&ModeScaled, &mut Transform)>,
) {
    let target = if controller.mode().is_assembled() { 1.0 } else { 0.0 };
    for (scaled, mut transform) in query.iter_mut() {
        let alpha = smoothing_factor(scaled.smoothing, time.delta_secs());
        let current = transform.scale.x;
        transform.scale = Vec3::splat(current + (target - current) * alpha);
    }
}

/// System: Copy committed instance records into the slot entities
pub fn upload_instances_system(
    mut groups: Query<(&mut ParticleGroup, &mut Transform, Option<&Children>), Without<InstanceSlot>>,
    mut slots: Query<(&InstanceSlot, &mut Transform, Option<&InstanceMaterial>), Without<ParticleGroup>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (mut group, mut root_transform, children) in groups.iter_mut() {
        let spin = group.spin;
        let Some(buffer) = group.buffer.as_mut() else { continue };
        if !buffer.take_dirty() {
            continue;
        }
        root_transform.rotation = Quat::from_rotation_y(spin);

        // An empty group spawns no slot children
        let Some(children) = children else { continue };
        for child in children.iter() {
            let Ok((slot, mut transform, material)) = slots.get_mut(child) else { continue };
            let Some(record) = buffer.get(slot.index).copied() else { continue };
            *transform = record.transform();

            if let Some(InstanceMaterial(handle)) = material {
                if buffer.take_color_dirty(slot.index) {
                    if let Some(material) = materials.get_mut(handle) {
                        material.base_color = Color::from(record.color());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use crate::group::GroupProfile;
    use bevy::input::InputPlugin;

    fn headless_app(config: TreeConfig) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), InputPlugin))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .insert_resource(config)
            .add_plugins(TreePlugin);
        app
    }

    fn ornaments_only() -> TreeConfig {
        TreeConfig {
            seed: 7,
            groups: vec![GroupProfile::for_kind(GroupKind::Ornaments)],
        }
    }

    #[test]
    fn startup_mounts_groups_with_attached_buffers() {
        let mut app = headless_app(TreeConfig::default());
        app.update();

        let world = app.world_mut();
        let mut groups = world.query::<&ParticleGroup>();
        let mounted: Vec<_> = groups.iter(world).collect();
        assert_eq!(mounted.len(), GroupKind::ALL.len());
        assert!(mounted.iter().all(|g| g.buffer.is_some()));

        let mut slots = world.query::<&InstanceSlot>();
        let total = TREE_NEEDLE_COUNT + ORNAMENT_COUNT + FAIRY_LIGHT_COUNT + TOPPER_COUNT;
        assert_eq!(slots.iter(world).count(), total);

        let mut colored = world.query::<&InstanceMaterial>();
        assert_eq!(colored.iter(world).count(), ORNAMENT_COUNT);
    }

    #[test]
    fn each_frame_commits_and_uploads() {
        let mut app = headless_app(ornaments_only());
        app.update();
        app.update();

        let world = app.world_mut();
        let mut groups = world.query::<&ParticleGroup>();
        let group = groups.single(world).unwrap();
        let buffer = group.buffer.as_ref().unwrap();
        // Upload consumed the flag set by this frame's commit
        assert!(buffer.commit_count() >= 1);
        assert!(!buffer.is_dirty());

        let record = *buffer.get(5).unwrap();
        let mut slots = world.query::<(&InstanceSlot, &Transform)>();
        let (_, transform) = slots.iter(world).find(|(slot, _)| slot.index == 5).unwrap();
        assert_eq!(transform.translation, Vec3::from_array(record.position));
    }

    #[test]
    fn queued_click_pops_during_the_same_frame() {
        let mut app = headless_app(ornaments_only());
        app.update();

        {
            let world = app.world_mut();
            let mut groups = world.query::<&mut ParticleGroup>();
            let mut group = groups.single_mut(world).unwrap();
            group.interaction.push(InteractionEvent::Click(3));
        }
        app.update();

        let world = app.world_mut();
        let mut groups = world.query::<&ParticleGroup>();
        let group = groups.single(world).unwrap();
        assert!(group.interaction.pop(3).is_some());
        assert_eq!(group.interaction.pending(), 0);
    }

    #[test]
    fn mode_change_cancels_pops_before_interpolation() {
        let mut app = headless_app(ornaments_only());
        app.update();

        {
            let world = app.world_mut();
            let mut groups = world.query::<&mut ParticleGroup>();
            let mut group = groups.single_mut(world).unwrap();
            group.interaction.push(InteractionEvent::Click(0));
        }
        app.update();
        app.world_mut().resource_mut::<ModeController>().toggle();
        app.update();

        let world = app.world_mut();
        let mut groups = world.query::<&ParticleGroup>();
        assert_eq!(groups.single(world).unwrap().interaction.active_pops(), 0);
    }

    #[test]
    fn empty_group_still_commits_and_uploads() {
        let mut profile = GroupProfile::for_kind(GroupKind::FairyLights);
        profile.count = 0;
        let mut app = headless_app(TreeConfig { seed: 7, groups: vec![profile] });
        for _ in 0..4 {
            app.update();
        }

        let world = app.world_mut();
        let mut groups = world.query::<(&ParticleGroup, Option<&Children>)>();
        let (group, children) = groups.single(world).unwrap();
        assert!(group.is_empty());
        assert!(children.is_none_or(|c| c.is_empty()));
        let buffer = group.buffer.as_ref().unwrap();
        assert!(buffer.commit_count() >= 1);
        assert!(!buffer.is_dirty());
        assert_eq!(world.query::<&InstanceSlot>().iter(world).count(), 0);
    }

    #[test]
    fn tree_groups_float_together_without_the_base() {
        let mut app = headless_app(TreeConfig::default());
        app.update();
        app.update();

        let world = app.world_mut();
        let mut floats = world.query_filtered::<Entity, With<SceneFloat>>();
        let float_root = floats.single(world).unwrap();

        let mut groups = world.query_filtered::<&ChildOf, With<ParticleGroup>>();
        let parents: Vec<Entity> = groups.iter(world).map(|child_of| child_of.parent()).collect();
        assert_eq!(parents.len(), GroupKind::ALL.len());
        assert!(parents.iter().all(|&parent| parent == float_root));

        let mut bases = world.query_filtered::<Option<&ChildOf>, With<ModeScaled>>();
        assert!(bases.iter(world).all(|child_of| child_of.is_none()));

        let mut sparkles = world.query::<&Sparkle>();
        assert_eq!(sparkles.iter(world).count(), SPARKLE_COUNT);
        let mut stars = world.query::<&StarField>();
        assert_eq!(stars.iter(world).count(), 1);
    }

    #[test]
    fn help_text_follows_mode_changes() {
        let mut app = headless_app(ornaments_only());
        app.update();
        app.world_mut().send_event(ModeChanged { from: TreeMode::Assembled, to: TreeMode::Scattered });
        app.update();

        let world = app.world_mut();
        let mut texts = world.query_filtered::<&Text, With<HelpText>>();
        assert_eq!(texts.single(world).unwrap().0, help_line(TreeMode::Scattered));
    }

    #[test]
    fn tree_base_fades_out_when_scattered() {
        let mut app = headless_app(ornaments_only());
        app.update();
        let change = app.world_mut().resource_mut::<ModeController>().set_mode(TreeMode::Scattered);
        assert!(change.is_some());
        for _ in 0..3 {
            app.update();
        }

        let world = app.world_mut();
        let mut bases = world.query::<(&ModeScaled, &Transform)>();
        assert_eq!(bases.iter(world).count(), 2);
        // MinimalPlugins time advances by a real delta; any positive delta shrinks the scale
        assert!(bases.iter(world).all(|(_, t)| t.scale.x <= 1.0));
    }
}
