use crate::grid_view::world_to_grid;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;
use plant_grid::{Environment, GridSnapshot, PlantId};

/// Resource to track the plant picked in the viewer
#[derive(Resource, Default)]
pub struct SelectedPlant(pub Option<PlantId>);

/// System to pick the plant under the cursor on left click. Clicking an empty
/// coordinate clears the selection.
pub fn handle_selection(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut contexts: EguiContexts,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    environment: Res<Environment>,
    mut selected: ResMut<SelectedPlant>,
) {
    if !mouse_button.just_pressed(MouseButton::Left) {
        return;
    }
    // Clicks on the info panels are not meant for the grid
    if contexts.ctx_mut().is_pointer_over_area() {
        return;
    }

    let Ok(window) = windows.get_single() else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.get_single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok(world_pos) = camera.viewport_to_world_2d(camera_transform, cursor_pos) else {
        return;
    };

    selected.0 = plant_under(&environment.grid_snapshot(), world_pos);
}

/// The plant drawn at a world position, if any
fn plant_under(snapshot: &GridSnapshot, world_pos: Vec2) -> Option<PlantId> {
    let (x, y) = world_to_grid(world_pos);
    snapshot.get(x, y).map(|cell| cell.plant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_view::tile_center;
    use plant_grid::{SimConfig, create_rng};

    #[test]
    fn picks_plant_from_snapshot() {
        let mut env = Environment::new(10, 6, SimConfig::default(), create_rng(5)).unwrap();
        let id = env.spawn_basic_plant(100, 3, 1, 1).unwrap();
        let snapshot = env.grid_snapshot();

        assert_eq!(plant_under(&snapshot, tile_center(3, 0)), Some(id));
        assert_eq!(plant_under(&snapshot, tile_center(3, 4)), None);
        assert_eq!(plant_under(&snapshot, Vec2::new(-4.0, 4.0)), None);
    }
}
