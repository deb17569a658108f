use crate::grid_view::TILE_SIZE;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

/// Window size the initial zoom is fitted to
const FIT_WINDOW: Vec2 = Vec2::new(1280.0, 720.0);

#[derive(Component)]
pub struct MainCamera;

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 10.0;

#[derive(Resource)]
pub struct CameraState {
    pub zoom: f32,
    pub position: Vec2,
    pub is_panning: bool,
    /// World-space size of the grid; the view center stays inside it
    pub extent: Vec2,
}

impl CameraState {
    /// Frame the whole grid, ground row at the bottom of the view
    pub fn fit_grid(width: u32, height: u32) -> Self {
        let extent = Vec2::new(width as f32, height as f32) * TILE_SIZE;
        let zoom = (extent / FIT_WINDOW).max_element() * 1.05;
        Self {
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            position: extent / 2.0,
            is_panning: false,
            extent,
        }
    }

    /// Zoom step proportional to the current zoom so wide grids zoom at a
    /// usable pace
    pub fn zoom_by(&mut self, scroll: f32) {
        self.zoom = (self.zoom - scroll * 0.1 * self.zoom).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Move by a screen-space drag. Screen y points down, world y points up.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        let delta = Vec2::new(-screen_delta.x, screen_delta.y) * self.zoom;
        self.position = (self.position + delta).clamp(Vec2::ZERO, self.extent);
    }
}

pub fn setup_camera(mut commands: Commands, camera_state: Res<CameraState>) {
    commands.spawn((
        Camera2d,
        MainCamera,
        Transform::from_xyz(camera_state.position.x, camera_state.position.y, 0.0),
        OrthographicProjection {
            scale: camera_state.zoom,
            ..OrthographicProjection::default_2d()
        },
    ));
}

pub fn camera_zoom(
    mut scroll_events: EventReader<MouseWheel>,
    mut camera_state: ResMut<CameraState>,
    mut query: Query<&mut OrthographicProjection, With<MainCamera>>,
) {
    let scroll: f32 = scroll_events.read().map(|event| event.y).sum();
    if scroll == 0.0 {
        return;
    }
    camera_state.zoom_by(scroll);
    if let Ok(mut projection) = query.get_single_mut() {
        projection.scale = camera_state.zoom;
    }
}

pub fn camera_pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut motion_events: EventReader<MouseMotion>,
    mut camera_state: ResMut<CameraState>,
    mut query: Query<&mut Transform, With<MainCamera>>,
) {
    camera_state.is_panning = mouse_button.pressed(MouseButton::Middle);
    let drag: Vec2 = motion_events.read().map(|event| event.delta).sum();
    if !camera_state.is_panning || drag == Vec2::ZERO {
        return;
    }

    camera_state.pan_by(drag);
    if let Ok(mut transform) = query.get_single_mut() {
        transform.translation = camera_state.position.extend(transform.translation.z);
    }
}
