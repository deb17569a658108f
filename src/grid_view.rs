use crate::selection::SelectedPlant;
use bevy::prelude::*;
use plant_grid::{ColorGenome, Environment, PlantId};

/// Side length of one grid coordinate in world units
pub const TILE_SIZE: f32 = 8.0;

const EMPTY_COLOR: Color = Color::srgb(0.08, 0.08, 0.1);

/// Sprite standing in for one grid coordinate
#[derive(Component)]
pub struct GridTile {
    pub x: i32,
    pub y: i32,
}

pub fn tile_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * TILE_SIZE
}

pub fn world_to_grid(position: Vec2) -> (i32, i32) {
    let cell = (position / TILE_SIZE).floor();
    (cell.x as i32, cell.y as i32)
}

pub fn spawn_grid_tiles(mut commands: Commands, environment: Res<Environment>) {
    for x in 0..environment.width() as i32 {
        for y in 0..environment.height() as i32 {
            commands.spawn((
                Sprite::from_color(EMPTY_COLOR, Vec2::splat(TILE_SIZE - 1.0)),
                Transform::from_translation(tile_center(x, y).extend(0.0)),
                GridTile { x, y },
            ));
        }
    }
}

/// Recolor tiles from the grid snapshot whenever the tick or selection changes
pub fn update_grid_tiles(
    environment: Res<Environment>,
    selected: Res<SelectedPlant>,
    mut tiles: Query<(&GridTile, &mut Sprite)>,
    mut drawn: Local<Option<(u64, Option<PlantId>)>>,
) {
    let key = (environment.tick(), selected.0);
    if *drawn == Some(key) {
        return;
    }
    *drawn = Some(key);

    let snapshot = environment.grid_snapshot();
    for (tile, mut sprite) in tiles.iter_mut() {
        sprite.color = match snapshot.get(tile.x, tile.y) {
            Some(cell) => plant_color(cell.color, Some(cell.plant) == selected.0),
            None => EMPTY_COLOR,
        };
    }
}

fn plant_color(color: ColorGenome, highlighted: bool) -> Color {
    if !highlighted {
        return Color::srgb_u8(color.r, color.g, color.b);
    }
    let lift = |channel: u8| channel + (255 - channel) / 2;
    Color::srgb_u8(lift(color.r), lift(color.g), lift(color.b))
}
