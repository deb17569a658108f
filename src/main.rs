mod camera;
mod grid_view;
mod selection;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, egui};
use camera::{CameraState, camera_pan, camera_zoom, setup_camera};
use clap::Parser;
use grid_view::{spawn_grid_tiles, update_grid_tiles};
use plant_grid::{
    CellState, ConfigError, Environment, RunBudget, SimConfig, SimulationPlugin,
    SimulationState, SpawnError, StepRequest, TickPacing, create_rng,
};
use selection::{SelectedPlant, handle_selection};
use std::path::PathBuf;
use thiserror::Error;

/// Plants competing for light and ground on a 2D grid
#[derive(Parser, Debug)]
#[command(name = "plant-grid", version)]
struct Args {
    /// Grid width in cells
    #[arg(long, default_value_t = 300)]
    width: u32,

    /// Grid height in cells
    #[arg(long, default_value_t = 20)]
    height: u32,

    /// Number of starter plants, spread evenly along the ground
    #[arg(long, default_value_t = 10)]
    plants: u32,

    /// Starting energy of each starter plant
    #[arg(long, default_value_t = 100)]
    energy: i64,

    /// Stalk height of the starter body plan
    #[arg(long, default_value_t = 1)]
    stalk_height: u32,

    /// Arm width of the starter body plan
    #[arg(long, default_value_t = 2)]
    arm_width: u32,

    /// Stop after this many ticks
    #[arg(long, default_value_t = 10_000)]
    cycles: u64,

    /// Seed for the simulation's random source
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    /// JSON file overriding simulation tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run without a window and exit when the run ends
    #[arg(long)]
    headless: bool,

    /// Seconds between ticks in the viewer
    #[arg(long, default_value_t = 0.05)]
    tick_seconds: f32,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to place starter plant: {0}")]
    Spawn(#[from] SpawnError),
}

fn main() -> AppExit {
    let args = Args::parse();
    let environment = match build_environment(&args) {
        Ok(environment) => environment,
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(source) = std::error::Error::source(&err) {
                eprintln!("  caused by: {source}");
            }
            return AppExit::error();
        }
    };

    if args.headless {
        run_headless(environment, args.cycles)
    } else {
        run_viewer(environment, &args)
    }
}

fn build_environment(args: &Args) -> Result<Environment, StartupError> {
    let config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    let mut environment = Environment::new(args.width, args.height, config, create_rng(args.seed))?;

    for i in 0..args.plants {
        let x = (i + 1) * args.width / (args.plants + 1);
        environment.spawn_basic_plant(args.energy, x as i32, args.stalk_height, args.arm_width)?;
    }
    Ok(environment)
}

fn run_headless(environment: Environment, cycles: u64) -> AppExit {
    App::new()
        .add_plugins((MinimalPlugins, LogPlugin::default(), SimulationPlugin))
        .insert_resource(environment)
        .insert_resource(RunBudget {
            max_cycles: Some(cycles),
            exit_when_done: true,
        })
        .add_systems(Startup, announce)
        .run()
}

fn run_viewer(environment: Environment, args: &Args) -> AppExit {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Plant Grid".to_string(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((EguiPlugin, SimulationPlugin))
        .insert_resource(CameraState::fit_grid(environment.width(), environment.height()))
        .insert_resource(environment)
        .insert_resource(TickPacing::every(args.tick_seconds))
        .insert_resource(RunBudget {
            max_cycles: Some(args.cycles),
            exit_when_done: false,
        })
        .init_resource::<SelectedPlant>()
        .add_systems(Startup, (announce, setup_camera, spawn_grid_tiles))
        .add_systems(Update, (
            camera_zoom,
            camera_pan,
            handle_selection,
            update_grid_tiles,
            ui_system,
        ))
        .run()
}

fn announce(environment: Res<Environment>) {
    info!("Starting {}", *environment);
}

fn ui_system(
    mut contexts: EguiContexts,
    mut simulation_state: ResMut<SimulationState>,
    mut step: ResMut<StepRequest>,
    camera_state: Res<CameraState>,
    selected: Res<SelectedPlant>,
    environment: Res<Environment>,
) {
    let stats = environment.stats();

    egui::Window::new("Simulation Info")
        .default_pos(egui::pos2(10.0, 10.0))
        .show(contexts.ctx_mut(), |ui| {
            ui.horizontal(|ui| {
                let running = *simulation_state == SimulationState::Running;
                let button_text = if running { "⏸ Pause" } else { "▶ Resume" };
                if ui.button(button_text).clicked() {
                    *simulation_state = if running {
                        SimulationState::Paused
                    } else {
                        SimulationState::Running
                    };
                }
                if !running && ui.button("⏭ Step").clicked() {
                    step.0 = true;
                }
                ui.label(format!("State: {}", if running { "Running" } else { "Paused" }));
            });

            ui.separator();
            ui.heading("Population");
            ui.separator();

            ui.label(format!("Tick: {}", stats.tick));
            ui.label(format!("Living plants: {}", stats.living));
            ui.label(format!("Births: {}", stats.births));
            ui.label(format!("Deaths: {}", stats.deaths));
            ui.label(format!("Occupied cells: {}", stats.occupied_cells));
            if environment.is_extinct() {
                ui.colored_label(egui::Color32::from_rgb(255, 120, 80), "All plants have died");
            }

            ui.separator();
            ui.heading("Camera");
            ui.separator();

            ui.label(format!("Zoom: {:.2}x", camera_state.zoom));
            ui.label("• Mouse Wheel - Zoom in/out");
            ui.label("• Middle Mouse - Pan camera");
            ui.label("• Left Click - Select plant");
        });

    let Some(plant) = selected.0.and_then(|id| environment.plant(id)) else {
        return;
    };

    egui::Window::new("Selected Plant")
        .default_pos(egui::pos2(10.0, 360.0))
        .default_size(egui::vec2(260.0, 320.0))
        .show(contexts.ctx_mut(), |ui| {
            let color = plant.color();
            ui.horizontal(|ui| {
                ui.heading(format!("Plant #{}", plant.serial()));
                ui.colored_label(egui::Color32::from_rgb(color.r, color.g, color.b), "■■■");
            });
            ui.separator();

            ui.label(format!("Energy: {}", plant.energy()));
            ui.label(format!("Root: x = {}", plant.root().x));
            ui.label(format!("Age: {} ticks", plant.age(environment.tick())));
            ui.label(format!(
                "Living cells: {} / {}",
                plant.living_cells(),
                plant.cells().len()
            ));

            ui.separator();
            ui.heading("Body Plan");

            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    for (index, (blueprint, cell)) in
                        plant.blueprints().iter().zip(plant.cells()).enumerate()
                    {
                        let text_color = match cell.state() {
                            CellState::Pending => egui::Color32::GRAY,
                            CellState::Alive => egui::Color32::from_rgb(100, 255, 100),
                            CellState::Dead => egui::Color32::from_rgb(255, 120, 80),
                        };
                        ui.add(egui::Label::new(
                            egui::RichText::new(format!(
                                "{index:3}: {blueprint}  {:?}",
                                cell.state()
                            ))
                            .color(text_color)
                            .font(egui::FontId::monospace(11.0)),
                        ));
                    }
                });
        });
}
