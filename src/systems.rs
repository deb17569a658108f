use crate::environment::Environment;
use bevy::log::info;
use bevy::prelude::*;

/// Resource to control simulation state
#[derive(Resource, PartialEq, Eq, Clone, Copy, Debug, Default)]
pub enum SimulationState {
    #[default]
    Running,
    Paused,
}

/// Wall-clock spacing between ticks; `None` advances one tick per frame
#[derive(Resource, Default)]
pub struct TickPacing(pub Option<Timer>);

impl TickPacing {
    pub fn every(seconds: f32) -> Self {
        Self(Some(Timer::from_seconds(seconds, TimerMode::Repeating)))
    }
}

/// Set while paused to advance exactly one tick on the next frame
#[derive(Resource, Default)]
pub struct StepRequest(pub bool);

/// When a run is over
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct RunBudget {
    /// Stop after this many ticks
    pub max_cycles: Option<u64>,
    /// Exit the app once the run ends (extinction or budget), instead of
    /// leaving the final state on screen
    pub exit_when_done: bool,
}

impl RunBudget {
    fn exhausted(&self, tick: u64) -> bool {
        self.max_cycles.is_some_and(|max| tick >= max)
    }
}

/// Drives the environment from the bevy schedule
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationState>()
            .init_resource::<TickPacing>()
            .init_resource::<StepRequest>()
            .init_resource::<RunBudget>()
            .add_systems(Update, advance_simulation);
    }
}

/// System to advance the environment by one tick when due
pub fn advance_simulation(
    time: Res<Time>,
    state: Res<SimulationState>,
    budget: Res<RunBudget>,
    mut pacing: ResMut<TickPacing>,
    mut step: ResMut<StepRequest>,
    mut environment: ResMut<Environment>,
    mut exit: EventWriter<AppExit>,
) {
    // A run can be over before its first tick (no plants, zero budget)
    if environment.is_extinct() || budget.exhausted(environment.tick()) {
        if budget.exit_when_done {
            exit.send(AppExit::Success);
        }
        return;
    }

    let due = match *state {
        SimulationState::Running => match pacing.0.as_mut() {
            Some(timer) => timer.tick(time.delta()).just_finished(),
            None => true,
        },
        SimulationState::Paused => std::mem::take(&mut step.0),
    };
    if !due {
        return;
    }

    environment.advance_tick();

    let finished = if environment.is_extinct() {
        info!("Complete death of all plants! cycle: {}", environment.tick());
        true
    } else if budget.exhausted(environment.tick()) {
        info!("Cycle budget reached: {}", *environment);
        true
    } else {
        false
    };

    if finished && budget.exit_when_done {
        exit.send(AppExit::Success);
    }
}
