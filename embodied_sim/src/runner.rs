//! Scenario runner - executes session smoke scenarios.

use crate::backend::{Backend, DEMO_FLOOR, DEMO_ROOM};
use crate::exporter::{EpisodeExport, StepFrame};
use crate::scenarios::ScenarioId;
use crate::settings::{make_cfg, SimSettings};
use crate::simulator::Simulator;

use embodied_core::{AgentConfiguration, Configuration, SceneId, SimError, SimulatorConfiguration};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Relative rotation tolerance for reset checks.
const RESET_RTOL: f32 = 1e-4;

/// Minimum random actions for the no-navmesh smoke run.
const SMOKE_STEPS: usize = 50;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total agent steps executed
    pub total_steps: u64,

    /// Collisions reported across all steps
    pub collisions: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Recorded trajectory, for scenarios that keep one
    pub episode: Option<EpisodeExport>,
}

/// What a scenario body reports before it is turned into a result.
#[derive(Default)]
struct Outcome {
    steps: u64,
    collisions: u64,
    failure: Option<String>,
    episode: Option<EpisodeExport>,
}

impl Outcome {
    fn fail(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

/// Runs session scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Steps per episode
    steps: usize,

    backend: Backend,

    /// Navmesh scene for reset/walk scenarios (defaults to the demo room)
    scene: Option<String>,
}

impl ScenarioRunner {
    /// Creates a runner over the built-in in-memory demo scenes.
    pub fn new(seed: u64) -> Result<Self, SimError> {
        Ok(Self {
            seed,
            steps: 100,
            backend: Backend::demo()?,
            scene: None,
        })
    }

    /// Sets the number of steps per episode.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Replaces the backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the scene used by the reset and walk scenarios.
    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    fn scene(&self) -> &str {
        self.scene.as_deref().unwrap_or(DEMO_ROOM)
    }

    fn settings(&self, scene: &str) -> SimSettings {
        SimSettings {
            scene: scene.to_string(),
            seed: self.seed,
            ..Default::default()
        }
    }

    fn open(&self, config: Configuration) -> Result<Simulator, SimError> {
        Simulator::open_with(config, self.backend.clone())
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let outcome = match scenario {
            ScenarioId::NoNavmeshSmoke => self.run_no_navmesh_smoke(),
            ScenarioId::EmptyScene => self.run_empty_scene(),
            ScenarioId::SimReset => self.run_sim_reset(),
            ScenarioId::KeepAgent => self.run_keep_agent(),
            ScenarioId::ConstructDestroy => self.run_construct_destroy(),
            ScenarioId::RandomWalk => self.run_random_walk(),
        };
        let outcome = outcome.unwrap_or_else(|e| Outcome::default().fail(e.to_string()));

        match &outcome.failure {
            Some(reason) => warn!("Scenario {} FAILED: {}", scenario.name(), reason),
            None => info!(
                "Scenario {} passed ({} steps, {} collisions)",
                scenario.name(),
                outcome.steps,
                outcome.collisions
            ),
        }

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: outcome.failure.is_none(),
            total_steps: outcome.steps,
            collisions: outcome.collisions,
            failure_reason: outcome.failure,
            episode: outcome.episode,
        }
    }

    /// Runs every scenario in order.
    pub fn run_all(&self) -> Vec<ScenarioResult> {
        ScenarioId::all().into_iter().map(|s| self.run(s)).collect()
    }

    /// Random actions on a stage with no navmesh and no sensors.
    fn run_no_navmesh_smoke(&self) -> Result<Outcome, SimError> {
        let agent = AgentConfiguration {
            sensor_specifications: vec![],
            ..Default::default()
        };
        let sim_cfg = SimulatorConfiguration {
            scene_id: SceneId::from(DEMO_FLOOR),
            random_seed: self.seed,
            ..Default::default()
        };
        let mut sim = self.open(Configuration::new(sim_cfg, vec![agent.clone()]))?;
        sim.initialize_agent(0)?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let actions = agent.action_names();
        let mut outcome = Outcome::default();

        for _ in 0..self.steps.max(SMOKE_STEPS) {
            let Some(action) = actions.choose(&mut rng) else {
                return Ok(outcome.fail("agent has no actions"));
            };
            let obs = sim.step(action)?;
            outcome.steps += 1;
            if obs.collided {
                outcome.collisions += 1;
                let step = outcome.steps;
                return Ok(outcome.fail(format!("collision without a navmesh at step {}", step)));
            }
        }

        Ok(outcome)
    }

    /// "NONE" scene: no stage template, empty frames still render.
    fn run_empty_scene(&self) -> Result<Outcome, SimError> {
        let settings = SimSettings {
            depth_sensor: true,
            ..self.settings("NONE")
        };
        let cfg = make_cfg(&settings);
        let actions: Vec<String> = cfg.agents[0].action_space.keys().cloned().collect();
        let mut sim = self.open(cfg)?;
        let mut outcome = Outcome::default();

        if sim.get_stage_initialization_template()?.is_some() {
            return Ok(outcome.fail("NONE scene produced a stage template"));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        for _ in 0..2 {
            let Some(action) = actions.choose(&mut rng) else {
                return Ok(outcome.fail("agent has no actions"));
            };
            let obs = sim.step(action)?;
            outcome.steps += 1;

            let Some(depth) = obs.get("depth_sensor") else {
                return Ok(outcome.fail("missing depth frame"));
            };
            if depth.data.iter().any(|d| *d != 0.0) {
                return Ok(outcome.fail("depth frame of an empty scene is not empty"));
            }
        }

        Ok(outcome)
    }

    /// Random steps then reset; state must match the initialized one.
    fn run_sim_reset(&self) -> Result<Outcome, SimError> {
        let cfg = make_cfg(&self.settings(self.scene()));
        let actions: Vec<String> = cfg.agents[0].action_space.keys().cloned().collect();
        let mut sim = self.open(cfg)?;
        sim.initialize_agent(0)?;
        let initial = sim.agent(0)?.initial_state();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut episode = EpisodeExport::new(ScenarioId::SimReset.name(), self.scene(), self.seed);
        episode.add_frame(StepFrame::new(0, None, &initial, false));
        let mut outcome = Outcome::default();

        for tick in 1..=self.steps as u64 {
            let Some(action) = actions.choose(&mut rng) else {
                return Ok(outcome.fail("agent has no actions"));
            };
            let obs = sim.step(action)?;
            outcome.steps += 1;
            if obs.collided {
                outcome.collisions += 1;
            }
            episode.add_frame(StepFrame::new(tick, Some(action.as_str()), &sim.agent(0)?.state(), obs.collided));
        }

        sim.reset()?;
        let restored = sim.agent(0)?.state();
        let passed = restored.approx_eq(&initial, RESET_RTOL);
        episode.finalize(passed);
        outcome.episode = Some(episode);

        if !passed {
            return Ok(outcome.fail(format!(
                "reset state {:?} differs from initial {:?}",
                restored.position, initial.position
            )));
        }
        Ok(outcome)
    }

    /// Keep handles from 3 sessions alive past each session's close.
    fn run_keep_agent(&self) -> Result<Outcome, SimError> {
        let sim_cfg = SimulatorConfiguration {
            scene_id: SceneId::from(self.scene()),
            random_seed: self.seed,
            ..Default::default()
        };
        let cfg = Configuration::new(sim_cfg, vec![AgentConfiguration::default()]);

        let mut agents = Vec::new();
        for _ in 0..3 {
            let sim = self.open(cfg.clone())?;
            agents.push(sim.get_agent(0)?);
        }

        let outcome = Outcome::default();
        if let Some(handle) = agents.iter().find(|h| h.is_alive()) {
            return Ok(outcome.fail(format!("handle for session {} still alive", handle.session_id())));
        }
        debug!("Kept {} agent handles past their sessions", agents.len());
        Ok(outcome)
    }

    /// Open and close 3 sessions with the same configuration.
    fn run_construct_destroy(&self) -> Result<Outcome, SimError> {
        let sim_cfg = SimulatorConfiguration {
            scene_id: SceneId::from(self.scene()),
            random_seed: self.seed,
            ..Default::default()
        };
        let cfg = Configuration::new(sim_cfg, vec![AgentConfiguration::default()]);
        let outcome = Outcome::default();

        let mut stage_counts = Vec::new();
        for _ in 0..3 {
            let mut sim = self.open(cfg.clone())?;
            stage_counts.push(sim.template_library()?.stages.get_num_templates());
            sim.close();
        }

        if stage_counts.windows(2).any(|w| w[0] != w[1]) {
            return Ok(outcome.fail(format!("stage templates leaked across sessions: {:?}", stage_counts)));
        }
        Ok(outcome)
    }

    /// Seeded random walk; every pose must stay on the navmesh.
    fn run_random_walk(&self) -> Result<Outcome, SimError> {
        let cfg = make_cfg(&self.settings(self.scene()));
        let actions: Vec<String> = cfg.agents[0].action_space.keys().cloned().collect();
        let mut sim = self.open(cfg)?;
        let handle = sim.initialize_agent(0)?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut episode = EpisodeExport::new(ScenarioId::RandomWalk.name(), self.scene(), self.seed);
        episode.add_frame(StepFrame::new(0, None, &sim.agent_state(&handle)?, false));
        let mut outcome = Outcome::default();

        for tick in 1..=self.steps as u64 {
            let Some(action) = actions.choose(&mut rng) else {
                return Ok(outcome.fail("agent has no actions"));
            };
            let obs = sim.step(action)?;
            let state = sim.agent_state(&handle)?;
            outcome.steps += 1;
            if obs.collided {
                outcome.collisions += 1;
            }
            episode.add_frame(StepFrame::new(tick, Some(action.as_str()), &state, obs.collided));

            if let Some(nav) = sim.navmesh() {
                if !nav.is_navigable(&state.position) {
                    episode.finalize(false);
                    outcome.episode = Some(episode);
                    return Ok(outcome.fail(format!("agent left the navmesh at tick {}", tick)));
                }
            }
        }

        episode.finalize(true);
        outcome.episode = Some(episode);
        Ok(outcome)
    }
}
