//! Simulator sessions.
//!
//! A `Simulator` is opened against one `Configuration`, drives its agents
//! through discrete actions and releases every backend resource on `close`
//! (or on drop).

use crate::backend::Backend;
use crate::context::SimContext;
use crate::physics::{ObjectId, PhysicsWorld};

use embodied_core::{
    AgentBody, AgentState, Attributes, Configuration, ObjectAttributes, SceneId, SimError,
    StageAttributes, TemplateId, TemplateLibrary,
};
use embodied_env::{Aabb, Frame, NavMesh, SceneGraph};
use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;
use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sensor readings produced by one step.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Sensor uuid → frame
    pub readings: BTreeMap<String, Frame>,

    /// The step's move was blocked by the navmesh
    pub collided: bool,
}

impl Observation {
    pub fn get(&self, sensor: &str) -> Option<&Frame> {
        self.readings.get(sensor)
    }
}

/// Weak reference to an agent of a session.
///
/// Handles stay valid to hold after the session closes; using one with a
/// closed session fails with `SimError::ClosedSession`.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    session: Uuid,
    index: usize,
    alive: Arc<AtomicBool>,
}

impl AgentHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn session_id(&self) -> Uuid {
        self.session
    }

    /// Returns false once the owning session has closed.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// A live simulation session.
pub struct Simulator {
    id: Uuid,

    /// Frozen copy of the configuration the session was opened with
    config: Configuration,

    backend: Backend,
    context: SimContext,

    /// Stage template in effect (`None` for the "NONE" scene)
    stage_template: Option<StageAttributes>,

    scene_graph: SceneGraph,
    navmesh: Option<NavMesh>,

    agents: Vec<AgentBody>,
    physics: PhysicsWorld,

    /// Cleared on close; shared with every handed-out `AgentHandle`
    alive: Arc<AtomicBool>,

    /// Collisions since open or last reset
    collisions: u64,

    /// Steps since open or last reset
    tick_count: u64,
}

impl Simulator {
    /// Opens a session using glTF scenes from disk and the process-wide
    /// template library.
    pub fn open(config: Configuration) -> Result<Self, SimError> {
        Self::open_with(config, Backend::filesystem())
    }

    /// Opens a session against an explicit backend.
    pub fn open_with(config: Configuration, backend: Backend) -> Result<Self, SimError> {
        config.validate()?;

        let (scene_graph, navmesh, stage_template) = match &config.sim.scene_id {
            SceneId::None => (SceneGraph::new(), None, None),
            SceneId::Path(path) => {
                let scene_err = |e: embodied_env::EnvError| {
                    SimError::config(format!("scene '{}': {}", path.display(), e))
                };
                let resolved = backend.scenes.resolve(path).map_err(scene_err)?;
                let graph = backend.scenes.load_stage(&resolved).map_err(scene_err)?;
                // A mesh with no regions has nothing to walk on
                let navmesh = backend
                    .navmeshes
                    .navmesh_for(&resolved)
                    .map_err(scene_err)?
                    .filter(|n| !n.regions.is_empty());

                let handle = config.sim.scene_id.to_string();
                let stage = register_stage(&backend.templates, &handle, &resolved)?;
                (graph, navmesh, Some(stage))
            }
        };

        if let (SceneId::Path(_), None) = (&config.sim.scene_id, &navmesh) {
            warn!("No navmesh for scene {}, collisions are disabled", config.sim.scene_id);
        }

        let gravity = stage_template
            .as_ref()
            .map(|s| s.gravity)
            .unwrap_or_else(|| StageAttributes::default().gravity);
        let floor_height = match (&navmesh, &stage_template) {
            (Some(nav), _) => nav.bounds().map(|b| b.min.y),
            (None, Some(stage)) => Some(stage.origin.y),
            (None, None) => None,
        };

        let mut sim = Self {
            id: Uuid::new_v4(),
            physics: PhysicsWorld::new(config.sim.enable_physics, gravity, floor_height),
            context: SimContext::new(config.sim.random_seed),
            agents: Vec::with_capacity(config.agents.len()),
            config,
            backend,
            stage_template,
            scene_graph,
            navmesh,
            alive: Arc::new(AtomicBool::new(true)),
            collisions: 0,
            tick_count: 0,
        };

        for index in 0..sim.config.agents.len() {
            let state = sim.sample_start_state();
            sim.agents
                .push(AgentBody::new(index, sim.config.agents[index].clone(), state));
        }

        info!(
            "Opened session {} (scene={}, agents={}, navmesh={}, physics={})",
            sim.id,
            sim.config.sim.scene_id,
            sim.agents.len(),
            sim.navmesh.is_some(),
            sim.config.sim.enable_physics
        );

        Ok(sim)
    }

    fn ensure_open(&self) -> Result<(), SimError> {
        if self.alive.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(SimError::ClosedSession)
        }
    }

    fn check_handle(&self, handle: &AgentHandle) -> Result<usize, SimError> {
        if !handle.is_alive() {
            return Err(SimError::ClosedSession);
        }
        self.ensure_open()?;
        if handle.session != self.id {
            return Err(SimError::config(format!(
                "agent handle belongs to session {}, not {}",
                handle.session, self.id
            )));
        }
        Ok(handle.index)
    }

    fn handle(&self, index: usize) -> AgentHandle {
        AgentHandle {
            session: self.id,
            index,
            alive: self.alive.clone(),
        }
    }

    /// Random navigable point and heading when a navmesh exists, the origin
    /// facing -Z otherwise.
    fn sample_start_state(&mut self) -> AgentState {
        let Some(nav) = &self.navmesh else {
            return AgentState::default();
        };
        let rng = self.context.rng();
        let Some(position) = nav.random_navigable_point(rng) else {
            return AgentState::default();
        };
        let yaw: f32 = rng.gen_range(0.0..TAU);
        AgentState::new(position, UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw))
    }

    // ------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------

    /// (Re)creates agent `index` at a fresh start state, replacing any
    /// existing agent for that index.
    pub fn initialize_agent(&mut self, index: usize) -> Result<AgentHandle, SimError> {
        self.ensure_open()?;
        if index >= self.config.agents.len() {
            return Err(SimError::agent_index(index, self.config.agents.len()));
        }
        let state = self.sample_start_state();
        self.initialize_agent_with_state(index, state)
    }

    /// (Re)creates agent `index` at `state`, which becomes its reset target.
    pub fn initialize_agent_with_state(
        &mut self,
        index: usize,
        state: AgentState,
    ) -> Result<AgentHandle, SimError> {
        self.ensure_open()?;
        let count = self.config.agents.len();
        let config = self
            .config
            .agents
            .get(index)
            .cloned()
            .ok_or_else(|| SimError::agent_index(index, count))?;

        self.agents[index] = AgentBody::new(index, config, state);
        debug!(
            "Initialized agent {} at ({:.3}, {:.3}, {:.3})",
            index, state.position.x, state.position.y, state.position.z
        );

        Ok(self.handle(index))
    }

    /// Returns a handle to an existing agent.
    pub fn get_agent(&self, index: usize) -> Result<AgentHandle, SimError> {
        self.ensure_open()?;
        if index >= self.agents.len() {
            return Err(SimError::agent_index(index, self.agents.len()));
        }
        Ok(self.handle(index))
    }

    pub fn agent(&self, index: usize) -> Result<&AgentBody, SimError> {
        self.ensure_open()?;
        self.agents
            .get(index)
            .ok_or_else(|| SimError::agent_index(index, self.agents.len()))
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    pub fn agent_state(&self, handle: &AgentHandle) -> Result<AgentState, SimError> {
        let index = self.check_handle(handle)?;
        Ok(self.agent(index)?.state())
    }

    /// Moves an agent; `reset_initial` also makes `state` its reset target.
    pub fn set_agent_state(
        &mut self,
        handle: &AgentHandle,
        state: AgentState,
        reset_initial: bool,
    ) -> Result<(), SimError> {
        let index = self.check_handle(handle)?;
        let count = self.agents.len();
        let body = self
            .agents
            .get_mut(index)
            .ok_or_else(|| SimError::agent_index(index, count))?;
        body.set_state(state, reset_initial);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Applies `action` to the default agent and advances one tick.
    pub fn step(&mut self, action: &str) -> Result<Observation, SimError> {
        self.step_agent(self.config.sim.default_agent_id, action)
    }

    /// Applies `action` to agent `index` and advances one tick.
    ///
    /// An unknown action fails before anything changes.
    pub fn step_agent(&mut self, index: usize, action: &str) -> Result<Observation, SimError> {
        self.ensure_open()?;
        let count = self.agents.len();
        let navmesh = self.navmesh.as_ref();
        let body = self
            .agents
            .get_mut(index)
            .ok_or_else(|| SimError::agent_index(index, count))?;

        let collided = body.act(action, navmesh)?;

        let dt = self.config.sim.physics_timestep;
        self.physics.step(dt);
        self.context.advance_time(Duration::from_secs_f64(dt));
        self.tick_count += 1;
        if collided {
            self.collisions += 1;
        }

        debug!(
            "Tick {}: agent {} '{}' (collided={})",
            self.tick_count, index, action, collided
        );

        Ok(self.observe(index, collided))
    }

    fn observe(&self, index: usize, collided: bool) -> Observation {
        let mut readings = BTreeMap::new();
        if let Some(body) = self.agents.get(index) {
            let scene = (!self.config.sim.scene_id.is_none()).then_some(&self.scene_graph);
            for spec in &body.config().sensor_specifications {
                let frame = self
                    .backend
                    .renderer
                    .render(spec, &body.sensor_pose(spec), scene);
                readings.insert(spec.uuid.clone(), frame);
            }
        }
        Observation { readings, collided }
    }

    /// Advances object dynamics without moving any agent.
    pub fn step_physics(&mut self, dt: f64) -> Result<(), SimError> {
        self.ensure_open()?;
        let elapsed = Duration::try_from_secs_f64(dt)
            .map_err(|e| SimError::config(format!("physics dt {}: {}", dt, e)))?;
        self.physics.step(dt);
        self.context.advance_time(elapsed);
        Ok(())
    }

    /// Puts every agent back at its initial state and clears per-episode
    /// counters. Objects stay where they are.
    pub fn reset(&mut self) -> Result<Observation, SimError> {
        self.ensure_open()?;
        for body in &mut self.agents {
            body.reset();
        }
        self.collisions = 0;
        self.tick_count = 0;
        self.context.set_time(0);

        debug!("Reset session {}", self.id);
        Ok(self.observe(self.config.sim.default_agent_id, false))
    }

    /// Releases every backend resource. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }

        self.agents.clear();
        self.physics.clear();
        self.scene_graph = SceneGraph::new();
        self.navmesh = None;
        self.stage_template = None;

        info!(
            "Closed session {} after {} ticks",
            self.id, self.tick_count
        );
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    /// Spawns an object from a registered template.
    ///
    /// Returns `Ok(None)` if no template has that ID.
    pub fn add_object(&mut self, template_id: TemplateId) -> Result<Option<ObjectId>, SimError> {
        self.ensure_open()?;
        let Some(template) = self.backend.templates.objects.get_template_by_id(template_id) else {
            debug!("add_object: no object template with id {}", template_id);
            return Ok(None);
        };

        let id = self.physics.add_object(template_id, template);
        debug!("Spawned object {} from template {}", id, template_id);
        Ok(Some(id))
    }

    /// Spawns an object from the template registered under `handle`.
    pub fn add_object_by_handle(&mut self, handle: &str) -> Result<Option<ObjectId>, SimError> {
        self.ensure_open()?;
        match self.backend.templates.objects.get_template_id_by_handle(handle) {
            Some(id) => self.add_object(id),
            None => Ok(None),
        }
    }

    /// Returns true if the object existed.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<bool, SimError> {
        self.ensure_open()?;
        Ok(self.physics.remove_object(id).is_some())
    }

    /// Copy of the template an object was created from.
    pub fn get_object_initialization_template(
        &self,
        id: ObjectId,
    ) -> Result<Option<ObjectAttributes>, SimError> {
        self.ensure_open()?;
        Ok(self.physics.object(id).map(|o| o.template.clone()))
    }

    pub fn get_object_translation(&self, id: ObjectId) -> Result<Option<Vector3<f32>>, SimError> {
        self.ensure_open()?;
        Ok(self.physics.object(id).map(|o| o.translation))
    }

    /// Returns false if no such object exists.
    pub fn set_object_translation(
        &mut self,
        id: ObjectId,
        translation: Vector3<f32>,
    ) -> Result<bool, SimError> {
        self.ensure_open()?;
        Ok(self.physics.set_translation(id, translation))
    }

    pub fn get_existing_object_ids(&self) -> Result<Vec<ObjectId>, SimError> {
        self.ensure_open()?;
        Ok(self.physics.object_ids())
    }

    // ------------------------------------------------------------------
    // Stage and templates
    // ------------------------------------------------------------------

    /// The stage template in effect; `None` for the "NONE" scene.
    pub fn get_stage_initialization_template(&self) -> Result<Option<StageAttributes>, SimError> {
        self.ensure_open()?;
        Ok(self.stage_template.clone())
    }

    /// Registries backing this session.
    pub fn template_library(&self) -> Result<Arc<TemplateLibrary>, SimError> {
        self.ensure_open()?;
        Ok(self.backend.templates.clone())
    }

    /// The loaded stage's scene graph (root-only for the "NONE" scene).
    pub fn get_active_scene_graph(&mut self) -> Result<&mut SceneGraph, SimError> {
        self.ensure_open()?;
        Ok(&mut self.scene_graph)
    }

    /// World-space bounds of the stage, `None` without geometry.
    pub fn scene_bounding_box(&mut self) -> Result<Option<Aabb>, SimError> {
        let graph = self.get_active_scene_graph()?;
        let root = graph.root();
        Ok(graph.compute_cumulative_bb(root))
    }

    pub fn navmesh_loaded(&self) -> bool {
        self.navmesh.is_some()
    }

    pub fn navmesh(&self) -> Option<&NavMesh> {
        self.navmesh.as_ref()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        !self.alive.load(Ordering::Acquire)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn collision_count(&self) -> u64 {
        self.collisions
    }

    /// Virtual time since open or last reset.
    pub fn time(&self) -> Duration {
        self.context.now()
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.close();
    }
}

/// Registers the stage template for `scene` under `handle` and returns the
/// registered copy. A sibling `<stem>.stage_config.json` overrides the
/// defaults, but the render asset is always the scene itself.
fn register_stage(
    library: &TemplateLibrary,
    handle: &str,
    resolved: &Path,
) -> Result<StageAttributes, SimError> {
    let config_path = resolved.with_extension(&StageAttributes::CONFIG_SUFFIX[1..]);
    let template = match fs::read_to_string(&config_path) {
        Ok(json) => {
            let base_dir = config_path.parent().unwrap_or_else(|| Path::new(""));
            let mut template = StageAttributes::from_config_json(handle, base_dir, &json)
                .map_err(|e| SimError::config(e.to_string()))?;
            template.render_asset_handle = handle.to_string();
            template
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => StageAttributes::for_asset(handle),
        Err(e) => {
            return Err(SimError::config(format!(
                "stage config '{}': {}",
                config_path.display(),
                e
            )))
        }
    };

    let id = library.stages.register_template(template, handle)?;
    library
        .stages
        .get_template_by_id(id)
        .ok_or_else(|| SimError::config(format!("stage template '{}' vanished", handle)))
}
