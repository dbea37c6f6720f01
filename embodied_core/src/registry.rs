//! Template registry with copy-on-register editing semantics.
//!
//! # Invariants
//!
//! - IDs are assigned monotonically per manager and never reused, even after
//!   a template is removed.
//! - Re-registering an existing handle replaces its canonical record and
//!   keeps its ID; only new handles grow `get_num_templates()`.
//! - Lookups return working copies. Editing a copy changes nothing until
//!   it is passed back to `register_template`.
//! - A failed registration or load leaves the manager untouched.
//!
//! Managers lock internally so they can be shared between sessions through
//! an `Arc`. Concurrent overwrites of the same handle are last-writer-wins.

use crate::attributes::{Attributes, ObjectAttributes, StageAttributes, TemplateId};
use crate::error::SimError;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug)]
struct ManagerState<T> {
    templates: BTreeMap<TemplateId, T>,
    ids_by_handle: HashMap<String, TemplateId>,
    next_id: u32,
}

impl<T: Attributes> ManagerState<T> {
    fn insert(&mut self, mut template: T, handle: String) -> TemplateId {
        let id = match self.ids_by_handle.get(&handle) {
            Some(id) => {
                debug!("Overwriting {} template '{}' (id={})", T::KIND, handle, id);
                *id
            }
            None => {
                let id = TemplateId(self.next_id);
                self.next_id += 1;
                self.ids_by_handle.insert(handle.clone(), id);
                debug!("Registered {} template '{}' (id={})", T::KIND, handle, id);
                id
            }
        };

        template.set_handle(&handle);
        template.set_id(id);
        self.templates.insert(id, template);
        id
    }
}

/// Registry of one template kind, keyed by ID and by unique handle.
#[derive(Debug)]
pub struct AttributesManager<T: Attributes> {
    state: RwLock<ManagerState<T>>,
}

pub type ObjectAttributesManager = AttributesManager<ObjectAttributes>;
pub type StageAttributesManager = AttributesManager<StageAttributes>;

impl<T: Attributes> AttributesManager<T> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ManagerState {
                templates: BTreeMap::new(),
                ids_by_handle: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ManagerState<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ManagerState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a canonical copy of `template` under `handle`.
    ///
    /// An empty `handle` falls back to the template's own handle. Fails only
    /// when both are empty.
    pub fn register_template(&self, template: T, handle: &str) -> Result<TemplateId, SimError> {
        let handle = if handle.trim().is_empty() {
            template.handle().trim().to_string()
        } else {
            handle.to_string()
        };
        if handle.is_empty() {
            return Err(SimError::InvalidTemplate(format!(
                "{} template has no handle",
                T::KIND
            )));
        }

        Ok(self.write().insert(template, handle))
    }

    /// Creates an unregistered template with default values.
    pub fn create_template(&self, handle: &str) -> T {
        T::with_handle(handle)
    }

    pub fn get_template_by_id(&self, id: TemplateId) -> Option<T> {
        self.read().templates.get(&id).cloned()
    }

    pub fn get_template_by_handle(&self, handle: &str) -> Option<T> {
        let state = self.read();
        state
            .ids_by_handle
            .get(handle)
            .and_then(|id| state.templates.get(id))
            .cloned()
    }

    pub fn get_template_id_by_handle(&self, handle: &str) -> Option<TemplateId> {
        self.read().ids_by_handle.get(handle).copied()
    }

    pub fn get_num_templates(&self) -> usize {
        self.read().templates.len()
    }

    /// Sorted handles containing `contains` (empty matches all).
    pub fn get_template_handles(&self, contains: &str) -> Vec<String> {
        let mut handles: Vec<String> = self
            .read()
            .ids_by_handle
            .keys()
            .filter(|h| h.contains(contains))
            .cloned()
            .collect();
        handles.sort();
        handles
    }

    /// Removes a template. Its ID is retired, not recycled.
    pub fn remove_template_by_handle(&self, handle: &str) -> Option<T> {
        let mut state = self.write();
        let id = state.ids_by_handle.remove(handle)?;
        state.templates.remove(&id)
    }

    /// Imports every config file of this kind found at `path`.
    ///
    /// `path` may be a directory (searched recursively), a config file, or
    /// a stem that becomes a config file once the kind's suffix is
    /// appended. Unparsable files are skipped. IDs come back in discovery
    /// order (sorted by file name).
    pub fn load_configs(&self, path: &Path) -> Result<Vec<TemplateId>, SimError> {
        let files = Self::discover_configs(path)?;

        let mut parsed = Vec::with_capacity(files.len());
        for file in files {
            let handle = file.display().to_string();
            let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
            let result = std::fs::read_to_string(&file)
                .map_err(|e| SimError::InvalidTemplate(format!("{}: {}", handle, e)))
                .and_then(|json| T::from_config_json(&handle, base_dir, &json));

            match result {
                Ok(template) => parsed.push((handle, template)),
                Err(e) => warn!("Skipping {} config {}: {}", T::KIND, handle, e),
            }
        }

        let mut state = self.write();
        let ids: Vec<TemplateId> = parsed
            .into_iter()
            .map(|(handle, template)| state.insert(template, handle))
            .collect();

        info!(
            "Loaded {} {} template(s) from {}",
            ids.len(),
            T::KIND,
            path.display()
        );
        Ok(ids)
    }

    fn discover_configs(path: &Path) -> Result<Vec<PathBuf>, SimError> {
        let load_error = |reason: String| SimError::Load {
            path: path.display().to_string(),
            reason,
        };

        if path.is_dir() {
            let mut files = Vec::new();
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| load_error(e.to_string()))?;
                let is_config = entry
                    .file_name()
                    .to_string_lossy()
                    .ends_with(T::CONFIG_SUFFIX);
                if entry.file_type().is_file() && is_config {
                    files.push(entry.into_path());
                }
            }
            return Ok(files);
        }

        if path.is_file() {
            let is_config = path
                .file_name()
                .map(|n| n.to_string_lossy().ends_with(T::CONFIG_SUFFIX))
                .unwrap_or(false);
            return Ok(if is_config { vec![path.to_path_buf()] } else { Vec::new() });
        }

        let with_suffix = PathBuf::from(format!("{}{}", path.display(), T::CONFIG_SUFFIX));
        if with_suffix.is_file() {
            return Ok(vec![with_suffix]);
        }

        Err(load_error("no such file or directory".to_string()))
    }
}

impl<T: Attributes> Default for AttributesManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object and stage registries shared by every session that uses them.
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    pub objects: ObjectAttributesManager,
    pub stages: StageAttributesManager,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped library for sharing across sessions.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The process-wide library used by sessions opened without an
    /// explicit backend.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<TemplateLibrary>> = OnceLock::new();
        GLOBAL.get_or_init(TemplateLibrary::shared).clone()
    }
}
