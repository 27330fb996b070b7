//! Registry of named state modules

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::module::StateModule;
use crate::StoreError;

/// Object-safe view of a module used for whole-container snapshots
trait SerializableModule: Send + Sync {
    fn to_json(&self) -> Result<serde_json::Value, StoreError>;
}

impl<S> SerializableModule for StateModule<S>
where
    S: Clone + Serialize + Send + Sync + 'static,
{
    fn to_json(&self) -> Result<serde_json::Value, StoreError> {
        serde_json::to_value(&*self.get()).map_err(|source| StoreError::Serialize {
            module: self.name().to_string(),
            source,
        })
    }
}

/// Container of uniquely named state modules
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<AHashMap<String, Arc<dyn SerializableModule>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a module and register it under `name`
    pub fn create<S>(&self, name: &str, initial: S) -> Result<Arc<StateModule<S>>, StoreError>
    where
        S: Clone + Serialize + Send + Sync + 'static,
    {
        let module = Arc::new(StateModule::new(name, initial));
        self.register(Arc::clone(&module))?;
        Ok(module)
    }

    /// Register an existing module under its own name
    pub fn register<S>(&self, module: Arc<StateModule<S>>) -> Result<(), StoreError>
    where
        S: Clone + Serialize + Send + Sync + 'static,
    {
        let mut modules = self.modules.write();
        let name = module.name().to_string();
        if modules.contains_key(&name) {
            return Err(StoreError::DuplicateModule(name));
        }
        debug!(module = %name, "registering state module");
        modules.insert(name, module);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    /// Registered module names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Serialize every module into one JSON object keyed by module name
    pub fn snapshot(&self) -> Result<serde_json::Value, StoreError> {
        let modules = self.modules.read();
        let mut object = serde_json::Map::new();
        for (name, module) in modules.iter() {
            object.insert(name.clone(), module.to_json()?);
        }
        Ok(serde_json::Value::Object(object))
    }
}
