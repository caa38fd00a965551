//! Shared application state

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::model::VentilatorModel;

/// Holder for the active model.
///
/// Readers take a snapshot `Arc`; train and load swap the whole model.
#[derive(Clone, Default)]
pub struct ModelSlot {
    inner: Arc<RwLock<Option<Arc<VentilatorModel>>>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<VentilatorModel>> {
        self.inner.read().clone()
    }

    pub fn replace(&self, model: VentilatorModel) -> Arc<VentilatorModel> {
        let model = Arc::new(model);
        *self.inner.write() = Some(model.clone());
        model
    }

    pub fn is_trained(&self) -> bool {
        self.inner.read().is_some()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub model: ModelSlot,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            model: ModelSlot::new(),
        }
    }
}
