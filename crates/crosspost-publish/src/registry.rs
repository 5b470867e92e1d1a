//! Publisher lookup table.

use std::collections::HashMap;
use std::sync::Arc;

use crosspost_model::Platform;

use crate::PlatformPublisher;

/// Capability map from platform to its publisher.
#[derive(Default, Clone)]
pub struct PublisherRegistry {
    publishers: HashMap<Platform, Arc<dyn PlatformPublisher>>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a publisher under the platform it reports. Replaces any
    /// earlier registration for the same platform.
    pub fn register(mut self, publisher: Arc<dyn PlatformPublisher>) -> Self {
        self.publishers.insert(publisher.platform(), publisher);
        self
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformPublisher>> {
        self.publishers.get(&platform).cloned()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<_> = self.publishers.keys().copied().collect();
        platforms.sort();
        platforms
    }
}
