use shortlink_admission::AdmissionController;
use shortlink_service::Shortener;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    links: Arc<dyn Shortener>,
    admission: AdmissionController,
    api_keys: Arc<HashSet<String>>,
}

impl AppState {
    pub fn new(
        links: Arc<dyn Shortener>,
        admission: AdmissionController,
        api_keys: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            links,
            admission,
            api_keys: Arc::new(api_keys.into_iter().collect()),
        }
    }

    pub fn links(&self) -> &dyn Shortener {
        self.links.as_ref()
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn is_known_api_key(&self, key: &str) -> bool {
        self.api_keys.contains(key)
    }
}
