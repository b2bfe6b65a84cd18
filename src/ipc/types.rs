use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::Config;
use crate::editor::Editors;
use crate::sync::Backend;

#[derive(Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub backend: Option<Box<dyn Backend>>,
    pub backend_url: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub editors: Editors,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            backend: None,
            backend_url: None,
            connected_at: None,
            editors: Editors::default(),
        }
    }

    pub fn attach_backend(&mut self, backend: Box<dyn Backend>, base_url: &str) {
        self.backend = Some(backend);
        self.backend_url = Some(base_url.to_string());
        self.connected_at = Some(Utc::now());
    }
}
