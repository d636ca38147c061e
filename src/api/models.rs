use serde::{Deserialize, Serialize};

use crate::data_models::ServiceStatus;
use crate::search::{DEFAULT_LANGUAGE, DEFAULT_LOCATION};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub location: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub location: Option<String>,
    pub language: Option<String>,
}

impl SearchParams {
    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub services: ServiceStatus,
    pub all_services_ok: bool,
}
