use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub local_storage_path: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:54321".to_string(),
            api_timeout_secs: 5,
            local_storage_path: PathBuf::from("./test-portal-storage.json"),
        }
    }
}

impl TestConfig {
    pub fn for_server(uri: impl Into<String>) -> Self {
        Self {
            api_base_url: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_storage(mut self, path: impl AsRef<Path>) -> Self {
        self.local_storage_path = path.as_ref().to_path_buf();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        let mut config = AppConfig::with_base_url(self.api_base_url.clone());
        config.api_timeout_secs = self.api_timeout_secs;
        config.local_storage_path = self.local_storage_path.clone();
        config
    }
}

pub struct MockPortalResponses;

impl MockPortalResponses {
    pub fn success() -> Value {
        json!({ "status": "success" })
    }

    pub fn failure(message: &str) -> Value {
        json!({ "status": "error", "message": message })
    }

    pub fn availability_response(ranges: &[(&str, &str)]) -> Value {
        let ranges: Vec<Value> = ranges
            .iter()
            .map(|(start, end)| json!({ "start": start, "end": end }))
            .collect();
        json!({ "availability": { "ranges": ranges } })
    }

    pub fn bulk_response(updated: u32) -> Value {
        json!({ "status": "success", "updated": updated })
    }

    pub fn doctor_listed_response(email: &str, listed: bool) -> Value {
        json!({
            "status": "success",
            "doctor": {
                "email": email,
                "fullName": "Dr. Ana Reyes",
                "specialization": "Clinical Psychology",
                "listed": listed
            }
        })
    }

    pub fn slots_response(slots: &[&str]) -> Value {
        json!({ "slots": slots })
    }

    pub fn profile_response(pre_assessment: Option<Value>) -> Value {
        json!({
            "email": "patient@example.com",
            "preAssessment": pre_assessment
        })
    }
}
