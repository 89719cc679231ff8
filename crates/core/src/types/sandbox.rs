//! Development sandbox descriptors.

use serde::{Deserialize, Serialize};

use super::status::SandboxStatus;

/// State of a user's sandbox as reported by the orchestration service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxDescriptor {
    pub user_id: String,
    pub container_name: String,
    pub status: SandboxStatus,
    #[serde(default)]
    pub urls: SandboxUrls,
}

impl SandboxDescriptor {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == SandboxStatus::Running
    }
}

/// Entry points exposed by a running sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxUrls {
    #[serde(default)]
    pub frontend: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub code_server: Option<String>,
}
