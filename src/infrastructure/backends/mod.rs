pub mod chat_api;
pub mod sandbox_api;

use std::sync::Arc;

use crate::domain::models::GenerationBackendArc;
use crate::domain::models::SandboxBackendArc;

pub struct BackendManager {}

impl BackendManager {
    pub fn generation() -> GenerationBackendArc {
        return Arc::<chat_api::ChatApi>::default();
    }

    pub fn sandbox() -> SandboxBackendArc {
        return Arc::<sandbox_api::SandboxApi>::default();
    }
}
