use super::GenerationError;

/// Side effects the conversation asks the front-end to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    AuthRequired,
    GenerationFailed(GenerationError),
    SandboxFailed(String),
}
