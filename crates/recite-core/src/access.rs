//! Authorization gates evaluated before any capture session starts.

use async_trait::async_trait;

/// The two independent yes/no checks recording depends on.
///
/// Both checks resolve asynchronously (platform permission prompts
/// answer on their own schedule). The coordinator queries them once per
/// process and caches the answers; a denial is terminal for the process,
/// never retried.
#[async_trait]
pub trait AccessAuthorizer: Send + Sync {
    /// Whether audio input may be captured.
    async fn microphone_allowed(&self) -> bool;

    /// Whether the recognition backend may be used.
    async fn recognition_allowed(&self) -> bool;
}

/// Cached answers from an [`AccessAuthorizer`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct AccessGrants {
    pub(crate) microphone: bool,
    pub(crate) recognition: bool,
}

/// Grants both checks unconditionally, for hosts without a permission
/// broker of their own.
#[derive(Debug, Default)]
pub struct SystemAuthorizer;

#[async_trait]
impl AccessAuthorizer for SystemAuthorizer {
    async fn microphone_allowed(&self) -> bool {
        true
    }

    async fn recognition_allowed(&self) -> bool {
        true
    }
}
