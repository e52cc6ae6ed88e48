use async_trait::async_trait;

use crate::Result;
use crate::types::ImageHandle;

/// Seam between the request handler and the remote inference service.
///
/// The production implementation is [`crate::GradioClient`]; tests inject
/// substitutes.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Identifier of the remote service, for diagnostics.
    fn space_id(&self) -> &str;

    async fn infer(&self, prompt: &str) -> Result<ImageHandle>;
}
