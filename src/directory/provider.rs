//! The professional-directory collaborator seam.

use async_trait::async_trait;

use crate::directory::model::{College, Professional};
use crate::error::DirectoryError;

/// Read-only directory of colleges and professionals.
///
/// The wizard holds an `Arc<dyn ProfessionalDirectory>` and queries it
/// reactively as the selection criteria change; implementations must be
/// safe to call concurrently.
#[async_trait]
pub trait ProfessionalDirectory: Send + Sync {
    /// All colleges students can select from.
    async fn list_colleges(&self) -> Result<Vec<College>, DirectoryError>;

    /// All doctors, ordered by descending rating.
    async fn list_doctors(&self) -> Result<Vec<Professional>, DirectoryError>;

    /// Counsellors affiliated with the named college, ordered by
    /// descending rating.
    async fn counsellors_by_college(
        &self,
        college: &str,
    ) -> Result<Vec<Professional>, DirectoryError>;
}
