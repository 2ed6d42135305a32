//! REST client for the hosted directory service.
//!
//! The service exposes three read endpoints: `/colleges`, `/doctors`, and
//! `/counsellors?college=<name>`. Professionals arrive with the same `type`
//! tag the wizard uses, so they decode straight into [`Professional`].

use serde::Deserialize;

use crate::directory::model::{College, Professional, sort_by_rating_desc};
use crate::directory::provider::ProfessionalDirectory;
use crate::error::DirectoryError;

/// Directory backed by the hosted HTTP service.
pub struct RestDirectory {
    base_url: String,
    client: reqwest::Client,
}

/// College document as the service returns it (`college` is the name).
#[derive(Debug, Deserialize)]
struct RawCollege {
    id: String,
    college: String,
}

impl RestDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// GET a path and fail on non-success status.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<reqwest::Response> {
        let resp = self
            .client
            .get(self.endpoint(path))
            .query(query)
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("{path} returned {}", resp.status());
        }
        Ok(resp)
    }

    async fn fetch_professionals(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Professional>, DirectoryError> {
        let resp = self
            .get(path, query)
            .await
            .map_err(|e| DirectoryError::RequestFailed {
                reason: e.to_string(),
            })?;

        let mut list: Vec<Professional> =
            resp.json()
                .await
                .map_err(|e| DirectoryError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        // The service orders doctors itself but not counsellors; sorting
        // here keeps the descending-rating contract independent of backend.
        sort_by_rating_desc(&mut list);
        Ok(list)
    }
}

#[async_trait::async_trait]
impl ProfessionalDirectory for RestDirectory {
    async fn list_colleges(&self) -> Result<Vec<College>, DirectoryError> {
        let resp = self
            .get("colleges", &[])
            .await
            .map_err(|e| DirectoryError::RequestFailed {
                reason: e.to_string(),
            })?;

        let raw: Vec<RawCollege> =
            resp.json()
                .await
                .map_err(|e| DirectoryError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        Ok(raw
            .into_iter()
            .map(|c| College {
                id: c.id,
                name: c.college,
            })
            .collect())
    }

    async fn list_doctors(&self) -> Result<Vec<Professional>, DirectoryError> {
        self.fetch_professionals("doctors", &[]).await
    }

    async fn counsellors_by_college(
        &self,
        college: &str,
    ) -> Result<Vec<Professional>, DirectoryError> {
        self.fetch_professionals("counsellors", &[("college", college)])
            .await
    }
}
