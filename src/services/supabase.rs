use crate::config::{SupabaseSettings, TableSettings};
use crate::models::{Application, ContentAnalysis, DateMeDoc, MatchmakingScore, UserProfile};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when interacting with the hosted database
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Client for the hosted Postgres row API
///
/// All entity rows (profiles, docs, applications, analyses, scores) live in
/// the hosted database; this client wraps its REST surface with per-table
/// helpers so handlers never build filter strings themselves.
pub struct SupabaseClient {
    base_url: String,
    service_key: String,
    client: Client,
    tables: TableSettings,
}

impl SupabaseClient {
    /// Create a new client from settings
    pub fn new(settings: SupabaseSettings, tables: TableSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            service_key: settings.service_key,
            client,
            tables,
        }
    }

    fn table_url(&self, table: &str, query: &[(String, String)]) -> String {
        let mut url = format!("{}/rest/v1/{}", self.base_url, table);
        if !query.is_empty() {
            let qs = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&qs);
        }
        url
    }

    fn check_status(status: StatusCode, body: &str) -> Result<(), SupabaseError> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }
        if !status.is_success() {
            return Err(SupabaseError::ApiError(format!("{}: {}", status, body)));
        }
        Ok(())
    }

    /// Select rows matching the given filter pairs (`column`, `eq.value`...)
    async fn select(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> Result<Vec<Value>, SupabaseError> {
        let url = self.table_url(table, query);

        tracing::debug!("Selecting from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Self::check_status(status, &body)?;

        serde_json::from_str(&body)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse rows: {}", e)))
    }

    /// Insert a row, returning the stored representation
    async fn insert(&self, table: &str, payload: &Value) -> Result<Value, SupabaseError> {
        let url = self.table_url(table, &[]);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Self::check_status(status, &body)?;

        let rows: Vec<Value> = serde_json::from_str(&body)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse insert: {}", e)))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::InvalidResponse("Insert returned no rows".into()))
    }

    /// Update rows matching the filters, returning the stored representation
    async fn update(
        &self,
        table: &str,
        query: &[(String, String)],
        patch: &Value,
    ) -> Result<Vec<Value>, SupabaseError> {
        let url = self.table_url(table, query);

        let response = self
            .client
            .patch(&url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Self::check_status(status, &body)?;

        serde_json::from_str(&body)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse update: {}", e)))
    }

    /// Delete rows matching the filters
    async fn delete(&self, table: &str, query: &[(String, String)]) -> Result<(), SupabaseError> {
        let url = self.table_url(table, query);

        let response = self
            .client
            .delete(&url)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Self::check_status(status, &body)
    }

    fn parse_one<T: serde::de::DeserializeOwned>(
        rows: Vec<Value>,
        what: &str,
    ) -> Result<Option<T>, SupabaseError> {
        match rows.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse {}: {}", what, e))),
            None => Ok(None),
        }
    }

    fn parse_many<T: serde::de::DeserializeOwned>(
        rows: Vec<Value>,
        what: &str,
    ) -> Result<Vec<T>, SupabaseError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    SupabaseError::InvalidResponse(format!("Failed to parse {}: {}", what, e))
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Date-me-docs
    // ------------------------------------------------------------------

    /// Fetch a doc by its public slug
    pub async fn get_doc_by_slug(&self, slug: &str) -> Result<Option<DateMeDoc>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.date_me_docs,
                &[("slug".into(), format!("eq.{}", slug))],
            )
            .await?;
        Self::parse_one(rows, "doc")
    }

    /// Fetch a doc by id
    pub async fn get_doc(&self, id: Uuid) -> Result<Option<DateMeDoc>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.date_me_docs,
                &[("id".into(), format!("eq.{}", id))],
            )
            .await?;
        Self::parse_one(rows, "doc")
    }

    /// Check whether a slug is already in use
    pub async fn is_slug_taken(&self, slug: &str) -> Result<bool, SupabaseError> {
        let rows = self
            .select(
                &self.tables.date_me_docs,
                &[
                    ("slug".into(), format!("eq.{}", slug)),
                    ("select".into(), "id".into()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Create a doc
    pub async fn insert_doc(&self, payload: &Value) -> Result<DateMeDoc, SupabaseError> {
        let row = self.insert(&self.tables.date_me_docs, payload).await?;
        serde_json::from_value(row)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse doc: {}", e)))
    }

    /// Update a doc by id
    pub async fn update_doc(&self, id: Uuid, patch: &Value) -> Result<DateMeDoc, SupabaseError> {
        let rows = self
            .update(
                &self.tables.date_me_docs,
                &[("id".into(), format!("eq.{}", id))],
                patch,
            )
            .await?;
        Self::parse_one(rows, "doc")?
            .ok_or_else(|| SupabaseError::NotFound(format!("Doc {} not found", id)))
    }

    /// Delete a doc by id
    pub async fn delete_doc(&self, id: Uuid) -> Result<(), SupabaseError> {
        self.delete(
            &self.tables.date_me_docs,
            &[("id".into(), format!("eq.{}", id))],
        )
        .await
    }

    /// List all docs owned by a profile, newest first
    pub async fn list_docs_for_user(&self, user_id: Uuid) -> Result<Vec<DateMeDoc>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.date_me_docs,
                &[
                    ("user_id".into(), format!("eq.{}", user_id)),
                    ("order".into(), "created_at.desc".into()),
                ],
            )
            .await?;
        Self::parse_many(rows, "docs")
    }

    // ------------------------------------------------------------------
    // User profiles
    // ------------------------------------------------------------------

    /// Fetch a profile by its hosted-auth user id
    pub async fn get_profile_by_auth_id(
        &self,
        auth_user_id: &str,
    ) -> Result<Option<UserProfile>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.user_profiles,
                &[("auth_user_id".into(), format!("eq.{}", auth_user_id))],
            )
            .await?;
        Self::parse_one(rows, "profile")
    }

    /// Fetch a profile by id
    pub async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.user_profiles,
                &[("id".into(), format!("eq.{}", id))],
            )
            .await?;
        Self::parse_one(rows, "profile")
    }

    /// Create a profile
    pub async fn insert_profile(&self, payload: &Value) -> Result<UserProfile, SupabaseError> {
        let row = self.insert(&self.tables.user_profiles, payload).await?;
        serde_json::from_value(row)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }

    /// Update a profile by id
    pub async fn update_profile(
        &self,
        id: Uuid,
        patch: &Value,
    ) -> Result<UserProfile, SupabaseError> {
        let rows = self
            .update(
                &self.tables.user_profiles,
                &[("id".into(), format!("eq.{}", id))],
                patch,
            )
            .await?;
        Self::parse_one(rows, "profile")?
            .ok_or_else(|| SupabaseError::NotFound(format!("Profile {} not found", id)))
    }

    /// List completed candidate profiles, excluding the requesting user
    pub async fn list_candidate_profiles(
        &self,
        exclude_id: Uuid,
        limit: usize,
    ) -> Result<Vec<UserProfile>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.user_profiles,
                &[
                    ("id".into(), format!("neq.{}", exclude_id)),
                    ("profile_completed".into(), "eq.true".into()),
                    ("limit".into(), limit.to_string()),
                ],
            )
            .await?;
        let profiles = Self::parse_many(rows, "profiles")?;

        tracing::debug!("Queried {} candidate profiles", profiles.len());

        Ok(profiles)
    }

    // ------------------------------------------------------------------
    // Applications
    // ------------------------------------------------------------------

    /// Create an application
    pub async fn insert_application(&self, payload: &Value) -> Result<Application, SupabaseError> {
        let row = self.insert(&self.tables.applications, payload).await?;
        serde_json::from_value(row).map_err(|e| {
            SupabaseError::InvalidResponse(format!("Failed to parse application: {}", e))
        })
    }

    /// Fetch an application by id
    pub async fn get_application(&self, id: Uuid) -> Result<Option<Application>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.applications,
                &[("id".into(), format!("eq.{}", id))],
            )
            .await?;
        Self::parse_one(rows, "application")
    }

    /// List applications for a doc, newest first, with optional status filter
    pub async fn list_applications_for_doc(
        &self,
        doc_id: Uuid,
        status: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Application>, SupabaseError> {
        let mut query = vec![
            ("date_me_doc_id".into(), format!("eq.{}", doc_id)),
            ("order".into(), "created_at.desc".into()),
            ("limit".into(), limit.to_string()),
            ("offset".into(), offset.to_string()),
        ];
        if let Some(status) = status {
            query.push(("status".into(), format!("eq.{}", status)));
        }

        let rows = self.select(&self.tables.applications, &query).await?;
        Self::parse_many(rows, "applications")
    }

    /// Update an application by id
    pub async fn update_application(
        &self,
        id: Uuid,
        patch: &Value,
    ) -> Result<Application, SupabaseError> {
        let rows = self
            .update(
                &self.tables.applications,
                &[("id".into(), format!("eq.{}", id))],
                patch,
            )
            .await?;
        Self::parse_one(rows, "application")?
            .ok_or_else(|| SupabaseError::NotFound(format!("Application {} not found", id)))
    }

    /// Update an application's status, scoped to its doc
    pub async fn update_application_status(
        &self,
        id: Uuid,
        doc_id: Uuid,
        status: &str,
    ) -> Result<Application, SupabaseError> {
        let rows = self
            .update(
                &self.tables.applications,
                &[
                    ("id".into(), format!("eq.{}", id)),
                    ("date_me_doc_id".into(), format!("eq.{}", doc_id)),
                ],
                &serde_json::json!({ "status": status }),
            )
            .await?;
        Self::parse_one(rows, "application")?
            .ok_or_else(|| SupabaseError::NotFound(format!("Application {} not found", id)))
    }

    // ------------------------------------------------------------------
    // Content analyses
    // ------------------------------------------------------------------

    /// Store a content-analysis row
    pub async fn insert_content_analysis(
        &self,
        payload: &Value,
    ) -> Result<ContentAnalysis, SupabaseError> {
        let row = self.insert(&self.tables.content_analysis, payload).await?;
        serde_json::from_value(row)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse analysis: {}", e)))
    }

    /// Update content-analysis rows for an application
    pub async fn update_analyses_for_application(
        &self,
        application_id: Uuid,
        patch: &Value,
    ) -> Result<(), SupabaseError> {
        self.update(
            &self.tables.content_analysis,
            &[("application_id".into(), format!("eq.{}", application_id))],
            patch,
        )
        .await?;
        Ok(())
    }

    /// List a user's stored analyses, newest first
    pub async fn list_analyses_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ContentAnalysis>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.content_analysis,
                &[
                    ("user_id".into(), format!("eq.{}", user_id)),
                    ("order".into(), "created_at.desc".into()),
                ],
            )
            .await?;
        Self::parse_many(rows, "analyses")
    }

    // ------------------------------------------------------------------
    // Matchmaking scores
    // ------------------------------------------------------------------

    /// Store a matchmaking-score row
    pub async fn insert_matchmaking_score(
        &self,
        payload: &Value,
    ) -> Result<MatchmakingScore, SupabaseError> {
        let row = self.insert(&self.tables.matchmaking_scores, payload).await?;
        serde_json::from_value(row)
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse score: {}", e)))
    }

    /// Fetch stored scores for a set of applications
    pub async fn scores_for_applications(
        &self,
        application_ids: &[Uuid],
    ) -> Result<Vec<MatchmakingScore>, SupabaseError> {
        if application_ids.is_empty() {
            return Ok(vec![]);
        }

        let ids = application_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let rows = self
            .select(
                &self.tables.matchmaking_scores,
                &[("application_id".into(), format!("in.({})", ids))],
            )
            .await?;
        Self::parse_many(rows, "scores")
    }

    /// Fetch the stored score for one application
    pub async fn get_score_for_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<MatchmakingScore>, SupabaseError> {
        let rows = self
            .select(
                &self.tables.matchmaking_scores,
                &[("application_id".into(), format!("eq.{}", application_id))],
            )
            .await?;
        Self::parse_one(rows, "score")
    }
}
