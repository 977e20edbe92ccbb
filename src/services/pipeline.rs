use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{MatchEngine, MatchInput, MatchOutcome};
use crate::models::{LinkKind, PsychProfile, SocialLink, UserProfile};
use crate::services::analyzer::{AnalyzerClient, AnalyzerError};
use crate::services::extractor::ContentExtractor;
use crate::services::jobs::{JobStore, JobStoreError};
use crate::services::supabase::{SupabaseClient, SupabaseError};

/// Errors from the analysis pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Supabase(#[from] SupabaseError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    #[error(transparent)]
    JobStore(#[from] JobStoreError),

    #[error("Missing data: {0}")]
    Missing(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),
}

/// Result of a digital footprint analysis
#[derive(Debug, Clone)]
pub struct FootprintAnalysis {
    pub profile: PsychProfile,
    pub metadata: Value,
    pub footprint_score: i32,
}

/// End-to-end analysis flow for applications and profiles
///
/// Runs after an application is submitted (spawned, never awaited by the
/// request handler): extract submitted links, analyze the applicant,
/// match against the doc owner, store the results, and record the job
/// outcome in the local queue.
pub struct AnalysisPipeline {
    supabase: Arc<SupabaseClient>,
    analyzer: Arc<AnalyzerClient>,
    extractor: Arc<ContentExtractor>,
    jobs: Arc<JobStore>,
    engine: MatchEngine,
}

impl AnalysisPipeline {
    pub fn new(
        supabase: Arc<SupabaseClient>,
        analyzer: Arc<AnalyzerClient>,
        extractor: Arc<ContentExtractor>,
        jobs: Arc<JobStore>,
        engine: MatchEngine,
    ) -> Self {
        Self {
            supabase,
            analyzer,
            extractor,
            jobs,
            engine,
        }
    }

    /// Process a submitted application, recording the job outcome
    pub async fn process_application(&self, application_id: Uuid, doc_id: Uuid) {
        tracing::info!("Starting analysis for application {}", application_id);

        if let Err(e) = self.jobs.mark_running(application_id, "application").await {
            tracing::warn!("Failed to mark job running for {}: {}", application_id, e);
        }

        match self.run_application_analysis(application_id, doc_id).await {
            Ok(()) => {
                if let Err(e) = self.jobs.mark_completed(application_id, "application").await {
                    tracing::warn!("Failed to mark job completed for {}: {}", application_id, e);
                }
                tracing::info!("Analysis completed for application {}", application_id);
            }
            Err(e) => {
                tracing::error!("Application analysis error for {}: {}", application_id, e);
                if let Err(mark_err) = self
                    .jobs
                    .mark_failed(application_id, "application", &e.to_string())
                    .await
                {
                    tracing::warn!("Failed to mark job failed for {}: {}", application_id, mark_err);
                }
            }
        }
    }

    async fn run_application_analysis(
        &self,
        application_id: Uuid,
        doc_id: Uuid,
    ) -> Result<(), PipelineError> {
        let application = self
            .supabase
            .get_application(application_id)
            .await?
            .ok_or_else(|| PipelineError::Missing(format!("application {}", application_id)))?;

        // Extract submitted links and store per-source analysis rows
        let results = self.extractor.extract_many(&application.social_links).await;
        let aggregated = self.extractor.aggregate(&results);

        for result in &results {
            if let Ok(content) = &result.outcome {
                self.supabase
                    .insert_content_analysis(&serde_json::json!({
                        "application_id": application_id,
                        "user_id": application.applicant_user_id,
                        "source_type": result.link.kind,
                        "source_url": result.link.url,
                        "extracted_content": content.body,
                        "content_metadata": aggregated.metadata,
                    }))
                    .await?;
            }
        }

        if aggregated.corpus.is_empty() {
            return Err(PipelineError::Missing(
                "no extractable content in submitted links".to_string(),
            ));
        }

        // AI profile analysis of the applicant's corpus
        let analysis = self
            .analyzer
            .analyze_profile(&aggregated.corpus, &aggregated.metadata)
            .await?;
        let applicant_profile = analysis.result;

        self.supabase
            .update_analyses_for_application(
                application_id,
                &serde_json::json!({
                    "psychological_profile": applicant_profile,
                    "interests": applicant_profile.interests,
                    "communication_style": applicant_profile.communication_style,
                    "values": applicant_profile.values,
                }),
            )
            .await?;

        // Match against the doc owner
        let doc = self
            .supabase
            .get_doc(doc_id)
            .await?
            .ok_or_else(|| PipelineError::Missing(format!("doc {}", doc_id)))?;
        let owner = self
            .supabase
            .get_profile(doc.user_id)
            .await?
            .ok_or_else(|| PipelineError::Missing(format!("owner profile {}", doc.user_id)))?;

        let url_context_score = self
            .compatibility_score(
                &serde_json::to_value(&owner).unwrap_or(Value::Null),
                &serde_json::to_value(&applicant_profile).unwrap_or(Value::Null),
                &doc.preferences,
            )
            .await;

        let outcome = self.engine.match_profiles(
            &MatchInput::from(&owner),
            &MatchInput::from(&applicant_profile),
            url_context_score,
        );

        self.supabase
            .insert_matchmaking_score(&serde_json::json!({
                "application_id": application_id,
                "doc_owner_id": owner.id,
                "applicant_id": application.applicant_user_id,
                "text_match_score": outcome.text_match_score,
                "url_context_score": outcome.url_context_score,
                "overall_score": outcome.overall_score,
                "compatibility_breakdown": outcome.breakdown,
                "recommendation": outcome.recommendation,
            }))
            .await?;

        self.supabase
            .update_application(
                application_id,
                &serde_json::json!({
                    "match_score": outcome.overall_score,
                    "compatibility_data": outcome,
                    "analysis_completed": true,
                }),
            )
            .await?;

        Ok(())
    }

    /// Match one application against its doc owner and store the score
    ///
    /// Used by the explicit match endpoint; the same engine and storage
    /// path the background pipeline takes.
    pub async fn match_application(
        &self,
        application_id: Uuid,
        include_url_matching: bool,
    ) -> Result<(MatchOutcome, Option<Uuid>), PipelineError> {
        let application = self
            .supabase
            .get_application(application_id)
            .await?
            .ok_or_else(|| PipelineError::Missing(format!("application {}", application_id)))?;

        let doc = self
            .supabase
            .get_doc(application.date_me_doc_id)
            .await?
            .ok_or_else(|| {
                PipelineError::Missing(format!("doc {}", application.date_me_doc_id))
            })?;
        let owner = self
            .supabase
            .get_profile(doc.user_id)
            .await?
            .ok_or_else(|| PipelineError::Missing(format!("owner profile {}", doc.user_id)))?;

        let applicant_id = application.applicant_user_id.ok_or_else(|| {
            PipelineError::Precondition(
                "Applicant profile not found. User must complete profile first.".to_string(),
            )
        })?;
        let applicant = self
            .supabase
            .get_profile(applicant_id)
            .await?
            .ok_or_else(|| PipelineError::Missing(format!("applicant profile {}", applicant_id)))?;

        let url_context_score = if include_url_matching {
            let mut links = applicant.social_link_list();
            links.extend(application.social_links.clone());
            self.url_context_score(&owner, &links).await
        } else {
            None
        };

        let outcome = self.engine.match_profiles(
            &MatchInput::from(&owner),
            &MatchInput::from(&applicant),
            url_context_score,
        );

        let score_id = match self
            .supabase
            .insert_matchmaking_score(&serde_json::json!({
                "application_id": application_id,
                "doc_owner_id": owner.id,
                "applicant_id": applicant.id,
                "text_match_score": outcome.text_match_score,
                "url_context_score": outcome.url_context_score,
                "overall_score": outcome.overall_score,
                "compatibility_breakdown": outcome.breakdown,
                "recommendation": outcome.recommendation,
            }))
            .await
        {
            Ok(score) => Some(score.id),
            Err(e) => {
                tracing::error!("Error saving match score: {}", e);
                None
            }
        };

        self.supabase
            .update_application(
                application_id,
                &serde_json::json!({
                    "match_score": outcome.overall_score,
                    "compatibility_data": outcome,
                }),
            )
            .await?;

        Ok((outcome, score_id))
    }

    /// Analyze a user's digital footprint from their profile links
    pub async fn analyze_footprint(
        &self,
        profile: &UserProfile,
    ) -> Result<FootprintAnalysis, PipelineError> {
        let links = profile.social_link_list();
        if links.is_empty() {
            return Err(PipelineError::Precondition(
                "No links to analyze. Please add your social media handles and website to your profile.".to_string(),
            ));
        }

        let results = self.extractor.extract_many(&links).await;
        let aggregated = self.extractor.aggregate(&results);

        if aggregated.corpus.is_empty() {
            return Err(PipelineError::Precondition(
                "No extractable content in profile links.".to_string(),
            ));
        }

        let analysis = self
            .analyzer
            .analyze_profile(&aggregated.corpus, &aggregated.metadata)
            .await?;
        let psych_profile = analysis.result;

        for result in &results {
            if let Ok(content) = &result.outcome {
                self.supabase
                    .insert_content_analysis(&serde_json::json!({
                        "user_id": profile.id,
                        "source_type": result.link.kind,
                        "source_url": result.link.url,
                        "extracted_content": content.body,
                        "content_metadata": aggregated.metadata,
                        "psychological_profile": psych_profile,
                        "interests": psych_profile.interests,
                        "communication_style": psych_profile.communication_style,
                        "values": psych_profile.values,
                    }))
                    .await?;
            }
        }

        let footprint_score = footprint_score(&aggregated.metadata);

        self.supabase
            .update_profile(
                profile.id,
                &serde_json::json!({
                    "digital_footprint_score": footprint_score,
                    "last_analysis_at": chrono::Utc::now(),
                }),
            )
            .await?;

        Ok(FootprintAnalysis {
            profile: psych_profile,
            metadata: aggregated.metadata,
            footprint_score,
        })
    }

    /// AI URL-context score between a doc owner and a set of applicant links
    ///
    /// Returns `None` when there is nothing to extract on the applicant
    /// side; returns `Some(0.0)` when extraction or analysis was attempted
    /// and failed, matching the stored-zero behavior downstream consumers
    /// expect.
    pub async fn url_context_score(
        &self,
        owner: &UserProfile,
        applicant_links: &[SocialLink],
    ) -> Option<f64> {
        if applicant_links.is_empty() {
            return None;
        }

        let results = self.extractor.extract_many(applicant_links).await;
        let aggregated = self.extractor.aggregate(&results);

        if aggregated.corpus.is_empty() {
            tracing::warn!("URL context matching: no extractable applicant content");
            return Some(0.0);
        }

        let applicant_analysis = match self
            .analyzer
            .analyze_profile(&aggregated.corpus, &aggregated.metadata)
            .await
        {
            Ok(analysis) => analysis.result,
            Err(e) => {
                tracing::warn!("URL context matching: profile analysis failed: {}", e);
                return Some(0.0);
            }
        };

        self.compatibility_score(
            &serde_json::to_value(owner).unwrap_or(Value::Null),
            &serde_json::to_value(&applicant_analysis).unwrap_or(Value::Null),
            &owner.preferences,
        )
        .await
    }

    /// AI compatibility between two profile blobs; `Some(0.0)` on failure
    async fn compatibility_score(
        &self,
        profile_a: &Value,
        profile_b: &Value,
        preferences: &Value,
    ) -> Option<f64> {
        match self
            .analyzer
            .calculate_compatibility(profile_a, profile_b, preferences)
            .await
        {
            Ok(analysis) => Some(analysis.result.overall_compatibility_score),
            Err(e) => {
                tracing::warn!("Compatibility analysis failed: {}", e);
                Some(0.0)
            }
        }
    }
}

/// Footprint score: 20 points per successful extraction plus a length
/// component, capped at 100
pub fn footprint_score(metadata: &Value) -> i32 {
    let successes = metadata
        .get("successful_extractions")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as f64;
    let total_length = metadata
        .get("total_length")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as f64;

    (successes * 20.0 + total_length / 1000.0).min(100.0).round() as i32
}

impl UserProfile {
    /// Collect the profile's outbound links as typed social links
    pub fn social_link_list(&self) -> Vec<SocialLink> {
        let mut links = Vec::new();

        if let Some(handle) = &self.twitter_handle {
            if !handle.is_empty() {
                links.push(SocialLink {
                    kind: LinkKind::Twitter,
                    url: format!("https://twitter.com/{}", handle.trim_start_matches('@')),
                    handle: Some(handle.clone()),
                });
            }
        }
        if let Some(url) = &self.personal_website {
            if !url.is_empty() {
                links.push(SocialLink {
                    kind: LinkKind::Website,
                    url: url.clone(),
                    handle: None,
                });
            }
        }
        if let Some(url) = &self.spotify_profile {
            if !url.is_empty() {
                links.push(SocialLink {
                    kind: LinkKind::Spotify,
                    url: url.clone(),
                    handle: None,
                });
            }
        }
        links.extend(self.other_links.iter().cloned());

        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_score() {
        let metadata = serde_json::json!({
            "successful_extractions": 2,
            "total_length": 10_000,
        });
        assert_eq!(footprint_score(&metadata), 50);

        let metadata = serde_json::json!({
            "successful_extractions": 10,
            "total_length": 500_000,
        });
        assert_eq!(footprint_score(&metadata), 100);

        let metadata = serde_json::json!({});
        assert_eq!(footprint_score(&metadata), 0);
    }

    #[test]
    fn test_social_link_list() {
        let mut profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": "6a4f2f5e-9a0f-4d9c-8b77-0e9a3a8f1b21",
            "auth_user_id": "auth-1",
            "email": "a@example.com"
        }))
        .unwrap();

        assert!(profile.social_link_list().is_empty());

        profile.twitter_handle = Some("@someone".to_string());
        profile.personal_website = Some("https://blog.example.com".to_string());

        let links = profile.social_link_list();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].kind, LinkKind::Twitter);
        assert_eq!(links[0].url, "https://twitter.com/someone");
        assert_eq!(links[1].kind, LinkKind::Website);
    }
}
