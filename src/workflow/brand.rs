//! Brand-analysis workflow: scrape → extract → save.
//!
//! Fetches a website, asks the model to extract a brand profile from the
//! content, and persists the result for the organization. Progress is
//! published under `brand:progress:{organization_id}` after every step
//! boundary so the dashboard can poll it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::model::{Message, ModelClient, ModelRequest};
use crate::workflow::fetch::ContentFetcher;
use crate::workflow::{ProgressStore, Workflow, WorkflowEngine};
use crate::{AppError, Result};

/// Progress-record key for an organization's brand analysis.
#[must_use]
pub fn progress_key(organization_id: &str) -> String {
    format!("brand:progress:{organization_id}")
}

/// Brand identity information extracted from a website.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrandProfile {
    /// The name of the company.
    pub company_name: String,
    /// What the company does, its mission, and what makes it unique.
    pub company_description: String,
    /// Communication tone: Conversational, Professional, Casual, or Formal.
    pub tone_profile: String,
    /// Free-form tone override, if any.
    #[serde(default)]
    pub custom_tone: Option<String>,
    /// Description of the target audience.
    pub audience: String,
}

/// Persists the final brand profile for an organization.
pub trait BrandRepo: Send + Sync {
    /// Upsert the profile keyed by organization.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Db`](crate::AppError::Db) if the write fails.
    fn save(
        &self,
        organization_id: &str,
        url: &str,
        profile: &BrandProfile,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Job context threaded through the three analysis steps.
pub struct BrandAnalysis {
    organization_id: String,
    url: String,
    model: Arc<dyn ModelClient>,
    fetcher: Arc<dyn ContentFetcher>,
    repo: Arc<dyn BrandRepo>,
    content: Option<String>,
    profile: Option<BrandProfile>,
}

impl BrandAnalysis {
    /// Create the job context for one analysis run.
    #[must_use]
    pub fn new(
        organization_id: impl Into<String>,
        url: impl Into<String>,
        model: Arc<dyn ModelClient>,
        fetcher: Arc<dyn ContentFetcher>,
        repo: Arc<dyn BrandRepo>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            url: url.into(),
            model,
            fetcher,
            repo,
            content: None,
            profile: None,
        }
    }

    async fn scrape(&mut self) -> Result<()> {
        let content = self.fetcher.fetch(&self.url).await?;
        debug!(bytes = content.len(), "website content fetched");
        self.content = Some(content);
        Ok(())
    }

    async fn extract(&mut self) -> Result<()> {
        let content = self
            .content
            .as_deref()
            .ok_or_else(|| AppError::Workflow("scrape step produced no content".into()))?;

        let response = self
            .model
            .complete(ModelRequest {
                system: EXTRACTION_SYSTEM.to_owned(),
                messages: vec![Message::user(extraction_prompt(content))],
                tools: Vec::new(),
                scope: Some(self.organization_id.clone()),
            })
            .await?;

        let text = response
            .text
            .ok_or_else(|| AppError::Workflow("model returned no text for brand extraction".into()))?;
        let profile: BrandProfile = serde_json::from_str(strip_code_fence(&text))
            .map_err(|err| AppError::Workflow(format!("model returned invalid brand profile: {err}")))?;

        self.profile = Some(profile);
        Ok(())
    }

    async fn save(&mut self) -> Result<()> {
        let profile = self
            .profile
            .as_ref()
            .ok_or_else(|| AppError::Workflow("extract step produced no profile".into()))?;
        self.repo
            .save(&self.organization_id, &self.url, profile)
            .await
    }
}

fn scrape_step(job: &mut BrandAnalysis) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
    Box::pin(job.scrape())
}

fn extract_step(job: &mut BrandAnalysis) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
    Box::pin(job.extract())
}

fn save_step(job: &mut BrandAnalysis) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
    Box::pin(job.save())
}

/// The three-step brand-analysis workflow definition.
#[must_use]
pub fn workflow() -> Workflow<BrandAnalysis> {
    Workflow::new()
        .step("scraping", scrape_step)
        .step("extracting", extract_step)
        .step("saving", save_step)
}

/// Run a complete analysis for one organization and return the profile.
///
/// # Errors
///
/// Propagates the first failing step's error after the `failed` progress
/// record has been persisted.
pub async fn analyze_brand(
    model: Arc<dyn ModelClient>,
    fetcher: Arc<dyn ContentFetcher>,
    repo: Arc<dyn BrandRepo>,
    store: &dyn ProgressStore,
    ttl: Duration,
    organization_id: &str,
    url: &str,
) -> Result<BrandProfile> {
    let mut job = BrandAnalysis::new(organization_id, url, model, fetcher, repo);
    let engine = WorkflowEngine::new(store, ttl);
    engine
        .run(&progress_key(organization_id), &workflow(), &mut job)
        .await?;
    job.profile
        .ok_or_else(|| AppError::Workflow("analysis completed without a profile".into()))
}

const EXTRACTION_SYSTEM: &str =
    "You are a brand analyst expert. Your job is to analyze website content and extract \
     key brand identity information. Be thorough but concise. Focus on understanding the \
     company's essence, values, and how they communicate. Respond with a single JSON \
     object and nothing else.";

fn extraction_prompt(content: &str) -> String {
    format!(
        "Analyze this website content and extract brand identity information.\n\n\
         Website content:\n{content}\n\n\
         Extract the following information as JSON:\n\
         1. companyName: The name of the company\n\
         2. companyDescription: A comprehensive description of what the company does, \
         their mission, and what makes them unique (2-4 sentences)\n\
         3. toneProfile: The tone of their communication - choose one of: \
         \"Conversational\", \"Professional\", \"Casual\", \"Formal\"\n\
         4. audience: A description of their target audience (1-2 sentences)"
    )
}

/// Strip a surrounding markdown code fence, if present, so fenced JSON
/// from the model still parses.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
