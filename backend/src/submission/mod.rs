//! Client seam towards the external advertising platform.
//!
//! The pipeline only ever talks to the platform through
//! [`CampaignSubmissionClient`]: three single-round-trip calls, one per
//! hierarchy level. Authentication and transport belong to implementations.

mod demo;

pub use demo::DemoSubmissionClient;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Campaign-level fields of one row.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignFields {
    pub name: String,
    pub objective: String,
    pub budget_type: String,
    pub budget: f64,
    pub bid_strategy: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub budget_optimization: bool,
    pub status: String,
    pub account_id: Option<String>,
}

/// Ad-set-level fields of one row (targeting and delivery).
#[derive(Debug, Clone, Serialize)]
pub struct AdSetFields {
    pub name: String,
    pub placement_type: Option<String>,
    pub conversion_location: Option<String>,
    pub optimization_event: Option<String>,
    pub age_min: u32,
    pub age_max: u32,
    pub gender: String,
    pub locations: Vec<String>,
    pub interests: Vec<String>,
    pub attribution_window: String,
}

/// Ad-level fields of one row (creative).
#[derive(Debug, Clone, Serialize)]
pub struct AdFields {
    pub name: String,
    pub headline: String,
    pub description: String,
    pub website_url: String,
    pub cta: Option<String>,
    pub image_url: String,
}

fn text(normalized: &Map<String, Value>, key: &str) -> Option<String> {
    match normalized.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(normalized: &Map<String, Value>, key: &str) -> Option<f64> {
    normalized.get(key)?.as_f64()
}

fn boolean(normalized: &Map<String, Value>, key: &str) -> Option<bool> {
    normalized.get(key)?.as_bool()
}

fn list(normalized: &Map<String, Value>, key: &str) -> Vec<String> {
    normalized
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

impl CampaignFields {
    /// Builds the campaign request from a validated row. Fallbacks mirror
    /// the schema defaults so a malformed normalized map still produces a
    /// well-formed request instead of a panic.
    pub fn from_normalized(normalized: &Map<String, Value>, account_id: Option<&str>) -> Self {
        CampaignFields {
            name: text(normalized, "campaign_name").unwrap_or_default(),
            objective: text(normalized, "objective").unwrap_or_default(),
            budget_type: text(normalized, "budget_type").unwrap_or_else(|| "DAILY".into()),
            budget: number(normalized, "budget").unwrap_or(0.0),
            bid_strategy: text(normalized, "bid_strategy").unwrap_or_default(),
            start_date: text(normalized, "start_date").unwrap_or_default(),
            end_date: text(normalized, "end_date"),
            budget_optimization: boolean(normalized, "budget_optimization").unwrap_or(false),
            status: text(normalized, "campaign_status").unwrap_or_else(|| "PAUSED".into()),
            account_id: account_id.map(str::to_string),
        }
    }
}

impl AdSetFields {
    pub fn from_normalized(normalized: &Map<String, Value>) -> Self {
        AdSetFields {
            name: text(normalized, "adset_name").unwrap_or_default(),
            placement_type: text(normalized, "placement_type"),
            conversion_location: text(normalized, "conversion_location"),
            optimization_event: text(normalized, "optimization_event"),
            age_min: number(normalized, "age_min").unwrap_or(13.0) as u32,
            age_max: number(normalized, "age_max").unwrap_or(65.0) as u32,
            gender: text(normalized, "gender").unwrap_or_else(|| "all".into()),
            locations: list(normalized, "locations"),
            interests: list(normalized, "interests"),
            attribution_window: text(normalized, "attribution_window")
                .unwrap_or_else(|| "click_7d".into()),
        }
    }
}

impl AdFields {
    pub fn from_normalized(normalized: &Map<String, Value>) -> Self {
        AdFields {
            name: text(normalized, "ad_name").unwrap_or_default(),
            headline: text(normalized, "headline").unwrap_or_default(),
            description: text(normalized, "description").unwrap_or_default(),
            website_url: text(normalized, "website_url").unwrap_or_default(),
            cta: text(normalized, "cta"),
            image_url: text(normalized, "image_url").unwrap_or_default(),
        }
    }
}

/// Remote creation of the campaign / ad set / ad hierarchy.
///
/// Each call is one remote round-trip returning the created object's id.
#[async_trait]
pub trait CampaignSubmissionClient: Send + Sync {
    async fn create_campaign(&self, fields: &CampaignFields) -> Result<String, ClientError>;

    async fn create_ad_set(
        &self,
        campaign_id: &str,
        fields: &AdSetFields,
    ) -> Result<String, ClientError>;

    async fn create_ad(&self, ad_set_id: &str, fields: &AdFields) -> Result<String, ClientError>;
}
