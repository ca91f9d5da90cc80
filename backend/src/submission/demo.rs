//! Stand-in submission client for running the service without platform
//! credentials: fabricates remote ids after a configurable delay, the same
//! way the original backend fell back to a demo ad account.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::error::ClientError;
use crate::submission::{AdFields, AdSetFields, CampaignFields, CampaignSubmissionClient};

pub struct DemoSubmissionClient {
    latency: Duration,
}

impl DemoSubmissionClient {
    pub fn new(latency: Duration) -> Self {
        DemoSubmissionClient { latency }
    }

    async fn fabricate(&self, prefix: &str) -> String {
        tokio::time::sleep(self.latency).await;
        format!("{prefix}_{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl CampaignSubmissionClient for DemoSubmissionClient {
    async fn create_campaign(&self, fields: &CampaignFields) -> Result<String, ClientError> {
        if fields.name.is_empty() {
            return Err(ClientError::Rejected("campaign name must not be empty".into()));
        }
        Ok(self.fabricate("cmp").await)
    }

    async fn create_ad_set(
        &self,
        _campaign_id: &str,
        fields: &AdSetFields,
    ) -> Result<String, ClientError> {
        if fields.name.is_empty() {
            return Err(ClientError::Rejected("ad set name must not be empty".into()));
        }
        Ok(self.fabricate("ads").await)
    }

    async fn create_ad(&self, _ad_set_id: &str, fields: &AdFields) -> Result<String, ClientError> {
        if fields.name.is_empty() {
            return Err(ClientError::Rejected("ad name must not be empty".into()));
        }
        Ok(self.fabricate("ad").await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn fabricated_ids_carry_their_prefix() {
        let client = DemoSubmissionClient::new(Duration::ZERO);
        let mut normalized = Map::new();
        normalized.insert("campaign_name".into(), "demo".into());
        let fields = CampaignFields::from_normalized(&normalized, None);
        let id = client.create_campaign(&fields).await.unwrap();
        assert!(id.starts_with("cmp_"));
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let client = DemoSubmissionClient::new(Duration::ZERO);
        let fields = CampaignFields::from_normalized(&Map::new(), None);
        assert!(matches!(
            client.create_campaign(&fields).await,
            Err(ClientError::Rejected(_))
        ));
    }
}
