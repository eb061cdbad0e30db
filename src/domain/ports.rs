use crate::domain::model::{DeliverySettings, Email, MergeInput, MergeOutput, OutputPaths};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn template_file(&self) -> &str;
    fn customers_file(&self) -> &str;
    fn output_path(&self) -> &str;
    fn emails_filename(&self) -> &str;
    fn errors_file(&self) -> &str;
    fn id_field(&self) -> &str;
    fn date_format(&self) -> &str;
    fn strict_placeholders(&self) -> bool;
    /// Fixed-value placeholders added to the computed-value registry.
    fn constants(&self) -> Vec<(String, String)>;
    fn delivery(&self) -> Option<DeliverySettings>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<MergeInput>;
    async fn transform(&self, input: MergeInput) -> Result<MergeOutput>;
    async fn load(&self, output: &MergeOutput) -> Result<OutputPaths>;
}

/// Outbound delivery capability, selected by name.
#[async_trait]
pub trait EmailService: Send + Sync {
    fn name(&self) -> &str;
    async fn is_available(&self) -> bool;
    /// Returns a status per recipient.
    async fn send_emails(&self, emails: &[Email]) -> Result<HashMap<String, String>>;
}
