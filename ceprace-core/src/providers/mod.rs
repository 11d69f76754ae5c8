//! Provider adapters: one network fetch per call, normalized into the
//! shared [`Address`] model.

pub mod brasil_api;
pub mod via_cep;

pub use brasil_api::BrasilApi;
pub use via_cep::ViaCep;

use std::sync::Arc;

use async_trait::async_trait;
use ceprace_model::Address;

use crate::error::ProviderError;

/// One external address-lookup service.
///
/// A call performs exactly one fetch of the provider's endpoint, parses the
/// body as that provider's schema, and converts it to the normalized
/// [`Address`]. The postal code is passed through opaque and unvalidated.
#[async_trait]
pub trait CepProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, cep: &str) -> Result<Address, ProviderError>;
}

/// Outcome of a single adapter invocation, tagged with the provider that
/// produced it. Emitted exactly once per adapter onto the race channel.
#[derive(Debug)]
pub struct ProviderResult {
    pub provider: String,
    pub outcome: Result<Address, ProviderError>,
}

/// The standard two-provider set, sharing one HTTP client.
pub fn default_providers(client: &reqwest::Client) -> Vec<Arc<dyn CepProvider>> {
    vec![
        Arc::new(BrasilApi::new(client.clone())),
        Arc::new(ViaCep::new(client.clone())),
    ]
}

/// GET `url` and decode the body as `T`.
///
/// The body is read in full before decoding so a transport failure and a
/// schema mismatch stay distinguishable in the error taxonomy.
pub(crate) async fn fetch_json<T>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, ProviderError>
where
    T: serde::de::DeserializeOwned,
{
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status));
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(ProviderError::Decode)
}
