use async_trait::async_trait;
use ceprace_model::Address;
use serde::Deserialize;

use super::{CepProvider, fetch_json};
use crate::error::ProviderError;

const BRASIL_API_BASE: &str = "https://brasilapi.com.br/api/cep/v1";
const BRASIL_API_NAME: &str = "BrasilAPI";

/// Adapter for the BrasilAPI CEP endpoint.
#[derive(Debug, Clone)]
pub struct BrasilApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BrasilApiResponse {
    cep: String,
    state: String,
    city: String,
    street: String,
    neighborhood: String,
}

impl From<BrasilApiResponse> for Address {
    fn from(resp: BrasilApiResponse) -> Self {
        Address {
            cep: resp.cep,
            estado: resp.state,
            cidade: resp.city,
            rua: resp.street,
            bairro: resp.neighborhood,
        }
    }
}

impl BrasilApi {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, BRASIL_API_BASE)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CepProvider for BrasilApi {
    fn name(&self) -> &str {
        BRASIL_API_NAME
    }

    async fn lookup(&self, cep: &str) -> Result<Address, ProviderError> {
        let url = format!("{}/{}", self.base_url, cep);
        tracing::debug!(target: "ceprace::providers", provider = BRASIL_API_NAME, %url, "fetching");

        let response: BrasilApiResponse = fetch_json(&self.client, &url).await?;
        Ok(response.into())
    }
}
