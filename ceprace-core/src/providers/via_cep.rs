use async_trait::async_trait;
use ceprace_model::Address;
use serde::Deserialize;

use super::{CepProvider, fetch_json};
use crate::error::ProviderError;

const VIA_CEP_BASE: &str = "http://viacep.com.br/ws";
const VIA_CEP_NAME: &str = "ViaCep";

/// Adapter for the ViaCEP web service.
#[derive(Debug, Clone)]
pub struct ViaCep {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    cep: String,
    logradouro: String,
    bairro: String,
    localidade: String,
    uf: String,
}

impl From<ViaCepResponse> for Address {
    fn from(resp: ViaCepResponse) -> Self {
        Address {
            cep: resp.cep,
            estado: resp.uf,
            cidade: resp.localidade,
            rua: resp.logradouro,
            bairro: resp.bairro,
        }
    }
}

impl ViaCep {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, VIA_CEP_BASE)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CepProvider for ViaCep {
    fn name(&self) -> &str {
        VIA_CEP_NAME
    }

    async fn lookup(&self, cep: &str) -> Result<Address, ProviderError> {
        let url = format!("{}/{}/json/", self.base_url, cep);
        tracing::debug!(target: "ceprace::providers", provider = VIA_CEP_NAME, %url, "fetching");

        let response: ViaCepResponse = fetch_json(&self.client, &url).await?;
        Ok(response.into())
    }
}
