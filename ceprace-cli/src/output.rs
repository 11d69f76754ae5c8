//! Presentation of race outcomes.

use ceprace_core::ResolvedAddress;

/// Six-line block naming the winning provider and the address fields.
pub fn render_block(resolved: &ResolvedAddress) -> String {
    format!(
        "\nAPI......: {}\nCEP......: {}\nEstado...: {}\nCidade...: {}\nRua......: {}\nBairro...: {}\n\n",
        resolved.provider,
        resolved.address.cep,
        resolved.address.estado,
        resolved.address.cidade,
        resolved.address.rua,
        resolved.address.bairro,
    )
}

/// Machine-readable rendering of the winning result.
pub fn render_json(resolved: &ResolvedAddress) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "api": resolved.provider,
        "endereco": resolved.address,
    }))
}
