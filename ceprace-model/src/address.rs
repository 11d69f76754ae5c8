/// Normalized address record produced by every provider adapter.
///
/// Fields are opaque text taken verbatim from whichever provider answered;
/// no validation or reformatting happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    pub cep: String,
    pub estado: String,
    pub cidade: String,
    pub rua: String,
    pub bairro: String,
}
