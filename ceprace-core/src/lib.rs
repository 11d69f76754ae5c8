//! Concurrent CEP resolution: provider adapters plus the race coordinator.
//!
//! The crate queries independent address-lookup services in parallel and
//! surfaces whichever result arrives first, bounded by a deadline. Late
//! responses are drained and discarded so no adapter task is left blocked
//! on an unread channel.

pub mod error;
pub mod providers;
pub mod race;

pub use error::{LookupError, ProviderError};
pub use providers::{CepProvider, ProviderResult, default_providers};
pub use race::{RaceConfig, RaceCoordinator, Resolution, ResolvedAddress};
