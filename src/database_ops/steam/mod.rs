pub mod provider;
pub mod transport;

pub use provider::{CollectorConfig, ItemFetchFailure, SteamCollector};
pub use transport::{HttpTransport, SteamTransport};
