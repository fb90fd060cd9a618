//! Uniform access over heterogeneous prediction-market platforms:
//! `{listMarkets, parseRange, entryFee, resolutionSource}`, with
//! `PolymarketLike`/`KalshiLike` variants behind one `PlatformClient`
//! trait object per platform.

mod cache;
mod client;
mod error;
mod fees;
mod kalshi;
mod parse_range;
mod polymarket;
mod types;

pub use client::{PlatformClient, ResolutionDescriptor, ResolutionMethod};
pub use error::{PlatformError, PlatformResult};
pub use fees::{effective_cost, entry_fee};
pub use kalshi::KalshiClient;
pub use parse_range::parse_range;
pub use polymarket::PolymarketClient;
pub use types::{Market, ParsedRange};
