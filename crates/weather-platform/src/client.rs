use crate::error::PlatformResult;
use crate::types::Market;
use async_trait::async_trait;
use chrono::NaiveDate;
use weather_storage::Platform;

/// How a platform's markets become resolvable ground truth. Distinct from
/// the observation sources used for entry signals -- this only describes
/// the single canonical reading the resolver waits for and trusts.
#[derive(Debug, Clone)]
pub enum ResolutionMethod {
    /// Daily climatological report published at the named station after
    /// local morning; the resolver must wait until `ready_after_local_hour`
    /// city-local time before treating it as final.
    ClimatologicalReport { ready_after_local_hour: u32 },
    /// Historical hourly observations API. When the series exposes a
    /// `max_temp` field use it directly; otherwise the resolver computes
    /// the max over the hourly series itself.
    HistoricalHourlyObservations { has_max_temp_field: bool },
}

#[derive(Debug, Clone)]
pub struct ResolutionDescriptor {
    pub station_id: String,
    pub method: ResolutionMethod,
}

/// Capability set exposed uniformly over heterogeneous platforms:
/// `{listMarkets, parseRange, entryFee, resolutionSource}`. `parseRange`
/// and `entryFee` are pure functions shared by every implementor (see
/// `parse_range` and `fees`); only market listing and resolution
/// provenance differ per platform, so only those are trait methods.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    fn platform(&self) -> Platform;

    /// List every open weather market for `city` whose target date falls
    /// in `[from, to]`. Implementations must exhaust cursor pagination --
    /// dropping pages silently is the documented failure mode.
    async fn fetch_markets(
        &self,
        city: &str,
        station_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PlatformResult<Vec<Market>>;

    fn resolution_descriptor(&self, station_id: &str) -> ResolutionDescriptor;
}
