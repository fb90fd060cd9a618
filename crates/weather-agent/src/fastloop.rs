//! The two independent fast loops: ground-observation polling and the
//! guaranteed-win entry scan it triggers. Both run on a tighter interval
//! than the main scan/execute/monitor/resolve cycle and never block it --
//! each is its own `tokio::spawn`, communicating back to the coordinator
//! only through tracing and the alert queue.

use crate::fastpath::{blocked_by_adjacent_no, crosses_boundary, is_new_high, lowest_ask_platform, min_gap_for, PlatformCandidate};
use crate::observation::{corrected_median, MetarObservationSource, ObservationSource, PwsObservationSource};
use chrono::{Timelike, Utc};
use chrono_tz::Tz;
use weather_config::{CityConfig, EngineConfig};
use weather_executor::{execute_metar_guaranteed_win, execute_pws_guaranteed_win, FastPathDedup, ObservationCandidate, ObservationOutcome};
use weather_notification::{Alert, AlertQueue, AlertType};
use weather_platform::PlatformClient;
use weather_storage::{Platform, RangeType, Side, StorageGateway};

/// Which ground-truth source triggered a boundary crossing. Determines
/// both the min-gap guard and which executor entry point handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationTrigger {
    Metar,
    Pws,
}

/// Poll both ground-truth sources for one city and update the day's
/// running highs. Returns the trigger(s) whose reading just became a new
/// high for the day, paired with that reading, since only a fresh high can
/// newly decide a market.
pub async fn poll_observations(
    storage: &StorageGateway,
    city: &CityConfig,
    metar_source: &MetarObservationSource,
    pws_source: &PwsObservationSource,
) -> anyhow::Result<Vec<(ObservationTrigger, f64)>> {
    let tz: Tz = city.timezone.parse().map_err(|_| anyhow::anyhow!("unknown timezone {}", city.timezone))?;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let now = Utc::now();

    let previous = storage.latest_observation(&city.name, today).await?;
    let previous_running_high = previous.as_ref().map(|o| o.running_high);
    let previous_wu_high = previous.as_ref().map(|o| o.wu_high);

    let mut triggers = Vec::new();

    let metar_reading = match metar_source.fetch(&city.kalshi_station).await {
        Ok(r) => Some(r.temp),
        Err(e) => {
            tracing::warn!(city = %city.name, error = %e, "metar poll failed");
            None
        }
    };

    let mut pws_readings = Vec::new();
    for station_id in &city.pws_station_ids {
        match pws_source.fetch(station_id).await {
            Ok(r) => {
                storage.insert_pws_observation(&city.name, today, now, station_id, r.temp, r.temp).await?;
                pws_readings.push(r.temp);
            }
            Err(e) => tracing::warn!(city = %city.name, station_id, error = %e, "pws poll failed"),
        }
    }
    let pws_median = corrected_median(pws_readings);

    let running_high = [metar_reading, pws_median, previous_running_high].into_iter().flatten().reduce(f64::max);
    let wu_high = [metar_reading, previous_wu_high].into_iter().flatten().reduce(f64::max);

    if let (Some(running_high), Some(wu_high)) = (running_high, wu_high) {
        storage
            .insert_observation(&city.name, today, now, &city.kalshi_station, metar_reading.unwrap_or(wu_high), running_high, wu_high)
            .await?;
    }

    if let Some(metar) = metar_reading {
        if is_new_high(metar, previous_wu_high) {
            triggers.push((ObservationTrigger::Metar, metar));
        }
    }
    if let Some(median) = pws_median {
        if is_new_high(median, previous_running_high) {
            triggers.push((ObservationTrigger::Pws, median));
        }
    }

    Ok(triggers)
}

/// Narrow entry scan fired right after a poll produces a new high. Fetches
/// today's markets fresh (never reuses a stale quote from the main cycle),
/// applies the three fast-path defense-in-depth checks, and hands every
/// surviving candidate to the matching guaranteed-win executor.
pub async fn scan_guaranteed_win(
    storage: &StorageGateway,
    clients: &[Box<dyn PlatformClient>],
    dedup: &FastPathDedup,
    city: &CityConfig,
    cfg: &EngineConfig,
    trigger: ObservationTrigger,
    observation_high: f64,
    alerts: &AlertQueue,
) -> anyhow::Result<usize> {
    let tz: Tz = city.timezone.parse().map_err(|_| anyhow::anyhow!("unknown timezone {}", city.timezone))?;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let local_hour = Utc::now().with_timezone(&tz).hour() as f64;

    let mut entered = 0usize;

    // (range_name, is_yes) -> lowest-ask platform candidate, so a
    // simultaneous crossing on both platforms only ever enters once. `Side`
    // has no `Hash` impl, hence the bool discriminant.
    let mut by_range: std::collections::HashMap<(String, bool), Vec<(PlatformCandidate, ObservationCandidate)>> =
        std::collections::HashMap::new();

    let open_trades = storage.get_open_trades_for_city_date(&city.name, today).await?;

    for client in clients {
        let station = match client.platform() {
            Platform::Polymarket => &city.polymarket_station,
            Platform::Kalshi => &city.kalshi_station,
        };
        let markets = match client.fetch_markets(&city.name, station, today, today).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(city = %city.name, platform = ?client.platform(), error = %e, "fast-path market fetch failed");
                continue;
            }
        };

        let platform_is_metar_resolved = trigger == ObservationTrigger::Metar;
        let gap = min_gap_for(
            platform_is_metar_resolved,
            if city.unit == weather_config::Unit::C { cfg.observation.metar_only_min_gap_c } else { cfg.observation.metar_only_min_gap_f },
            if city.unit == weather_config::Unit::C { crate::fastpath::BASE_MIN_GAP_C } else { crate::fastpath::BASE_MIN_GAP_F },
        );

        for market in &markets {
            // Only an unbounded tail range can be "guaranteed" before the
            // day is over -- a bounded range can still be overshot later.
            if market.range_type != RangeType::Unbounded {
                continue;
            }
            if !crosses_boundary(market.range_min, market.range_max, observation_high, gap) {
                continue;
            }

            let (side, ask, bid) = match (market.range_min, market.range_max) {
                (Some(_), _) => (Side::Yes, market.yes_ask, market.yes_bid),
                (None, Some(_)) => (Side::No, market.no_ask, market.no_bid),
                (None, None) => continue,
            };

            if blocked_by_adjacent_no(side, market.range_max, &open_trades) {
                continue;
            }

            let candidate = ObservationCandidate {
                city: city.name.clone(),
                target_date: today,
                platform: market.platform,
                market_id: market.market_id.clone(),
                range_name: market.range_name.clone(),
                range_min: market.range_min,
                range_max: market.range_max,
                range_type: market.range_type,
                side,
                unit: match city.unit {
                    weather_config::Unit::F => "F".to_string(),
                    weather_config::Unit::C => "C".to_string(),
                },
                ask,
                bid,
                spread: ask - bid,
                volume: market.volume,
                observation_high,
                wu_high: observation_high,
            };

            by_range
                .entry((market.range_name.clone(), side == Side::Yes))
                .or_default()
                .push((PlatformCandidate { platform: market.platform, ask }, candidate));
        }
    }

    let city_mae = storage
        .get_city_error_distribution(&city.name)
        .await?
        .map(|d| d.mean_error.abs())
        .unwrap_or_else(|| {
            tracing::warn!(city = %city.name, "falling back to default error for pws sizing, no distribution recorded yet");
            1.5
        });

    for ((range_name, _is_yes), group) in by_range {
        let platform_candidates: Vec<PlatformCandidate> =
            group.iter().map(|(pc, _)| PlatformCandidate { platform: pc.platform, ask: pc.ask }).collect();
        let Some(winner_platform) = lowest_ask_platform(&platform_candidates) else { continue };
        let Some((_, candidate)) = group.into_iter().find(|(pc, _)| pc.platform == winner_platform) else { continue };

        let outcome = match trigger {
            ObservationTrigger::Metar => {
                execute_metar_guaranteed_win(storage, candidate, &cfg.observation, &cfg.sizing).await?
            }
            ObservationTrigger::Pws => {
                execute_pws_guaranteed_win(
                    storage,
                    dedup,
                    candidate,
                    city_mae,
                    local_hour,
                    cfg.sizing.yes_bankroll + cfg.sizing.no_bankroll,
                    &cfg.observation,
                    &cfg.sizing,
                )
                .await?
            }
        };

        match outcome {
            ObservationOutcome::Opened(_trade) => {
                entered += 1;
                alerts
                    .send(Alert::new(
                        AlertType::GuaranteedWinDetected {
                            city: city.name.clone(),
                            range_name: range_name.clone(),
                            observation_high,
                        },
                        "Guaranteed win detected",
                        format!("{} {} high {:.1}", city.name, range_name, observation_high),
                    ))
                    .await;
            }
            ObservationOutcome::Blocked(reason) => {
                tracing::debug!(city = %city.name, range_name, reason, "fast-path executor blocked candidate");
            }
        }
    }

    Ok(entered)
}
