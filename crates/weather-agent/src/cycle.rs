//! Sequential per-city cycle: scan -> execute -> monitor -> resolve.
//! Each step is isolated behind its own failure boundary so one city's
//! platform outage or one market's bad data never aborts the rest of the
//! cycle -- the coordinator logs and moves on, matching the teacher's
//! `run_trading_cycle` per-step error handling.

use crate::candidates::{build_candidate_pair, market_implied_mean};
use crate::platforms::platform_client_for;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use weather_config::{CityConfig, EngineConfig, Unit};
use weather_executor::{execute_edge_candidate, Bankroll, ExecutionOutcome, NoDateCap};
use weather_forecast::ForecastEngine;
use weather_monitor::{MonitorContext, MonitorEngine, ObservationSnapshot};
use weather_notification::{Alert, AlertQueue, AlertType};
use weather_platform::{Market, PlatformClient};
use weather_resolver::{is_ready_to_resolve, ResolverEngine};
use weather_scanner::evaluate_market_both_sides;
use weather_storage::StorageGateway;

const SCAN_HORIZON_DAYS: i64 = 7;

#[derive(Debug, Default)]
pub struct CycleSummary {
    pub entered: usize,
    pub filtered: usize,
    pub opened: usize,
    pub exited: usize,
    pub resolved: usize,
}

fn station_for(platform_client: &dyn PlatformClient, city: &CityConfig) -> &str {
    use weather_storage::Platform;
    match platform_client.platform() {
        Platform::Polymarket => &city.polymarket_station,
        Platform::Kalshi => &city.kalshi_station,
    }
}

fn close_time_for(target_date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let local_midnight = (target_date + chrono::Duration::days(1)).and_hms_opt(0, 0, 0).unwrap();
    tz.from_local_datetime(&local_midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::<Utc>::from_naive_utc_and_offset(local_midnight, Utc))
}

/// Run the scan + execute steps for one city and return every market
/// fetched this cycle, keyed by market_id, so the monitor step can reuse
/// the same live quotes without a second round of HTTP calls.
async fn run_scan_and_execute(
    storage: &StorageGateway,
    clients: &[Box<dyn PlatformClient>],
    city: &CityConfig,
    cfg: &EngineConfig,
    alerts: &AlertQueue,
    summary: &mut CycleSummary,
) -> anyhow::Result<HashMap<String, Market>> {
    let tz: Tz = city.timezone.parse().map_err(|_| anyhow::anyhow!("unknown timezone {}", city.timezone))?;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let horizon = today + chrono::Duration::days(SCAN_HORIZON_DAYS);

    let mut all_markets = Vec::new();
    for client in clients {
        let station = station_for(client.as_ref(), city);
        match client.fetch_markets(&city.name, station, today, horizon).await {
            Ok(markets) => all_markets.extend(markets),
            Err(e) => tracing::warn!(city = %city.name, platform = ?client.platform(), error = %e, "market fetch failed, skipping platform this cycle"),
        }
    }
    if all_markets.is_empty() {
        return Ok(HashMap::new());
    }

    let mut by_date: HashMap<NaiveDate, Vec<Market>> = HashMap::new();
    for m in &all_markets {
        by_date.entry(m.target_date).or_default().push(m.clone());
    }

    let sources = crate::platforms::build_forecast_sources(cfg, city.kalshi_nws_priority);
    let forecast_engine = ForecastEngine::new(sources);

    let mut bankroll = Bankroll::refresh(storage, &cfg.sizing).await?;
    let mut no_date_caps: HashMap<NaiveDate, NoDateCap> = HashMap::new();

    let unit_is_celsius = city.unit == Unit::C;
    let unit_str = match city.unit {
        Unit::F => "F",
        Unit::C => "C",
    };

    let city_mae = storage
        .get_city_error_distribution(&city.name)
        .await?
        .map(|d| d.mean_error.abs())
        .unwrap_or_else(|| {
            tracing::warn!(city = %city.name, "falling back to default city_mae, no error distribution recorded yet");
            1.5
        });
    let current_observation_high = storage.latest_observation(&city.name, today).await?.map(|o| o.running_high);

    for (target_date, markets) in &by_date {
        let close_time = close_time_for(*target_date, tz);
        let now = Utc::now();
        let days_out = ((close_time - now).num_hours() as f64 / 24.0).max(0.0);
        let is_dual_station = city.is_dual_station();

        let forecast = match forecast_engine
            .forecast(storage, &city.name, city.lat, city.lon, unit_is_celsius, *target_date, days_out, is_dual_station, &cfg.forecast_sources)
            .await
        {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(city = %city.name, date = %target_date, error = %e, "forecast pass failed, skipping date this cycle");
                continue;
            }
        };
        if forecast.low_confidence {
            tracing::warn!(city = %city.name, date = %target_date, "low confidence ensemble, skipping entries for this date");
            continue;
        }

        let implied_mean = market_implied_mean(markets, forecast.mean);
        no_date_caps.entry(*target_date).or_insert(NoDateCap::refresh(storage, &cfg.sizing, *target_date).await?);

        for market in markets {
            let (yes, no) = build_candidate_pair(
                storage,
                market.clone(),
                &forecast,
                implied_mean,
                city_mae,
                current_observation_high,
                city.kalshi_blocked,
                &cfg.calibration,
                now,
                close_time,
            )
            .await?;

            let entered = evaluate_market_both_sides(storage, yes, no, &cfg.filters, &cfg.calibration, &cfg.forecast_sources).await?;
            summary.entered += entered.len();

            for candidate in &entered {
                let no_cap = no_date_caps.get_mut(target_date).expect("seeded above");
                let outcome = execute_edge_candidate(storage, &mut bankroll, no_cap, candidate, unit_str, &cfg.sizing).await?;
                match outcome {
                    ExecutionOutcome::Opened(trade) => {
                        summary.opened += 1;
                        alerts
                            .send(Alert::new(
                                AlertType::TradeEntered {
                                    city: city.name.clone(),
                                    range_name: trade.range_name.clone(),
                                    side: format!("{:?}", trade.side),
                                    shares: trade.shares,
                                    cost: trade.cost,
                                },
                                "Trade entered",
                                format!("{} {} x{:.0} @ {:.2}", city.name, trade.range_name, trade.shares, trade.entry_ask),
                            ))
                            .await;
                    }
                    ExecutionOutcome::Blocked(reason) => {
                        tracing::debug!(city = %city.name, reason, "executor blocked candidate");
                    }
                }
            }
        }
    }

    summary.filtered = all_markets.len() * 2 - summary.entered;
    Ok(all_markets.into_iter().map(|m| (m.market_id.clone(), m)).collect())
}

/// Re-evaluate every open trade for this city against the markets fetched
/// this cycle. Trades whose market didn't come back in this fetch (closed,
/// delisted, or outside the scan horizon) are left untouched -- the
/// resolver step is what eventually closes those out.
async fn run_monitor(
    storage: &StorageGateway,
    city: &CityConfig,
    cfg: &EngineConfig,
    markets_by_id: &HashMap<String, Market>,
    alerts: &AlertQueue,
    summary: &mut CycleSummary,
) -> anyhow::Result<()> {
    let engine = MonitorEngine::new();
    let tz: Tz = city.timezone.parse().map_err(|_| anyhow::anyhow!("unknown timezone {}", city.timezone))?;
    let today = Utc::now().with_timezone(&tz).date_naive();

    let mut dates: Vec<NaiveDate> = markets_by_id.values().map(|m| m.target_date).collect();
    dates.sort_unstable();
    dates.dedup();

    for target_date in dates {
        let open_trades = storage.get_open_trades_for_city_date(&city.name, target_date).await?;
        if open_trades.is_empty() {
            continue;
        }
        let observation = storage
            .latest_observation(&city.name, target_date)
            .await?
            .map(|o| ObservationSnapshot { running_high: o.running_high, wu_high: o.wu_high });
        let day_is_over = today > target_date;

        for trade in &open_trades {
            let Some(market) = markets_by_id.get(&trade.market_id) else {
                continue;
            };
            let ask = market.ask(trade.side);
            let bid = market.bid(trade.side);

            let (_, corrected_probability, _) = match weather_forecast::probability_for_range(
                storage,
                trade.range_type,
                trade.range_min,
                trade.range_max,
                trade.forecast_temp,
                trade.forecast_std_dev,
                &cfg.calibration,
            )
            .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(trade_id = %trade.id, error = %e, "probability recompute failed, skipping trade this cycle");
                    continue;
                }
            };

            let lead_bucket = 0;
            let price_bucket = ((ask.clamp(0.0, 1.0) * 10.0).floor() as i32).clamp(0, 9);
            let market_calibration = storage
                .lookup_market_calibration(trade.platform, trade.range_type, lead_bucket, price_bucket)
                .await?;

            let ctx = MonitorContext {
                trade,
                current_ask: ask,
                current_bid: bid,
                observation,
                current_corrected_probability: corrected_probability,
                market_calibration: market_calibration.as_ref(),
                entry_fee_rate: weather_platform::entry_fee(trade.platform, ask) / ask.max(1e-9),
                single_source_resolution: !city.is_dual_station(),
                day_is_over,
                now: Utc::now(),
            };

            storage
                .update_running_extremes(trade.id, ask.max(trade.max_price_seen.unwrap_or(0.0)), corrected_probability.min(trade.min_probability_seen.unwrap_or(1.0)))
                .await?;

            if let Some((_, signal)) = engine.evaluate_and_exit(storage, &ctx, &cfg.monitor, &cfg.calibration).await? {
                summary.exited += 1;
                alerts
                    .send(Alert::new(
                        AlertType::TradeExited {
                            city: city.name.clone(),
                            range_name: trade.range_name.clone(),
                            reason: format!("{:?}", signal.reason),
                            pnl: signal.pnl,
                        },
                        "Trade exited",
                        format!("{} {} pnl {:.2}", city.name, trade.range_name, signal.pnl),
                    ))
                    .await;
            }
        }
    }

    Ok(())
}

/// Resolve every market whose target date has elapsed for this city, then
/// rebuild calibration and refresh the materialized views. Calibration
/// rebuild runs once at the end of the full cycle, not per city, since it
/// aggregates across every city at once.
async fn run_resolve_for_city(
    storage: &StorageGateway,
    clients: &[Box<dyn PlatformClient>],
    city: &CityConfig,
    alerts: &AlertQueue,
    summary: &mut CycleSummary,
) -> anyhow::Result<()> {
    let resolver = ResolverEngine::new();
    let tz: Tz = city.timezone.parse().map_err(|_| anyhow::anyhow!("unknown timezone {}", city.timezone))?;
    let today = Utc::now().with_timezone(&tz).date_naive();

    let elapsed = storage.open_markets_with_elapsed_target_date(&city.name, today).await?;
    for (market_id, platform) in elapsed {
        let Some(client) = platform_client_for(clients, platform) else { continue };
        let station = station_for(client, city);
        let descriptor = client.resolution_descriptor(station);

        let open = storage.get_open_trades_for_market(&market_id).await?;
        let Some(first) = open.first() else { continue };
        let target_date = first.target_date;

        let now = Utc::now();
        match is_ready_to_resolve(&descriptor, &city.timezone, target_date, now) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                tracing::warn!(city = %city.name, error = %e, "resolution readiness check failed");
                continue;
            }
        }

        let Some(observation) = storage.latest_observation(&city.name, target_date).await? else {
            tracing::debug!(city = %city.name, market_id, "no authoritative observation yet, retrying next cycle");
            continue;
        };
        let actual_temp = observation.wu_high;

        let ranges: Vec<(String, weather_resolver::RangeBound)> =
            open.iter().map(|t| (t.range_name.clone(), weather_resolver::RangeBound::of_trade(t))).collect();
        let winning_range = weather_resolver::winning_range_label(&ranges, actual_temp)
            .unwrap_or_else(|| "outside_traded_ranges".to_string());

        match resolver
            .resolve_market(storage, &market_id, platform, actual_temp, &winning_range, now, &descriptor.station_id)
            .await
        {
            Ok(result) => {
                summary.resolved += result.trades_resolved;
                for trade in &open {
                    alerts
                        .send(Alert::new(
                            AlertType::TradeResolved {
                                city: city.name.clone(),
                                range_name: trade.range_name.clone(),
                                won: weather_resolver::trade_won(trade, actual_temp),
                                pnl: weather_resolver::settlement_pnl(trade, weather_resolver::trade_won(trade, actual_temp)),
                            },
                            "Trade resolved",
                            format!("{} {} actual {:.1}", city.name, trade.range_name, actual_temp),
                        ))
                        .await;
                }
            }
            Err(e) => tracing::error!(city = %city.name, market_id, error = %e, "resolution failed"),
        }
    }

    Ok(())
}

/// Run one full cycle across every configured city, then a single
/// calibration rebuild and materialized-view refresh. City order is
/// immaterial -- cities never share bankroll or dedup state, so a failure
/// in one never blocks another.
pub async fn run_full_cycle(
    storage: &StorageGateway,
    clients: &[Box<dyn PlatformClient>],
    cfg: &EngineConfig,
    alerts: &AlertQueue,
    city_filter: Option<&str>,
) -> anyhow::Result<CycleSummary> {
    let mut summary = CycleSummary::default();

    for city in &cfg.cities {
        if let Some(only) = city_filter {
            if city.name != only {
                continue;
            }
        }

        let markets_by_id = match run_scan_and_execute(storage, clients, city, cfg, alerts, &mut summary).await {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(city = %city.name, error = %e, "scan/execute step failed");
                continue;
            }
        };

        if let Err(e) = run_monitor(storage, city, cfg, &markets_by_id, alerts, &mut summary).await {
            tracing::error!(city = %city.name, error = %e, "monitor step failed");
        }

        if let Err(e) = run_resolve_for_city(storage, clients, city, alerts, &mut summary).await {
            tracing::error!(city = %city.name, error = %e, "resolve step failed");
        }

        alerts
            .send(Alert::new(
                AlertType::ScanSummary { city: city.name.clone(), entered: summary.entered, filtered: summary.filtered },
                "Scan summary",
                format!("{}: {} entered, {} filtered", city.name, summary.entered, summary.filtered),
            ))
            .await;
    }

    let resolver = ResolverEngine::new();
    if let Err(e) = resolver.rebuild_calibration(storage, &cfg.calibration, Utc::now().date_naive()).await {
        tracing::error!(error = %e, "calibration rebuild failed");
    } else {
        alerts
            .send(Alert::new(AlertType::CalibrationRebuilt { buckets: 0 }, "Calibration rebuilt", "rolling window rebuild complete"))
            .await;
    }
    if let Err(e) = resolver.refresh_views(storage).await {
        tracing::error!(error = %e, "materialized view refresh failed");
    }

    Ok(summary)
}
