use crate::error::{ResolverError, ResolverResult};
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use weather_platform::{ResolutionDescriptor, ResolutionMethod};

/// City-local-time gate on when a platform's authoritative reading for
/// `target_date` can be trusted as final. Never evaluated in UTC --
/// a climatological report published at 07:00 in one city's timezone can
/// still be mid-afternoon the previous day in UTC.
pub fn is_ready_to_resolve(
    descriptor: &ResolutionDescriptor,
    timezone: &str,
    target_date: NaiveDate,
    now_utc: DateTime<Utc>,
) -> ResolverResult<bool> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| ResolverError::UnknownTimezone(timezone.to_string()))?;
    let local_now = now_utc.with_timezone(&tz);
    let local_date = local_now.date_naive();

    Ok(match &descriptor.method {
        ResolutionMethod::ClimatologicalReport { ready_after_local_hour } => {
            let next_day = target_date + Duration::days(1);
            local_date > next_day
                || (local_date == next_day && local_now.hour() >= *ready_after_local_hour)
        }
        ResolutionMethod::HistoricalHourlyObservations { .. } => local_date > target_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn descriptor(method: ResolutionMethod) -> ResolutionDescriptor {
        ResolutionDescriptor { station_id: "KNYC".into(), method }
    }

    #[test]
    fn climatological_report_not_ready_before_local_hour() {
        let target = NaiveDate::from_ymd_opt(2026, 7, 20).unwrap();
        // next-day 06:00 America/New_York in UTC is 10:00 UTC.
        let now = Utc.with_ymd_and_hms(2026, 7, 21, 10, 0, 0).unwrap();
        let ready = is_ready_to_resolve(
            &descriptor(ResolutionMethod::ClimatologicalReport { ready_after_local_hour: 7 }),
            "America/New_York",
            target,
            now,
        )
        .unwrap();
        assert!(!ready);
    }

    #[test]
    fn climatological_report_ready_after_local_hour() {
        let target = NaiveDate::from_ymd_opt(2026, 7, 20).unwrap();
        // next-day 08:00 America/New_York is 12:00 UTC.
        let now = Utc.with_ymd_and_hms(2026, 7, 21, 12, 0, 0).unwrap();
        let ready = is_ready_to_resolve(
            &descriptor(ResolutionMethod::ClimatologicalReport { ready_after_local_hour: 7 }),
            "America/New_York",
            target,
            now,
        )
        .unwrap();
        assert!(ready);
    }

    #[test]
    fn historical_observations_ready_once_local_midnight_passes() {
        let target = NaiveDate::from_ymd_opt(2026, 7, 20).unwrap();
        let still_same_local_day = Utc.with_ymd_and_hms(2026, 7, 21, 2, 0, 0).unwrap(); // 22:00 local on the 20th
        let next_local_day = Utc.with_ymd_and_hms(2026, 7, 21, 5, 0, 0).unwrap(); // 01:00 local on the 21st
        let descriptor = descriptor(ResolutionMethod::HistoricalHourlyObservations { has_max_temp_field: true });
        assert!(!is_ready_to_resolve(&descriptor, "America/New_York", target, still_same_local_day).unwrap());
        assert!(is_ready_to_resolve(&descriptor, "America/New_York", target, next_local_day).unwrap());
    }

    #[test]
    fn unknown_timezone_is_an_error_not_a_panic() {
        let target = NaiveDate::from_ymd_opt(2026, 7, 20).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 7, 21, 5, 0, 0).unwrap();
        let descriptor = descriptor(ResolutionMethod::HistoricalHourlyObservations { has_max_temp_field: true });
        assert!(is_ready_to_resolve(&descriptor, "Not/A_Zone", target, now).is_err());
    }
}
