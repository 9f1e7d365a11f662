//! Timer-driven notification jobs.
//!
//! Two entry points drive the notifier: a weekly absence sweep (Sunday
//! 20:00 local time) and an hourly retry of pending dispatches. Neither
//! job persists missed runs across restarts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, TimeZone};
use notifier::{Notifier, Transport};
use tokio::time::{interval, sleep};
use tracing::{error, info};

/// Hour of day (local time) the weekly absence sweep runs.
pub const WEEKLY_RUN_HOUR: u32 = 20;

/// Period of the pending-message retry job.
pub const RETRY_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Duration until the next Sunday at [`WEEKLY_RUN_HOUR`] in `now`'s
/// timezone. If it is Sunday and the run hour is still ahead, today
/// qualifies.
///
/// Candidates that land in a DST gap are skipped to the following week;
/// ambiguous local times resolve to the earlier instant.
pub fn time_until_weekly_run<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tz = now.timezone();
    let run_time = NaiveTime::from_hms_opt(WEEKLY_RUN_HOUR, 0, 0).expect("constant run hour");

    let days_ahead = (7 - now.weekday().num_days_from_sunday() as i64) % 7;
    let mut date = now.date_naive() + ChronoDuration::days(days_ahead);

    loop {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(run_time)).earliest() {
            if candidate > *now {
                return candidate
                    .signed_duration_since(now.clone())
                    .to_std()
                    .unwrap_or_default();
            }
        }
        date += ChronoDuration::days(7);
    }
}

/// Run the weekly absence sweep forever.
///
/// Sleeps until the next Sunday 20:00 local time, runs
/// `notify_absent_members`, recomputes, repeats. Cycle errors are logged;
/// the loop never dies.
pub async fn run_weekly_absence_job<T: Transport>(notifier: Arc<Notifier<T>>) {
    loop {
        let delay = time_until_weekly_run(&chrono::Local::now());
        info!(seconds = delay.as_secs(), "Next absence sweep scheduled");
        sleep(delay).await;

        if let Err(e) = notifier.notify_absent_members().await {
            error!("Absence sweep failed: {}", e);
        }
    }
}

/// Run the pending-message retry job forever.
///
/// The first pass happens one full period after start; cycle errors are
/// logged and the loop continues.
pub async fn run_hourly_retry_job<T: Transport>(notifier: Arc<Notifier<T>>, period: Duration) {
    let mut ticker = interval(period);
    // A tokio interval fires immediately; consume that tick so the first
    // retry pass waits a full period.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = notifier.retry_failed_messages().await {
            error!("Retry cycle failed: {}", e);
        }
    }
}
