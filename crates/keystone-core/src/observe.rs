//! Optional metrics instrumentation for keystone.
//!
//! When the `observe` feature is enabled, migrations emit counters and
//! histograms via the [`metrics`] crate. A downstream application must install
//! a metrics recorder to collect the data.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record one migration step attempt (counter + duration histogram).
///
/// - `keystone.migration.steps_total` – counter with `outcome` label (`ok` / `fail`)
/// - `keystone.migration.step_duration_seconds` – histogram of step latency
#[inline]
pub fn record_migration(version: u32, duration: std::time::Duration, success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!(
            "keystone.migration.steps_total",
            "version" => version.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!("keystone.migration.step_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (version, duration, success);
    }
}

/// Record how many records a step rewrote or indexed.
///
/// - `keystone.migration.records_total` – counter with `step` label
#[inline]
pub fn record_records_migrated(step: &'static str, count: u64) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("keystone.migration.records_total", "step" => step).increment(count);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (step, count);
    }
}
