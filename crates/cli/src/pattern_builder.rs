//! Maps `--pattern` + a JSON config file to a `LoadPattern` (spec.md §6 CLI
//! surface). Mirrors the teacher's `load_config`/`validate_config` pair:
//! read the file, deserialize into a typed struct, construct.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;

use pulsegen_core::adaptive::{Adaptive, AdaptiveConfig};
use pulsegen_core::backpressure::QueueDepthBackpressure;
use pulsegen_core::metrics::MetricsCollector;
use pulsegen_core::pattern::{
    LoadPattern, RampUp, RampUpThenSustain, SineWave, Spike, Static, Step, StepSegment,
    WarmupCooldown,
};
use pulsegen_core::snapshot_cache::CachedCollectorSnapshot;

const ADAPTIVE_SNAPSHOT_CACHE_TTL: Duration = Duration::from_millis(100);

#[derive(Deserialize)]
struct StaticConfig {
    tps: f64,
    duration_secs: f64,
}

#[derive(Deserialize)]
struct StepSegmentConfig {
    tps: f64,
    duration_secs: f64,
}

#[derive(Deserialize)]
struct StepConfig {
    segments: Vec<StepSegmentConfig>,
}

#[derive(Deserialize)]
struct RampUpConfig {
    max_tps: f64,
    duration_secs: f64,
}

#[derive(Deserialize)]
struct RampUpSustainConfig {
    max_tps: f64,
    ramp_secs: f64,
    sustain_secs: f64,
}

#[derive(Deserialize)]
struct SineConfig {
    baseline_tps: f64,
    amplitude: f64,
    period_secs: f64,
    duration_secs: f64,
}

#[derive(Deserialize)]
struct SpikeConfig {
    baseline_tps: f64,
    spike_tps: f64,
    interval_secs: f64,
    width_secs: f64,
    duration_secs: f64,
}

#[derive(Deserialize)]
struct WarmupCooldownConfig {
    inner_pattern: String,
    inner_config: serde_json::Value,
    warmup_secs: f64,
    cooldown_secs: f64,
}

#[derive(Deserialize)]
struct AdaptiveConfigFile {
    initial_tps: f64,
    min_tps: f64,
    max_tps: f64,
    ramp_increment: f64,
    ramp_decrement: f64,
    ramp_interval_ms: i64,
    sustain_duration_ms: i64,
    stable_intervals_required: u32,
    recovery_tps_ratio: f64,
    duration_secs: f64,
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

fn load_json(path: &Path) -> Result<serde_json::Value> {
    let contents = fs::read_to_string(path)
        .into_diagnostic()
        .with_context(|| format!("failed to read pattern config {}", path.display()))?;
    serde_json::from_str(&contents)
        .into_diagnostic()
        .with_context(|| format!("invalid pattern config JSON in {}", path.display()))
}

/// `collector` is only consulted when `name == "adaptive"`, where it doubles
/// as the pattern's `SnapshotProvider` read-back. `backpressure` is the
/// engine's real queue-depth handle (see `ExecutionEngine::backpressure`) —
/// `"adaptive"` reads it back too, rather than standing up a disconnected
/// instance of its own that the engine never ticks.
pub fn build_pattern(
    name: &str,
    config_path: &Path,
    collector: &Arc<MetricsCollector>,
    backpressure: &Arc<QueueDepthBackpressure>,
) -> Result<Arc<dyn LoadPattern>> {
    let value = load_json(config_path)?;
    build_from_value(name, value, collector, backpressure)
}

fn build_from_value(
    name: &str,
    value: serde_json::Value,
    collector: &Arc<MetricsCollector>,
    backpressure: &Arc<QueueDepthBackpressure>,
) -> Result<Arc<dyn LoadPattern>> {
    match name {
        "static" => {
            let config: StaticConfig = serde_json::from_value(value).into_diagnostic()?;
            Ok(Arc::new(Static::new(config.tps, secs(config.duration_secs))))
        }
        "step" => {
            let config: StepConfig = serde_json::from_value(value).into_diagnostic()?;
            let segments = config
                .segments
                .into_iter()
                .map(|s| StepSegment {
                    tps: s.tps,
                    duration: secs(s.duration_secs),
                })
                .collect();
            Ok(Arc::new(Step::new(segments).into_diagnostic()?))
        }
        "ramp-up" => {
            let config: RampUpConfig = serde_json::from_value(value).into_diagnostic()?;
            Ok(Arc::new(RampUp::new(config.max_tps, secs(config.duration_secs))))
        }
        "ramp-up-sustain" => {
            let config: RampUpSustainConfig = serde_json::from_value(value).into_diagnostic()?;
            Ok(Arc::new(RampUpThenSustain::new(
                config.max_tps,
                secs(config.ramp_secs),
                secs(config.sustain_secs),
            )))
        }
        "sine" => {
            let config: SineConfig = serde_json::from_value(value).into_diagnostic()?;
            Ok(Arc::new(SineWave::new(
                config.baseline_tps,
                config.amplitude,
                secs(config.period_secs),
                secs(config.duration_secs),
            )))
        }
        "spike" => {
            let config: SpikeConfig = serde_json::from_value(value).into_diagnostic()?;
            Ok(Arc::new(Spike::new(
                config.baseline_tps,
                config.spike_tps,
                secs(config.interval_secs),
                secs(config.width_secs),
                secs(config.duration_secs),
            )))
        }
        "warmup-cooldown" => {
            let config: WarmupCooldownConfig = serde_json::from_value(value).into_diagnostic()?;
            let inner = build_from_value(&config.inner_pattern, config.inner_config, collector, backpressure)?;
            Ok(Arc::new(WarmupCooldown::new(
                inner,
                secs(config.warmup_secs),
                secs(config.cooldown_secs),
            )))
        }
        "adaptive" => {
            let config: AdaptiveConfigFile = serde_json::from_value(value).into_diagnostic()?;
            let adaptive_config = AdaptiveConfig::new(
                config.initial_tps,
                config.min_tps,
                config.max_tps,
                config.ramp_increment,
                config.ramp_decrement,
                config.ramp_interval_ms,
                config.sustain_duration_ms,
                config.stable_intervals_required,
                config.recovery_tps_ratio,
            )
            .into_diagnostic()?;
            let cached_snapshot = Arc::new(CachedCollectorSnapshot::new(
                collector.clone(),
                10,
                ADAPTIVE_SNAPSHOT_CACHE_TTL,
            ));
            Ok(Arc::new(Adaptive::new(
                adaptive_config,
                cached_snapshot,
                backpressure.clone(),
                secs(config.duration_secs),
            )))
        }
        other => Err(miette::miette!(
            "unknown pattern '{}': expected one of static, step, ramp-up, ramp-up-sustain, sine, spike, warmup-cooldown, adaptive",
            other
        )),
    }
}
