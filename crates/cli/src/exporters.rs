//! `MetricsExporter` contract (spec.md §6): one `export` call per completed
//! run, composite-called so one exporter's failure never skips the rest.
//! Console/JSON/CSV are plain adapters over `AggregatedSnapshot` — thin,
//! as spec.md §1 says out-of-scope report formatters should be.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use miette::{Context, IntoDiagnostic, Result};
use pulsegen_core::metrics::AggregatedSnapshot;
use serde::Serialize;
use uuid::Uuid;

/// Threaded through to every exporter call and attached to the CLI's own
/// tracing span around the run (ambient addition, spec.md §3 of `SPEC_FULL.md`).
#[derive(Debug, Clone, Serialize)]
pub struct RunContext {
    pub run_id: Uuid,
    pub started_at: SystemTime,
}

impl RunContext {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: SystemTime::now(),
        }
    }
}

pub trait MetricsExporter {
    fn export(&self, title: &str, snapshot: &AggregatedSnapshot, context: &RunContext) -> Result<()>;
}

pub struct ConsoleExporter;

impl MetricsExporter for ConsoleExporter {
    fn export(&self, title: &str, snapshot: &AggregatedSnapshot, context: &RunContext) -> Result<()> {
        println!("=== {title} (run {}) ===", context.run_id);
        println!(
            "executions: {} (success {}, failure {}, skipped {})",
            snapshot.total_executions, snapshot.success_count, snapshot.failure_count, snapshot.skipped_count
        );
        println!(
            "tps: success {:.1}, failure {:.1}, response {:.1}",
            snapshot.success_tps, snapshot.failure_tps, snapshot.response_tps
        );
        println!("failure rate: {:.4}", snapshot.failure_rate());
        println!("queue depth: {}", snapshot.queue_depth);
        for (quantile, nanos) in &snapshot.success_latency_percentiles_nanos {
            println!("  p{:<5} success latency: {:.3} ms", quantile * 100.0, *nanos as f64 / 1_000_000.0);
        }
        Ok(())
    }
}

pub struct JsonFileExporter {
    pub path: PathBuf,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    run_id: Uuid,
    snapshot: &'a AggregatedSnapshot,
}

impl MetricsExporter for JsonFileExporter {
    fn export(&self, title: &str, snapshot: &AggregatedSnapshot, context: &RunContext) -> Result<()> {
        let report = JsonReport {
            title,
            run_id: context.run_id,
            snapshot,
        };
        let data = serde_json::to_string_pretty(&report).into_diagnostic()?;
        fs::write(&self.path, data)
            .into_diagnostic()
            .with_context(|| format!("failed to write JSON report to {}", self.path.display()))
    }
}

pub struct CsvFileExporter {
    pub path: PathBuf,
}

impl MetricsExporter for CsvFileExporter {
    fn export(&self, title: &str, snapshot: &AggregatedSnapshot, context: &RunContext) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)
            .into_diagnostic()
            .with_context(|| format!("failed to open CSV report at {}", self.path.display()))?;
        writer
            .write_record([
                "title",
                "run_id",
                "total_executions",
                "success_count",
                "failure_count",
                "skipped_count",
                "success_tps",
                "failure_tps",
                "response_tps",
                "failure_rate",
                "queue_depth",
                "elapsed_millis",
            ])
            .into_diagnostic()?;
        writer
            .write_record([
                title.to_string(),
                context.run_id.to_string(),
                snapshot.total_executions.to_string(),
                snapshot.success_count.to_string(),
                snapshot.failure_count.to_string(),
                snapshot.skipped_count.to_string(),
                snapshot.success_tps.to_string(),
                snapshot.failure_tps.to_string(),
                snapshot.response_tps.to_string(),
                snapshot.failure_rate().to_string(),
                snapshot.queue_depth.to_string(),
                snapshot.elapsed_millis.to_string(),
            ])
            .into_diagnostic()?;
        writer.flush().into_diagnostic()?;
        Ok(())
    }
}

/// Calls every exporter even if earlier ones fail; logs and continues
/// (spec.md §6/§7: "if an exporter throws, other exporters must still be
/// called").
pub fn export_all(
    exporters: &[Box<dyn MetricsExporter>],
    title: &str,
    snapshot: &AggregatedSnapshot,
    context: &RunContext,
) {
    for exporter in exporters {
        if let Err(err) = exporter.export(title, snapshot, context) {
            tracing::error!(error = %err, "exporter failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_snapshot() -> AggregatedSnapshot {
        AggregatedSnapshot {
            total_executions: 10,
            success_count: 9,
            failure_count: 1,
            skipped_count: 0,
            success_tps: 4.5,
            failure_tps: 0.5,
            response_tps: 5.0,
            success_latency_percentiles_nanos: vec![(0.5, 1_000_000)],
            failure_latency_percentiles_nanos: vec![],
            queue_wait_percentiles_nanos: vec![],
            queue_depth: 0,
            elapsed_millis: 2_000,
        }
    }

    #[test]
    fn console_exporter_never_errors() {
        let exporter = ConsoleExporter;
        let context = RunContext::new(Uuid::new_v4());
        assert!(exporter.export("test run", &sample_snapshot(), &context).is_ok());
    }

    #[test]
    fn json_exporter_writes_valid_json() {
        let file = NamedTempFile::new().unwrap();
        let exporter = JsonFileExporter {
            path: file.path().to_path_buf(),
        };
        let context = RunContext::new(Uuid::new_v4());
        exporter.export("test run", &sample_snapshot(), &context).unwrap();
        let contents = fs::read_to_string(file.path()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["title"], "test run");
        assert_eq!(parsed["snapshot"]["total_executions"], 10);
    }

    #[test]
    fn csv_exporter_writes_a_header_and_one_row() {
        let file = NamedTempFile::new().unwrap();
        let exporter = CsvFileExporter {
            path: file.path().to_path_buf(),
        };
        let context = RunContext::new(Uuid::new_v4());
        exporter.export("test run", &sample_snapshot(), &context).unwrap();
        let contents = fs::read_to_string(file.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("total_executions"));
    }

    #[test]
    fn export_all_continues_past_an_unwritable_path() {
        let good = NamedTempFile::new().unwrap();
        let exporters: Vec<Box<dyn MetricsExporter>> = vec![
            Box::new(JsonFileExporter {
                path: PathBuf::from("/nonexistent/dir/report.json"),
            }),
            Box::new(JsonFileExporter {
                path: good.path().to_path_buf(),
            }),
        ];
        let context = RunContext::new(Uuid::new_v4());
        export_all(&exporters, "test run", &sample_snapshot(), &context);
        assert!(fs::read_to_string(good.path()).unwrap().contains("total_executions"));
    }
}
