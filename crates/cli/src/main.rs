mod exporters;
mod pattern_builder;
mod task_registry;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use prometheus::{IntGauge, Registry, TextEncoder};
use tiny_http::{Response, Server};
use uuid::Uuid;

use exporters::{export_all, ConsoleExporter, CsvFileExporter, JsonFileExporter, MetricsExporter, RunContext};
use pulsegen_core::backpressure::QueueDepthBackpressure;
use pulsegen_core::engine::{EngineState, ExecutionEngine, DEFAULT_QUEUE_CAPACITY};
use pulsegen_core::metrics::MetricsCollector;

#[derive(Parser)]
#[command(name = "pulsegen", version, about = "Adaptive load generator")]
struct Cli {
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[arg(long)]
    metrics_addr: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        /// Task to drive: `noop` or `synthetic-latency`.
        #[arg(long, default_value = "noop")]
        task: String,
        #[arg(long, default_value_t = 5)]
        task_latency_ms: u64,
        #[arg(long, default_value_t = 0.0)]
        task_failure_rate: f64,

        /// Pattern to drive TPS: static, step, ramp-up, ramp-up-sustain,
        /// sine, spike, warmup-cooldown, adaptive.
        #[arg(long)]
        pattern: String,
        #[arg(long)]
        pattern_config: PathBuf,

        /// `cooperative`, `pooled:<n>`, or `inherited` (defer to the task's
        /// own `Task::thread_strategy`).
        #[arg(long, default_value = "cooperative")]
        threads: String,

        /// Repeatable: `console`, `json:<path>`, `csv:<path>`.
        #[arg(long = "exporter")]
        exporters: Vec<String>,

        #[arg(long)]
        run_id: Option<String>,

        #[arg(long, default_value_t = 5)]
        shutdown_drain_timeout_secs: u64,
        #[arg(long, default_value_t = 2)]
        shutdown_force_timeout_secs: u64,
    },
    Validate {
        #[arg(long)]
        pattern: String,
        #[arg(long)]
        pattern_config: PathBuf,
    },
}

struct Metrics {
    registry: Registry,
    executions_success: IntGauge,
    executions_failure: IntGauge,
    executions_skipped: IntGauge,
    queue_depth: IntGauge,
    engine_state: IntGauge,
    engine_uptime_ms: IntGauge,
}

impl Metrics {
    fn init(addr: Option<&str>) -> Result<Arc<Self>> {
        let registry = Registry::new();
        let executions_success =
            IntGauge::new("pulsegen_executions_success", "Successful executions").into_diagnostic()?;
        let executions_failure =
            IntGauge::new("pulsegen_executions_failure", "Failed executions").into_diagnostic()?;
        let executions_skipped =
            IntGauge::new("pulsegen_executions_skipped", "Skipped executions").into_diagnostic()?;
        let queue_depth =
            IntGauge::new("pulsegen_queue_depth", "Worker pool queue depth").into_diagnostic()?;
        let engine_state = IntGauge::new(
            "pulsegen_engine_state",
            "0=STOPPED, 1=RUNNING, 2=STOPPING",
        )
        .into_diagnostic()?;
        let engine_uptime_ms =
            IntGauge::new("pulsegen_engine_uptime_ms", "Elapsed run time in milliseconds").into_diagnostic()?;

        registry.register(Box::new(executions_success.clone())).into_diagnostic()?;
        registry.register(Box::new(executions_failure.clone())).into_diagnostic()?;
        registry.register(Box::new(executions_skipped.clone())).into_diagnostic()?;
        registry.register(Box::new(queue_depth.clone())).into_diagnostic()?;
        registry.register(Box::new(engine_state.clone())).into_diagnostic()?;
        registry.register(Box::new(engine_uptime_ms.clone())).into_diagnostic()?;

        let metrics = Arc::new(Self {
            registry,
            executions_success,
            executions_failure,
            executions_skipped,
            queue_depth,
            engine_state,
            engine_uptime_ms,
        });

        if let Some(addr) = addr {
            let registry = metrics.registry.clone();
            let addr = addr.to_string();
            thread::spawn(move || start_metrics_server(&addr, &registry));
        }

        Ok(metrics)
    }

    fn record_snapshot(&self, snapshot: &pulsegen_core::metrics::AggregatedSnapshot, state: EngineState) {
        self.executions_success.set(snapshot.success_count as i64);
        self.executions_failure.set(snapshot.failure_count as i64);
        self.executions_skipped.set(snapshot.skipped_count as i64);
        self.queue_depth.set(snapshot.queue_depth as i64);
        self.engine_uptime_ms.set(snapshot.elapsed_millis);
        self.engine_state.set(match state {
            EngineState::Stopped => 0,
            EngineState::Running => 1,
            EngineState::Stopping => 2,
        });
    }
}

fn start_metrics_server(addr: &str, registry: &Registry) {
    let server = match Server::http(addr) {
        Ok(server) => server,
        Err(_) => return,
    };
    for request in server.incoming_requests() {
        let encoder = TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_ok() {
            let _ = request.respond(Response::from_data(buffer));
        }
    }
}

fn init_tracing(log_format: LogFormat, log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .into_diagnostic()?;
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match log_format {
        LogFormat::Json => fmt.json().init(),
        LogFormat::Pretty => fmt.init(),
    }
    Ok(())
}

/// Exit codes per spec: 0 normal, 3 task init failure, 4 forced
/// shutdown/timeout, 1 any other error.
const EXIT_OK: i32 = 0;
const EXIT_TASK_INIT_FAILED: i32 = 3;
const EXIT_FORCED_SHUTDOWN: i32 = 4;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, &cli.log_level)?;
    let metrics = Metrics::init(cli.metrics_addr.as_deref())?;

    let exit_code = match cli.command {
        Commands::Run {
            task,
            task_latency_ms,
            task_failure_rate,
            pattern,
            pattern_config,
            threads,
            exporters,
            run_id,
            shutdown_drain_timeout_secs,
            shutdown_force_timeout_secs,
        } => run_command(
            &task,
            task_latency_ms,
            task_failure_rate,
            &pattern,
            &pattern_config,
            &threads,
            &exporters,
            run_id,
            shutdown_drain_timeout_secs,
            shutdown_force_timeout_secs,
            &metrics,
        )?,
        Commands::Validate {
            pattern,
            pattern_config,
        } => validate_command(&pattern, &pattern_config)?,
    };

    if exit_code != EXIT_OK {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn parse_thread_strategy(value: &str) -> Result<pulsegen_core::task::ThreadStrategy> {
    use pulsegen_core::task::ThreadStrategy;
    if value == "cooperative" {
        return Ok(ThreadStrategy::Cooperative);
    }
    if value == "inherited" {
        return Ok(ThreadStrategy::Inherited);
    }
    if let Some(count) = value.strip_prefix("pooled:") {
        let workers: usize = count
            .parse()
            .into_diagnostic()
            .with_context(|| format!("invalid pooled worker count '{count}'"))?;
        return Ok(ThreadStrategy::Pooled(workers));
    }
    Err(miette::miette!(
        "invalid --threads value '{}': expected 'cooperative', 'pooled:<n>', or 'inherited'",
        value
    ))
}

fn build_exporters(specs: &[String]) -> Result<Vec<Box<dyn MetricsExporter>>> {
    let mut built: Vec<Box<dyn MetricsExporter>> = Vec::new();
    for spec in specs {
        if spec == "console" {
            built.push(Box::new(ConsoleExporter));
        } else if let Some(path) = spec.strip_prefix("json:") {
            built.push(Box::new(JsonFileExporter {
                path: PathBuf::from(path),
            }));
        } else if let Some(path) = spec.strip_prefix("csv:") {
            built.push(Box::new(CsvFileExporter {
                path: PathBuf::from(path),
            }));
        } else {
            return Err(miette::miette!(
                "invalid --exporter value '{}': expected 'console', 'json:<path>', or 'csv:<path>'",
                spec
            ));
        }
    }
    if built.is_empty() {
        built.push(Box::new(ConsoleExporter));
    }
    Ok(built)
}

/// Wraps a built-in demo task to apply the CLI's `--threads` selection,
/// since `task_registry`'s tasks don't know about CLI flags.
struct TaskWithStrategy {
    inner: Arc<dyn pulsegen_core::task::Task>,
    strategy: pulsegen_core::task::ThreadStrategy,
}

impl pulsegen_core::task::Task for TaskWithStrategy {
    fn init(&self) -> Result<(), pulsegen_core::task::TaskError> {
        self.inner.init()
    }

    fn execute(&self, iteration: u64) -> pulsegen_core::task::TaskResult {
        self.inner.execute(iteration)
    }

    fn teardown(&self) -> Result<(), pulsegen_core::task::TaskError> {
        self.inner.teardown()
    }

    fn thread_strategy(&self) -> pulsegen_core::task::ThreadStrategy {
        self.strategy.resolve(self.inner.thread_strategy())
    }
}

#[allow(clippy::too_many_arguments)]
fn run_command(
    task: &str,
    task_latency_ms: u64,
    task_failure_rate: f64,
    pattern: &str,
    pattern_config: &PathBuf,
    threads: &str,
    exporter_specs: &[String],
    run_id: Option<String>,
    shutdown_drain_timeout_secs: u64,
    shutdown_force_timeout_secs: u64,
    metrics: &Metrics,
) -> Result<i32> {
    let run_id = run_id
        .map(|id| Uuid::parse_str(&id).into_diagnostic())
        .transpose()?
        .unwrap_or_else(Uuid::new_v4);
    let span = tracing::info_span!("pulsegen_run", run_id = %run_id, task, pattern);
    let _entered = span.enter();
    tracing::info!("starting run");

    let task_obj = task_registry::build_task(task, task_latency_ms, task_failure_rate)?;
    let thread_strategy = parse_thread_strategy(threads)?;
    let collector = Arc::new(MetricsCollector::new());
    let backpressure = Arc::new(QueueDepthBackpressure::new(DEFAULT_QUEUE_CAPACITY as u64));
    let pattern_obj = pattern_builder::build_pattern(pattern, pattern_config, &collector, &backpressure)?;
    let exporter_objs = build_exporters(exporter_specs)?;

    let wrapped_task = TaskWithStrategy {
        inner: task_obj,
        strategy: thread_strategy,
    };
    let engine = ExecutionEngine::new(Arc::new(wrapped_task), pattern_obj, collector)
        .with_timeouts(
            Duration::from_secs(shutdown_drain_timeout_secs),
            Duration::from_secs(shutdown_force_timeout_secs),
        )
        .with_backpressure(backpressure);

    let result = engine.run();
    let state = engine.state();

    let snapshot = match result {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::error!(error = %err, "engine run failed");
            return Ok(EXIT_TASK_INIT_FAILED);
        }
    };

    metrics.record_snapshot(&snapshot, state);
    let context = RunContext::new(run_id);
    export_all(&exporter_objs, "pulsegen run", &snapshot, &context);

    if engine.shutdown_degraded() {
        tracing::error!("shutdown did not converge cleanly");
        return Ok(EXIT_FORCED_SHUTDOWN);
    }

    Ok(EXIT_OK)
}

fn validate_command(pattern: &str, pattern_config: &PathBuf) -> Result<i32> {
    let collector = Arc::new(MetricsCollector::new());
    let backpressure = Arc::new(QueueDepthBackpressure::new(DEFAULT_QUEUE_CAPACITY as u64));
    pattern_builder::build_pattern(pattern, pattern_config, &collector, &backpressure)?;
    println!("Pattern config OK");
    Ok(EXIT_OK)
}
