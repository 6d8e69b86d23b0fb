//! runbridge - workflow-run output bridge CLI
//!
//! Two thin entrypoints around the bundle contract in `runbridge-core`:
//!
//! - `publish`: producer side. Sanitizes outputs, projects an event
//!   subset, stamps provenance metadata, and stages the canonical bundle
//!   directory for the platform's artifact upload step.
//! - `collect`: consumer side. Reads a downloaded bundle, enforces the
//!   identity binding chain, and re-exposes outputs, extracted values, and
//!   files through the runner's sinks.
//!
//! The artifact transport itself (upload/download of the archived bundle)
//! is the hosting platform's job; this binary only stages and consumes the
//! directory tree.

mod sink;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Number, Value};
use tracing::Level;

use runbridge_core::{
    apply_extract_mappings, build_bridge_meta, obs, parse_and_merge_outputs,
    parse_extract_mappings, parse_json_object, pick_by_paths, read_bundle, resolve_first,
    resolve_required, restore_files, scalar_to_string, split_list, validate_expectations,
    write_bundle, Expectations, OutputsMap, ProducerContext, SanitizeMode, BUNDLE_DIR,
};

use sink::OutputSink;

#[derive(Parser)]
#[command(name = "runbridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bridge outputs, metadata, and files between workflow runs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage a bundle of outputs, metadata, and files for upload
    Publish(PublishArgs),

    /// Validate a downloaded bundle and re-expose its contents
    Collect(CollectArgs),
}

#[derive(Args)]
struct PublishArgs {
    /// Inline outputs as a JSON object (overrides the outputs file key-by-key)
    #[arg(long, default_value = "")]
    outputs: String,

    /// Path to a JSON object file of outputs
    #[arg(long)]
    outputs_file: Option<PathBuf>,

    /// Workspace-relative files to attach (newline- or comma-separated)
    #[arg(long, default_value = "")]
    files: String,

    /// Event payload paths to embed in metadata (newline- or comma-separated)
    #[arg(long, default_value = "")]
    event_paths: String,

    /// Embed the full event payload instead of a path subset
    #[arg(long)]
    include_full_event: bool,

    /// Output sanitize mode: strict or none
    #[arg(long, default_value = "strict")]
    sanitize: String,

    /// Extra metadata as a JSON object (merged last, keys win)
    #[arg(long, default_value = "")]
    meta: String,

    /// Artifact name handed to the upload step
    #[arg(long, default_value = "bridge")]
    artifact_name: String,

    /// Retention hint (days) handed to the upload step
    #[arg(long)]
    retention_days: Option<u32>,

    /// Bundle staging root (recreated fresh per invocation)
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Repository override (default: GITHUB_REPOSITORY)
    #[arg(long)]
    repository: Option<String>,

    /// Workflow name override (default: GITHUB_WORKFLOW)
    #[arg(long)]
    workflow: Option<String>,

    /// Run id override (default: GITHUB_RUN_ID)
    #[arg(long)]
    run_id: Option<String>,

    /// Run attempt override (default: GITHUB_RUN_ATTEMPT)
    #[arg(long)]
    run_attempt: Option<String>,

    /// Event name override (default: GITHUB_EVENT_NAME)
    #[arg(long)]
    event_name: Option<String>,

    /// Head SHA override (default: GITHUB_SHA)
    #[arg(long)]
    head_sha: Option<String>,

    /// Producer job override (default: GITHUB_JOB)
    #[arg(long)]
    job: Option<String>,
}

#[derive(Args)]
struct CollectArgs {
    /// Root directory where the bundle archive was unpacked
    #[arg(long)]
    bundle_dir: PathBuf,

    /// Workflow run id the bundle must have been produced by
    #[arg(long)]
    run_id: String,

    /// Expected repository (default: GITHUB_REPOSITORY)
    #[arg(long)]
    repository: Option<String>,

    /// Expected run attempt
    #[arg(long)]
    run_attempt: Option<String>,

    /// Expected producer workflow name
    #[arg(long)]
    source_workflow: Option<String>,

    /// Expected head commit SHA
    #[arg(long)]
    expected_head_sha: Option<String>,

    /// Expected pull request number
    #[arg(long)]
    expected_pr_number: Option<String>,

    /// Allowed producer event names (newline- or comma-separated)
    #[arg(long, default_value = "")]
    require_events: String,

    /// Extract mappings, one name=path line per output
    #[arg(long, default_value = "")]
    extract: String,

    /// Restore the bundle's file tree into this directory
    #[arg(long)]
    restore_files_to: Option<PathBuf>,

    /// Also export emitted outputs as environment variables
    #[arg(long)]
    export_env: bool,

    /// Fail when no bundle is present (disable to get an empty result)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    fail_on_missing: bool,

    /// Remove the scratch bundle directory after a successful collect
    #[arg(long)]
    cleanup: bool,
}

/// Snapshot of the hosting runner's environment, captured once per
/// invocation so the core logic never reads ambient state.
#[derive(Debug, Clone, Default)]
struct RunnerEnv {
    repository: Option<String>,
    workflow: Option<String>,
    run_id: Option<String>,
    run_attempt: Option<String>,
    event_name: Option<String>,
    head_sha: Option<String>,
    event_path: Option<String>,
    job: Option<String>,
    output_file: Option<String>,
    env_file: Option<String>,
}

impl RunnerEnv {
    fn capture() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            repository: var("GITHUB_REPOSITORY"),
            workflow: var("GITHUB_WORKFLOW"),
            run_id: var("GITHUB_RUN_ID"),
            run_attempt: var("GITHUB_RUN_ATTEMPT"),
            event_name: var("GITHUB_EVENT_NAME"),
            head_sha: var("GITHUB_SHA"),
            event_path: var("GITHUB_EVENT_PATH"),
            job: var("GITHUB_JOB"),
            output_file: var("GITHUB_OUTPUT"),
            env_file: var("GITHUB_ENV"),
        }
    }

    fn sink(&self) -> OutputSink {
        OutputSink::new(
            self.output_file.clone().map(PathBuf::from),
            self.env_file.clone().map(PathBuf::from),
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    runbridge_core::init_tracing(cli.json, level);

    let env = RunnerEnv::capture();
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    match cli.command {
        Commands::Publish(args) => cmd_publish(&args, &env, &cwd),
        Commands::Collect(args) => cmd_collect(&args, &env),
    }
}

fn parse_sanitize(raw: &str) -> Result<SanitizeMode> {
    match raw {
        "strict" => Ok(SanitizeMode::Strict),
        "none" => Ok(SanitizeMode::None),
        other => anyhow::bail!("Unknown sanitize mode: {}", other),
    }
}

/// Read the trigger event payload from the runner's event file, if any.
fn read_event_payload(env: &RunnerEnv) -> Result<Option<Value>> {
    let Some(path) = &env.event_path else {
        return Ok(None);
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload: {:?}", path))?;
    let payload: Value = serde_json::from_str(&text)
        .with_context(|| format!("Event payload is not valid JSON: {:?}", path))?;
    Ok(Some(payload))
}

/// Pull the PR number out of the trigger payload, wherever the event type
/// keeps it.
fn pr_number_from_payload(payload: Option<&Value>) -> Option<Number> {
    match runbridge_core::get_by_path(payload?, "pull_request.number|issue.number")? {
        Value::Number(number) => Some(number),
        _ => None,
    }
}

/// Assemble the producer context from explicit flags with env fallbacks.
fn build_producer_context(
    args: &PublishArgs,
    env: &RunnerEnv,
    payload: Option<&Value>,
) -> Result<ProducerContext> {
    Ok(ProducerContext {
        repository: resolve_required(
            "repository",
            &[
                ("--repository", args.repository.clone()),
                ("GITHUB_REPOSITORY", env.repository.clone()),
            ],
        )?,
        workflow_name: resolve_required(
            "workflow name",
            &[
                ("--workflow", args.workflow.clone()),
                ("GITHUB_WORKFLOW", env.workflow.clone()),
            ],
        )?,
        run_id: resolve_required(
            "run id",
            &[
                ("--run-id", args.run_id.clone()),
                ("GITHUB_RUN_ID", env.run_id.clone()),
            ],
        )?,
        run_attempt: resolve_required(
            "run attempt",
            &[
                ("--run-attempt", args.run_attempt.clone()),
                ("GITHUB_RUN_ATTEMPT", env.run_attempt.clone()),
            ],
        )?,
        event_name: resolve_required(
            "event name",
            &[
                ("--event-name", args.event_name.clone()),
                ("GITHUB_EVENT_NAME", env.event_name.clone()),
            ],
        )?,
        head_sha: resolve_required(
            "head sha",
            &[
                ("--head-sha", args.head_sha.clone()),
                ("GITHUB_SHA", env.head_sha.clone()),
            ],
        )?,
        pr_number: pr_number_from_payload(payload),
        job: resolve_first(&[("--job", args.job.clone()), ("GITHUB_JOB", env.job.clone())]),
    })
}

/// Recreate `path` as an empty directory.
fn fresh_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to clear staging dir: {:?}", path))
        }
    }
    fs::create_dir_all(path).with_context(|| format!("Failed to create staging dir: {:?}", path))
}

/// Stage a bundle for the platform's upload step.
fn cmd_publish(args: &PublishArgs, env: &RunnerEnv, source_base: &Path) -> Result<()> {
    let _phase = obs::PhaseSpan::enter("publish");

    let sanitize = parse_sanitize(&args.sanitize)?;
    let payload = read_event_payload(env)?;
    let ctx = build_producer_context(args, env, payload.as_ref())?;

    let file_text = match &args.outputs_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read outputs file: {:?}", path))?,
        None => String::new(),
    };
    let outputs = parse_and_merge_outputs(&args.outputs, &file_text, sanitize)?;

    let mut extra = if args.meta.trim().is_empty() {
        Map::new()
    } else {
        parse_json_object(&args.meta, "extra metadata")?
    };

    let event_paths = split_list(&args.event_paths);
    if args.include_full_event || !event_paths.is_empty() {
        let subset = match (&payload, args.include_full_event) {
            (Some(Value::Object(map)), true) => map.clone(),
            (Some(value), false) => pick_by_paths(value, &event_paths),
            _ => Map::new(),
        };
        extra.insert("event".to_string(), Value::Object(subset));
    }

    let meta = build_bridge_meta(&ctx, &extra);
    let files = split_list(&args.files);

    let staging = args
        .staging_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(".runbridge/publish"));
    fresh_dir(&staging)?;

    let bundle_dir = write_bundle(&staging, &outputs, &meta, &files, source_base)?;
    obs::emit_bundle_written(&bundle_dir, outputs.len(), files.len());

    // Hand the upload coordinates to the platform's artifact step.
    let sink = env.sink();
    sink.write_output("bundle_dir", &staging.display().to_string())?;
    sink.write_output("artifact_name", &args.artifact_name)?;
    if let Some(days) = args.retention_days {
        sink.write_output("retention_days", &days.to_string())?;
    }

    println!("Bundle staged at {:?}", bundle_dir);
    println!("Artifact:  {}", args.artifact_name);
    if let Some(days) = args.retention_days {
        println!("Retention: {} days", days);
    }
    println!("Outputs:   {}", outputs.len());
    println!("Files:     {}", files.len());

    Ok(())
}

/// Validate a downloaded bundle and re-expose its contents.
fn cmd_collect(args: &CollectArgs, env: &RunnerEnv) -> Result<()> {
    let _phase = obs::PhaseSpan::enter("collect");
    let sink = env.sink();

    if !args.bundle_dir.join(BUNDLE_DIR).is_dir() {
        if args.fail_on_missing {
            anyhow::bail!("Bundle not found under {:?}", args.bundle_dir);
        }
        sink.write_output("found", "false")?;
        println!(
            "No bundle found under {:?} (fail-on-missing disabled)",
            args.bundle_dir
        );
        return Ok(());
    }

    let bundle = read_bundle(&args.bundle_dir)?;
    obs::emit_bundle_loaded(
        &bundle.meta.repository,
        &bundle.meta.workflow_run_id,
        &bundle.meta.event_name,
    );

    let expectations = Expectations {
        repository: resolve_required(
            "repository",
            &[
                ("--repository", args.repository.clone()),
                ("GITHUB_REPOSITORY", env.repository.clone()),
            ],
        )?,
        run_id: args.run_id.clone(),
        run_attempt: args.run_attempt.clone(),
        source_workflow: args.source_workflow.clone(),
        expected_head_sha: args.expected_head_sha.clone(),
        expected_pr_number: args.expected_pr_number.clone(),
        require_events: split_list(&args.require_events),
    };

    if let Err(err) = validate_expectations(&bundle.meta, &expectations) {
        obs::emit_expectation_failed(&err);
        return Err(err.into());
    }
    obs::emit_expectations_ok(&bundle.meta.repository, &bundle.meta.workflow_run_id);

    emit_outputs(&sink, &bundle.outputs, args.export_env)?;

    let mappings = parse_extract_mappings(&args.extract)?;
    let extracted = apply_extract_mappings(&mappings, &bundle.outputs, &bundle.meta);
    for (name, value) in &extracted {
        sink.write_output(name, value)?;
        if args.export_env {
            sink.export_env(name, value)?;
        }
    }
    sink.write_output("found", "true")?;
    obs::emit_outputs_emitted(bundle.outputs.len(), extracted.len());

    if let Some(dest) = &args.restore_files_to {
        let restored = restore_files(&bundle.files_dir, dest)?;
        obs::emit_files_restored(dest, restored);
        if restored {
            println!("Restored bundle files to {:?}", dest);
        }
    }

    if args.cleanup {
        fs::remove_dir_all(args.bundle_dir.join(BUNDLE_DIR))
            .with_context(|| format!("Failed to clean up bundle dir: {:?}", args.bundle_dir))?;
    }

    println!(
        "Collected bundle from run {} ({} outputs, {} extracted)",
        bundle.meta.workflow_run_id,
        bundle.outputs.len(),
        extracted.len()
    );

    Ok(())
}

/// Re-publish bundle outputs through the sink, in insertion order.
fn emit_outputs(sink: &OutputSink, outputs: &OutputsMap, export_env: bool) -> Result<()> {
    for (key, value) in outputs {
        let rendered = scalar_to_string(value);
        sink.write_output(key, &rendered)?;
        if export_env {
            sink.export_env(key, &rendered)?;
        }
    }
    Ok(())
}
