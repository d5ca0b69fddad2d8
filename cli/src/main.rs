//! meetscribe CLI
//!
//! Registers meeting artifacts, generates proposals, tickets and summaries
//! from them, and inspects job state.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use meetscribe::db::context_repo::{self, ContextType};
use meetscribe::db::meeting_repo::{self, NewMeeting};
use meetscribe::pipeline::JobProgressEvent;
use meetscribe::{
    artifact, load_config, Config, Database, JobKind, JobOrchestrator, JobProgressBroadcaster,
    JobResult, Language, MeetscribeError, OrchestratorError, ProcessError, ProcessingRequest,
};

#[derive(Parser)]
#[command(
    name = "meetscribe",
    version,
    about = "Turn meeting recordings and documents into proposals, tickets and summaries"
)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, env = "MEETSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage meetings
    #[command(subcommand)]
    Meeting(MeetingCommands),

    /// Generate a document for a meeting
    Process {
        meeting_id: i64,

        /// proposal, jira_ticket or executive_summary
        #[arg(short, long)]
        kind: JobKind,

        /// Output language (es or en)
        #[arg(short, long, default_value = "es")]
        language: Language,

        /// Stored business context to include
        #[arg(long)]
        context: Option<i64>,

        /// Run inline instead of as a background job
        #[arg(long)]
        sync: bool,
    },

    /// Translate the stored result of a job
    Translate {
        meeting_id: i64,

        #[arg(short, long)]
        kind: JobKind,

        /// Target language (es or en)
        #[arg(long)]
        to: Language,
    },

    /// Show a meeting and its jobs
    Status { meeting_id: i64 },

    /// Manage business contexts
    #[command(subcommand)]
    Context(ContextCommands),
}

#[derive(Subcommand)]
enum MeetingCommands {
    /// Register a meeting, optionally with an artifact file
    Create {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Recording, transcript or document for the meeting
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List meetings, newest first
    List {
        #[arg(short, long)]
        limit: Option<u64>,
    },

    /// Delete a meeting and its jobs
    Delete { meeting_id: i64 },
}

#[derive(Subcommand)]
enum ContextCommands {
    /// Store a business context from a file
    Add {
        name: String,

        /// File holding the context text
        file: PathBuf,

        /// template or knowledge_base
        #[arg(short = 't', long = "type", default_value = "knowledge_base")]
        context_type: ContextType,
    },

    /// List stored contexts
    List {
        #[arg(short = 't', long = "type")]
        context_type: Option<ContextType>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, MeetscribeError> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    meetscribe::init_logging(&config.logging)?;

    let db = Database::open(Path::new(&config.database_path))?;
    let json = cli.json;

    match cli.command {
        Commands::Meeting(cmd) => meeting_command(&db, cmd, json),
        Commands::Context(cmd) => context_command(&db, cmd, json),
        Commands::Status { meeting_id } => {
            let orchestrator = JobOrchestrator::from_config(&config, db)?;
            let snapshot = orchestrator.status(meeting_id)?;
            if json {
                print_json(&snapshot);
            } else {
                let m = &snapshot.meeting;
                println!("#{} {} [{}]", m.id, m.title, m.status);
                for job in &snapshot.jobs {
                    println!("  {:<18} {:<10} {}", job.kind, job.status, job.updated_at);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Translate {
            meeting_id,
            kind,
            to,
        } => {
            let orchestrator = JobOrchestrator::from_config(&config, db)?;
            let translated = orchestrator.translate_job(meeting_id, kind, to).await?;
            if json {
                print_json(&serde_json::json!({
                    "meetingId": meeting_id,
                    "kind": kind,
                    "language": to,
                    "result": translated,
                }));
            } else {
                println!("{}", translated);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Process {
            meeting_id,
            kind,
            language,
            context,
            sync,
        } => {
            let mut request = ProcessingRequest::new(meeting_id, kind, language);
            if let Some(id) = context {
                request = request.with_business_context(id);
            }
            process(&config, db, request, sync, json).await
        }
    }
}

fn meeting_command(
    db: &Database,
    cmd: MeetingCommands,
    json: bool,
) -> Result<ExitCode, MeetscribeError> {
    match cmd {
        MeetingCommands::Create {
            title,
            description,
            file,
        } => {
            let mut meeting = NewMeeting {
                title,
                description,
                ..Default::default()
            };
            if let Some(path) = file {
                let path = std::fs::canonicalize(&path).map_err(|e| {
                    ProcessError::ReadArtifact {
                        path: path.clone(),
                        source: e,
                    }
                })?;
                let metadata =
                    std::fs::metadata(&path).map_err(|e| ProcessError::ReadArtifact {
                        path: path.clone(),
                        source: e,
                    })?;
                meeting.filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                meeting.media_type = Some(artifact::guess_media_type(&path));
                meeting.byte_size = Some(metadata.len());
                meeting.artifact_path = Some(path.to_string_lossy().into_owned());
            }

            let row = meeting_repo::insert(db, &meeting)?;
            if json {
                print_json(&row);
            } else {
                println!("Created meeting #{} '{}'", row.id, row.title);
            }
        }
        MeetingCommands::List { limit } => {
            let rows = meeting_repo::list(db, limit)?;
            if json {
                print_json(&rows);
            } else if rows.is_empty() {
                println!("No meetings.");
            } else {
                for m in rows {
                    println!(
                        "#{:<5} {:<11} {:<24} {}",
                        m.id,
                        m.status,
                        m.filename.as_deref().unwrap_or("-"),
                        m.title
                    );
                }
            }
        }
        MeetingCommands::Delete { meeting_id } => {
            if !meeting_repo::delete(db, meeting_id)? {
                return Err(OrchestratorError::MeetingNotFound(meeting_id).into());
            }
            println!("Deleted meeting #{}", meeting_id);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn context_command(
    db: &Database,
    cmd: ContextCommands,
    json: bool,
) -> Result<ExitCode, MeetscribeError> {
    match cmd {
        ContextCommands::Add {
            name,
            file,
            context_type,
        } => {
            let content =
                std::fs::read_to_string(&file).map_err(|e| ProcessError::ReadArtifact {
                    path: file.clone(),
                    source: e,
                })?;
            if content.trim().is_empty() {
                return Err(OrchestratorError::InvalidRequest(format!(
                    "context file {} is empty",
                    file.display()
                ))
                .into());
            }
            let row = context_repo::insert(db, &name, &content, context_type)?;
            if json {
                print_json(&row);
            } else {
                println!("Stored {} context #{} '{}'", row.context_type, row.id, row.name);
            }
        }
        ContextCommands::List { context_type } => {
            let rows = context_repo::list(db, context_type)?;
            if json {
                print_json(&rows);
            } else {
                for c in rows {
                    println!("#{:<5} {:<15} {}", c.id, c.context_type, c.name);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn process(
    config: &Config,
    db: Database,
    request: ProcessingRequest,
    sync: bool,
    json: bool,
) -> Result<ExitCode, MeetscribeError> {
    let broadcaster = JobProgressBroadcaster::default();
    let orchestrator = JobOrchestrator::from_config(config, db)?.with_progress(broadcaster.clone());

    let result = if sync {
        orchestrator.run_sync(request).await?
    } else {
        let mut events = broadcaster.subscribe();
        let mut handle = orchestrator.request_processing(request)?;
        loop {
            tokio::select! {
                joined = &mut handle => {
                    break joined.map_err(|e| OrchestratorError::TaskFailed(e.to_string()))?;
                }
                event = events.recv() => match event {
                    Ok(event) if !json => print_progress(&event),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Progress output skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => {}
                },
            }
        }
    };

    print_result(&result, json);
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_progress(event: &JobProgressEvent) {
    eprintln!("[{}] {}", event.phase, event.message);
}

fn print_result(result: &JobResult, json: bool) {
    if json {
        print_json(result);
        return;
    }
    if result.is_success() {
        println!("{}", result.result);
    } else {
        eprintln!("Job {} failed: {}", result.job_id, result.result);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("error: failed to serialize output: {}", e),
    }
}
