use clap::{Parser, Subcommand};
use deep_research::{
    agents::{combine_query, ReportMode, ResearchPipeline, DEFAULT_FEEDBACK_QUESTIONS},
    config::Config,
    models::{AppState, JobRegistry},
    research::{ProgressCallback, ResearchProgress},
    routes::create_router,
    utils::init_tracing,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};

const JOB_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Recursive deep research powered by web search and LLMs
#[derive(Parser, Debug)]
#[command(name = "deep-research")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Research a query from the terminal and write the result to a file
    Run {
        /// What to research
        query: String,

        /// Sub-queries per level (default: RESEARCH_BREADTH)
        #[arg(short, long)]
        breadth: Option<usize>,

        /// Recursion depth (default: RESEARCH_DEPTH)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Output kind: report or answer
        #[arg(short, long, default_value = "report")]
        mode: ReportMode,

        /// Output file (default: report.md or answer.md)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Skip the clarifying questions
        #[arg(long)]
        no_clarify: bool,
    },

    /// Serve the HTTP API
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    let pipeline = Arc::new(ResearchPipeline::from_config(&config)?);

    match cli.command {
        Command::Run {
            query,
            breadth,
            depth,
            mode,
            output,
            no_clarify,
        } => {
            let breadth = breadth.unwrap_or(config.research.default_breadth);
            let depth = depth.unwrap_or(config.research.default_depth);
            let output = output.unwrap_or_else(|| match mode {
                ReportMode::Report => PathBuf::from("report.md"),
                ReportMode::Answer => PathBuf::from("answer.md"),
            });
            run(&pipeline, query, breadth, depth, mode, output, no_clarify).await
        }
        Command::Serve => serve(config, pipeline).await,
    }
}

async fn run(
    pipeline: &ResearchPipeline,
    query: String,
    breadth: usize,
    depth: usize,
    mode: ReportMode,
    output: PathBuf,
    no_clarify: bool,
) -> anyhow::Result<()> {
    let prompt = if no_clarify || mode == ReportMode::Answer {
        query
    } else {
        clarify(pipeline, &query).await?
    };

    let on_progress: ProgressCallback = Arc::new(|progress: &ResearchProgress| {
        info!(
            depth = progress.current_depth,
            breadth = progress.current_breadth,
            completed = progress.completed_queries,
            total = progress.total_queries,
            query = progress.current_query.as_deref().unwrap_or(""),
            "Research progress"
        );
    });

    let result = pipeline
        .researcher
        .deep_research(&prompt, breadth, depth, Some(on_progress))
        .await;
    info!(
        learnings = result.learnings.len(),
        urls = result.visited_urls.len(),
        "Research complete"
    );

    let text = pipeline
        .reports
        .write(mode, &prompt, &result.learnings, &result.visited_urls)
        .await?;
    tokio::fs::write(&output, &text).await?;
    info!("Wrote {}", output.display());

    Ok(())
}

/// Ask the clarifying questions on stdin and fold the answers into the prompt
async fn clarify(pipeline: &ResearchPipeline, query: &str) -> anyhow::Result<String> {
    let questions = match pipeline
        .feedback
        .generate_feedback(query, DEFAULT_FEEDBACK_QUESTIONS)
        .await
    {
        Ok(questions) => questions,
        Err(e) => {
            warn!(error = %e, "Skipping clarifying questions");
            return Ok(query.to_string());
        }
    };

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut answers = Vec::with_capacity(questions.len());
    for question in &questions {
        stdout.write_all(format!("\n{}\nYour answer: ", question).as_bytes()).await?;
        stdout.flush().await?;
        answers.push(lines.next_line().await?.unwrap_or_default());
    }

    Ok(combine_query(query, &questions, &answers))
}

async fn serve(config: Config, pipeline: Arc<ResearchPipeline>) -> anyhow::Result<()> {
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);

    let jobs = JobRegistry::with_retention(config.server.job_retention());
    let sweeper = jobs.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(JOB_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.evict_expired();
        }
    });

    let state = AppState {
        config,
        pipeline,
        jobs,
    };
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
