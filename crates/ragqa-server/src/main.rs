//! ragqa: document question answering server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use ragqa_chat::{Generator, LLMConfig, LlmGenerator};
use ragqa_core::RagConfig;
use ragqa_ingest::FileExtractor;
use ragqa_resolve::build_context;
use ragqa_server::{build_router, indexing, AppState};

fn resolve_data_dir() -> PathBuf {
    std::env::var("RAGQA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn build_state(data_dir: &Path) -> anyhow::Result<AppState> {
    let config = RagConfig::from_env(data_dir)?;
    let embedder = ragqa_infer::create_embedder(&config.data_paths.models);

    let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
    let generator = LlmGenerator::from_config(&llm_config)
        .map(|g| Arc::new(g) as Arc<dyn Generator>);
    if generator.is_none() {
        info!("No LLM provider configured; /query will return 503");
    }

    Ok(AppState::new(
        config,
        embedder,
        Arc::new(FileExtractor),
        generator,
    )?)
}

fn print_usage() {
    println!("ragqa: question answering over uploaded documents");
    println!();
    println!("Usage: ragqa [command]");
    println!();
    println!("Commands:");
    println!("  (none)                   Start the server");
    println!("  ingest <file>            Ingest a .pdf or .txt file");
    println!("  query <question>         Retrieve fragments and answer a question");
    println!("  help                     Show this help message");
    println!();
    println!("Environment: RAGQA_DATA_DIR, PORT, RAGQA_CHUNK_SIZE, RAGQA_CHUNK_OVERLAP,");
    println!("             RAGQA_TOP_K, RAGQA_MODEL_DIR, RUST_LOG");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "ingest" => {
                if args.len() < 3 {
                    eprintln!("Usage: ragqa ingest <file>");
                    std::process::exit(1);
                }
                let state = build_state(&resolve_data_dir())?;
                let report = state.ingester.ingest(Path::new(&args[2]))?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            "query" => {
                if args.len() < 3 {
                    eprintln!("Usage: ragqa query <question>");
                    std::process::exit(1);
                }
                let question = args[2..].join(" ");
                let state = build_state(&resolve_data_dir())?;
                let fragments = state.retriever.retrieve(&question, state.config.top_k)?;
                for (rank, f) in fragments.iter().enumerate() {
                    println!("[{}] {} (distance {:.4})", rank + 1, f.source, f.distance);
                    println!("{}", f.text);
                    println!();
                }
                if let Some(generator) = &state.generator {
                    let answer = generator
                        .generate(&question, &build_context(&fragments))
                        .await?;
                    println!("Answer: {}", answer);
                }
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_usage();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'ragqa help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let state = Arc::new(build_state(&data_dir)?);
    let port = state.config.port;

    indexing::start_indexing_worker(state.clone());

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ragqa server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
