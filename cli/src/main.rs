use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use search_core::corpus::{index_documents, load_documents};
use search_core::tokenizer::split_into_words;
use search_core::{
    log_duration, paginate, remove_duplicates, DocId, DocumentStatus, ExecutionPolicy,
    SearchConfig, SearchServer,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search-cli")]
#[command(about = "Query an in-memory TF-IDF index built from JSON/JSONL documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Input path (file or directory)
    #[arg(long)]
    corpus: String,
    /// Space separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// Maximum number of ranked documents per query
    #[arg(long, default_value_t = search_core::config::MAX_RESULT_DOCUMENT_COUNT)]
    max_results: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank documents for a query
    Search {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long)]
        query: String,
        /// Only documents with this status are returned
        #[arg(long, default_value = "actual")]
        status: DocumentStatus,
        /// Remove duplicate documents before searching
        #[arg(long, default_value_t = false)]
        dedup: bool,
        #[arg(long, default_value_t = false)]
        parallel: bool,
        #[arg(long, default_value_t = 2)]
        page_size: usize,
    },
    /// Show which query words a document contains
    Match {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long)]
        query: String,
        #[arg(long)]
        id: DocId,
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Remove documents whose word set repeats a lower id and print their ids
    Dedup {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { corpus, query, status, dedup, parallel, page_size } => {
            let mut server = build_server(&corpus)?;
            if dedup {
                remove_duplicates(&mut server);
            }
            search(&server, &query, status, policy(parallel), page_size)
        }
        Commands::Match { corpus, query, id, parallel } => {
            let server = build_server(&corpus)?;
            let (words, status) = server
                .match_document_with(policy(parallel), &query, id)
                .with_context(|| format!("cannot match document {id}"))?;
            println!("{} words for document {id} ({status:?}): {}", words.len(), words.join(" "));
            Ok(())
        }
        Commands::Dedup { corpus } => {
            let mut server = build_server(&corpus)?;
            for id in remove_duplicates(&mut server) {
                println!("Found duplicate document id {id}");
            }
            println!("{} documents left", server.document_count());
            Ok(())
        }
    }
}

fn policy(parallel: bool) -> ExecutionPolicy {
    if parallel { ExecutionPolicy::Parallel } else { ExecutionPolicy::Sequential }
}

fn build_server(args: &CorpusArgs) -> Result<SearchServer> {
    log_duration!("build index");
    let config = SearchConfig::default().with_max_results(args.max_results);
    let mut server = SearchServer::with_config(split_into_words(&args.stop_words), config)
        .context("invalid stop words")?;
    let docs = load_documents(&args.corpus)?;
    index_documents(&mut server, &docs)?;
    tracing::info!(documents = server.document_count(), corpus = %args.corpus, "index ready");
    Ok(server)
}

fn search(
    server: &SearchServer,
    query: &str,
    status: DocumentStatus,
    policy: ExecutionPolicy,
    page_size: usize,
) -> Result<()> {
    log_duration!(format!("search {query:?}"));
    let docs = server
        .find_top_documents_by_status_with(policy, query, status)
        .with_context(|| format!("invalid query {query:?}"))?;
    if docs.is_empty() {
        println!("no documents found");
        return Ok(());
    }
    for (n, page) in paginate(&docs, page_size).into_iter().enumerate() {
        println!("Page {}: {page}", n + 1);
    }
    Ok(())
}
