//! `bankqa`: build an index over the bank's documents, ask questions against
//! it, and evaluate answer quality.

mod corpus;
mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bankqa_eval::{Evaluator, banking_cases, load_cases};
use bankqa_rag::{
    AnswerPipeline, Chunk, Chunker, Document, EmbeddingIndex, EmbeddingProvider,
    ExtractiveGenerator, HashingEmbeddingProvider, RagConfig, RecursiveChunker, RetrievalMode,
    Retriever, TextGenerator, corpus_version,
};
#[cfg(feature = "openai")]
use bankqa_rag::openai::{OpenAIChatGenerator, OpenAIEmbeddingProvider};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::corpus::load_corpus;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "bankqa")]
#[command(about = "Answer questions about the bank's service agreements", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON settings file with optional `rag` and `eval` sections
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk and embed the corpus, then save the index snapshot
    Index {
        #[command(flatten)]
        source: SourceArgs,

        /// Where to write the index snapshot
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Answer a single question
    Ask {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        /// Text generator
        #[arg(long, value_enum, default_value_t = GeneratorKind::Extractive)]
        generator: GeneratorKind,

        /// Print the full answer record as JSON
        #[arg(long)]
        json: bool,

        question: String,
    },

    /// Score the pipeline against reference answers
    Evaluate {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        #[arg(long, value_enum, default_value_t = GeneratorKind::Extractive)]
        generator: GeneratorKind,

        /// JSON array of evaluation cases (defaults to the built-in banking cases)
        #[arg(long)]
        cases: Option<PathBuf>,

        /// Where to write the JSON report
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Corpus files or directories (.txt, .md and .pdf)
    #[arg(long, required = true, num_args = 1..)]
    corpus: Vec<PathBuf>,

    /// Index snapshot to reuse; rebuilt in memory when absent or stale
    #[arg(short, long)]
    index: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = EncoderKind::Hashing)]
    encoder: EncoderKind,
}

#[derive(Args)]
struct RetrievalArgs {
    /// Retrieval mode: vector or hybrid
    #[arg(long)]
    mode: Option<RetrievalMode>,

    #[arg(long)]
    top_k: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EncoderKind {
    Hashing,
    Openai,
}

#[derive(Clone, Copy, ValueEnum)]
enum GeneratorKind {
    Extractive,
    Openai,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Index { source, out } => {
            settings.rag.validate()?;
            let encoder = encoder(source.encoder)?;
            let documents = load_corpus(&source.corpus)?;
            let index = build_index(&documents, &settings.rag, encoder.as_ref()).await?;
            index.save(&out, &corpus_version(&documents))?;
            println!(
                "Indexed {} chunks from {} documents into {}",
                index.len(),
                documents.len(),
                out.display()
            );
        }
        Commands::Ask { source, retrieval, generator, json, question } => {
            retrieval.apply(&mut settings.rag);
            let pipeline = pipeline(&source, &settings.rag, generator).await?;
            let record = pipeline.answer(&question).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", record.generated_answer);
                if !record.citations.is_empty() {
                    println!();
                    println!("Sources: {}", record.citations.join(", "));
                }
            }
        }
        Commands::Evaluate { source, retrieval, generator, cases, out } => {
            retrieval.apply(&mut settings.rag);
            let evaluator = Evaluator::new(settings.eval.clone())?;
            let cases = match cases {
                Some(path) => load_cases(&path)
                    .with_context(|| format!("failed to load cases from {}", path.display()))?,
                None => banking_cases(),
            };
            let pipeline = pipeline(&source, &settings.rag, generator).await?;
            let report = evaluator.evaluate(&cases, &pipeline).await;
            println!("{report}");
            if let Some(out) = out {
                report.save(&out)?;
                info!(path = %out.display(), "report written");
            }
        }
    }

    Ok(())
}

impl RetrievalArgs {
    fn apply(&self, config: &mut RagConfig) {
        if let Some(mode) = self.mode {
            config.retrieval_mode = mode;
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn encoder(kind: EncoderKind) -> Result<Arc<dyn EmbeddingProvider>> {
    match kind {
        EncoderKind::Hashing => Ok(Arc::new(HashingEmbeddingProvider::default())),
        #[cfg(feature = "openai")]
        EncoderKind::Openai => Ok(Arc::new(OpenAIEmbeddingProvider::from_env()?)),
        #[cfg(not(feature = "openai"))]
        EncoderKind::Openai => bail!("the openai encoder requires the `openai` feature"),
    }
}

fn generator(kind: GeneratorKind) -> Result<Arc<dyn TextGenerator>> {
    match kind {
        GeneratorKind::Extractive => Ok(Arc::new(ExtractiveGenerator::default())),
        #[cfg(feature = "openai")]
        GeneratorKind::Openai => Ok(Arc::new(OpenAIChatGenerator::from_env()?)),
        #[cfg(not(feature = "openai"))]
        GeneratorKind::Openai => bail!("the openai generator requires the `openai` feature"),
    }
}

async fn build_index(
    documents: &[Document],
    config: &RagConfig,
    encoder: &dyn EmbeddingProvider,
) -> Result<EmbeddingIndex> {
    let chunker = RecursiveChunker::from_config(config)?;
    let chunks: Vec<Chunk> = documents.iter().flat_map(|d| chunker.chunk(d)).collect();
    if chunks.is_empty() {
        bail!("the corpus produced no chunks");
    }
    Ok(EmbeddingIndex::build(chunks, encoder).await?)
}

/// Load the snapshot at `path` when it matches the corpus and encoder,
/// otherwise rebuild the index from `documents`.
async fn load_or_build_index(
    path: Option<&Path>,
    documents: &[Document],
    config: &RagConfig,
    encoder: &dyn EmbeddingProvider,
) -> Result<EmbeddingIndex> {
    if let Some(path) = path.filter(|p| p.exists()) {
        match EmbeddingIndex::load(path, &encoder.info(), &corpus_version(documents)) {
            Ok(index) => return Ok(index),
            Err(e) => warn!(path = %path.display(), error = %e, "ignoring stale index snapshot"),
        }
    }
    build_index(documents, config, encoder).await
}

async fn pipeline(
    source: &SourceArgs,
    config: &RagConfig,
    generator_kind: GeneratorKind,
) -> Result<AnswerPipeline> {
    config.validate()?;
    let encoder = encoder(source.encoder)?;
    let generator = generator(generator_kind)?;
    let documents = load_corpus(&source.corpus)?;
    let index =
        load_or_build_index(source.index.as_deref(), &documents, config, encoder.as_ref()).await?;
    let retriever = Retriever::new(Arc::new(index), encoder, config)?;

    Ok(AnswerPipeline::builder()
        .config(config.clone())
        .retriever(Arc::new(retriever))
        .generator(generator)
        .build()?)
}
