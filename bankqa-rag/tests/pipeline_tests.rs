//! End-to-end tests: chunk → index → retrieve → answer.

use std::sync::Arc;

use async_trait::async_trait;
use bankqa_rag::{
    AnswerPipeline, Chunker, Document, EmbeddingIndex, EmbeddingProvider, ExtractiveGenerator,
    HashingEmbeddingProvider, Prompt, RagConfig, RagError, RecursiveChunker, RetrievalMode,
    Retriever, TextGenerator, reconstruct,
};

const ZELLE_DOC: &str = "Zelle transfers are limited to $2,500 per day. \
                         Wire transfers require two-factor authentication.";

struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &Prompt) -> bankqa_rag::Result<String> {
        Err(RagError::Embedding { provider: "upstream".into(), message: "503".into() })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

async fn zelle_retriever(config: &RagConfig) -> Arc<Retriever> {
    let document = Document::new("agreement", ZELLE_DOC, "agreement.txt");
    let chunks = RecursiveChunker::new(50, 10).unwrap().chunk(&document);
    let encoder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbeddingProvider::default());
    let index = EmbeddingIndex::build(chunks, encoder.as_ref()).await.unwrap();
    Arc::new(Retriever::new(Arc::new(index), encoder, config).unwrap())
}

#[tokio::test]
async fn zelle_chunk_ranks_above_wire_chunk() {
    let config = RagConfig::default();
    let retriever = zelle_retriever(&config).await;

    let entries = retriever.index().entries();
    let chunks: Vec<_> = entries.iter().map(|e| e.chunk.clone()).collect();
    assert_eq!(reconstruct(&chunks), ZELLE_DOC);

    let results =
        retriever.retrieve("What is the Zelle limit?", 3, RetrievalMode::Vector).await.unwrap();
    assert!(results[0].chunk.text.contains("Zelle"));
    let wire_rank = results.iter().position(|r| r.chunk.text.contains("Wire")).unwrap();
    assert!(wire_rank > 0);
    assert!(results[0].score > results[wire_rank].score);
}

#[tokio::test]
async fn hybrid_retrieval_is_deterministic() {
    let config = RagConfig::builder().retrieval_mode(RetrievalMode::Hybrid).build().unwrap();
    let retriever = zelle_retriever(&config).await;
    let first = retriever.retrieve("wire authentication", 2, RetrievalMode::Hybrid).await.unwrap();
    let second = retriever.retrieve("wire authentication", 2, RetrievalMode::Hybrid).await.unwrap();
    assert_eq!(first, second);
    assert!(first[0].chunk.text.contains("authentication"));
}

#[tokio::test]
async fn answer_cites_context_chunks() {
    let config = RagConfig::default();
    let pipeline = AnswerPipeline::builder()
        .config(config.clone())
        .retriever(zelle_retriever(&config).await)
        .generator(Arc::new(ExtractiveGenerator::default()))
        .build()
        .unwrap();

    let record = pipeline.answer("What is the Zelle limit?").await.unwrap();
    assert_eq!(record.question, "What is the Zelle limit?");
    assert!(record.generated_answer.contains("$2,500"));
    assert_eq!(record.citations.len(), record.retrieved_chunks.len());
    assert_eq!(record.citations[0], record.retrieved_chunks[0].chunk.id);
}

#[tokio::test]
async fn generator_failure_surfaces_as_generation_unavailable() {
    let config = RagConfig::default();
    let pipeline = AnswerPipeline::builder()
        .config(config.clone())
        .retriever(zelle_retriever(&config).await)
        .generator(Arc::new(FailingGenerator))
        .build()
        .unwrap();

    let err = pipeline.answer("What is the Zelle limit?").await.unwrap_err();
    match err {
        RagError::GenerationUnavailable { generator, message } => {
            assert_eq!(generator, "failing");
            assert!(message.contains("503"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn pipeline_rejects_config_that_scores_differently_from_retriever() {
    let retriever_config = RagConfig::builder().similarity_threshold(0.4).build().unwrap();
    let pipeline_config = RagConfig::builder().hybrid_weights(0.5, 0.5).build().unwrap();

    let err = AnswerPipeline::builder()
        .config(pipeline_config)
        .retriever(zelle_retriever(&retriever_config).await)
        .generator(Arc::new(ExtractiveGenerator::default()))
        .build()
        .err()
        .unwrap();

    assert!(matches!(err, RagError::Config(_)));
    assert!(err.to_string().contains("differs from the retriever's"));
}

#[tokio::test]
async fn pipeline_without_config_takes_retriever_scoring() {
    let retriever_config = RagConfig::builder().similarity_threshold(0.4).build().unwrap();

    let pipeline = AnswerPipeline::builder()
        .retriever(zelle_retriever(&retriever_config).await)
        .generator(Arc::new(ExtractiveGenerator::default()))
        .build()
        .unwrap();

    assert_eq!(pipeline.config().similarity_threshold, Some(0.4));
    assert_eq!(pipeline.config().vector_weight, retriever_config.vector_weight);
    assert_eq!(pipeline.config().top_k, RagConfig::default().top_k);
}
