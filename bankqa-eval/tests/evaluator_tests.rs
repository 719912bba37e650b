//! Evaluator runs over a real pipeline with scripted generators.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bankqa_eval::{EvalConfig, EvaluationCase, Evaluator, PassGate, f1_score};
use bankqa_rag::{
    AnswerPipeline, Chunker, Document, EmbeddingIndex, EmbeddingProvider,
    HashingEmbeddingProvider, Prompt, RagConfig, RagError, RecursiveChunker, Retriever,
    TextGenerator,
};

const ZELLE_DOC: &str = "Zelle transfers are limited to $2,500 per day. \
                         Wire transfers require two-factor authentication.";

/// Answers known questions after an optional delay; anything else fails.
struct ScriptedGenerator {
    answers: HashMap<String, (String, Duration)>,
}

impl ScriptedGenerator {
    fn new(script: &[(&str, &str, u64)]) -> Self {
        let answers = script
            .iter()
            .map(|(q, a, delay)| (q.to_string(), (a.to_string(), Duration::from_millis(*delay))))
            .collect();
        Self { answers }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt) -> bankqa_rag::Result<String> {
        let question = prompt.user.rsplit("Question: ").next().unwrap_or_default();
        match self.answers.get(question) {
            Some((answer, delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(answer.clone())
            }
            None => Err(RagError::GenerationUnavailable {
                generator: "scripted".into(),
                message: "upstream returned 503".into(),
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

async fn pipeline(generator: ScriptedGenerator) -> AnswerPipeline {
    let document = Document::new("agreement", ZELLE_DOC, "agreement.txt");
    let chunks = RecursiveChunker::new(50, 10).unwrap().chunk(&document);
    let encoder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbeddingProvider::default());
    let index = EmbeddingIndex::build(chunks, encoder.as_ref()).await.unwrap();
    let config = RagConfig::default();
    let retriever = Retriever::new(Arc::new(index), encoder, &config).unwrap();
    AnswerPipeline::builder()
        .config(config)
        .retriever(Arc::new(retriever))
        .generator(Arc::new(generator))
        .build()
        .unwrap()
}

fn zelle_case() -> EvaluationCase {
    EvaluationCase::new("What is the daily Zelle limit?", "$2,500 per day", ["2,500", "Zelle"])
        .with_category("transfer_limits")
}

#[tokio::test]
async fn zelle_answer_passes_on_f1() {
    let pipeline = pipeline(ScriptedGenerator::new(&[(
        "What is the daily Zelle limit?",
        "$2,500 per day for Zelle transfers",
        0,
    )]))
    .await;
    let evaluator = Evaluator::new(EvalConfig::default()).unwrap();

    let report = evaluator.evaluate(&[zelle_case()], &pipeline).await;

    assert_eq!(report.total_cases, 1);
    assert_eq!(report.passed_cases, 1);
    assert_eq!(report.failed_cases, 0);
    let case = &report.cases[0];
    assert!(case.score.f1 > 0.5);
    assert_eq!(case.score.keyword_accuracy, 1.0);
    assert!(case.score.similarity > 0.0);
    assert_eq!(case.score.answer_words, 6);
    assert_eq!(case.score.reference_words, 3);
    assert_eq!(case.score.length_ratio, 2.0);
    assert!(case.retrieval.max_similarity > 0.0);
    assert!(!case.citations.is_empty());
    assert_eq!(report.categories["transfer_limits"].passed_cases, 1);
}

#[tokio::test]
async fn failed_generation_is_isolated_to_its_case() {
    let pipeline = pipeline(ScriptedGenerator::new(&[
        ("What is the daily Zelle limit?", "$2,500 per day for Zelle transfers", 0),
        ("What do wires require?", "Wires require two-factor authentication.", 0),
    ]))
    .await;
    let cases = vec![
        zelle_case(),
        EvaluationCase::new("Who approves overdrafts?", "The branch manager.", ["manager"]),
        EvaluationCase::new(
            "What do wires require?",
            "Two-factor authentication is required for wires.",
            ["two-factor"],
        ),
    ];
    let evaluator = Evaluator::new(EvalConfig::default()).unwrap();

    let report = evaluator.evaluate(&cases, &pipeline).await;

    assert_eq!(report.total_cases, 3);
    assert_eq!(report.failed_cases, 1);
    let failed = &report.cases[1];
    assert!(failed.error.as_deref().unwrap().contains("503"));
    assert!(failed.answer.is_none());
    assert_eq!(failed.score.f1, 0.0);
    assert_eq!(failed.score.similarity, 0.0);
    assert_eq!(failed.score.keyword_accuracy, 0.0);
    assert!(!failed.score.passed);

    let expected_f1 = (f1_score("$2,500 per day for Zelle transfers", "$2,500 per day")
        + f1_score(
            "Wires require two-factor authentication.",
            "Two-factor authentication is required for wires.",
        ))
        / 3.0;
    assert!((report.mean_f1 - expected_f1).abs() < 1e-12);
}

#[tokio::test(start_paused = true)]
async fn slow_case_times_out_without_blocking_the_batch() {
    let pipeline = pipeline(ScriptedGenerator::new(&[
        ("What is the daily Zelle limit?", "$2,500 per day for Zelle transfers", 0),
        ("What do wires require?", "two-factor authentication", 60_000),
    ]))
    .await;
    let cases = vec![
        zelle_case(),
        EvaluationCase::new("What do wires require?", "two-factor authentication", ["wire"]),
    ];
    let config = EvalConfig::builder().case_timeout(Duration::from_millis(100)).build().unwrap();

    let report = Evaluator::new(config).unwrap().evaluate(&cases, &pipeline).await;

    assert_eq!(report.failed_cases, 1);
    assert!(report.cases[0].error.is_none());
    assert!(report.cases[1].error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn report_keeps_input_order_when_cases_finish_out_of_order() {
    let script: Vec<(String, String, u64)> = (0..6)
        .map(|i| (format!("question {i}"), format!("answer {i}"), 600 - i * 100))
        .collect();
    let borrowed: Vec<(&str, &str, u64)> =
        script.iter().map(|(q, a, d)| (q.as_str(), a.as_str(), *d)).collect();
    let pipeline = pipeline(ScriptedGenerator::new(&borrowed)).await;
    let cases: Vec<EvaluationCase> = (0..6)
        .map(|i| EvaluationCase::new(format!("question {i}"), format!("answer {i}"), ["answer"]))
        .collect();
    let config = EvalConfig::builder().concurrency(6).build().unwrap();

    let report = Evaluator::new(config).unwrap().evaluate(&cases, &pipeline).await;

    let questions: Vec<&str> = report.cases.iter().map(|c| c.question.as_str()).collect();
    let expected: Vec<String> = (0..6).map(|i| format!("question {i}")).collect();
    assert_eq!(questions, expected);
    assert!(report.cases.iter().enumerate().all(|(i, c)| c.index == i));
    assert_eq!(report.passed_cases, 6);
}

#[tokio::test]
async fn all_metrics_gate_can_fail_a_high_f1_case() {
    let pipeline = pipeline(ScriptedGenerator::new(&[(
        "What is the daily Zelle limit?",
        "$2,500 per day",
        0,
    )]))
    .await;
    let case = EvaluationCase::new(
        "What is the daily Zelle limit?",
        "$2,500 per day",
        ["zelle", "weekly", "monthly"],
    );
    let config = EvalConfig::builder().pass_gate(PassGate::AllMetrics).build().unwrap();

    let report = Evaluator::new(config).unwrap().evaluate(&[case], &pipeline).await;

    assert_eq!(report.cases[0].score.f1, 1.0);
    assert_eq!(report.cases[0].score.keyword_accuracy, 0.0);
    assert_eq!(report.passed_cases, 0);
}

#[tokio::test]
async fn empty_batch_yields_empty_report() {
    let pipeline = pipeline(ScriptedGenerator::new(&[])).await;
    let report = Evaluator::new(EvalConfig::default()).unwrap().evaluate(&[], &pipeline).await;
    assert_eq!(report.total_cases, 0);
    assert_eq!(report.mean_f1, 0.0);
    assert!(report.cases.is_empty());
}
