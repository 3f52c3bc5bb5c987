use finrag_core::engine::{EngineSettings, RagEngine};
use finrag_core::prompt::FALLBACK_ANSWER;
use finrag_core::RagError;
use finrag_llm::mock::MockProvider;
use finrag_llm::{ChatOptions, Role};
use finrag_memory::document::{
    DocumentError, DocumentReader, FileType, IngestionPipeline, SplitterConfig, TextSplitter,
    UploadedFile,
};
use finrag_memory::{LocalVectorStore, VectorStore};

const COLLECTION: &str = "financial_documents";

fn settings() -> EngineSettings {
    EngineSettings {
        collection: COLLECTION.into(),
        vector_size: 3,
        top_k: 3,
        chat_options: ChatOptions::default(),
    }
}

fn pipeline() -> IngestionPipeline {
    IngestionPipeline::new(
        DocumentReader::default(),
        TextSplitter::new(SplitterConfig::default()),
    )
}

async fn engine_with(
    provider: MockProvider,
    store: Box<dyn VectorStore>,
) -> RagEngine<MockProvider> {
    let engine = RagEngine::new(provider, store, pipeline(), settings());
    engine.init().await.unwrap();
    engine
}

async fn engine(provider: MockProvider) -> RagEngine<MockProvider> {
    engine_with(provider, Box::new(LocalVectorStore::new())).await
}

/// Unit vector whose cosine similarity to `[1, 0, 0]` is `cos`.
fn at_cosine(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt(), 0.0]
}

fn provider_with_known_distances() -> MockProvider {
    MockProvider::default()
        .with_embedding("Alpha savings report.", at_cosine(0.9))
        .with_embedding("Beta spending report.", at_cosine(0.5))
        .with_embedding("Gamma loan report.", at_cosine(0.1))
        .with_embedding("what did I save?", vec![1.0, 0.0, 0.0])
}

fn three_files() -> Vec<UploadedFile> {
    vec![
        UploadedFile::new("gamma.txt", "Gamma loan report."),
        UploadedFile::new("alpha.txt", "Alpha savings report."),
        UploadedFile::new("beta.txt", "Beta spending report."),
    ]
}

#[tokio::test]
async fn search_returns_k_nearest_by_ascending_distance() {
    let engine = engine(provider_with_known_distances()).await;
    let report = engine.ingest(&three_files()).await.unwrap();
    assert_eq!(report.chunks_added, 3);

    let hits = engine.search("what did I save?", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].metadata.filename, "alpha.txt");
    assert_eq!(hits[1].metadata.filename, "beta.txt");
    assert!((hits[0].distance - 0.1).abs() < 1e-5);
    assert!((hits[1].distance - 0.5).abs() < 1e-5);
    for hit in &hits {
        assert!((hit.similarity - (1.0 - hit.distance)).abs() < 1e-6);
    }
}

#[tokio::test]
async fn search_with_k_larger_than_index() {
    let engine = engine(provider_with_known_distances()).await;
    engine.ingest(&three_files()).await.unwrap();
    let hits = engine.search("what did I save?", 10).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[2].metadata.filename, "gamma.txt");
}

#[tokio::test]
async fn search_on_empty_index_is_empty() {
    let engine = engine(MockProvider::default()).await;
    assert!(engine.search("anything", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_then_search_and_stats_are_empty() {
    let engine = engine(provider_with_known_distances()).await;
    engine.ingest(&three_files()).await.unwrap();
    assert_eq!(engine.stats().await.unwrap().total_chunks, 3);

    engine.clear().await.unwrap();

    assert!(engine.search("what did I save?", 3).await.unwrap().is_empty());
    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.total_chunks, 0);
    assert_eq!(stats.unique_files, 0);
    assert!(stats.file_types.is_empty());
}

#[tokio::test]
async fn embedding_failure_adds_nothing() {
    let engine = engine(MockProvider::failing_embed()).await;
    let result = engine.ingest(&three_files()).await;
    assert!(matches!(result, Err(RagError::Embedding(_))));
    assert_eq!(engine.stats().await.unwrap().total_chunks, 0);
}

#[tokio::test]
async fn unsupported_file_does_not_abort_batch() {
    let engine = engine(MockProvider::default()).await;
    let report = engine
        .ingest(&[
            UploadedFile::new("notes.txt", "Emergency fund: 6 months."),
            UploadedFile::new("return.docx", vec![0x50, 0x4b, 0x03, 0x04]),
            UploadedFile::new("spend.csv", "category,amount\nrent,1200\nfood,300\n"),
        ])
        .await
        .unwrap();

    assert_eq!(report.chunks_added, 2);
    assert_eq!(report.files.len(), 3);
    let failed: Vec<_> = report.failed_files().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].filename, "return.docx");
    assert!(matches!(
        failed[0].outcome,
        Err(DocumentError::UnsupportedFormat(ref ext)) if ext == "docx"
    ));

    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.total_chunks, 2);
    assert_eq!(stats.unique_files, 2);
    assert!(stats.file_types.contains(FileType::Csv.as_str()));
    assert!(stats.file_types.contains(FileType::Text.as_str()));
}

#[tokio::test]
async fn empty_csv_is_a_failed_file() {
    let engine = engine(MockProvider::default()).await;
    let report = engine
        .ingest(&[
            UploadedFile::new("empty.csv", ""),
            UploadedFile::new("notes.txt", "Pay off the card first."),
        ])
        .await
        .unwrap();

    assert_eq!(report.chunks_added, 1);
    let failed: Vec<_> = report.failed_files().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].filename, "empty.csv");
    assert!(matches!(failed[0].outcome, Err(DocumentError::EmptyCsv)));
    assert_eq!(engine.stats().await.unwrap().unique_files, 1);
}

#[tokio::test]
async fn csv_report_is_what_gets_indexed() {
    let engine = engine(MockProvider::default()).await;
    engine
        .ingest(&[UploadedFile::new("spend.csv", "category,amount\nrent,1200\n")])
        .await
        .unwrap();
    let hits = engine.search("rent", 1).await.unwrap();
    assert!(hits[0].text.starts_with("Financial Data from spend.csv:"));
    assert!(hits[0].text.contains("Total rows: 1"));
    assert!(hits[0].text.contains("category: rent"));
}

#[tokio::test]
async fn answer_builds_grounded_prompt() {
    let provider = MockProvider::with_responses(vec!["Keep saving.".into()])
        .with_embedding("Alpha savings report.", at_cosine(0.9))
        .with_embedding("what did I save?", vec![1.0, 0.0, 0.0]);
    let engine = engine(provider).await;
    engine
        .ingest(&[UploadedFile::new("alpha.txt", "Alpha savings report.")])
        .await
        .unwrap();

    let answer = engine.answer("what did I save?").await.unwrap();
    assert_eq!(answer.text, "Keep saving.");
    assert!(answer.failure.is_none());
    assert_eq!(answer.sources.len(), 1);

    let calls = engine.provider().chat_calls();
    assert_eq!(calls.len(), 1);
    let (messages, options) = &calls[0];
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.contains("Context Information:"));
    assert!(messages[0]
        .content
        .ends_with("Source: alpha.txt\nAlpha savings report."));
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "what did I save?");
    assert!((options.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(options.max_tokens, 500);
}

#[tokio::test]
async fn answer_with_empty_index_still_calls_completion() {
    let engine = engine(MockProvider::default()).await;
    let answer = engine.answer("Should I refinance?").await.unwrap();
    assert_eq!(answer.text, "mock response");
    assert!(answer.sources.is_empty());

    let calls = engine.provider().chat_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0[0].content.ends_with("Context Information:\n"));
}

#[tokio::test]
async fn answer_embedding_failure_returns_fallback() {
    let engine = engine(MockProvider::failing_embed()).await;
    let answer = engine.answer("q").await.unwrap();
    assert_eq!(answer.text, FALLBACK_ANSWER);
    assert!(matches!(answer.failure, Some(RagError::Embedding(_))));
    assert!(engine.provider().chat_calls().is_empty());
}

#[tokio::test]
async fn answer_completion_failure_returns_fallback() {
    let engine = engine(MockProvider::failing_chat()).await;
    engine
        .ingest(&[UploadedFile::new("a.txt", "Some figures.")])
        .await
        .unwrap();
    let answer = engine.answer("q").await.unwrap();
    assert_eq!(answer.text, FALLBACK_ANSWER);
    assert!(answer.is_fallback());
    assert!(matches!(answer.failure, Some(RagError::Completion(_))));
    assert_eq!(answer.sources.len(), 1);
}

#[tokio::test]
async fn long_document_gets_sequential_chunk_ids() {
    let engine = engine(MockProvider::default()).await;
    let text = "Monthly budget review shows rent, food and transport. ".repeat(60);
    let report = engine
        .ingest(&[UploadedFile::new("review.txt", text)])
        .await
        .unwrap();
    assert!(report.chunks_added > 1);

    let mut ids: Vec<usize> = engine
        .search("budget", report.chunks_added)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.metadata.chunk_id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..report.chunks_added).collect::<Vec<_>>());
}

#[tokio::test]
async fn index_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = LocalVectorStore::open(dir.path()).await.unwrap();
        let engine = engine_with(provider_with_known_distances(), Box::new(store)).await;
        engine.ingest(&three_files()).await.unwrap();
    }

    let store = LocalVectorStore::open(dir.path()).await.unwrap();
    let engine = engine_with(provider_with_known_distances(), Box::new(store)).await;
    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.total_chunks, 3);
    assert_eq!(stats.unique_files, 3);

    let hits = engine.search("what did I save?", 1).await.unwrap();
    assert_eq!(hits[0].metadata.filename, "alpha.txt");
}
