//! Conversation and ingestion scenarios.

use super::fakes::{passage, CountingRetriever, FixedTranscriber, MapFetcher, ScriptedLlm};
use crate::config::KnowledgeConfig;
use crate::corpus::Corpus;
use crate::rag::{AnsweringEngine, EngineSettings, NegotiationState, SessionRegistry};
use crate::retriever::Retriever;
use crate::sources::{fetch_urls, load_upload, transcribe_upload};
use crate::types::Document;
use crate::KnowledgeBase;
use docqa_core::config::KnowledgeSettings;
use docqa_core::AppError;
use docqa_prompt::{builtin_prompt, FALLBACK_OFFER, QA_ARTICLE_ID};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn settings() -> EngineSettings {
    let prompt = builtin_prompt(QA_ARTICLE_ID).unwrap().unwrap();
    EngineSettings::new("test-model", 0.9, prompt)
}

fn corpus(temp: &TempDir) -> Corpus {
    let config =
        KnowledgeConfig::with_settings(temp.path().join("index.sqlite"), KnowledgeSettings::default());
    Corpus::open_with(&config).unwrap()
}

fn knowledge_base(temp: &TempDir, llm: Arc<ScriptedLlm>) -> KnowledgeBase {
    KnowledgeBase::new(corpus(temp), SessionRegistry::new(llm, settings()))
}

fn articles() -> Vec<Document> {
    vec![
        Document::new(
            "Paris is the capital and most populous city of France. \
             The Eiffel Tower was completed in 1889.",
            "https://example.com/paris",
        ),
        Document::new(
            "Photosynthesis lets plants convert sunlight, water and carbon dioxide into sugar.",
            "https://example.com/plants",
        ),
    ]
}

fn offer_reply() -> String {
    format!("FOUND_IN_CONTEXT: no\n{}", FALLBACK_OFFER)
}

#[tokio::test]
async fn test_reingesting_same_documents_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let corpus = corpus(&temp);

    let (first, first_stats) = corpus.build("default", &articles()).await.unwrap();
    let before = first.retrieve("When was the Eiffel Tower built?").await.unwrap();

    let (second, second_stats) = corpus.build("default", &articles()).await.unwrap();
    let after = second.retrieve("When was the Eiffel Tower built?").await.unwrap();

    assert_eq!(first_stats, second_stats);
    assert_eq!(before, after);
    assert_eq!(corpus.count("default").await.unwrap(), first_stats.chunks);
}

#[tokio::test]
async fn test_unanswerable_question_arms_fallback() {
    let llm = ScriptedLlm::new(&[offer_reply().as_str()]);
    let engine = AnsweringEngine::new(llm, settings());
    engine
        .ingest(CountingRetriever::new(vec![passage("https://a.test", "Cats purr.")]))
        .await;

    let answer = engine.answer("Who wrote Dune?").await.unwrap();

    assert!(answer.contains(FALLBACK_OFFER));
    assert!(!answer.contains("FOUND_IN_CONTEXT"));
    assert_eq!(
        engine.state().await,
        NegotiationState::AwaitingPermission {
            pending_question: "Who wrote Dune?".to_string()
        }
    );
}

#[tokio::test]
async fn test_untagged_offer_still_arms_fallback() {
    let llm = ScriptedLlm::new(&[FALLBACK_OFFER]);
    let engine = AnsweringEngine::new(llm, settings());
    engine.ingest(CountingRetriever::new(Vec::new())).await;

    engine.answer("Who wrote Dune?").await.unwrap();
    assert!(engine.state().await.is_awaiting_permission());
}

#[tokio::test]
async fn test_agreeing_answers_from_model_knowledge() {
    let llm = ScriptedLlm::new(&[offer_reply().as_str(), "Frank Herbert wrote Dune."]);
    let retriever = CountingRetriever::new(vec![passage("https://a.test", "Cats purr.")]);
    let engine = AnsweringEngine::new(llm.clone(), settings());
    engine.ingest(retriever.clone()).await;

    engine.answer("Who wrote Dune?").await.unwrap();
    let answer = engine.answer("yes please").await.unwrap();

    assert_eq!(
        answer,
        "📚 From my own knowledge:\n\nFrank Herbert wrote Dune.\n\n_(Please verify externally.)_"
    );
    assert_eq!(retriever.calls(), 1);
    assert_eq!(engine.state().await, NegotiationState::Idle);

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].prompt, "Who wrote Dune?");
}

#[tokio::test]
async fn test_offer_under_found_tag_arms_fallback() {
    let reply = format!("FOUND_IN_CONTEXT: yes\n{}", FALLBACK_OFFER);
    let llm = ScriptedLlm::new(&[reply.as_str(), "Frank Herbert wrote Dune."]);
    let retriever = CountingRetriever::new(vec![passage("https://a.test", "Cats purr.")]);
    let engine = AnsweringEngine::new(llm, settings());
    engine.ingest(retriever.clone()).await;

    engine.answer("Who wrote Dune?").await.unwrap();
    assert!(engine.state().await.is_awaiting_permission());

    let answer = engine.answer("yes").await.unwrap();
    assert!(answer.contains("Frank Herbert wrote Dune."));
    assert_eq!(retriever.calls(), 1);
}

#[tokio::test]
async fn test_agreement_racing_an_offer_waits_for_it() {
    let llm = ScriptedLlm::slow(
        &[offer_reply().as_str(), "Frank Herbert wrote Dune."],
        Duration::from_millis(100),
    );
    let retriever = CountingRetriever::new(vec![passage("https://a.test", "Cats purr.")]);
    let engine = AnsweringEngine::new(llm.clone(), settings());
    engine.ingest(retriever.clone()).await;

    // The agreement arrives while the first turn is still waiting on the model
    let (first, second) = tokio::join!(engine.answer("Who wrote Dune?"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine.answer("yes please").await
    });

    assert!(first.unwrap().contains(FALLBACK_OFFER));
    assert!(second.unwrap().starts_with("📚 From my own knowledge:"));
    assert_eq!(retriever.calls(), 1);

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].prompt, "Who wrote Dune?");
    assert_eq!(engine.state().await, NegotiationState::Idle);
}

#[tokio::test]
async fn test_concurrent_questions_each_settle_in_turn() {
    let llm = ScriptedLlm::slow(
        &[offer_reply().as_str(), offer_reply().as_str()],
        Duration::from_millis(50),
    );
    let retriever = CountingRetriever::new(Vec::new());
    let engine = AnsweringEngine::new(llm, settings());
    engine.ingest(retriever.clone()).await;

    let (first, second) = tokio::join!(engine.answer("Who wrote Dune?"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine.answer("Who wrote Foundation?").await
    });
    first.unwrap();
    second.unwrap();

    assert_eq!(retriever.calls(), 2);
    assert_eq!(
        engine.state().await.pending_question(),
        Some("Who wrote Foundation?")
    );
}

#[tokio::test]
async fn test_declining_is_a_new_query() {
    let llm = ScriptedLlm::new(&[offer_reply().as_str(), "FOUND_IN_CONTEXT: yes\nRelevant:\nCats purr."]);
    let retriever = CountingRetriever::new(vec![passage("https://a.test", "Cats purr.")]);
    let engine = AnsweringEngine::new(llm.clone(), settings());
    engine.ingest(retriever.clone()).await;

    engine.answer("Who wrote Dune?").await.unwrap();
    let answer = engine.answer("no thanks").await.unwrap();

    assert!(!answer.starts_with("📚"));
    assert_eq!(retriever.calls(), 2);
    assert_eq!(llm.requests()[1].prompt, "no thanks");
    assert_eq!(engine.state().await, NegotiationState::Idle);
}

#[tokio::test]
async fn test_declining_with_another_gap_rearms_for_new_question() {
    let llm = ScriptedLlm::new(&[offer_reply().as_str(), offer_reply().as_str()]);
    let engine = AnsweringEngine::new(llm, settings());
    engine.ingest(CountingRetriever::new(Vec::new())).await;

    engine.answer("Who wrote Dune?").await.unwrap();
    engine.answer("What about Foundation?").await.unwrap();

    assert_eq!(
        engine.state().await.pending_question(),
        Some("What about Foundation?")
    );
}

#[tokio::test]
async fn test_fresh_session_is_not_ready() {
    let temp = TempDir::new().unwrap();
    let kb = knowledge_base(&temp, ScriptedLlm::new(&[]));

    let result = kb.ask(None, "What is in the article?").await;
    assert!(matches!(result, Err(AppError::NotReady)));
}

#[tokio::test]
async fn test_unreachable_url_is_skipped() {
    let fetcher = MapFetcher::default()
        .with_page("https://one.test", "text/html", "<p>First page</p>")
        .with_page("https://three.test/notes.txt", "text/plain", "Third page");
    let urls = vec![
        "https://one.test".to_string(),
        "https://two.test".to_string(),
        "https://three.test/notes.txt".to_string(),
    ];

    let docs = fetch_urls(&fetcher, &urls).await;

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].source(), "https://one.test");
    assert_eq!(docs[1].source(), "https://three.test/notes.txt");
}

#[test]
fn test_executable_upload_is_rejected() {
    let result = load_upload("installer.exe", b"MZ\x90\x00\x03");
    match result {
        Err(AppError::UnsupportedFormat(message)) => {
            assert_eq!(message, "Unsupported file type: .exe")
        }
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reset_clears_vectors_and_session() {
    let temp = TempDir::new().unwrap();
    let kb = knowledge_base(&temp, ScriptedLlm::new(&[]));

    let stats = kb.ingest(None, &articles()).await.unwrap();
    assert!(stats.chunks > 0);
    assert!(kb.ask(None, "What is the capital of France?").await.is_ok());

    let removed = kb.reset(None).await.unwrap();
    assert_eq!(removed, stats.chunks);
    assert_eq!(kb.corpus().count("default").await.unwrap(), 0);
    assert!(matches!(
        kb.ask(None, "What is the capital of France?").await,
        Err(AppError::NotReady)
    ));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let temp = TempDir::new().unwrap();
    let kb = knowledge_base(&temp, ScriptedLlm::new(&[]));

    kb.ingest(Some("alice"), &articles()).await.unwrap();

    assert!(kb.ask(Some("alice"), "capital of France?").await.is_ok());
    assert!(matches!(
        kb.ask(Some("bob"), "capital of France?").await,
        Err(AppError::NotReady)
    ));
}

#[tokio::test]
async fn test_persisted_collection_survives_restart() {
    let temp = TempDir::new().unwrap();
    knowledge_base(&temp, ScriptedLlm::new(&[]))
        .ingest(None, &articles())
        .await
        .unwrap();

    let llm = ScriptedLlm::new(&[]);
    let restarted = knowledge_base(&temp, llm.clone());
    restarted.ask(None, "When was the Eiffel Tower completed?").await.unwrap();

    let system = llm.requests()[0].system.clone().unwrap();
    assert!(system.contains("[https://example.com/paris]"));
}

#[tokio::test]
async fn test_audio_transcript_is_answerable() {
    let temp = TempDir::new().unwrap();
    let kb = knowledge_base(&temp, ScriptedLlm::new(&[]));

    let doc = transcribe_upload(
        &FixedTranscriber("Today we discuss the borrow checker in Rust."),
        "lecture.mp3",
        b"ID3",
    )
    .await
    .unwrap();
    kb.ingest(None, &[doc]).await.unwrap();

    assert!(kb.ask(None, "What is discussed?").await.is_ok());
}
