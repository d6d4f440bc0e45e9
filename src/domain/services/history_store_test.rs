use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use test_utils::legacy_history_fixture;

use super::HistoryStore;
use super::HISTORY_KEY;
use crate::domain::models::AnalysisResult;
use crate::domain::models::HistoryKind;
use crate::domain::models::InstagramResult;
use crate::domain::models::NaveenaError;
use crate::domain::models::SentimentScores;
use crate::domain::models::Store;
use crate::domain::models::StoreBox;
use crate::domain::models::TextResult;
use crate::domain::models::ViewMode;
use crate::domain::services::PersistentStore;
use crate::infrastructure::stores::memory::MemoryStore;

struct BrokenStore {}

impl Store for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        bail!("storage disabled");
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        bail!("quota exceeded");
    }

    fn remove(&self, _key: &str) -> Result<()> {
        bail!("storage disabled");
    }
}

fn store_with(backend: StoreBox) -> HistoryStore {
    return HistoryStore::new(PersistentStore::new(backend));
}

fn text_result(compound: f64) -> AnalysisResult {
    return AnalysisResult::Text(TextResult {
        scores: SentimentScores {
            positive: 0.4,
            neutral: 0.6,
            negative: 0.0,
            compound,
        },
        explanation: "Mostly positive.".to_string(),
    });
}

fn instagram_result() -> AnalysisResult {
    return AnalysisResult::Instagram(InstagramResult {
        emotional_category: vec!["Joy".to_string()],
        explanation: "positive".to_string(),
        average_sentiment_score: 0.42,
        ..InstagramResult::default()
    });
}

#[test]
fn it_prepends_entries_newest_first() -> Result<()> {
    let mut history = store_with(Arc::new(MemoryStore::default()));
    history.append(HistoryKind::Text, "first", text_result(0.1))?;
    history.append(HistoryKind::Instagram, "https://instagram.com/p/XYZ", instagram_result())?;
    history.append(HistoryKind::Text, "third", text_result(0.3))?;

    let previews = history
        .items()
        .iter()
        .map(|e| return e.preview.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(previews, vec!["third", "https://instagram.com/p/XYZ", "first"]);
    assert_eq!(history.len(), 3);

    return Ok(());
}

#[test]
fn it_generates_unique_creation_ordered_ids() -> Result<()> {
    let mut history = store_with(Arc::new(MemoryStore::default()));
    for idx in 0..20 {
        history.append(HistoryKind::Text, &format!("entry {idx}"), text_result(0.0))?;
    }

    let ids = history
        .items()
        .iter()
        .map(|e| return e.id.parse::<i64>().unwrap())
        .collect::<Vec<i64>>();
    for pair in ids.windows(2) {
        assert!(pair[0] > pair[1], "ids must strictly decrease newest-first");
    }

    return Ok(());
}

#[test]
fn it_keeps_identical_inputs_as_separate_entries() -> Result<()> {
    let mut history = store_with(Arc::new(MemoryStore::default()));
    history.append(HistoryKind::Text, "same", text_result(0.2))?;
    history.append(HistoryKind::Text, "same", text_result(0.2))?;

    assert_eq!(history.len(), 2);
    assert_ne!(history.items()[0].id, history.items()[1].id);

    return Ok(());
}

#[test]
fn it_rejects_mismatched_kinds() {
    let mut history = store_with(Arc::new(MemoryStore::default()));
    let res = history.append(HistoryKind::Instagram, "oops", text_result(0.2));

    assert!(matches!(res, Err(NaveenaError::Validation(_))));
    assert!(history.is_empty());
}

#[test]
fn it_restores_the_same_sequence_after_restart() -> Result<()> {
    let backend = Arc::new(MemoryStore::default());
    let mut history = store_with(backend.clone());
    history.append(HistoryKind::Text, &"long input ".repeat(10), text_result(-0.4))?;
    history.append(HistoryKind::Instagram, "https://instagram.com/p/XYZ", instagram_result())?;

    let mut restarted = store_with(backend);
    restarted.restore();

    assert_eq!(restarted.items(), history.items());

    return Ok(());
}

#[test]
fn it_restores_empty_after_clear() -> Result<()> {
    let backend = Arc::new(MemoryStore::default());
    let mut history = store_with(backend.clone());
    history.append(HistoryKind::Text, "hello there", text_result(0.2))?;

    history.clear();
    assert!(history.is_empty());
    assert_eq!(backend.get(HISTORY_KEY)?, None);

    let mut restarted = store_with(backend);
    restarted.restore();
    assert!(restarted.is_empty());

    return Ok(());
}

#[test]
fn it_restores_legacy_camel_case_history() -> Result<()> {
    let backend = Arc::new(MemoryStore::default());
    backend.set(HISTORY_KEY, legacy_history_fixture())?;

    let mut history = store_with(backend);
    history.restore();

    assert_eq!(history.len(), 2);
    assert_eq!(history.items()[0].kind, HistoryKind::Instagram);
    assert!(history.get("1717171717000").is_some());

    return Ok(());
}

#[test]
fn it_continues_ids_after_restored_entries() -> Result<()> {
    let backend = Arc::new(MemoryStore::default());
    let future_id = "99999999999999";
    backend.set(
        HISTORY_KEY,
        &format!(
            r#"[{{"id":"{future_id}","date":1,"type":"TEXT","preview":"x","result":{{"scores":{{"positive":0,"neutral":1,"negative":0,"compound":0}},"explanation":""}}}}]"#
        ),
    )?;

    let mut history = store_with(backend);
    history.restore();
    let item = history.append(HistoryKind::Text, "next", text_result(0.1))?;

    assert_eq!(item.id, "100000000000000");

    return Ok(());
}

#[test]
fn it_falls_back_to_the_clock_when_ids_cannot_grow() -> Result<()> {
    let backend = Arc::new(MemoryStore::default());
    let max_id = i64::MAX.to_string();
    backend.set(
        HISTORY_KEY,
        &format!(
            r#"[{{"id":"{max_id}","date":1,"type":"TEXT","preview":"x","result":{{"scores":{{"positive":0,"neutral":1,"negative":0,"compound":0}},"explanation":""}}}}]"#
        ),
    )?;

    let mut history = store_with(backend);
    history.restore();
    let item = history.append(HistoryKind::Text, "next", text_result(0.1))?;

    let id = item.id.parse::<i64>()?;
    assert!(id > 0);
    assert!(id < i64::MAX);

    return Ok(());
}

#[test]
fn it_treats_malformed_history_as_empty() -> Result<()> {
    let backend = Arc::new(MemoryStore::default());

    backend.set(HISTORY_KEY, "[{\"id\": 1")?;
    let mut history = store_with(backend.clone());
    history.restore();
    assert!(history.is_empty());

    backend.set(
        HISTORY_KEY,
        r#"[{"id":"1","date":1,"type":"INSTAGRAM","preview":"x","result":{"scores":{"positive":0,"neutral":1,"negative":0,"compound":0},"explanation":""}}]"#,
    )?;
    history.restore();
    assert!(history.is_empty());

    return Ok(());
}

#[test]
fn it_keeps_working_in_memory_when_storage_fails() -> Result<()> {
    let mut history = store_with(Arc::new(BrokenStore {}));
    history.restore();
    assert!(!history.is_persisted());

    history.append(HistoryKind::Text, "still recorded", text_result(0.3))?;
    assert_eq!(history.len(), 1);
    assert!(!history.is_persisted());

    history.clear();
    assert!(history.is_empty());

    return Ok(());
}

#[test]
fn it_replays_without_mutating_the_store() -> Result<()> {
    let mut history = store_with(Arc::new(MemoryStore::default()));
    history.append(HistoryKind::Text, "I loved it", text_result(0.7))?;
    let before = history.items().to_vec();

    let replay = HistoryStore::replay(&history.items()[0]);

    assert_eq!(replay.view_mode, ViewMode::Text);
    assert_eq!(replay.input, "I loved it");
    assert_eq!(replay.result, text_result(0.7));
    assert_eq!(history.items(), before.as_slice());

    return Ok(());
}
