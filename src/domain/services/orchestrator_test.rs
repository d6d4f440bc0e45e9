use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time;
use tokio::time::Instant;

use super::Orchestrator;
use super::OrchestratorSettings;
use super::Submission;
use super::INSTAGRAM_EXTRACTING_MESSAGE;
use super::INSTAGRAM_FAILURE_MESSAGE;
use super::INSTAGRAM_VALIDATION_MESSAGE;
use super::TEXT_FAILURE_MESSAGE;
use super::TEXT_MANUAL_MESSAGE;
use super::TEXT_REALTIME_MESSAGE;
use crate::domain::models::AnalysisResult;
use crate::domain::models::Event;
use crate::domain::models::Gateway;
use crate::domain::models::HistoryKind;
use crate::domain::models::InstagramResult;
use crate::domain::models::LoadingState;
use crate::domain::models::NaveenaError;
use crate::domain::models::SentimentScores;
use crate::domain::models::Session;
use crate::domain::models::StoreBox;
use crate::domain::models::TextResult;
use crate::domain::models::ViewMode;
use crate::domain::models::LOGIN_VALIDATION_MESSAGE;
use crate::infrastructure::stores::memory::MemoryStore;

const POST_URL: &str = "https://instagram.com/p/XYZ";

#[derive(Default)]
struct FakeGateway {
    calls: Mutex<Vec<String>>,
    fail_text: bool,
    fail_instagram: bool,
    text_delay: Duration,
}

impl FakeGateway {
    fn calls(&self) -> Vec<String> {
        return self.calls.lock().unwrap().clone();
    }
}

fn text_result_for(text: &str) -> TextResult {
    return TextResult {
        scores: SentimentScores {
            positive: 0.5,
            neutral: 0.5,
            negative: 0.0,
            compound: 0.6,
        },
        explanation: format!("scored {text}"),
    };
}

fn instagram_stub() -> InstagramResult {
    return InstagramResult {
        emotional_category: vec!["Excited".to_string(), "Curious".to_string()],
        explanation: "The audience is excited.".to_string(),
        average_sentiment_score: 0.42,
        caption: Some("Launch day!".to_string()),
        ..InstagramResult::default()
    };
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn analyze_text(&self, text: &str) -> Result<TextResult> {
        self.calls.lock().unwrap().push(format!("text:{text}"));
        time::sleep(self.text_delay).await;
        if self.fail_text {
            bail!("text endpoint returned 500");
        }

        return Ok(text_result_for(text));
    }

    async fn analyze_instagram_post(
        &self,
        reference: &str,
        session: &Session,
    ) -> Result<InstagramResult> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("instagram:{}:{reference}", session.username));
        if self.fail_instagram {
            bail!("post is private");
        }

        return Ok(instagram_stub());
    }
}

struct Harness {
    orchestrator: Orchestrator,
    rx: mpsc::UnboundedReceiver<Event>,
    gateway: Arc<FakeGateway>,
    store: StoreBox,
}

impl Harness {
    fn new(gateway: FakeGateway, settings: OrchestratorSettings) -> Harness {
        return Harness::with_store(gateway, settings, Arc::new(MemoryStore::default()));
    }

    fn with_store(gateway: FakeGateway, settings: OrchestratorSettings, store: StoreBox) -> Harness {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        let gateway = Arc::new(gateway);
        let orchestrator = Orchestrator::new(gateway.clone(), store.clone(), settings, tx);

        return Harness {
            orchestrator,
            rx,
            gateway,
            store,
        };
    }

    async fn pump(&mut self) {
        let event = self.rx.recv().await.unwrap();
        self.orchestrator.handle_event(event);
    }

    async fn pump_until_idle(&mut self) {
        while self.orchestrator.loading().is_loading {
            self.pump().await;
        }
    }
}

fn eager_realtime() -> OrchestratorSettings {
    return OrchestratorSettings {
        realtime_min_chars: 0,
        ..OrchestratorSettings::default()
    };
}

#[tokio::test(start_paused = true)]
async fn it_runs_the_instagram_flow_for_a_logged_in_user() -> Result<()> {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());
    let start = Instant::now();

    harness.orchestrator.login("alice", "tok123")?;
    let submission = harness.orchestrator.submit_instagram(POST_URL)?;
    assert_eq!(submission, Submission::Started);
    assert_eq!(
        harness.orchestrator.loading(),
        LoadingState::pending("Authenticating as @alice...")
    );

    harness.pump().await;
    assert_eq!(start.elapsed(), Duration::from_millis(800));
    assert_eq!(
        harness.orchestrator.loading(),
        LoadingState::pending(INSTAGRAM_EXTRACTING_MESSAGE)
    );

    harness.pump().await;
    let history = harness.orchestrator.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history.items()[0].kind, HistoryKind::Instagram);
    assert_eq!(history.items()[0].preview, POST_URL);
    assert_eq!(
        history.items()[0].result,
        AnalysisResult::Instagram(instagram_stub())
    );
    assert_eq!(harness.orchestrator.instagram_result(), Some(&instagram_stub()));
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());
    assert_eq!(harness.orchestrator.error(), None);
    assert_eq!(
        harness.gateway.calls(),
        vec![format!("instagram:alice:{POST_URL}")]
    );

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_asks_for_a_login_before_calling_the_instagram_endpoint() -> Result<()> {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());

    let submission = harness.orchestrator.submit_instagram(POST_URL)?;
    assert_eq!(submission, Submission::LoginRequired);
    assert!(harness.orchestrator.is_login_prompt_open());
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());

    time::sleep(Duration::from_millis(5000)).await;
    assert!(harness.rx.try_recv().is_err());
    assert!(harness.gateway.calls().is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_rejects_an_empty_instagram_reference() {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());

    let res = harness.orchestrator.submit_instagram("   ");
    assert_eq!(
        res,
        Err(NaveenaError::Validation(INSTAGRAM_VALIDATION_MESSAGE.to_string()))
    );
    assert_eq!(harness.orchestrator.error(), Some(INSTAGRAM_VALIDATION_MESSAGE));
    assert!(harness.gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn it_reports_instagram_failures_without_recording_them() -> Result<()> {
    let gateway = FakeGateway {
        fail_instagram: true,
        ..FakeGateway::default()
    };
    let mut harness = Harness::new(gateway, OrchestratorSettings::default());

    harness.orchestrator.login("alice", "tok123")?;
    harness.orchestrator.submit_instagram(POST_URL)?;
    harness.pump_until_idle().await;

    assert_eq!(harness.orchestrator.error(), Some(INSTAGRAM_FAILURE_MESSAGE));
    assert_eq!(harness.orchestrator.instagram_result(), None);
    assert!(harness.orchestrator.history().is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_records_manual_text_analysis() {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());

    let submission = harness.orchestrator.submit_text_manual("I love this product");
    assert_eq!(submission, Submission::Started);
    assert_eq!(
        harness.orchestrator.loading(),
        LoadingState::pending(TEXT_MANUAL_MESSAGE)
    );

    harness.pump().await;
    assert_eq!(
        harness.orchestrator.text_result(),
        Some(&text_result_for("I love this product"))
    );
    assert_eq!(harness.orchestrator.history().len(), 1);
    assert_eq!(
        harness.orchestrator.history().items()[0].preview,
        "I love this product"
    );
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());
}

#[tokio::test]
async fn it_hides_the_cause_of_manual_failures() {
    let gateway = FakeGateway {
        fail_text: true,
        ..FakeGateway::default()
    };
    let mut harness = Harness::new(gateway, OrchestratorSettings::default());

    harness.orchestrator.submit_text_manual("I love this product");
    harness.pump().await;

    assert_eq!(harness.orchestrator.error(), Some(TEXT_FAILURE_MESSAGE));
    assert_eq!(harness.orchestrator.text_result(), None);
    assert!(harness.orchestrator.history().is_empty());
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());
}

#[tokio::test(start_paused = true)]
async fn it_ignores_empty_manual_submissions() {
    let mut harness = Harness::new(FakeGateway::default(), eager_realtime());
    harness.orchestrator.set_view_mode(ViewMode::Text);
    harness.orchestrator.set_realtime_enabled(true);
    harness.orchestrator.set_text_input("typing");

    let submission = harness.orchestrator.submit_text_manual("  \n ");
    assert_eq!(submission, Submission::Ignored);
    assert_eq!(
        harness.orchestrator.loading(),
        LoadingState::pending(TEXT_REALTIME_MESSAGE)
    );
    assert!(harness.gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn it_coalesces_realtime_input_into_one_call() {
    let mut harness = Harness::new(FakeGateway::default(), eager_realtime());
    harness.orchestrator.set_view_mode(ViewMode::Text);
    harness.orchestrator.set_realtime_enabled(true);
    let start = Instant::now();

    harness.orchestrator.set_text_input("a");
    assert_eq!(
        harness.orchestrator.loading(),
        LoadingState::pending(TEXT_REALTIME_MESSAGE)
    );
    time::sleep(Duration::from_millis(200)).await;
    harness.orchestrator.set_text_input("ab");
    time::sleep(Duration::from_millis(200)).await;
    harness.orchestrator.set_text_input("abc");

    harness.pump().await;
    assert_eq!(start.elapsed(), Duration::from_millis(1400));

    harness.pump().await;
    assert_eq!(harness.gateway.calls(), vec!["text:abc".to_string()]);
    assert_eq!(harness.orchestrator.text_result(), Some(&text_result_for("abc")));
    assert!(harness.orchestrator.history().is_empty());
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());
}

#[tokio::test(start_paused = true)]
async fn it_waits_for_enough_characters_before_realtime_analysis() {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());
    harness.orchestrator.set_view_mode(ViewMode::Text);
    harness.orchestrator.set_realtime_enabled(true);

    harness.orchestrator.set_text_input("  hello  ");
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());
    time::sleep(Duration::from_millis(3000)).await;
    assert!(harness.rx.try_recv().is_err());

    harness.orchestrator.set_text_input("hello!");
    assert!(harness.orchestrator.loading().is_loading);
}

#[tokio::test(start_paused = true)]
async fn it_swallows_realtime_failures() {
    let gateway = FakeGateway {
        fail_text: true,
        ..FakeGateway::default()
    };
    let mut harness = Harness::new(gateway, eager_realtime());
    harness.orchestrator.set_view_mode(ViewMode::Text);
    harness.orchestrator.set_realtime_enabled(true);

    harness.orchestrator.set_text_input("this is awful");
    harness.pump_until_idle().await;

    assert_eq!(harness.gateway.calls().len(), 1);
    assert_eq!(harness.orchestrator.error(), None);
    assert_eq!(harness.orchestrator.text_result(), None);
    assert!(harness.orchestrator.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn it_cancels_the_pending_timer_when_leaving_the_text_view() {
    let mut harness = Harness::new(FakeGateway::default(), eager_realtime());
    harness.orchestrator.set_view_mode(ViewMode::Text);
    harness.orchestrator.set_realtime_enabled(true);
    harness.orchestrator.set_text_input("half typed");

    time::sleep(Duration::from_millis(500)).await;
    harness.orchestrator.set_view_mode(ViewMode::Dashboard);
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());

    time::sleep(Duration::from_millis(5000)).await;
    assert!(harness.rx.try_recv().is_err());
    assert!(harness.gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn it_cancels_the_pending_timer_when_realtime_is_disabled() {
    let mut harness = Harness::new(FakeGateway::default(), eager_realtime());
    harness.orchestrator.set_view_mode(ViewMode::Text);
    harness.orchestrator.set_realtime_enabled(true);
    harness.orchestrator.set_text_input("half typed");

    harness.orchestrator.set_realtime_enabled(false);
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());

    time::sleep(Duration::from_millis(5000)).await;
    assert!(harness.rx.try_recv().is_err());
    assert!(harness.gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn it_discards_completions_of_cancelled_realtime_calls() {
    let gateway = FakeGateway {
        text_delay: Duration::from_millis(500),
        ..FakeGateway::default()
    };
    let mut harness = Harness::new(gateway, eager_realtime());
    harness.orchestrator.set_view_mode(ViewMode::Text);
    harness.orchestrator.set_realtime_enabled(true);
    harness.orchestrator.set_text_input("already sent");

    harness.pump().await;
    harness.orchestrator.set_view_mode(ViewMode::Dashboard);
    harness.pump().await;

    assert_eq!(harness.gateway.calls(), vec!["text:already sent".to_string()]);
    assert_eq!(harness.orchestrator.text_result(), None);
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());
    assert_eq!(harness.orchestrator.view_mode(), ViewMode::Dashboard);
}

#[tokio::test(start_paused = true)]
async fn it_records_superseded_manual_submissions() {
    let gateway = FakeGateway {
        text_delay: Duration::from_millis(500),
        ..FakeGateway::default()
    };
    let mut harness = Harness::new(gateway, OrchestratorSettings::default());

    harness.orchestrator.submit_text_manual("first draft");
    harness.orchestrator.submit_text_manual("second draft");
    harness.pump().await;
    harness.pump().await;

    let mut previews = harness
        .orchestrator
        .history()
        .items()
        .iter()
        .map(|e| return e.preview.to_string())
        .collect::<Vec<String>>();
    previews.sort();
    assert_eq!(previews, vec!["first draft", "second draft"]);
    assert_eq!(
        harness.orchestrator.text_result(),
        Some(&text_result_for("second draft"))
    );
    assert_eq!(harness.orchestrator.loading(), LoadingState::idle());
}

#[tokio::test(start_paused = true)]
async fn it_lets_text_and_instagram_flows_interleave() -> Result<()> {
    let mut harness = Harness::new(FakeGateway::default(), eager_realtime());
    harness.orchestrator.login("alice", "tok123")?;
    harness.orchestrator.set_view_mode(ViewMode::Text);
    harness.orchestrator.set_realtime_enabled(true);
    harness.orchestrator.set_text_input("pretty good");

    harness.orchestrator.submit_instagram(POST_URL)?;
    assert_eq!(
        harness.orchestrator.loading(),
        LoadingState::pending("Authenticating as @alice...")
    );

    harness.pump_until_idle().await;

    assert_eq!(
        harness.orchestrator.text_result(),
        Some(&text_result_for("pretty good"))
    );
    assert_eq!(harness.orchestrator.instagram_result(), Some(&instagram_stub()));
    assert_eq!(harness.orchestrator.history().len(), 1);
    assert_eq!(
        harness.orchestrator.history().items()[0].kind,
        HistoryKind::Instagram
    );

    return Ok(());
}

#[tokio::test]
async fn it_validates_logins() {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());
    harness.orchestrator.show_login_prompt();

    let res = harness.orchestrator.login("   ", "tok123");
    assert!(matches!(res, Err(NaveenaError::Validation(_))));
    assert_eq!(harness.orchestrator.error(), Some(LOGIN_VALIDATION_MESSAGE));
    assert!(harness.orchestrator.session().is_none());
    assert!(harness.orchestrator.is_login_prompt_open());

    harness.orchestrator.login(" alice ", "tok123").unwrap();
    assert_eq!(harness.orchestrator.session().unwrap().username, " alice ");
    assert_eq!(harness.orchestrator.error(), None);
    assert!(!harness.orchestrator.is_login_prompt_open());
}

#[tokio::test]
async fn it_returns_to_the_dashboard_on_logout() -> Result<()> {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());
    harness.orchestrator.login("alice", "tok123")?;
    harness.orchestrator.set_view_mode(ViewMode::Instagram);

    harness.orchestrator.logout();

    assert!(harness.orchestrator.session().is_none());
    assert_eq!(harness.orchestrator.view_mode(), ViewMode::Dashboard);

    return Ok(());
}

#[tokio::test]
async fn it_replays_history_entries_without_calling_the_gateway() {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());
    harness.orchestrator.submit_text_manual("I loved it");
    harness.pump().await;
    harness.orchestrator.set_text_input("");
    harness.orchestrator.set_view_mode(ViewMode::Dashboard);

    let id = harness.orchestrator.history().items()[0].id.to_string();
    assert!(harness.orchestrator.load_history_entry(&id));

    assert_eq!(harness.orchestrator.view_mode(), ViewMode::Text);
    assert_eq!(harness.orchestrator.text_input(), "I loved it");
    assert_eq!(
        harness.orchestrator.text_result(),
        Some(&text_result_for("I loved it"))
    );
    assert_eq!(harness.gateway.calls().len(), 1);
    assert_eq!(harness.orchestrator.history().len(), 1);

    assert!(!harness.orchestrator.load_history_entry("missing"));
}

#[tokio::test]
async fn it_restores_session_and_history_on_start() -> Result<()> {
    let mut harness = Harness::new(FakeGateway::default(), OrchestratorSettings::default());
    harness.orchestrator.login("alice", "tok123")?;
    harness.orchestrator.submit_text_manual("persist me");
    harness.pump().await;

    let restarted = Harness::with_store(
        FakeGateway::default(),
        OrchestratorSettings::default(),
        harness.store.clone(),
    );

    assert_eq!(restarted.orchestrator.session().unwrap().username, "alice");
    assert_eq!(restarted.orchestrator.history().len(), 1);
    assert!(restarted.orchestrator.is_persistence_available());
    assert_eq!(restarted.orchestrator.view_mode(), ViewMode::Dashboard);

    return Ok(());
}
