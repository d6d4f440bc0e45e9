#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;

use super::Debouncer;
use super::HistoryStore;
use super::PersistentStore;
use super::SessionManager;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AnalysisResult;
use crate::domain::models::Event;
use crate::domain::models::GatewayBox;
use crate::domain::models::HistoryKind;
use crate::domain::models::InstagramResult;
use crate::domain::models::LoadingState;
use crate::domain::models::NaveenaError;
use crate::domain::models::Session;
use crate::domain::models::StoreBox;
use crate::domain::models::StoreName;
use crate::domain::models::TextMode;
use crate::domain::models::TextResult;
use crate::domain::models::ViewMode;
use crate::infrastructure::gateways::http::HttpGateway;
use crate::infrastructure::stores::StoreManager;

pub const TEXT_MANUAL_MESSAGE: &str = "Analyzing sentiment...";
pub const TEXT_REALTIME_MESSAGE: &str = "Real-time analysis...";
pub const INSTAGRAM_EXTRACTING_MESSAGE: &str = "Extracting Caption & Comments...";
pub const TEXT_FAILURE_MESSAGE: &str = "Analysis failed. Please try again.";
pub const INSTAGRAM_FAILURE_MESSAGE: &str =
    "Could not analyze URL. The post might be private or unreachable.";
pub const INSTAGRAM_VALIDATION_MESSAGE: &str = "Please enter a valid URL.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub debounce: Duration,
    pub auth_delay: Duration,
    pub realtime_min_chars: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> OrchestratorSettings {
        return OrchestratorSettings {
            debounce: Duration::from_millis(1000),
            auth_delay: Duration::from_millis(800),
            realtime_min_chars: 5,
        };
    }
}

impl OrchestratorSettings {
    pub fn from_config() -> Result<OrchestratorSettings> {
        let debounce = Config::get(ConfigKey::DebounceMs)
            .parse::<u64>()
            .context("debounce-ms must be a number of milliseconds")?;
        let auth_delay = Config::get(ConfigKey::AuthDelayMs)
            .parse::<u64>()
            .context("auth-delay-ms must be a number of milliseconds")?;
        let realtime_min_chars = Config::get(ConfigKey::RealtimeMinChars)
            .parse::<usize>()
            .context("realtime-min-chars must be a whole number")?;

        return Ok(OrchestratorSettings {
            debounce: Duration::from_millis(debounce),
            auth_delay: Duration::from_millis(auth_delay),
            realtime_min_chars,
        });
    }
}

/// Outcome of a submit action that passed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    Started,
    Ignored,
    LoginRequired,
}

#[derive(Clone, Debug)]
struct Pending {
    message: String,
    started: u64,
    realtime: bool,
}

/// Loading state of one flow. The generation moves on every start and
/// cancel; completions stamped with an older generation are stale.
#[derive(Clone, Debug, Default)]
struct FlowSlot {
    generation: u64,
    pending: Option<Pending>,
}

impl FlowSlot {
    fn begin(&mut self, message: &str, started: u64, realtime: bool) -> u64 {
        self.generation += 1;
        self.pending = Some(Pending {
            message: message.to_string(),
            started,
            realtime,
        });

        return self.generation;
    }

    fn is_current(&self, generation: u64) -> bool {
        return self.pending.is_some() && self.generation == generation;
    }

    fn is_realtime(&self) -> bool {
        return self.pending.as_ref().map(|e| return e.realtime).unwrap_or(false);
    }

    fn set_message(&mut self, generation: u64, message: &str) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        if let Some(pending) = self.pending.as_mut() {
            pending.message = message.to_string();
        }

        return true;
    }

    fn settle(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.pending = None;

        return true;
    }

    fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }
}

/// Owns every piece of client state the dashboard renders and is the only
/// writer of it. Gateway calls run on spawned tasks that report back through
/// `Event`s, which the owner of the receiving end feeds into `handle_event`.
pub struct Orchestrator {
    gateway: GatewayBox,
    tx: mpsc::UnboundedSender<Event>,
    settings: OrchestratorSettings,
    sessions: SessionManager,
    history: HistoryStore,
    debouncer: Debouncer,
    view_mode: ViewMode,
    realtime_enabled: bool,
    text_input: String,
    instagram_input: String,
    text_result: Option<TextResult>,
    instagram_result: Option<InstagramResult>,
    error: Option<String>,
    login_prompt_open: bool,
    text_flow: FlowSlot,
    instagram_flow: FlowSlot,
    flows_started: u64,
}

impl Orchestrator {
    /// Builds the orchestrator and restores the persisted session and history.
    pub fn new(
        gateway: GatewayBox,
        store: StoreBox,
        settings: OrchestratorSettings,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Orchestrator {
        let mut sessions = SessionManager::new(PersistentStore::new(store.clone()));
        let mut history = HistoryStore::new(PersistentStore::new(store));
        sessions.restore();
        history.restore();

        return Orchestrator {
            gateway,
            tx,
            debouncer: Debouncer::new(settings.debounce),
            settings,
            sessions,
            history,
            view_mode: ViewMode::default(),
            realtime_enabled: false,
            text_input: "".to_string(),
            instagram_input: "".to_string(),
            text_result: None,
            instagram_result: None,
            error: None,
            login_prompt_open: false,
            text_flow: FlowSlot::default(),
            instagram_flow: FlowSlot::default(),
            flows_started: 0,
        };
    }

    pub fn from_config(tx: mpsc::UnboundedSender<Event>) -> Result<Orchestrator> {
        let store_name = StoreName::parse(Config::get(ConfigKey::Storage))
            .context("storage must be one of: file, memory")?;

        return Ok(Orchestrator::new(
            Arc::new(HttpGateway::default()),
            StoreManager::get(store_name),
            OrchestratorSettings::from_config()?,
            tx,
        ));
    }

    pub async fn health_check(&self) -> Result<()> {
        return self.gateway.health_check().await;
    }

    pub fn view_mode(&self) -> ViewMode {
        return self.view_mode;
    }

    pub fn session(&self) -> Option<&Session> {
        return self.sessions.current();
    }

    pub fn error(&self) -> Option<&str> {
        return self.error.as_deref();
    }

    pub fn text_input(&self) -> &str {
        return &self.text_input;
    }

    pub fn instagram_input(&self) -> &str {
        return &self.instagram_input;
    }

    pub fn text_result(&self) -> Option<&TextResult> {
        return self.text_result.as_ref();
    }

    pub fn instagram_result(&self) -> Option<&InstagramResult> {
        return self.instagram_result.as_ref();
    }

    pub fn history(&self) -> &HistoryStore {
        return &self.history;
    }

    pub fn is_realtime_enabled(&self) -> bool {
        return self.realtime_enabled;
    }

    pub fn is_login_prompt_open(&self) -> bool {
        return self.login_prompt_open;
    }

    pub fn is_persistence_available(&self) -> bool {
        return self.sessions.is_persisted() && self.history.is_persisted();
    }

    /// The flows keep separate slots; what's shown is whichever pending flow
    /// started last.
    pub fn loading(&self) -> LoadingState {
        let latest = [&self.text_flow, &self.instagram_flow]
            .into_iter()
            .filter_map(|e| return e.pending.as_ref())
            .max_by_key(|e| return e.started);

        match latest {
            Some(pending) => return LoadingState::pending(&pending.message),
            None => return LoadingState::idle(),
        }
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
        self.sync_realtime();
    }

    pub fn set_realtime_enabled(&mut self, enabled: bool) {
        self.realtime_enabled = enabled;
        self.sync_realtime();
    }

    pub fn set_text_input(&mut self, text: &str) {
        self.text_input = text.to_string();
        self.sync_realtime();
    }

    pub fn set_instagram_input(&mut self, reference: &str) {
        self.instagram_input = reference.to_string();
    }

    pub fn show_login_prompt(&mut self) {
        self.login_prompt_open = true;
    }

    pub fn close_login_prompt(&mut self) {
        self.login_prompt_open = false;
    }

    pub fn login(&mut self, username: &str, session_token: &str) -> Result<(), NaveenaError> {
        if let Err(err) = self.sessions.login(username, session_token) {
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.login_prompt_open = false;
        self.error = None;
        return Ok(());
    }

    /// The Instagram view is meaningless without a session, so logging out
    /// always lands on the dashboard.
    pub fn logout(&mut self) {
        self.sessions.logout();
        self.set_view_mode(ViewMode::Dashboard);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Puts a stored analysis back on screen. Inputs are restored without
    /// arming real-time analysis, so replaying never reaches the gateway.
    pub fn load_history_entry(&mut self, id: &str) -> bool {
        let replay = match self.history.get(id) {
            Some(item) => HistoryStore::replay(item),
            None => return false,
        };

        self.cancel_realtime();
        self.view_mode = replay.view_mode;
        self.error = None;
        match replay.result {
            AnalysisResult::Text(result) => {
                self.text_input = replay.input;
                self.text_result = Some(result);
            }
            AnalysisResult::Instagram(result) => {
                self.instagram_input = replay.input;
                self.instagram_result = Some(result);
            }
        }

        return true;
    }

    pub fn submit_text_manual(&mut self, text: &str) -> Submission {
        if text.trim().is_empty() {
            return Submission::Ignored;
        }

        self.debouncer.cancel();
        self.error = None;
        let generation = self.begin_text_flow(TEXT_MANUAL_MESSAGE, false);
        self.spawn_text_analysis(generation, TextMode::Manual, text.to_string());

        return Submission::Started;
    }

    pub fn submit_instagram(&mut self, reference: &str) -> Result<Submission, NaveenaError> {
        if reference.trim().is_empty() {
            self.error = Some(INSTAGRAM_VALIDATION_MESSAGE.to_string());
            return Err(NaveenaError::Validation(
                INSTAGRAM_VALIDATION_MESSAGE.to_string(),
            ));
        }

        let session = match self.sessions.current() {
            Some(session) => session.clone(),
            None => {
                self.login_prompt_open = true;
                return Ok(Submission::LoginRequired);
            }
        };

        self.error = None;
        self.flows_started += 1;
        let generation = self.instagram_flow.begin(
            &format!("Authenticating as @{}...", session.username),
            self.flows_started,
            false,
        );

        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        let auth_delay = self.settings.auth_delay;
        let reference = reference.to_string();
        tokio::spawn(async move {
            time::sleep(auth_delay).await;
            let phase = Event::InstagramPhase {
                generation,
                message: INSTAGRAM_EXTRACTING_MESSAGE.to_string(),
            };
            if tx.send(phase).is_err() {
                return;
            }

            let result = gateway
                .analyze_instagram_post(&reference, &session)
                .await
                .map_err(|err| return NaveenaError::Gateway(format!("{err:#}")));

            let _ = tx.send(Event::InstagramAnalyzed {
                generation,
                reference,
                result,
            });
        });

        return Ok(Submission::Started);
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::DebounceElapsed(generation) => {
                if !self.text_flow.is_current(generation) || !self.text_flow.is_realtime() {
                    return;
                }
                self.spawn_text_analysis(generation, TextMode::Realtime, self.text_input.clone());
            }
            Event::TextAnalyzed {
                generation,
                mode,
                input,
                result,
            } => {
                self.handle_text_analyzed(generation, mode, &input, result);
            }
            Event::InstagramPhase {
                generation,
                message,
            } => {
                self.instagram_flow.set_message(generation, &message);
            }
            Event::InstagramAnalyzed {
                generation,
                reference,
                result,
            } => {
                self.handle_instagram_analyzed(generation, &reference, result);
            }
        }
    }

    fn handle_text_analyzed(
        &mut self,
        generation: u64,
        mode: TextMode,
        input: &str,
        result: Result<TextResult, NaveenaError>,
    ) {
        let current = self.text_flow.settle(generation);

        match result {
            Ok(res) => {
                // Manual submissions are committed by the user, so they're
                // recorded even if newer input has since taken over the screen.
                if mode == TextMode::Manual {
                    self.record(HistoryKind::Text, input, AnalysisResult::Text(res.clone()));
                }
                if current {
                    self.text_result = Some(res);
                } else {
                    tracing::debug!(generation, "Discarding stale text result");
                }
            }
            Err(err) => {
                if mode == TextMode::Realtime {
                    tracing::warn!(error = %err, "Real-time analysis failed");
                    return;
                }

                tracing::error!(error = %err, "Text analysis failed");
                if current {
                    self.error = Some(TEXT_FAILURE_MESSAGE.to_string());
                }
            }
        }
    }

    fn handle_instagram_analyzed(
        &mut self,
        generation: u64,
        reference: &str,
        result: Result<InstagramResult, NaveenaError>,
    ) {
        let current = self.instagram_flow.settle(generation);

        match result {
            Ok(res) => {
                self.record(
                    HistoryKind::Instagram,
                    reference,
                    AnalysisResult::Instagram(res.clone()),
                );
                if current {
                    self.instagram_result = Some(res);
                }
            }
            Err(err) => {
                tracing::error!(error = %err, reference = reference, "Instagram analysis failed");
                if current {
                    self.error = Some(INSTAGRAM_FAILURE_MESSAGE.to_string());
                }
            }
        }
    }

    fn record(&mut self, kind: HistoryKind, source: &str, result: AnalysisResult) {
        match self.history.append(kind, source, result) {
            Ok(item) => tracing::debug!(id = item.id, kind = %item.kind, "Recorded analysis"),
            Err(err) => tracing::error!(error = %err, "Failed to record analysis"),
        }
    }

    fn realtime_active(&self) -> bool {
        return self.realtime_enabled
            && self.view_mode == ViewMode::Text
            && self.text_input.trim().chars().count() > self.settings.realtime_min_chars;
    }

    fn sync_realtime(&mut self) {
        if !self.realtime_active() {
            self.cancel_realtime();
            return;
        }

        let generation = self.begin_text_flow(TEXT_REALTIME_MESSAGE, true);
        self.debouncer.arm(&self.tx, Event::DebounceElapsed(generation));
    }

    /// Drops a pending timer and any real-time call in flight. Manual text
    /// flows are left alone.
    fn cancel_realtime(&mut self) {
        self.debouncer.cancel();
        if self.text_flow.is_realtime() {
            self.text_flow.cancel();
        }
    }

    fn begin_text_flow(&mut self, message: &str, realtime: bool) -> u64 {
        self.flows_started += 1;
        return self.text_flow.begin(message, self.flows_started, realtime);
    }

    fn spawn_text_analysis(&self, generation: u64, mode: TextMode, input: String) {
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = gateway
                .analyze_text(&input)
                .await
                .map_err(|err| return NaveenaError::Gateway(format!("{err:#}")));

            let _ = tx.send(Event::TextAnalyzed {
                generation,
                mode,
                input,
                result,
            });
        });
    }
}
