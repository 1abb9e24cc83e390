//! The session state machine: lifecycle, navigation, composition, the urgent
//! queue and the guarded security-alert flow.
//!
//! A [`Session`] is a cheap handle over shared state. All operations are
//! synchronous except [`Session::send`]; cues go to the injected
//! [`CueSink`] and the two reading engines are driven through the injected
//! [`Scheduler`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::braille;
use crate::constants::{DEFAULT_ALERT_SENDER, DOT_COUNT, DOT_MASK, INACTIVITY_TIMEOUT};
use crate::cue::HapticEvent;
use crate::message::{Message, MessageCategory};
use crate::mode::{
    FraudAlertPhase, InputMode, NavigateContext, ReadContext, ReadingMode, SendResult, SessionMode,
};
use crate::output::{Actuator, CueSink, NullHaptics};
use crate::repository::{DraftStore, InMemoryDrafts, InMemoryRepository, MessageRepository};
use crate::scenario::DemoScenario;
use crate::scheduler::{ScheduledAction, Scheduler, cancel_slot};
use crate::signature::HapticSignature;
use crate::tactile::TactileEngine;
use crate::transport::{MockTransport, SendTransport};
use crate::zone::{Zone, ZoneEngine};

/// Apps offered by the launcher list.
pub const APPS: [&str; 6] = ["Messages", "Mail", "Slack", "Teams", "Notes", "Phone"];

/// Maps a chorded dot mask to a character.
pub type DotMapper = fn(u8) -> Option<char>;

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Quiet period after the last interaction before the session exits.
    pub inactivity_timeout: Duration,
    /// Senders whose conversations open the security alert instead of Read.
    pub alert_senders: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: INACTIVITY_TIMEOUT,
            alert_senders: vec![DEFAULT_ALERT_SENDER.to_string()],
        }
    }
}

impl SessionConfig {
    /// Case-insensitive exact match against the trusted alert senders.
    pub fn is_alert_sender(&self, sender: &str) -> bool {
        self.alert_senders
            .iter()
            .any(|s| s.to_lowercase() == sender.to_lowercase())
    }
}

/// Everything a session talks to. Defaults are in-memory and silent.
pub struct Collaborators {
    pub repository: Box<dyn MessageRepository>,
    pub drafts: Box<dyn DraftStore>,
    pub transport: Arc<dyn SendTransport>,
    pub cues: Arc<dyn CueSink>,
    pub actuator: Arc<dyn Actuator>,
    pub scheduler: Arc<dyn Scheduler>,
    pub dot_mapper: DotMapper,
}

impl Collaborators {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            repository: Box::new(InMemoryRepository::default()),
            drafts: Box::new(InMemoryDrafts::default()),
            transport: Arc::new(MockTransport::new()),
            cues: Arc::new(NullHaptics),
            actuator: Arc::new(NullHaptics),
            scheduler,
            dot_mapper: braille::dot_to_char,
        }
    }

    pub fn with_repository(mut self, repository: impl MessageRepository + 'static) -> Self {
        self.repository = Box::new(repository);
        self
    }

    pub fn with_drafts(mut self, drafts: impl DraftStore + 'static) -> Self {
        self.drafts = Box::new(drafts);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn SendTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_cues(mut self, cues: Arc<dyn CueSink>) -> Self {
        self.cues = cues;
        self
    }

    pub fn with_actuator(mut self, actuator: Arc<dyn Actuator>) -> Self {
        self.actuator = actuator;
        self
    }

    pub fn with_dot_mapper(mut self, dot_mapper: DotMapper) -> Self {
        self.dot_mapper = dot_mapper;
        self
    }
}

/// Observable session state, for display and assertions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub active: bool,
    pub mode: SessionMode,
    pub category: MessageCategory,
    pub message_index: usize,
    pub current_message: Option<Message>,
    pub reading_mode: ReadingMode,
    pub composing: bool,
    pub draft: String,
    pub dot_mask: u8,
    pub input_mode: InputMode,
    pub urgent_queue: usize,
    pub fraud_phase: Option<FraudAlertPhase>,
    pub scenario: Option<DemoScenario>,
    pub urgent_only: bool,
    pub last_send: Option<SendResult>,
    pub message_count: usize,
    pub tactile_signature: Option<HapticSignature>,
    pub zone: Option<Zone>,
}

struct SessionCore {
    this: Weak<Mutex<SessionCore>>,
    config: SessionConfig,
    repository: Box<dyn MessageRepository>,
    drafts: Box<dyn DraftStore>,
    transport: Arc<dyn SendTransport>,
    cues: Arc<dyn CueSink>,
    scheduler: Arc<dyn Scheduler>,
    dot_mapper: DotMapper,
    tactile: TactileEngine,
    zone: ZoneEngine,

    messages: Vec<Message>,
    active: bool,
    mode: SessionMode,
    category_index: usize,
    message_index: usize,
    reading_mode: ReadingMode,
    composing: bool,
    draft: String,
    dot_mask: u8,
    input_mode: InputMode,
    urgent_queue: Vec<Message>,
    fraud_phase: Option<FraudAlertPhase>,
    scenario: Option<DemoScenario>,
    urgent_only: bool,
    last_send: Option<SendResult>,
    inactivity: Option<ScheduledAction>,
    inactivity_generation: u64,
}

/// Handle to one session. Clones share the same state.
#[derive(Clone)]
pub struct Session {
    core: Arc<Mutex<SessionCore>>,
}

fn lock(core: &Mutex<SessionCore>) -> MutexGuard<'_, SessionCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            repository,
            drafts,
            transport,
            cues,
            actuator,
            scheduler,
            dot_mapper,
        } = collaborators;
        let tactile = TactileEngine::new(Arc::clone(&scheduler), Arc::clone(&actuator));
        let zone = ZoneEngine::new(Arc::clone(&scheduler), actuator);
        let core = Arc::new_cyclic(|this| {
            Mutex::new(SessionCore {
                this: this.clone(),
                config,
                repository,
                drafts,
                transport,
                cues,
                scheduler,
                dot_mapper,
                tactile,
                zone,
                messages: Vec::new(),
                active: false,
                mode: SessionMode::Home,
                category_index: 0,
                message_index: 0,
                reading_mode: ReadingMode::Summary,
                composing: false,
                draft: String::new(),
                dot_mask: 0,
                input_mode: InputMode::default(),
                urgent_queue: Vec::new(),
                fraud_phase: None,
                scenario: None,
                urgent_only: false,
                last_send: None,
                inactivity: None,
                inactivity_generation: 0,
            })
        });
        Self { core }
    }

    fn lock(&self) -> MutexGuard<'_, SessionCore> {
        lock(&self.core)
    }

    /// Run a user-facing operation, then count it as an interaction.
    fn interact<R>(&self, op: impl FnOnce(&mut SessionCore) -> R) -> R {
        let mut core = self.lock();
        let out = op(&mut core);
        core.touch();
        out
    }

    // Lifecycle

    pub fn enter(&self) {
        self.interact(SessionCore::enter);
    }

    pub fn exit(&self) {
        self.lock().exit();
    }

    /// Re-arm the inactivity timer. No-op while inactive.
    pub fn register_interaction(&self) {
        self.lock().touch();
    }

    pub fn select_demo_scenario(&self, scenario: DemoScenario) {
        self.interact(|core| core.select_demo_scenario(scenario));
    }

    pub fn clear_demo_scenario(&self) {
        self.lock().scenario = None;
    }

    // Navigation

    pub fn next_category(&self) {
        self.interact(|core| core.step_category(true));
    }

    pub fn prev_category(&self) {
        self.interact(|core| core.step_category(false));
    }

    pub fn next_message(&self) {
        self.interact(SessionCore::next_message);
    }

    pub fn enter_full_mode(&self) {
        self.interact(SessionCore::enter_full_mode);
    }

    pub fn exit_full_mode(&self) {
        self.interact(|core| core.reading_mode = ReadingMode::Summary);
    }

    pub fn enter_home(&self) {
        self.interact(SessionCore::enter_home);
    }

    pub fn enter_navigate(&self, context: NavigateContext) {
        self.interact(|core| core.enter_navigate(context));
    }

    pub fn enter_read(&self, context: ReadContext) {
        self.interact(|core| core.enter_read(context));
    }

    /// Open the conversation with `sender`. Trusted alert senders raise the
    /// security alert on Home instead.
    pub fn open_conversation(&self, sender: &str, app_id: &str) {
        self.interact(|core| core.open_conversation(sender, app_id));
    }

    /// Context-sensitive back.
    pub fn take_me_back(&self) {
        self.interact(SessionCore::take_me_back);
    }

    /// Leave the category view: flush, drain the urgent queue, reset cursors.
    pub fn exit_to_dashboard(&self) {
        self.interact(SessionCore::exit_to_dashboard);
    }

    pub fn toggle_urgent_only(&self) {
        self.interact(SessionCore::toggle_urgent_only);
    }

    // Composition

    pub fn start_reply(&self) {
        self.interact(SessionCore::start_reply);
    }

    pub fn append_char(&self, c: char) {
        self.interact(|core| {
            if core.composing {
                core.draft.push(c);
            }
        });
    }

    pub fn delete_last_char(&self) {
        self.interact(|core| {
            if core.composing {
                core.draft.pop();
            }
        });
    }

    /// Flip dot `index` (0..6) of the pending chord.
    pub fn toggle_dot(&self, index: u8) {
        self.interact(|core| core.toggle_dot(index));
    }

    /// Commit the pending chord through the dot mapping.
    pub fn commit_dots(&self) {
        self.interact(SessionCore::commit_dots);
    }

    pub fn commit_space(&self) {
        self.interact(SessionCore::commit_space);
    }

    /// Commit a whole chord at once. Masks with bits above the sixth are ignored.
    pub fn commit_chord(&self, mask: u8) {
        self.interact(|core| core.commit_chord(mask));
    }

    pub fn toggle_input_mode(&self) {
        self.interact(|core| {
            core.input_mode = core.input_mode.toggled();
            core.play(HapticEvent::EnterFullMode);
        });
    }

    /// Send the draft to the active conversation.
    ///
    /// Returns `None` when there is nothing to send. On failure every piece of
    /// composition state is left as it was, so the user can retry.
    pub async fn send(&self) -> Option<SendResult> {
        let (transport, key, text) = {
            let mut core = self.lock();
            if !core.active || !core.composing {
                return None;
            }
            let key = core.active_message()?.conversation_key().to_string();
            core.touch();
            (Arc::clone(&core.transport), key, core.draft.clone())
        };
        let outcome = transport.send(key.clone(), text).await;
        let mut core = self.lock();
        let result = match outcome {
            Ok(()) => {
                core.drafts.clear(&key);
                let same_target = core
                    .active_message()
                    .is_some_and(|m| m.conversation_key() == key);
                if core.composing && same_target {
                    core.draft.clear();
                    core.dot_mask = 0;
                    core.composing = false;
                }
                info!(%key, "reply sent");
                core.play(HapticEvent::SendSuccess);
                SendResult::Sent
            }
            Err(e) => {
                warn!(error = %e, "send failed, draft kept");
                core.play(HapticEvent::SendFailure);
                SendResult::Failed
            }
        };
        core.last_send = Some(result);
        Some(result)
    }

    // Incoming

    /// Add an arriving message. Urgent ones queue silently until the next drain.
    pub fn receive_message(&self, message: Message) {
        let mut core = self.lock();
        if !core.active {
            return;
        }
        if message.category == MessageCategory::Urgent {
            core.urgent_queue.push(message.clone());
        }
        core.messages.push(message);
    }

    // Security alert

    pub fn enter_alert(&self) {
        self.interact(SessionCore::enter_alert);
    }

    pub fn freeze(&self) {
        self.interact(|core| {
            if core.fraud_phase == Some(FraudAlertPhase::Alert) {
                core.fraud_phase = Some(FraudAlertPhase::Frozen);
                core.play(HapticEvent::FreezeConfirm);
            }
        });
    }

    pub fn call_bank(&self) {
        self.interact(|core| {
            if core.fraud_phase == Some(FraudAlertPhase::Alert) {
                core.fraud_phase = Some(FraudAlertPhase::Calling);
                core.play(HapticEvent::Activate);
            }
        });
    }

    /// Clear the alert from any phase.
    pub fn dismiss_alert(&self) {
        self.interact(|core| {
            core.fraud_phase = None;
            core.play(HapticEvent::CategorySwitch);
        });
    }

    // Tactile reading

    /// Start both reading engines with the signature the current screen implies.
    pub fn begin_tactile_reading(&self) {
        self.interact(|core| {
            if !core.active {
                return;
            }
            let signature = core.reading_signature();
            core.tactile.start(signature);
            core.zone.start();
        });
    }

    pub fn update_tactile_reading(&self, dot_count: i32) {
        self.interact(|core| core.tactile.update_density(dot_count));
    }

    pub fn update_reading_content(&self, cell: usize, bitmask: u8) {
        self.interact(|core| core.zone.update_content(cell, bitmask));
    }

    pub fn enter_reading_gap(&self) {
        self.interact(|core| core.zone.enter_empty());
    }

    pub fn stop_tactile_reading(&self) {
        let core = self.lock();
        core.tactile.stop();
        core.zone.stop();
    }

    // Observers

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn mode(&self) -> SessionMode {
        self.lock().mode.clone()
    }

    pub fn category(&self) -> MessageCategory {
        self.lock().category()
    }

    pub fn message_index(&self) -> usize {
        self.lock().message_index
    }

    pub fn reading_mode(&self) -> ReadingMode {
        self.lock().reading_mode
    }

    pub fn input_mode(&self) -> InputMode {
        self.lock().input_mode
    }

    pub fn is_composing(&self) -> bool {
        self.lock().composing
    }

    pub fn draft(&self) -> String {
        self.lock().draft.clone()
    }

    pub fn dot_mask(&self) -> u8 {
        self.lock().dot_mask
    }

    pub fn urgent_queue_len(&self) -> usize {
        self.lock().urgent_queue.len()
    }

    pub fn fraud_phase(&self) -> Option<FraudAlertPhase> {
        self.lock().fraud_phase
    }

    pub fn demo_scenario(&self) -> Option<DemoScenario> {
        self.lock().scenario
    }

    pub fn urgent_only(&self) -> bool {
        self.lock().urgent_only
    }

    pub fn last_send_result(&self) -> Option<SendResult> {
        self.lock().last_send
    }

    /// Message under the category/message cursor.
    pub fn current_message(&self) -> Option<Message> {
        self.lock().current_message().cloned()
    }

    /// The message being read or replied to: the Read context's, else the cursor's.
    pub fn active_message(&self) -> Option<Message> {
        self.lock().active_message().cloned()
    }

    pub fn messages_in_category(&self) -> Vec<Message> {
        let core = self.lock();
        core.in_category().cloned().collect()
    }

    pub fn count_by_category(&self, category: MessageCategory) -> usize {
        self.lock()
            .messages
            .iter()
            .filter(|m| m.category == category)
            .count()
    }

    /// First message of each sender, in arrival order.
    pub fn conversations(&self) -> Vec<Message> {
        let core = self.lock();
        let mut seen = HashSet::new();
        core.messages
            .iter()
            .filter(|m| seen.insert(m.sender.as_str()))
            .cloned()
            .collect()
    }

    /// Message featured on Home: the first queued urgent one, else (with the
    /// urgent-only filter) the first urgent message or (without) the first message.
    pub fn home_top_message(&self) -> Option<Message> {
        let core = self.lock();
        if let Some(first) = core.urgent_queue.first() {
            return Some(first.clone());
        }
        if core.urgent_only {
            core.messages
                .iter()
                .find(|m| m.category == MessageCategory::Urgent)
                .cloned()
        } else {
            core.messages.first().cloned()
        }
    }

    pub fn is_read(&self, id: Uuid) -> bool {
        self.lock().repository.is_read(id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let core = self.lock();
        SessionSnapshot {
            active: core.active,
            mode: core.mode.clone(),
            category: core.category(),
            message_index: core.message_index,
            current_message: core.active_message().cloned(),
            reading_mode: core.reading_mode,
            composing: core.composing,
            draft: core.draft.clone(),
            dot_mask: core.dot_mask,
            input_mode: core.input_mode,
            urgent_queue: core.urgent_queue.len(),
            fraud_phase: core.fraud_phase,
            scenario: core.scenario,
            urgent_only: core.urgent_only,
            last_send: core.last_send,
            message_count: core.messages.len(),
            tactile_signature: core.tactile.signature(),
            zone: core.zone.is_active().then(|| core.zone.zone()),
        }
    }
}

impl SessionCore {
    fn play(&self, cue: HapticEvent) {
        debug!(%cue, "cue");
        self.cues.play(cue);
    }

    /// The one place Home, Navigate and Read entry signal a screen change.
    fn on_screen_changed(&self) {
        self.play(HapticEvent::CategorySwitch);
    }

    fn category(&self) -> MessageCategory {
        MessageCategory::ORDER[self.category_index]
    }

    fn in_category(&self) -> impl Iterator<Item = &Message> {
        let category = self.category();
        self.messages.iter().filter(move |m| m.category == category)
    }

    fn current_message(&self) -> Option<&Message> {
        self.in_category().nth(self.message_index)
    }

    fn active_message(&self) -> Option<&Message> {
        match &self.mode {
            SessionMode::Read(context) => Some(&context.message),
            _ => self.current_message(),
        }
    }

    fn touch(&mut self) {
        if !self.active {
            return;
        }
        cancel_slot(&mut self.inactivity);
        self.inactivity_generation += 1;
        let generation = self.inactivity_generation;
        let this = self.this.clone();
        self.inactivity = Some(self.scheduler.schedule(
            self.config.inactivity_timeout,
            Box::new(move || {
                let Some(shared) = this.upgrade() else {
                    return;
                };
                let mut core = lock(&shared);
                if core.active && core.inactivity_generation == generation {
                    info!("session idle, exiting");
                    core.exit();
                }
            }),
        ));
    }

    fn reset_reading(&mut self) {
        self.message_index = 0;
        self.reading_mode = ReadingMode::Summary;
        self.composing = false;
        self.draft.clear();
        self.dot_mask = 0;
    }

    fn reset_cursors(&mut self) {
        self.category_index = 0;
        self.reset_reading();
    }

    fn save_draft_if_composing(&mut self) {
        if !self.composing {
            return;
        }
        if let Some(key) = self.active_message().map(|m| m.conversation_key().to_string()) {
            self.drafts.save(&key, &self.draft);
        }
    }

    /// One queued-alert cue for any number of queued messages.
    fn drain_urgent_queue(&mut self) {
        if self.urgent_queue.is_empty() {
            return;
        }
        debug!(queued = self.urgent_queue.len(), "draining urgent queue");
        self.play(HapticEvent::UrgentQueuedAlert);
        self.urgent_queue.clear();
    }

    fn enter(&mut self) {
        self.messages = match self.scenario {
            Some(scenario) => scenario.messages(),
            None => self.repository.load_messages(),
        };
        self.active = true;
        self.mode = SessionMode::Home;
        self.reset_cursors();
        self.urgent_queue.clear();
        self.urgent_only = false;
        self.fraud_phase = None;
        info!(
            messages = self.messages.len(),
            scenario = self.scenario.map(DemoScenario::as_str),
            "session entered"
        );
        if self.scenario.is_some_and(DemoScenario::triggers_alert) {
            self.fraud_phase = Some(FraudAlertPhase::Alert);
            self.play(HapticEvent::UrgentTriplePulse);
        }
    }

    fn exit(&mut self) {
        if !self.active {
            return;
        }
        cancel_slot(&mut self.inactivity);
        self.inactivity_generation += 1;
        self.save_draft_if_composing();
        self.drain_urgent_queue();
        self.tactile.stop();
        self.zone.stop();
        self.active = false;
        self.mode = SessionMode::Home;
        self.reset_cursors();
        self.urgent_only = false;
        self.fraud_phase = None;
        info!("session exited");
    }

    fn select_demo_scenario(&mut self, scenario: DemoScenario) {
        self.scenario = Some(scenario);
        self.messages = scenario.messages();
        self.category_index = scenario.focus_category().index();
        self.reset_reading();
        self.urgent_queue.clear();
        debug!(%scenario, "demo scenario selected");
        if self.active {
            self.mode = SessionMode::Home;
            self.on_screen_changed();
        }
    }

    fn step_category(&mut self, forward: bool) {
        if !self.active {
            return;
        }
        let next = if forward {
            self.category_index + 1
        } else {
            match self.category_index.checked_sub(1) {
                Some(i) => i,
                None => return,
            }
        };
        if next >= MessageCategory::ORDER.len() {
            return;
        }
        self.save_draft_if_composing();
        self.category_index = next;
        self.reset_reading();
        debug!(category = %self.category(), "category switched");
        self.play(HapticEvent::CategorySwitch);
    }

    fn next_message(&mut self) {
        if !self.active {
            return;
        }
        let count = self.in_category().count();
        if count == 0 {
            return;
        }
        if self.message_index + 1 >= count {
            self.play(HapticEvent::EndOfCategory);
            return;
        }
        self.save_draft_if_composing();
        let next = self.message_index + 1;
        self.reset_reading();
        self.message_index = next;
    }

    fn enter_full_mode(&mut self) {
        if !self.active || self.active_message().is_none() {
            return;
        }
        self.reading_mode = ReadingMode::Full;
        self.play(HapticEvent::EnterFullMode);
    }

    fn enter_home(&mut self) {
        if !self.active {
            return;
        }
        self.mode = SessionMode::Home;
        self.reset_cursors();
        debug!("mode: home");
        self.on_screen_changed();
    }

    fn enter_navigate(&mut self, context: NavigateContext) {
        if !self.active {
            return;
        }
        self.mode = SessionMode::Navigate(context);
        self.fraud_phase = None;
        self.reset_cursors();
        debug!("mode: navigate");
        self.on_screen_changed();
    }

    fn enter_read(&mut self, context: ReadContext) {
        if !self.active {
            return;
        }
        let id = context.message.id;
        self.repository.mark_read(id);
        for m in self.messages.iter_mut().filter(|m| m.id == id) {
            m.is_read = true;
        }
        let mut context = context;
        context.message.is_read = true;
        debug!(sender = %context.message.sender, signature = %context.signature, "mode: read");
        self.mode = SessionMode::Read(context);
        self.fraud_phase = None;
        self.reset_cursors();
        self.on_screen_changed();
    }

    fn open_conversation(&mut self, sender: &str, app_id: &str) {
        if !self.active {
            return;
        }
        let Some(message) = self.messages.iter().find(|m| m.sender == sender).cloned() else {
            return;
        };
        if self.config.is_alert_sender(&message.sender) {
            self.enter_home();
            self.enter_alert();
            return;
        }
        self.enter_read(ReadContext::new(message, Some(app_id.to_string())));
    }

    fn take_me_back(&mut self) {
        if !self.active {
            return;
        }
        match self.mode.clone() {
            SessionMode::Home => self.exit(),
            SessionMode::Navigate(_) => self.enter_home(),
            SessionMode::Read(_) if self.composing => {
                self.save_draft_if_composing();
                self.composing = false;
                self.dot_mask = 0;
            }
            SessionMode::Read(context) => match context.app_id {
                Some(app_id) => self.enter_navigate(NavigateContext::Conversations { app_id }),
                None => self.enter_home(),
            },
        }
    }

    fn exit_to_dashboard(&mut self) {
        if !self.active {
            return;
        }
        self.save_draft_if_composing();
        self.drain_urgent_queue();
        self.reset_cursors();
    }

    fn toggle_urgent_only(&mut self) {
        if !self.active {
            return;
        }
        self.urgent_only = !self.urgent_only;
        self.reset_reading();
        self.play(HapticEvent::SendSuccess);
    }

    fn start_reply(&mut self) {
        if !self.active {
            return;
        }
        let Some(key) = self.active_message().map(|m| m.conversation_key().to_string()) else {
            return;
        };
        self.composing = true;
        self.dot_mask = 0;
        self.draft = self.drafts.load(&key).unwrap_or_default();
        debug!(%key, restored = !self.draft.is_empty(), "composing");
    }

    fn toggle_dot(&mut self, index: u8) {
        if !self.composing || index >= DOT_COUNT {
            return;
        }
        self.dot_mask ^= 1 << index;
        self.play(HapticEvent::FocusChanged);
    }

    fn commit_dots(&mut self) {
        if !self.composing {
            return;
        }
        let mask = std::mem::take(&mut self.dot_mask);
        if mask == 0 {
            return;
        }
        if let Some(c) = (self.dot_mapper)(mask) {
            self.draft.push(c);
        }
        self.play(HapticEvent::Preview);
    }

    fn commit_space(&mut self) {
        if !self.composing {
            return;
        }
        self.draft.push(' ');
        self.dot_mask = 0;
        self.play(HapticEvent::Preview);
    }

    fn commit_chord(&mut self, mask: u8) {
        if !self.composing || mask == 0 || mask & !DOT_MASK != 0 {
            return;
        }
        if let Some(c) = (self.dot_mapper)(mask) {
            self.draft.push(c);
            self.play(HapticEvent::Preview);
        }
    }

    fn enter_alert(&mut self) {
        if !self.active || self.mode != SessionMode::Home || self.fraud_phase.is_some() {
            return;
        }
        self.fraud_phase = Some(FraudAlertPhase::Alert);
        info!("security alert raised");
        self.play(HapticEvent::UrgentTriplePulse);
    }

    fn reading_signature(&self) -> HapticSignature {
        match &self.mode {
            SessionMode::Read(context) => context.signature,
            SessionMode::Home if self.urgent_only => HapticSignature::Urgent,
            SessionMode::Home | SessionMode::Navigate(_) => HapticSignature::Neutral,
        }
    }
}
