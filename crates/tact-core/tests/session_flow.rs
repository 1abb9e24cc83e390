//! End-to-end session behaviour on the virtual clock: lifecycle, inactivity,
//! drafts, send outcomes, the urgent queue and the security-alert flow.

use std::sync::Arc;
use std::time::Duration;

use tact_core::{
    Collaborators, DemoScenario, DraftStore, FraudAlertPhase, HapticEvent, HapticSignature,
    InMemoryDrafts, InMemoryRepository, Message, MessageCategory, MockTransport, NavigateContext,
    ReadContext, Recorder, SendResult, Session, SessionConfig, SessionMode, Tone,
    VirtualScheduler,
};

struct Rig {
    clock: Arc<VirtualScheduler>,
    rec: Recorder,
    transport: MockTransport,
    session: Session,
}

fn rig_with(messages: Vec<Message>, drafts: InMemoryDrafts) -> Rig {
    let clock = Arc::new(VirtualScheduler::new());
    let rec = Recorder::clocked(Arc::clone(&clock));
    let transport = MockTransport::new();
    let collab = Collaborators::new(clock.clone())
        .with_repository(InMemoryRepository::new(messages))
        .with_drafts(drafts)
        .with_transport(Arc::new(transport.clone()))
        .with_cues(Arc::new(rec.clone()))
        .with_actuator(Arc::new(rec.clone()));
    Rig {
        clock,
        rec,
        transport,
        session: Session::new(SessionConfig::default(), collab),
    }
}

fn rig(messages: Vec<Message>) -> Rig {
    rig_with(messages, InMemoryDrafts::new())
}

fn msg(sender: &str, category: MessageCategory) -> Message {
    Message::clamped(sender, "hello there", 0.5, Tone::Calm, category)
}

fn inbox() -> Vec<Message> {
    vec![
        msg("Bank", MessageCategory::Urgent),
        msg("Mom", MessageCategory::Personal),
        msg("Dad", MessageCategory::Personal),
        msg("Boss", MessageCategory::Work),
    ]
}

// ---------------------------------------------------------------------------
// Inactivity
// ---------------------------------------------------------------------------

#[test]
fn inactivity_exits_on_the_sixtieth_second() {
    let r = rig(inbox());
    r.session.enter();

    r.clock.advance(Duration::from_secs(59));
    assert!(r.session.is_active());

    r.clock.advance(Duration::from_secs(1));
    assert!(!r.session.is_active());
}

#[test]
fn interaction_restarts_the_countdown() {
    let r = rig(inbox());
    r.session.enter();

    r.clock.advance(Duration::from_secs(30));
    r.session.register_interaction();
    r.clock.advance(Duration::from_secs(59));
    assert!(r.session.is_active());

    r.session.next_category();
    r.clock.advance(Duration::from_secs(59));
    assert!(r.session.is_active());

    r.clock.advance(Duration::from_secs(1));
    assert!(!r.session.is_active());
    assert_eq!(r.clock.pending_count(), 0);
}

#[test]
fn interaction_while_inactive_arms_nothing() {
    let r = rig(inbox());
    r.session.register_interaction();
    r.session.next_category();
    assert_eq!(r.clock.pending_count(), 0);
}

#[test]
fn manual_exit_disarms_the_timer() {
    let r = rig(inbox());
    r.session.enter();
    r.session.exit();
    assert_eq!(r.clock.pending_count(), 0);

    r.session.enter();
    r.clock.advance(Duration::from_secs(59));
    assert!(r.session.is_active());
}

#[test]
fn custom_timeout_is_honoured() {
    let clock = Arc::new(VirtualScheduler::new());
    let config = SessionConfig {
        inactivity_timeout: Duration::from_secs(5),
        ..SessionConfig::default()
    };
    let session = Session::new(config, Collaborators::new(clock.clone()));
    session.enter();
    clock.advance(Duration::from_secs(5));
    assert!(!session.is_active());
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

#[test]
fn draft_survives_category_round_trip() {
    let r = rig(inbox());
    r.session.enter();
    r.session.start_reply();
    r.session.append_char('o');
    r.session.append_char('k');

    r.session.next_category();
    assert!(!r.session.is_composing());
    assert_eq!(r.session.draft(), "");

    r.session.prev_category();
    r.session.start_reply();
    assert_eq!(r.session.draft(), "ok");
}

#[test]
fn exit_persists_draft_for_the_active_conversation() {
    let mut drafts = InMemoryDrafts::new();
    drafts.save("Mom", "see you");
    let r = rig_with(inbox(), drafts);
    r.session.enter();
    r.session.next_category();
    r.session.start_reply();
    assert_eq!(r.session.draft(), "see you");

    r.session.append_char('!');
    r.session.exit();

    r.session.enter();
    r.session.next_category();
    r.session.start_reply();
    assert_eq!(r.session.draft(), "see you!");
}

#[test]
fn next_message_flushes_draft_without_cue() {
    let r = rig(inbox());
    r.session.enter();
    r.session.next_category();
    r.session.start_reply();
    r.session.append_char('x');
    r.rec.clear();

    r.session.next_message();
    assert_eq!(r.session.current_message().unwrap().sender, "Dad");
    assert!(r.rec.cues().is_empty());

    r.session.enter_read(ReadContext::new(msg("Mom", MessageCategory::Personal), None));
    r.session.start_reply();
    assert_eq!(r.session.draft(), "x");
}

#[test]
fn editing_requires_composing() {
    let r = rig(inbox());
    r.session.enter();
    r.session.append_char('a');
    r.session.toggle_dot(0);
    r.session.commit_space();
    assert_eq!(r.session.draft(), "");
    assert_eq!(r.session.dot_mask(), 0);
    assert!(r.rec.cues().is_empty());
}

#[test]
fn start_reply_without_message_is_noop() {
    let r = rig(vec![msg("Mom", MessageCategory::Personal)]);
    r.session.enter();
    r.session.start_reply();
    assert!(!r.session.is_composing());
}

// ---------------------------------------------------------------------------
// Send
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_failure_keeps_everything() {
    let r = rig(inbox());
    r.transport.set_failing(true);
    r.session.enter();
    r.session.start_reply();
    r.session.append_char('h');
    r.session.append_char('i');
    r.session.toggle_dot(0);
    r.session.toggle_dot(2);
    r.rec.clear();

    let result = r.session.send().await;
    assert_eq!(result, Some(SendResult::Failed));
    assert_eq!(r.session.draft(), "hi");
    assert_eq!(r.session.dot_mask(), 0b000101);
    assert!(r.session.is_composing());
    assert_eq!(r.rec.cues(), vec![HapticEvent::SendFailure]);
    assert_eq!(r.session.last_send_result(), Some(SendResult::Failed));

    r.transport.set_failing(false);
    assert_eq!(r.session.send().await, Some(SendResult::Sent));
    assert_eq!(r.transport.sent(), vec![("Bank".to_string(), "hi".to_string())]);
}

#[tokio::test]
async fn send_success_clears_draft_mask_and_store() {
    let mut drafts = InMemoryDrafts::new();
    drafts.save("Bank", "call me");
    let r = rig_with(inbox(), drafts);
    r.session.enter();
    r.session.start_reply();
    r.session.toggle_dot(1);
    r.rec.clear();

    assert_eq!(r.session.send().await, Some(SendResult::Sent));
    assert_eq!(r.session.draft(), "");
    assert_eq!(r.session.dot_mask(), 0);
    assert!(!r.session.is_composing());
    assert_eq!(r.rec.cues(), vec![HapticEvent::SendSuccess]);

    r.session.start_reply();
    assert_eq!(r.session.draft(), "");
}

#[tokio::test]
async fn send_when_not_composing_is_noop() {
    let r = rig(inbox());
    r.session.enter();
    assert_eq!(r.session.send().await, None);
    assert!(r.rec.cues().is_empty());
    assert!(r.transport.sent().is_empty());
    assert_eq!(r.session.last_send_result(), None);
}

// ---------------------------------------------------------------------------
// Urgent queue
// ---------------------------------------------------------------------------

fn drain_on_exit(queued: usize) {
    let r = rig(inbox());
    r.session.enter();
    for i in 0..queued {
        r.session.receive_message(msg(&format!("Alert {i}"), MessageCategory::Urgent));
    }
    r.session.receive_message(msg("Friend", MessageCategory::Personal));
    assert_eq!(r.session.urgent_queue_len(), queued);
    assert!(r.rec.cues().is_empty());

    r.session.exit();
    assert_eq!(r.rec.count_cue(HapticEvent::UrgentQueuedAlert), 1);
    assert_eq!(r.session.urgent_queue_len(), 0);
}

#[test]
fn one_queued_alert_for_one_message() {
    drain_on_exit(1);
}

#[test]
fn one_queued_alert_for_three_messages() {
    drain_on_exit(3);
}

#[test]
fn one_queued_alert_for_five_messages() {
    drain_on_exit(5);
}

#[test]
fn dashboard_drain_resets_cursors_and_composing() {
    let r = rig(inbox());
    r.session.enter();
    r.session.next_category();
    r.session.next_message();
    r.session.start_reply();
    r.session.receive_message(msg("Fraud", MessageCategory::Urgent));
    r.session.receive_message(msg("Fraud 2", MessageCategory::Urgent));
    r.rec.clear();

    r.session.exit_to_dashboard();
    assert_eq!(r.rec.cues(), vec![HapticEvent::UrgentQueuedAlert]);
    assert_eq!(r.session.category(), MessageCategory::Urgent);
    assert_eq!(r.session.message_index(), 0);
    assert!(!r.session.is_composing());

    r.session.exit_to_dashboard();
    assert_eq!(r.rec.cues().len(), 1);
}

#[test]
fn empty_queue_drains_silently() {
    let r = rig(inbox());
    r.session.enter();
    r.session.exit();
    assert!(r.rec.cues().is_empty());
}

#[test]
fn inactive_session_ignores_arrivals() {
    let r = rig(inbox());
    r.session.receive_message(msg("Fraud", MessageCategory::Urgent));
    assert_eq!(r.session.urgent_queue_len(), 0);
}

// ---------------------------------------------------------------------------
// Security alert
// ---------------------------------------------------------------------------

#[test]
fn bank_fraud_scenario_raises_alert_on_entry() {
    let r = rig(vec![]);
    r.session.select_demo_scenario(DemoScenario::BankFraud);
    r.session.enter();
    assert_eq!(r.session.fraud_phase(), Some(FraudAlertPhase::Alert));
    assert_eq!(r.rec.cues(), vec![HapticEvent::UrgentTriplePulse]);
    assert_eq!(r.session.count_by_category(MessageCategory::Urgent), 2);
}

#[test]
fn other_scenarios_enter_quietly() {
    let r = rig(vec![]);
    r.session.select_demo_scenario(DemoScenario::OverloadFilter);
    r.session.enter();
    assert_eq!(r.session.fraud_phase(), None);
    assert!(r.rec.cues().is_empty());

    r.session.clear_demo_scenario();
    r.session.enter();
    let urgent = r.session.messages_in_category();
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].sender, "Bank");
}

#[test]
fn freeze_from_calling_is_noop() {
    let r = rig(inbox());
    r.session.enter();
    r.session.enter_alert();
    r.session.call_bank();
    assert_eq!(r.session.fraud_phase(), Some(FraudAlertPhase::Calling));
    r.rec.clear();

    r.session.freeze();
    assert_eq!(r.session.fraud_phase(), Some(FraudAlertPhase::Calling));
    assert!(r.rec.cues().is_empty());
}

#[test]
fn call_bank_from_frozen_is_noop() {
    let r = rig(inbox());
    r.session.enter();
    r.session.enter_alert();
    r.session.freeze();
    r.session.freeze();
    assert_eq!(r.rec.count_cue(HapticEvent::FreezeConfirm), 1);

    r.session.call_bank();
    assert_eq!(r.session.fraud_phase(), Some(FraudAlertPhase::Frozen));
    assert_eq!(r.rec.count_cue(HapticEvent::Activate), 0);
}

#[test]
fn dismiss_clears_from_any_phase() {
    let r = rig(inbox());
    r.session.enter();

    r.session.dismiss_alert();
    assert_eq!(r.session.fraud_phase(), None);

    for setup in [None, Some("freeze"), Some("call")] {
        r.session.enter_alert();
        match setup {
            Some("freeze") => r.session.freeze(),
            Some("call") => r.session.call_bank(),
            _ => {}
        }
        r.session.dismiss_alert();
        assert_eq!(r.session.fraud_phase(), None);
    }
    assert_eq!(r.rec.count_cue(HapticEvent::CategorySwitch), 4);
}

#[test]
fn alert_only_from_home() {
    let r = rig(inbox());
    r.session.enter();
    r.session.enter_navigate(NavigateContext::Apps);
    r.session.enter_alert();
    assert_eq!(r.session.fraud_phase(), None);

    r.session.enter_home();
    r.session.enter_alert();
    r.session.enter_alert();
    assert_eq!(r.rec.count_cue(HapticEvent::UrgentTriplePulse), 1);
}

// ---------------------------------------------------------------------------
// Modes and take-me-back
// ---------------------------------------------------------------------------

#[test]
fn mode_changes_share_one_cue() {
    let r = rig(inbox());
    r.session.enter();
    r.session.enter_navigate(NavigateContext::GenericList {
        title: "Notes".into(),
        items: vec!["one".into()],
    });
    r.session.enter_read(ReadContext::new(msg("Mom", MessageCategory::Personal), None));
    r.session.enter_home();
    assert_eq!(r.rec.cues(), vec![HapticEvent::CategorySwitch; 3]);
}

#[test]
fn take_me_back_walks_up_the_hierarchy() {
    let r = rig(inbox());
    r.session.enter();
    r.session.enter_navigate(NavigateContext::Apps);
    r.session.open_conversation("Mom", "Messages");
    assert!(matches!(r.session.mode(), SessionMode::Read(_)));

    r.session.start_reply();
    r.session.append_char('y');
    r.session.take_me_back();
    assert!(matches!(r.session.mode(), SessionMode::Read(_)));
    assert!(!r.session.is_composing());

    r.session.take_me_back();
    assert_eq!(
        r.session.mode(),
        SessionMode::Navigate(NavigateContext::Conversations {
            app_id: "Messages".into()
        })
    );

    r.session.take_me_back();
    assert_eq!(r.session.mode(), SessionMode::Home);

    r.session.take_me_back();
    assert!(!r.session.is_active());

    r.session.enter();
    r.session.enter_read(ReadContext::new(msg("Mom", MessageCategory::Personal), None));
    r.session.start_reply();
    assert_eq!(r.session.draft(), "y");
}

#[test]
fn read_without_app_goes_home() {
    let r = rig(inbox());
    r.session.enter();
    r.session.enter_read(
        ReadContext::new(msg("Boss", MessageCategory::Work), None)
            .with_signature(HapticSignature::Calm),
    );
    r.session.take_me_back();
    assert_eq!(r.session.mode(), SessionMode::Home);
}

#[test]
fn modes_are_guarded_by_activity() {
    let r = rig(inbox());
    r.session.enter_navigate(NavigateContext::Apps);
    r.session.take_me_back();
    r.session.enter_alert();
    assert_eq!(r.session.mode(), SessionMode::Home);
    assert!(r.rec.cues().is_empty());
}

// ---------------------------------------------------------------------------
// Tactile reading through the session
// ---------------------------------------------------------------------------

#[test]
fn reading_in_anger_context_follows_segmented_rhythm() {
    let hot = Message::clamped("Boss", "now!!", 0.95, Tone::Anger, MessageCategory::Work);
    let r = rig(vec![hot.clone()]);
    r.session.enter();
    r.session.enter_read(ReadContext::new(hot, None));
    r.rec.clear();

    r.session.begin_tactile_reading();
    r.clock.advance_ms(18 * 6);
    let times: Vec<u64> = r
        .rec
        .timed_impulses()
        .iter()
        .map(|(t, _)| *t)
        .filter(|t| t % 18 == 0 && *t > 0)
        .collect();
    assert_eq!(times, vec![18, 36, 72]);
}

#[test]
fn exit_stops_both_engines() {
    let r = rig(inbox());
    r.session.enter();
    r.session.begin_tactile_reading();
    r.session.update_reading_content(0, 0b111111);
    r.session.exit();

    let before = r.rec.impulses().len();
    r.clock.advance_ms(2_000);
    assert_eq!(r.rec.impulses().len(), before);
    assert_eq!(r.clock.pending_count(), 0);
}

#[test]
fn density_updates_never_tick_out_of_cadence() {
    let r = rig(inbox());
    r.session.enter();
    r.session.begin_tactile_reading();
    for n in [1, 4, 6, 2, 0] {
        r.session.update_tactile_reading(n);
    }
    assert!(r.rec.impulses().is_empty());
    r.session.stop_tactile_reading();
    assert!(r.session.snapshot().tactile_signature.is_none());
}
