//! Scripted walkthroughs of each demo scenario on the virtual clock.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use tact_core::{
    Collaborators, DemoScenario, HapticEvent, Message, MessageCategory, MockTransport, Recorded,
    Recorder, Scheduler, Session, SessionConfig, SessionSnapshot, Tone, VirtualScheduler,
    cells_for_text, raised_count,
};

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub scenario: DemoScenario,
    pub elapsed_ms: u64,
    pub snapshot: SessionSnapshot,
    pub cues: Vec<HapticEvent>,
    pub timeline: Vec<Recorded>,
}

struct Rig {
    clock: Arc<VirtualScheduler>,
    session: Session,
}

impl Rig {
    fn wait(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
    }

    /// Read `text` cell by cell the way a finger would, one cell per 120ms.
    fn trace_text(&self, text: &str) {
        for (cell, mask) in cells_for_text(text).into_iter().enumerate() {
            if mask == 0 {
                self.session.enter_reading_gap();
            } else {
                self.session.update_reading_content(cell, mask);
                self.session.update_tactile_reading(raised_count(mask));
            }
            self.wait(120);
        }
    }
}

/// Run the scripted session for `scenario` and collect everything it emitted.
pub async fn run(scenario: DemoScenario, fail_send: bool) -> DemoReport {
    let clock = Arc::new(VirtualScheduler::new());
    let recorder = Recorder::clocked(Arc::clone(&clock));
    let transport = if fail_send {
        MockTransport::failing()
    } else {
        MockTransport::new()
    };
    let collaborators = Collaborators::new(Arc::clone(&clock) as Arc<dyn Scheduler>)
        .with_transport(Arc::new(transport))
        .with_cues(Arc::new(recorder.clone()))
        .with_actuator(Arc::new(recorder.clone()));
    let session = Session::new(SessionConfig::default(), collaborators);
    session.select_demo_scenario(scenario);
    let rig = Rig { clock, session };

    tracing::debug!(%scenario, "demo started");
    match scenario {
        DemoScenario::BankFraud => bank_fraud(&rig),
        DemoScenario::MomBirthday => mom_birthday(&rig).await,
        DemoScenario::OverloadFilter => overload_filter(&rig),
    }

    let snapshot = rig.session.snapshot();
    rig.session.exit();
    rig.wait(500);

    DemoReport {
        scenario,
        elapsed_ms: rig.clock.now().as_millis() as u64,
        snapshot,
        cues: recorder.cues(),
        timeline: recorder.entries(),
    }
}

fn bank_fraud(rig: &Rig) {
    let s = &rig.session;
    s.enter();
    rig.wait(800);
    s.freeze();
    rig.wait(600);
    s.dismiss_alert();
    s.open_conversation("Security Team", "messages");
    s.begin_tactile_reading();
    rig.trace_text("blocked");
    s.stop_tactile_reading();
    s.take_me_back();
}

async fn mom_birthday(rig: &Rig) {
    let s = &rig.session;
    s.enter();
    s.next_category();
    s.open_conversation("Mom", "messages");
    s.begin_tactile_reading();
    rig.trace_text("cake");
    s.stop_tactile_reading();
    s.start_reply();
    for c in "yes".chars() {
        s.append_char(c);
        rig.wait(150);
    }
    s.send().await;
    rig.wait(300);
}

fn overload_filter(rig: &Rig) {
    let s = &rig.session;
    s.enter();
    s.toggle_urgent_only();
    for (sender, body) in [
        ("Landlord", "Water will be shut off at noon."),
        ("School", "Pickup moved to 2 PM today."),
    ] {
        s.receive_message(Message::clamped(
            sender,
            body,
            0.9,
            Tone::Urgent,
            MessageCategory::Urgent,
        ));
        rig.wait(400);
    }
    s.exit_to_dashboard();
    s.toggle_urgent_only();
    for _ in 0..3 {
        s.next_category();
    }
    s.begin_tactile_reading();
    for _ in 0..4 {
        s.next_message();
        rig.wait(250);
    }
    s.stop_tactile_reading();
}
