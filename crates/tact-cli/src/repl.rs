//! Line-oriented command language for driving a live session.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use tact_core::{
    DemoScenario, Message, MessageCategory, NavigateContext, SendResult, Session, Tone,
};

pub const HELP: &str = "\
session:   enter | exit | status | list | scenario <name>|clear | quit
navigate:  next | cat+ | cat- | full | summary | home | apps | open <sender> [--app <id>]
           back | dashboard | urgent-only
compose:   reply | type <text> | del | dot <1-6> | commit | space | chord <dots>
           input | send
alert:     alert | freeze | call | dismiss
incoming:  receive <sender> <category> <tone> <urgency> <body...>
tactile:   feel | density <n> | cell <index> <dots> | gap | still";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Enter,
    Exit,
    Status,
    List,
    Scenario(Option<DemoScenario>),
    Quit,
    Help,
    Next,
    NextCategory,
    PrevCategory,
    Full,
    Summary,
    Home,
    Apps,
    Open { sender: String, app_id: String },
    Back,
    Dashboard,
    UrgentOnly,
    Reply,
    Type(String),
    Delete,
    Dot(u8),
    Commit,
    Space,
    Chord(u8),
    InputMode,
    Send,
    Alert,
    Freeze,
    Call,
    Dismiss,
    Receive(Message),
    Feel,
    Density(i32),
    Cell { index: usize, mask: u8 },
    Gap,
    Still,
}

/// Dot numbers 1..=6 as written on a cell (`"125"`) to a bitmask.
pub fn parse_dots(s: &str) -> Result<u8> {
    if s.is_empty() {
        bail!("no dots given");
    }
    s.chars().try_fold(0u8, |mask, c| match c.to_digit(10) {
        Some(d @ 1..=6) => Ok(mask | 1 << (d - 1)),
        _ => Err(anyhow!("'{c}' is not a dot number (1-6)")),
    })
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let cmd = match word.to_ascii_lowercase().as_str() {
            "enter" => Command::Enter,
            "exit" => Command::Exit,
            "status" => Command::Status,
            "list" | "ls" => Command::List,
            "scenario" => match rest {
                "" => bail!("usage: scenario <name>|clear"),
                "clear" | "none" => Command::Scenario(None),
                name => Command::Scenario(Some(name.parse()?)),
            },
            "quit" | "q" => Command::Quit,
            "help" | "?" => Command::Help,
            "next" | "n" => Command::Next,
            "cat+" => Command::NextCategory,
            "cat-" => Command::PrevCategory,
            "full" => Command::Full,
            "summary" => Command::Summary,
            "home" => Command::Home,
            "apps" => Command::Apps,
            "open" => parse_open(rest)?,
            "back" => Command::Back,
            "dashboard" => Command::Dashboard,
            "urgent-only" => Command::UrgentOnly,
            "reply" => Command::Reply,
            "type" => {
                // Everything after the first separator, spaces included.
                let text = line.get(word.len() + 1..).unwrap_or("");
                if text.is_empty() {
                    bail!("usage: type <text>");
                }
                Command::Type(text.to_string())
            }
            "del" => Command::Delete,
            "dot" => {
                let mask = parse_dots(rest)?;
                if mask.count_ones() != 1 {
                    bail!("usage: dot <1-6>");
                }
                Command::Dot(mask.trailing_zeros() as u8)
            }
            "commit" => Command::Commit,
            "space" => Command::Space,
            "chord" => Command::Chord(parse_dots(rest)?),
            "input" => Command::InputMode,
            "send" => Command::Send,
            "alert" => Command::Alert,
            "freeze" => Command::Freeze,
            "call" => Command::Call,
            "dismiss" => Command::Dismiss,
            "receive" => Command::Receive(parse_receive(rest)?),
            "feel" => Command::Feel,
            "density" => Command::Density(rest.parse().context("usage: density <n>")?),
            "cell" => {
                let (index, dots) = rest.split_once(' ').context("usage: cell <index> <dots>")?;
                Command::Cell {
                    index: index.parse().context("cell index must be a number")?,
                    mask: parse_dots(dots.trim())?,
                }
            }
            "gap" => Command::Gap,
            "still" => Command::Still,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(cmd)
    }
}

/// Senders may contain spaces, so the whole remainder names the sender
/// unless it ends in `--app <id>`.
fn parse_open(rest: &str) -> Result<Command> {
    const USAGE: &str = "usage: open <sender> [--app <id>]";
    let (sender, app_id) = match rest.rsplit_once("--app") {
        Some((sender, app)) if sender.is_empty() || sender.ends_with(char::is_whitespace) => {
            let app = app.trim();
            if app.is_empty() || app.contains(char::is_whitespace) {
                bail!(USAGE);
            }
            (sender.trim(), app)
        }
        _ => (rest.trim(), "messages"),
    };
    if sender.is_empty() {
        bail!(USAGE);
    }
    Ok(Command::Open {
        sender: sender.to_string(),
        app_id: app_id.to_string(),
    })
}

fn parse_receive(rest: &str) -> Result<Message> {
    const USAGE: &str = "usage: receive <sender> <category> <tone> <urgency> <body...>";
    let mut parts = rest.splitn(5, char::is_whitespace);
    let sender = parts.next().filter(|s| !s.is_empty()).context(USAGE)?;
    let category: MessageCategory = parts.next().context(USAGE)?.parse()?;
    let tone: Tone = parts.next().context(USAGE)?.parse()?;
    let urgency: f64 = parts
        .next()
        .context(USAGE)?
        .parse()
        .context("urgency must be a number")?;
    let body = parts.next().unwrap_or("").trim();
    Ok(Message::new(sender, body, urgency, tone, category)?)
}

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Apply one command, returning the text to print (possibly empty).
pub async fn execute(session: &Session, command: Command) -> Result<(Flow, String)> {
    let reply = match command {
        Command::Quit => return Ok((Flow::Quit, String::new())),
        Command::Help => HELP.to_string(),
        Command::Status => serde_json::to_string_pretty(&session.snapshot())?,
        Command::List => list(session),
        Command::Send => match session.send().await {
            Some(SendResult::Sent) => "sent".to_string(),
            Some(SendResult::Failed) => "send failed, draft kept".to_string(),
            None => "nothing to send".to_string(),
        },
        other => {
            apply(session, other);
            status_line(session)
        }
    };
    Ok((Flow::Continue, reply))
}

fn apply(session: &Session, command: Command) {
    match command {
        Command::Enter => session.enter(),
        Command::Exit => session.exit(),
        Command::Scenario(Some(s)) => session.select_demo_scenario(s),
        Command::Scenario(None) => session.clear_demo_scenario(),
        Command::Next => session.next_message(),
        Command::NextCategory => session.next_category(),
        Command::PrevCategory => session.prev_category(),
        Command::Full => session.enter_full_mode(),
        Command::Summary => session.exit_full_mode(),
        Command::Home => session.enter_home(),
        Command::Apps => session.enter_navigate(NavigateContext::Apps),
        Command::Open { sender, app_id } => session.open_conversation(&sender, &app_id),
        Command::Back => session.take_me_back(),
        Command::Dashboard => session.exit_to_dashboard(),
        Command::UrgentOnly => session.toggle_urgent_only(),
        Command::Reply => session.start_reply(),
        Command::Type(text) => text.chars().for_each(|c| session.append_char(c)),
        Command::Delete => session.delete_last_char(),
        Command::Dot(index) => session.toggle_dot(index),
        Command::Commit => session.commit_dots(),
        Command::Space => session.commit_space(),
        Command::Chord(mask) => session.commit_chord(mask),
        Command::InputMode => session.toggle_input_mode(),
        Command::Alert => session.enter_alert(),
        Command::Freeze => session.freeze(),
        Command::Call => session.call_bank(),
        Command::Dismiss => session.dismiss_alert(),
        Command::Receive(message) => session.receive_message(message),
        Command::Feel => session.begin_tactile_reading(),
        Command::Density(n) => session.update_tactile_reading(n),
        Command::Cell { index, mask } => session.update_reading_content(index, mask),
        Command::Gap => session.enter_reading_gap(),
        Command::Still => session.stop_tactile_reading(),
        Command::Status | Command::List | Command::Send | Command::Quit | Command::Help => {}
    }
}

/// One-line summary of where the session is.
pub fn status_line(session: &Session) -> String {
    if !session.is_active() {
        return "[inactive]".to_string();
    }
    let mut line = format!(
        "[{} | {} #{}]",
        session.mode().name(),
        session.category(),
        session.message_index()
    );
    if let Some(phase) = session.fraud_phase() {
        line.push_str(&format!(" alert={phase:?}"));
    }
    if session.urgent_queue_len() > 0 {
        line.push_str(&format!(" queued={}", session.urgent_queue_len()));
    }
    if session.is_composing() {
        line.push_str(&format!(" draft=\"{}\"", session.draft()));
    }
    if let Some(m) = session.active_message() {
        line.push_str(&format!("\n  {}: {}", m.sender, m.summary()));
    }
    line
}

fn list(session: &Session) -> String {
    let messages = session.messages_in_category();
    if messages.is_empty() {
        return format!("(no {} messages)", session.category());
    }
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let mark = if session.is_read(m.id) { ' ' } else { '*' };
            format!("{mark}{i:>2} {:<14} {}", m.sender, m.summary())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read commands until EOF, `quit` or Ctrl-C, then exit the session.
pub async fn run<R>(session: &Session, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                None
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                let (flow, reply) = execute(session, command).await?;
                if !reply.is_empty() {
                    println!("{reply}");
                }
                if flow == Flow::Quit {
                    break;
                }
            }
            Err(e) => println!("error: {e}"),
        }
    }
    session.exit();
    Ok(())
}
