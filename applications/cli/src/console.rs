//! Console command parsing, execution and event rendering

use reprise_core::{format_timestamp, LoopEdit, RepeatMode};
use reprise_playback::{CoordinatorEvent, LoadPhase, PlaybackCoordinator, PlaybackSnapshot};
use thiserror::Error;
use tracing::warn;

/// A parsed console command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Seek(f64),
    Volume(f32),
    PointA,
    PointB,
    ClearLoop,
    ToggleLoop,
    Save(Option<String>),
    /// 1-based segment number
    Segment(usize),
    SegmentNext,
    SegmentPrev,
    /// 1-based segment number
    SegmentDelete(usize),
    Mode(RepeatMode),
    Next,
    Prev,
    Status,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("not a number: '{0}'")]
    InvalidNumber(String),

    #[error("unknown mode '{0}' (none, one, all, shuffle, next)")]
    InvalidMode(String),
}

pub const HELP: &str = "\
commands:
  play | pause | toggle        transport
  seek <seconds>               jump to a time
  vol <0-2>                    set volume
  a | b | clear | loop         set A, set B, clear range, toggle enforcement
  save [label]                 save the A-B range as a segment
  seg <n> | segnext | segprev  apply a segment
  segdel <n>                   delete a segment
  mode <none|one|all|shuffle|next>
  next | prev                  skip within the folder
  status | help | quit";

fn number<T: std::str::FromStr>(arg: Option<&str>, command: &'static str) -> Result<T, ParseError> {
    let arg = arg.ok_or(ParseError::MissingArgument(command))?;
    arg.parse()
        .map_err(|_| ParseError::InvalidNumber(arg.to_string()))
}

/// Parse one input line
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, Some(rest.trim()).filter(|r| !r.is_empty())),
        None => (line, None),
    };

    let command = match word.to_lowercase().as_str() {
        "" => return Err(ParseError::Empty),
        "play" => Command::Play,
        "pause" => Command::Pause,
        "toggle" | "space" => Command::Toggle,
        "seek" => Command::Seek(number(rest, "seek")?),
        "vol" | "volume" => Command::Volume(number(rest, "vol")?),
        "a" => Command::PointA,
        "b" => Command::PointB,
        "clear" => Command::ClearLoop,
        "loop" => Command::ToggleLoop,
        "save" => Command::Save(rest.map(str::to_string)),
        "seg" => Command::Segment(number(rest, "seg")?),
        "segnext" => Command::SegmentNext,
        "segprev" => Command::SegmentPrev,
        "segdel" => Command::SegmentDelete(number(rest, "segdel")?),
        "mode" => {
            let arg = rest.ok_or(ParseError::MissingArgument("mode"))?;
            Command::Mode(
                RepeatMode::from_str(arg).ok_or_else(|| ParseError::InvalidMode(arg.to_string()))?,
            )
        }
        "next" => Command::Next,
        "prev" => Command::Prev,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

/// Whether the console loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run a command against the coordinator, printing its immediate result
pub async fn execute(
    coordinator: &mut PlaybackCoordinator,
    command: Command,
) -> anyhow::Result<Flow> {
    match command {
        Command::Play => {
            if !coordinator.play().await {
                println!("nothing to play");
            }
        }
        Command::Pause => {
            coordinator.pause().await;
        }
        Command::Toggle => {
            coordinator.toggle_play_pause().await;
        }
        Command::Seek(time) => {
            let applied = coordinator.seek(time).await;
            println!("at {}", format_timestamp(applied));
        }
        Command::Volume(level) => {
            coordinator.set_volume(level);
        }
        Command::PointA => {
            coordinator.set_point_a();
        }
        Command::PointB => {
            if coordinator.set_point_b() == LoopEdit::Rejected {
                println!("B must be after A");
            }
        }
        Command::ClearLoop => coordinator.clear_loop(),
        Command::ToggleLoop => {
            coordinator.toggle_loop_enabled();
        }
        Command::Save(label) => match coordinator.save_segment(label).await? {
            Some(segment) => println!(
                "saved '{}' #{} [{} - {}]",
                segment.label,
                segment.index + 1,
                format_timestamp(segment.start_time),
                format_timestamp(segment.end_time)
            ),
            None => println!("set A and B first"),
        },
        Command::Segment(number) => {
            let id = number
                .checked_sub(1)
                .and_then(|i| coordinator.segments().get(i))
                .map(|s| s.id.clone());
            match id {
                Some(id) => {
                    coordinator.select_segment(&id).await;
                }
                None => println!("no segment {number}"),
            }
        }
        Command::SegmentNext => {
            if coordinator.next_segment().await.is_none() {
                println!("no segments");
            }
        }
        Command::SegmentPrev => {
            if coordinator.prev_segment().await.is_none() {
                println!("no segments");
            }
        }
        Command::SegmentDelete(number) => {
            let id = number
                .checked_sub(1)
                .and_then(|i| coordinator.segments().get(i))
                .map(|s| s.id.clone());
            match id {
                Some(id) => {
                    coordinator.delete_segment(&id).await?;
                }
                None => println!("no segment {number}"),
            }
        }
        Command::Mode(mode) => coordinator.set_loop_mode(mode),
        Command::Next => {
            if coordinator.play_next_in_queue().await?.is_none() {
                println!("last file in folder");
            }
        }
        Command::Prev => {
            if coordinator.play_prev_in_queue().await?.is_none() {
                println!("first file in folder");
            }
        }
        Command::Status => {
            println!("{}", status_line(&coordinator.snapshot()));
            for segment in coordinator.segments() {
                let marker = if coordinator.current_segment().map(|s| &s.id) == Some(&segment.id) {
                    '*'
                } else {
                    ' '
                };
                println!(
                    "{marker} {:>2}. {} [{} - {}]",
                    segment.index + 1,
                    segment.label,
                    format_timestamp(segment.start_time),
                    format_timestamp(segment.end_time)
                );
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Parse and run one input line.
///
/// A failed command is reported and the session carries on.
pub async fn run_line(coordinator: &mut PlaybackCoordinator, line: &str) -> Flow {
    let command = match parse(line) {
        Ok(command) => command,
        Err(ParseError::Empty) => return Flow::Continue,
        Err(e) => {
            println!("{e}");
            return Flow::Continue;
        }
    };
    match execute(coordinator, command).await {
        Ok(flow) => flow,
        Err(e) => {
            warn!("Command failed: {:#}", e);
            println!("error: {e:#}");
            Flow::Continue
        }
    }
}

/// One-line summary of the coordinator state
pub fn status_line(snapshot: &PlaybackSnapshot) -> String {
    let Some(title) = &snapshot.title else {
        return "no file selected".to_string();
    };

    let state = match snapshot.phase {
        LoadPhase::Loading => "loading",
        LoadPhase::Failed => "failed",
        _ if snapshot.is_playing => "playing",
        _ => "paused",
    };
    let duration = snapshot
        .duration
        .map_or_else(|| "--:--".to_string(), format_timestamp);

    let mut line = format!(
        "[{state}] {title} {} / {duration} | mode {} | vol {:.2}",
        format_timestamp(snapshot.current_time),
        snapshot.repeat_mode,
        snapshot.volume
    );

    let range = snapshot.loop_range;
    match (range.point_a(), range.point_b()) {
        (Some(a), Some(b)) => {
            let enforced = if snapshot.loop_enabled { "" } else { " (off)" };
            line.push_str(&format!(
                " | loop {} - {}{enforced}",
                format_timestamp(a),
                format_timestamp(b)
            ));
        }
        (Some(a), None) => line.push_str(&format!(" | A {}", format_timestamp(a))),
        _ => {}
    }

    if let Some(error) = &snapshot.load_error {
        line.push_str(&format!(" | error: {error}"));
    }
    line
}

/// Human-readable line for an event; per-tick time updates are not shown
pub fn describe(event: &CoordinatorEvent) -> Option<String> {
    let text = match event {
        CoordinatorEvent::FileChanged { file_id } => format!("loading {file_id}"),
        CoordinatorEvent::Loaded { .. } => "ready".to_string(),
        CoordinatorEvent::LoadFailed { error, .. } => format!("could not load: {error}"),
        CoordinatorEvent::DurationChanged { duration } => {
            format!("duration {}", format_timestamp(*duration))
        }
        CoordinatorEvent::PlayingChanged { playing } => {
            if *playing { "playing" } else { "paused" }.to_string()
        }
        CoordinatorEvent::LoopChanged { range } => match (range.point_a(), range.point_b()) {
            (Some(a), Some(b)) => format!("loop {} - {}", format_timestamp(a), format_timestamp(b)),
            (Some(a), None) => format!("A at {}", format_timestamp(a)),
            _ => "loop cleared".to_string(),
        },
        CoordinatorEvent::LoopEnabledChanged { enabled } => {
            format!("loop {}", if *enabled { "on" } else { "off" })
        }
        CoordinatorEvent::FileFinished { .. } => "finished".to_string(),
        CoordinatorEvent::QueueFinished => "end of folder".to_string(),
        CoordinatorEvent::VolumeChanged { volume } => format!("volume {volume:.2}"),
        CoordinatorEvent::RepeatModeChanged { mode } => format!("mode {mode}"),
        CoordinatorEvent::TimeUpdated { .. }
        | CoordinatorEvent::LoopWrapped { .. }
        | CoordinatorEvent::SegmentsChanged
        | CoordinatorEvent::CurrentSegmentChanged { .. }
        | CoordinatorEvent::PhaseChanged { .. } => return None,
    };
    Some(text)
}
