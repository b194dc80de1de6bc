//! Operator console.
//!
//! Lines starting with `:` are commands; anything else is typed into the
//! keyboard bus followed by `Enter`, exactly as a wedge scanner plugged into
//! the terminal would deliver it.

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, bail};
use labelcheck_core::{ImagePayload, ScannerId};
use labelcheck_hardware::{KeyEvent, KeyboardBus, NamedKey};
use labelcheck_orchestrator::{CaptureState, OperatorAction, SessionView};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const HELP: &str = "\
commands:
  :retry            dismiss an invalid result
  :reprint          dismiss an invalid result after reprinting
  :capture <path>   validate a photo (image file, or a file holding a data URI)
  :arm [scanner]    arm a scanner for image capture
  :quit             exit
anything else is typed as keyboard-wedge input";

/// Parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Operator(OperatorAction),
    Capture(PathBuf),
    Type(String),
    Help,
    Quit,
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ConsoleCommand>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let Some(command) = line.trim().strip_prefix(':') else {
        return Ok(Some(ConsoleCommand::Type(line.to_string())));
    };

    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    let parsed = match (name, arg) {
        ("retry", None) => ConsoleCommand::Operator(OperatorAction::Retry),
        ("reprint", None) => ConsoleCommand::Operator(OperatorAction::Reprint),
        ("capture", Some(path)) => ConsoleCommand::Capture(PathBuf::from(path)),
        ("capture", None) => bail!("usage: :capture <path>"),
        ("arm", None) => ConsoleCommand::Operator(OperatorAction::Arm(None)),
        ("arm", Some(id)) => {
            let id: ScannerId = id.parse().with_context(|| format!("bad scanner id {id:?}"))?;
            ConsoleCommand::Operator(OperatorAction::Arm(Some(id)))
        }
        ("help", _) => ConsoleCommand::Help,
        ("quit" | "q", None) => ConsoleCommand::Quit,
        _ => bail!("unknown command :{command}, try :help"),
    };
    Ok(Some(parsed))
}

/// Load a manual capture from disk.
///
/// Files that hold text starting with `data:` are treated as a data URI;
/// anything else is raw image bytes and is base64 encoded.
pub async fn load_capture(path: &Path) -> anyhow::Result<ImagePayload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    let image = if bytes.starts_with(b"data:") {
        let text = std::str::from_utf8(&bytes).context("data URI is not UTF-8")?;
        ImagePayload::new(text)?
    } else {
        ImagePayload::from_bytes(&bytes)?
    };
    Ok(image)
}

/// Read stdin on a dedicated thread.
///
/// Tokio's stdin blocks runtime shutdown while a read is pending, so lines are
/// forwarded from a plain thread instead. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Run the console until `:quit`, end of input, or shutdown.
///
/// Dropping `operator` on return is what stops the runtime.
pub async fn run_console(
    mut lines: mpsc::Receiver<String>,
    bus: KeyboardBus,
    operator: mpsc::Sender<OperatorAction>,
    shutdown: CancellationToken,
) {
    println!("{HELP}");

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let action = match command {
            ConsoleCommand::Operator(action) => action,
            ConsoleCommand::Capture(path) => match load_capture(&path).await {
                Ok(image) => OperatorAction::ManualCapture(image),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Manual capture failed");
                    println!("[error] {e:#}");
                    continue;
                }
            },
            ConsoleCommand::Type(text) => {
                bus.type_str(&text);
                bus.press(KeyEvent::Named(NamedKey::Enter));
                continue;
            }
            ConsoleCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ConsoleCommand::Quit => break,
        };

        if operator.send(action).await.is_err() {
            break;
        }
    }

    debug!("Console closed");
}

/// Print the session whenever it changes.
pub async fn print_session(mut view: watch::Receiver<SessionView>) {
    while view.changed().await.is_ok() {
        let snapshot = view.borrow_and_update().clone();
        println!("{}", describe(&snapshot));
    }
}

fn describe(view: &SessionView) -> String {
    let barcode = view
        .barcode
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    let scanners = if view.scanners.is_empty() {
        "-".to_string()
    } else {
        let ids: Vec<String> = view.scanners.iter().map(ToString::to_string).collect();
        ids.join(",")
    };
    let mut text = format!(
        "[{}] state={} barcode={barcode} scanners={scanners}",
        view.connection, view.state
    );

    if view.state == CaptureState::Validating
        && let Some(at) = view.captured_at
    {
        text.push_str(&format!(" since {}", at.format("%H:%M:%S")));
    }

    if view.state == CaptureState::Invalid
        && let Some(result) = &view.result
    {
        if let Some(at) = view.captured_at {
            text.push_str(&format!("\n  captured: {}", at.format("%H:%M:%S UTC")));
        }
        let expected = &result.expected_address;
        text.push_str(&format!(
            "\n  expected: {} {}",
            expected.name, expected.address
        ));
        if let Some(scanned) = &result.scanned_address {
            text.push_str(&format!("\n  scanned:  {scanned}"));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use labelcheck_core::{Address, PackageAddress, TrackingNumber, ValidationResult};
    use labelcheck_network::ConnectionState;
    use rstest::rstest;

    #[rstest]
    #[case(":retry", ConsoleCommand::Operator(OperatorAction::Retry))]
    #[case(":reprint", ConsoleCommand::Operator(OperatorAction::Reprint))]
    #[case(":arm", ConsoleCommand::Operator(OperatorAction::Arm(None)))]
    #[case(":arm 3", ConsoleCommand::Operator(OperatorAction::Arm(Some(ScannerId::new(3)))))]
    #[case(":capture /tmp/label.jpg", ConsoleCommand::Capture(PathBuf::from("/tmp/label.jpg")))]
    #[case(":quit", ConsoleCommand::Quit)]
    #[case(":help", ConsoleCommand::Help)]
    #[case("1Z12345E0205271688", ConsoleCommand::Type("1Z12345E0205271688".into()))]
    fn test_parse_line(#[case] line: &str, #[case] expected: ConsoleCommand) {
        assert_eq!(parse_line(line).unwrap(), Some(expected));
    }

    #[rstest]
    #[case(":capture")]
    #[case(":arm x")]
    #[case(":launch")]
    fn test_parse_line_errors(#[case] line: &str) {
        assert!(parse_line(line).is_err());
    }

    #[test]
    fn test_blank_line_ignored() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_capture_encodes_bytes() {
        let path = std::env::temp_dir().join(format!("labelcheck-{}.jpg", std::process::id()));
        tokio::fs::write(&path, [0xFF, 0xD8, 0xFF]).await.unwrap();

        let image = load_capture(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(image.as_str(), "/9j/");
    }

    #[tokio::test]
    async fn test_load_capture_strips_data_uri() {
        let path = std::env::temp_dir().join(format!("labelcheck-{}.txt", std::process::id()));
        tokio::fs::write(&path, "data:image/jpeg;base64,/9j/4AAQ\n")
            .await
            .unwrap();

        let image = load_capture(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(image.as_str(), "/9j/4AAQ");
    }

    #[tokio::test]
    async fn test_console_types_into_bus() {
        let bus = KeyboardBus::new();
        let mut keys = bus.subscribe();
        let (lines_tx, lines) = mpsc::channel(4);
        let (operator_tx, mut operator) = mpsc::channel(4);

        lines_tx.send("1Z".to_string()).await.unwrap();
        lines_tx.send(":retry".to_string()).await.unwrap();
        drop(lines_tx);

        run_console(lines, bus, operator_tx, CancellationToken::new()).await;

        assert_eq!(keys.recv().await.unwrap(), KeyEvent::Char('1'));
        assert_eq!(keys.recv().await.unwrap(), KeyEvent::Char('Z'));
        assert_eq!(keys.recv().await.unwrap(), KeyEvent::Named(NamedKey::Enter));
        assert_eq!(operator.recv().await, Some(OperatorAction::Retry));
        assert_eq!(operator.recv().await, None);
    }

    #[test]
    fn test_describe_invalid_result() {
        let view = SessionView {
            state: CaptureState::Invalid,
            connection: ConnectionState::Open,
            barcode: Some(TrackingNumber::new("1Z12345E0205271688").unwrap()),
            scanner_id: None,
            result: Some(ValidationResult {
                valid: false,
                expected_address: PackageAddress {
                    name: "Happy Returns".into(),
                    address: Address {
                        city: "Austin".into(),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                scanned_address: Some(Address {
                    city: "Dallas".into(),
                    ..Default::default()
                }),
            }),
            captured_at: Some(Utc.with_ymd_and_hms(2026, 3, 4, 9, 15, 30).unwrap()),
            scanners: vec![ScannerId::new(1), ScannerId::new(3)],
        };

        assert_eq!(
            describe(&view),
            "[open] state=Invalid barcode=1Z12345E0205271688 scanners=1,3\n  captured: 09:15:30 UTC\n  expected: Happy Returns Austin\n  scanned:  Dallas"
        );
    }

    #[test]
    fn test_describe_idle_without_scanners() {
        let view = SessionView {
            state: CaptureState::Idle,
            connection: ConnectionState::Connecting,
            barcode: None,
            scanner_id: None,
            result: None,
            captured_at: None,
            scanners: Vec::new(),
        };

        assert_eq!(describe(&view), "[connecting] state=Idle barcode=- scanners=-");
    }
}
