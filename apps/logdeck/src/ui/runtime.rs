use std::io;
use std::thread;
use std::time::Duration;

use crossterm::cursor::Show;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

use super::dashboard::Dashboard;
use crate::ingest::SourceEvent;
use crate::telemetry::{PerfGuard, record_gauge};

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Single inbox of the coordinator loop.
#[derive(Debug)]
pub enum AppEvent {
    Input(Event),
    Source(SourceEvent),
}

impl From<SourceEvent> for AppEvent {
    fn from(event: SourceEvent) -> Self {
        AppEvent::Source(event)
    }
}

/// Raw mode plus alternate screen, undone on drop so the shell is usable
/// again however the dashboard exits.
pub struct TerminalGuard(bool);

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self(true);
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.0 {
            let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
            let _ = disable_raw_mode();
        }
    }
}

/// Forward terminal input into the coordinator inbox from a dedicated
/// thread. The thread exits once the inbox is closed.
pub fn spawn_input_thread(tx: UnboundedSender<AppEvent>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("logdeck-input".to_string())
        .spawn(move || {
            while !tx.is_closed() {
                match event::poll(INPUT_POLL_INTERVAL) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => {
                        warn!(target: "logdeck::ui", error = %err, "failed to poll terminal input");
                        break;
                    }
                }
                match event::read() {
                    Ok(event) => {
                        if tx.send(AppEvent::Input(event)).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(target: "logdeck::ui", error = %err, "failed to read terminal input");
                        break;
                    }
                }
            }
            debug!(target: "logdeck::ui", "input thread finished");
        })
}

fn apply(dashboard: &mut Dashboard, event: AppEvent) -> bool {
    match event {
        AppEvent::Input(event) => dashboard.handle_event(event),
        AppEvent::Source(event) => dashboard.apply_source_event(event),
    }
}

/// Coordinator loop: wait for the next event, apply everything already
/// queued behind it, then draw once. Returns when the user quits or every
/// sender is gone.
pub async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    dashboard: &mut Dashboard,
    rx: &mut UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    terminal.draw(|frame| dashboard.render(frame))?;
    while let Some(event) = rx.recv().await {
        let mut dirty = apply(dashboard, event);
        let mut applied: u64 = 1;
        while !dashboard.should_quit() {
            let Ok(event) = rx.try_recv() else {
                break;
            };
            dirty |= apply(dashboard, event);
            applied += 1;
        }
        record_gauge("ui.events_per_frame", applied);

        if dashboard.should_quit() {
            debug!(target: "logdeck::ui", "quit requested");
            break;
        }
        if dirty {
            let _perf = PerfGuard::new("ui.draw");
            terminal.draw(|frame| dashboard.render(frame))?;
            trace!(target: "logdeck::ui", applied, "frame drawn");
        }
    }
    Ok(())
}

/// Take over the terminal and run the dashboard until the user quits.
pub async fn run(
    mut dashboard: Dashboard,
    tx: UnboundedSender<AppEvent>,
    mut rx: UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.hide_cursor()?;
    terminal.clear()?;

    spawn_input_thread(tx)?;
    let result = event_loop(&mut terminal, &mut dashboard, &mut rx).await;
    rx.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::ingest::SourceId;
    use crate::render::style::Theme;
    use crate::store::IngestedLine;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use tokio::sync::mpsc::unbounded_channel;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn line(source: usize, text: &str) -> AppEvent {
        SourceEvent::Line {
            source: SourceId(source),
            line: IngestedLine::Start(text.to_string()),
        }
        .into()
    }

    fn row(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    #[test_timeout::tokio_timeout_test(10)]
    async fn queued_events_are_applied_before_quit() {
        let (tx, mut rx) = unbounded_channel();
        let mut dashboard = Dashboard::new(
            vec!["api".to_string()],
            UiConfig::default(),
            Theme::default(),
        );
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).expect("terminal");

        tx.send(line(0, "10:00:01 one")).expect("send");
        tx.send(line(0, "10:00:02 two")).expect("send");
        tx.send(key(KeyCode::Down)).expect("send");
        tx.send(key(KeyCode::Char('q'))).expect("send");
        tx.send(line(0, "10:00:03 after quit")).expect("send");

        event_loop(&mut terminal, &mut dashboard, &mut rx)
            .await
            .expect("loop");
        assert!(dashboard.should_quit());
        let pane = dashboard.pane(SourceId(0)).expect("pane");
        assert_eq!(pane.store().len(), 2);
        assert_eq!(pane.list().active(), Some(0));
    }

    #[test_timeout::tokio_timeout_test(10)]
    async fn loop_ends_when_senders_are_gone() {
        let (tx, mut rx) = unbounded_channel();
        let mut dashboard = Dashboard::new(
            vec!["api".to_string(), "db".to_string()],
            UiConfig::default(),
            Theme::default(),
        );
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).expect("terminal");

        tx.send(line(0, "10:00:01 hello")).expect("send");
        tx.send(SourceEvent::Exited {
            source: SourceId(1),
            code: Some(0),
        }
        .into())
            .expect("send");
        drop(tx);

        event_loop(&mut terminal, &mut dashboard, &mut rx)
            .await
            .expect("loop");
        assert!(!dashboard.should_quit());
        assert!(row(&terminal, 0).contains("db (exited 0)"));
        assert!(row(&terminal, 2).contains("10:00:01 hello"));
    }

    #[test_timeout::tokio_timeout_test(10)]
    async fn resize_redraws_at_the_new_size() {
        let (tx, mut rx) = unbounded_channel();
        let mut dashboard = Dashboard::new(
            vec!["api".to_string()],
            UiConfig::default(),
            Theme::default(),
        );
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).expect("terminal");
        terminal.draw(|frame| dashboard.render(frame)).expect("draw");

        terminal.backend_mut().resize(70, 12);
        tx.send(AppEvent::Input(Event::Resize(70, 12))).expect("send");
        drop(tx);
        event_loop(&mut terminal, &mut dashboard, &mut rx)
            .await
            .expect("loop");
        assert_eq!(terminal.backend().buffer().area.width, 70);
        assert!(row(&terminal, 11).starts_with("q quit"));
    }
}
