use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::app::{App, Effect, Event, Output};
use crate::clipboard::ClipboardWriter;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::language;
use crate::translator::TranslationClient;

const HELP: &str = "\
Type text and press Enter to translate it.
  :src <code>     set source language
  :dst <code>     set target language
  :swap           swap languages (and the current translation)
  :clear          clear input and output
  :copy           copy the translation to the clipboard
  :example <n>    use a preset phrase
  :examples       list preset phrases
  :langs          list language codes
  :help           show this help
  :quit           exit";

#[derive(Debug)]
pub enum Command {
    Event(Event),
    Help,
    Languages,
    Examples,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Event(Event::InputChanged(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match (name, arg) {
        ("src" | "dst", Some(code)) => {
            if !language::is_supported(code) {
                return Command::Invalid(format!("Unknown language code: {}", code));
            }
            if name == "src" {
                Command::Event(Event::SourceChanged(code.to_string()))
            } else {
                Command::Event(Event::TargetChanged(code.to_string()))
            }
        }
        ("src" | "dst", None) => Command::Invalid(format!("Usage: :{} <code>", name)),
        ("swap", _) => Command::Event(Event::Swap),
        ("clear", _) => Command::Event(Event::Clear),
        ("copy", _) => Command::Event(Event::Copy),
        ("example", Some(n)) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Command::Event(Event::Example(n - 1)),
            _ => Command::Invalid(format!("Not an example number: {}", n)),
        },
        ("example", None) => Command::Invalid("Usage: :example <n>".into()),
        ("examples", _) => Command::Examples,
        ("langs", _) => Command::Languages,
        ("help", _) => Command::Help,
        ("quit" | "q", _) => Command::Quit,
        _ => Command::Invalid(format!("Unknown command: :{}", name)),
    }
}

pub fn render(app: &App) -> String {
    let mut out = format!(
        "[{} ({}) -> {} ({})] {} chars\n",
        language::display_name(app.source()),
        app.source(),
        language::display_name(app.target()),
        app.target(),
        app.char_count()
    );
    if !app.input().is_empty() {
        out.push_str(&format!("> {}\n", app.input()));
    }
    match app.output() {
        Output::Loading => out.push_str("  ... translating\n"),
        _ => {
            for line in app.output_text().lines() {
                out.push_str("  ");
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    if let Some(notification) = app.notification() {
        out.push_str(&format!("  * {}\n", notification.message));
    }
    out
}

/// Owns the controller state and carries out the effects it asks for.
pub struct Runtime {
    app: App,
    debouncer: Debouncer,
    client: Arc<TranslationClient>,
    clipboard: Box<dyn ClipboardWriter>,
    tx: UnboundedSender<Event>,
}

impl Runtime {
    pub fn new(
        app: App,
        debouncer: Debouncer,
        client: Arc<TranslationClient>,
        clipboard: Box<dyn ClipboardWriter>,
    ) -> (Self, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Self {
            app,
            debouncer,
            client,
            clipboard,
            tx,
        };
        (runtime, rx)
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in self.app.handle(event) {
                if let Some(next) = self.apply(effect) {
                    queue.push_back(next);
                }
            }
        }
    }

    fn apply(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::ScheduleDebounce { generation } => {
                let tx = self.tx.clone();
                self.debouncer.reset(move || {
                    let _ = tx.send(Event::DebounceElapsed(generation));
                });
                None
            }
            Effect::CancelDebounce => {
                if self.debouncer.is_pending() {
                    tracing::debug!("Pending translation cancelled");
                }
                self.debouncer.cancel();
                None
            }
            Effect::Translate(req) => {
                tracing::info!(
                    "Translating #{} {} -> {} ({} chars)",
                    req.seq,
                    req.source,
                    req.target,
                    req.text.chars().count()
                );
                let client = Arc::clone(&self.client);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.translate(&req.text, &req.source, &req.target).await;
                    let _ = tx.send(Event::TranslationFinished {
                        seq: req.seq,
                        result,
                    });
                });
                None
            }
            Effect::CopyToClipboard(text) => Some(Event::CopyFinished(self.clipboard.write_text(&text))),
            Effect::ExpireNotification { id, after } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(Event::NotificationExpired(id));
                });
                None
            }
        }
    }
}

pub async fn run(config: &Config, clipboard: Box<dyn ClipboardWriter>) -> Result<()> {
    let client = Arc::new(TranslationClient::from_config(config)?);
    let app = App::new(
        config.source_lang.clone(),
        config.target_lang.clone(),
        config.examples.clone(),
        Duration::from_secs(config.notification_secs),
    );
    let debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms));
    let (mut runtime, mut events) = Runtime::new(app, debouncer, client, clipboard);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{}\n\n", HELP).as_bytes()).await?;

    let mut last_view = String::new();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Command::Event(event) => runtime.dispatch(event),
                    Command::Quit => break,
                    Command::Help => stdout.write_all(format!("{}\n", HELP).as_bytes()).await?,
                    Command::Languages => {
                        let list: String = language::LANGUAGES
                            .iter()
                            .map(|code| format!("  {:<6} {}\n", code, language::display_name(code)))
                            .collect();
                        stdout.write_all(list.as_bytes()).await?;
                    }
                    Command::Examples => {
                        let list: String = runtime
                            .app()
                            .examples()
                            .iter()
                            .enumerate()
                            .map(|(i, text)| format!("  {}. {}\n", i + 1, text))
                            .collect();
                        stdout.write_all(list.as_bytes()).await?;
                    }
                    Command::Invalid(msg) => stdout.write_all(format!("{}\n", msg).as_bytes()).await?,
                }
            }
            Some(event) = events.recv() => runtime.dispatch(event),
        }

        let view = render(runtime.app());
        if view != last_view {
            stdout.write_all(view.as_bytes()).await?;
            stdout.flush().await?;
            last_view = view;
        }
    }

    tracing::info!("Input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::time::Instant;

    use super::*;
    use crate::app::{COPIED, PLACEHOLDER};
    use crate::clipboard::ClipboardError;
    use crate::translator::tests::FakeProvider;

    struct FakeClipboard(Arc<Mutex<Vec<String>>>);

    impl ClipboardWriter for FakeClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn runtime(
        providers: Vec<Box<dyn crate::translator::Provider>>,
        target: &str,
    ) -> (Runtime, UnboundedReceiver<Event>, Arc<Mutex<Vec<String>>>) {
        let copied = Arc::new(Mutex::new(Vec::new()));
        let app = App::new(
            "en".into(),
            target.into(),
            Vec::new(),
            Duration::from_secs(3),
        );
        let (rt, rx) = Runtime::new(
            app,
            Debouncer::new(Duration::from_millis(500)),
            Arc::new(TranslationClient::new(providers)),
            Box::new(FakeClipboard(copied.clone())),
        );
        (rt, rx, copied)
    }

    #[test]
    fn plain_lines_become_input() {
        assert!(matches!(
            parse_command("hello there"),
            Command::Event(Event::InputChanged(ref t)) if t == "hello there"
        ));
    }

    #[test]
    fn commands_are_parsed() {
        assert!(matches!(
            parse_command(":dst zh-CN"),
            Command::Event(Event::TargetChanged(ref c)) if c == "zh-CN"
        ));
        assert!(matches!(parse_command(":src xx"), Command::Invalid(_)));
        assert!(matches!(parse_command(":src"), Command::Invalid(_)));
        assert!(matches!(parse_command(":example 2"), Command::Event(Event::Example(1))));
        assert!(matches!(parse_command(":example 0"), Command::Invalid(_)));
        assert!(matches!(parse_command(":swap"), Command::Event(Event::Swap)));
        assert!(matches!(parse_command(":quit"), Command::Quit));
        assert!(matches!(parse_command(":bogus"), Command::Invalid(_)));
    }

    #[test]
    fn render_shows_placeholder_and_languages() {
        let app = App::new("en".into(), "zh-CN".into(), Vec::new(), Duration::from_secs(3));

        let view = render(&app);

        assert!(view.starts_with("[English (en) -> Chinese (Simplified) (zh-CN)] 0 chars"));
        assert!(view.contains(PLACEHOLDER));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_translates_once_after_debounce() {
        let primary = FakeProvider::ok("primary", "hola");
        let calls = primary.calls.clone();
        let (mut rt, mut rx, _) = runtime(vec![Box::new(primary)], "es");
        let start = Instant::now();

        for text in ["h", "he", "hel", "hell", "hello"] {
            rt.dispatch(Event::InputChanged(text.into()));
        }

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::DebounceElapsed(_)));
        assert_eq!(start.elapsed(), Duration::from_millis(500));
        rt.dispatch(event);
        assert!(rt.app().is_loading());

        let event = rx.recv().await.unwrap();
        rt.dispatch(event);
        assert_eq!(rt.app().output_text(), "hola");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_result_is_rendered() {
        let secondary = FakeProvider::ok("secondary", "你好");
        let seen = secondary.seen.clone();
        let (mut rt, mut rx, _) = runtime(
            vec![Box::new(FakeProvider::failing("primary")), Box::new(secondary)],
            "zh-CN",
        );

        rt.dispatch(Event::InputChanged("hello".into()));
        let event = rx.recv().await.unwrap();
        rt.dispatch(event);
        let event = rx.recv().await.unwrap();
        rt.dispatch(event);

        assert_eq!(rt.app().output_text(), "你好");
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[("en".to_string(), "zh-CN".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn copy_writes_clipboard_and_notification_expires() {
        let (mut rt, mut rx, copied) = runtime(vec![Box::new(FakeProvider::ok("p", "hola"))], "es");
        rt.dispatch(Event::InputChanged("hello".into()));
        let event = rx.recv().await.unwrap();
        rt.dispatch(event);
        let event = rx.recv().await.unwrap();
        rt.dispatch(event);

        rt.dispatch(Event::Copy);
        assert_eq!(copied.lock().unwrap().as_slice(), &["hola".to_string()]);
        assert_eq!(rt.app().notification().map(|n| n.message), Some(COPIED));

        let start = Instant::now();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::NotificationExpired(_)));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        rt.dispatch(event);
        assert!(rt.app().notification().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_pending_debounce() {
        let primary = FakeProvider::ok("p", "hola");
        let calls = primary.calls.clone();
        let (mut rt, mut rx, _) = runtime(vec![Box::new(primary)], "es");

        rt.dispatch(Event::InputChanged("hello".into()));
        rt.dispatch(Event::Clear);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(rt.app().output_text(), PLACEHOLDER);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_debounce_does_not_fire_newer_input_early() {
        let primary = FakeProvider::ok("p", "hola mundo");
        let calls = primary.calls.clone();
        let (mut rt, mut rx, _) = runtime(vec![Box::new(primary)], "es");

        rt.dispatch(Event::InputChanged("hello".into()));
        // Let the timer fire without reading its event yet.
        tokio::time::sleep(Duration::from_millis(501)).await;
        rt.dispatch(Event::InputChanged("hello world".into()));
        let typed_at = Instant::now();

        let stale = rx.recv().await.unwrap();
        assert!(matches!(stale, Event::DebounceElapsed(_)));
        rt.dispatch(stale);
        assert!(!rt.app().is_loading());

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::DebounceElapsed(_)));
        assert_eq!(typed_at.elapsed(), Duration::from_millis(500));
        rt.dispatch(event);
        assert!(rt.app().is_loading());

        let event = rx.recv().await.unwrap();
        rt.dispatch(event);
        assert_eq!(rt.app().output_text(), "hola mundo");
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
