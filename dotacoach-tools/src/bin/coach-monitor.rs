// coach-monitor
//
// Live coaching dashboard for the Dota 2 feed.
//
// Build: cargo run --release --bin coach-monitor -- [options]
// Quit:  q / Esc / Ctrl-C

use chrono::{DateTime, Local};
use crossbeam::channel;
use crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::{cursor, event, style, terminal, ExecutableCommand, QueueableCommand};
use dotacoach::feed::{CloseReason, FeedEvent};
use dotacoach::session::{Connection, SessionEvent, SessionStats};
use dotacoach::view::{BuybackView, DashboardView, ViewModel, VitalView};
use dotacoach_tools::config::MonitorConfig;
use dotacoach_tools::render::{format_event, gauge, Severity};
use dotacoach_tools::{coach_opts, coach_parseopts, init_logging, print_usage};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant, SystemTime};

#[derive(Debug)]
struct Cli {
    endpoint: String,
    fps: u64,
    retry: Option<Duration>,
    quiet: bool,
    event_log_size: usize,
}

fn parse_cli() -> Result<Cli, ExitCode> {
    let mut opts = coach_opts();
    opts.optopt("c", "config", "YAML config file", "file");
    opts.optopt("", "fps", "UI refresh rate (default 10)", "n");
    opts.optopt(
        "",
        "retry",
        "Reopen the feed this many seconds after it drops (default: never)",
        "sec",
    );
    opts.optopt(
        "",
        "event-log-size",
        "Max events to show in log (default 5)",
        "n",
    );
    opts.optopt("", "log", "Write log output to this file", "file");
    opts.optflag("", "quiet", "Suppress footer hint");

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "coach-monitor".into());
    let brief = "Live coaching dashboard for the Dota 2 feed.";
    let (matches, endpoint) = match coach_parseopts(&opts, &args) {
        Ok(m) => m,
        Err(f) => {
            eprintln!("ERROR: {}", f);
            print_usage(&opts, &program, brief);
            return Err(ExitCode::FAILURE);
        }
    };
    if matches.opt_present("help") {
        print_usage(&opts, &program, brief);
        return Err(ExitCode::SUCCESS);
    }

    let config = match matches.opt_str("config") {
        Some(path) => match MonitorConfig::load(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return Err(ExitCode::FAILURE);
            }
        },
        None => MonitorConfig::default(),
    };

    if let Some(path) = matches.opt_str("log") {
        match std::fs::File::create(&path) {
            Ok(file) => init_logging(
                &matches,
                log::LevelFilter::Info,
                env_logger::Target::Pipe(Box::new(file)),
            ),
            Err(e) => {
                eprintln!("ERROR: cannot create log file {}: {}", path, e);
                return Err(ExitCode::FAILURE);
            }
        }
    }

    let endpoint = if matches.opt_present("e") {
        endpoint
    } else {
        config.endpoint.unwrap_or(endpoint)
    };
    let fps = matches
        .opt_str("fps")
        .and_then(|s| s.parse().ok())
        .or(config.fps)
        .unwrap_or(10);
    let retry = matches
        .opt_str("retry")
        .and_then(|s| s.parse().ok())
        .or(config.retry_secs)
        .map(|s: u64| Duration::from_secs(s.max(1)));
    let event_log_size = matches
        .opt_str("event-log-size")
        .and_then(|s| s.parse().ok())
        .or(config.event_log_size)
        .unwrap_or(5);
    let quiet = matches.opt_present("quiet") || config.quiet.unwrap_or(false);

    Ok(Cli {
        endpoint,
        fps,
        retry,
        quiet,
        event_log_size,
    })
}

#[derive(Clone)]
struct LoggedEvent {
    timestamp: SystemTime,
    event: String,
    color: Color,
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Green,
        Severity::Warn => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

struct Tui {
    stdout: io::Stdout,
}

impl Tui {
    fn setup() -> io::Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        stdout.execute(terminal::EnterAlternateScreen)?;
        stdout.execute(cursor::Hide)?;
        Ok(Self { stdout })
    }

    fn teardown(&mut self) {
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }

    fn line(&mut self, text: &str, color: Option<Color>, bold: bool) -> io::Result<()> {
        if bold {
            self.stdout.queue(SetAttribute(Attribute::Bold))?;
        }
        if let Some(color) = color {
            self.stdout.queue(SetForegroundColor(color))?;
        }
        self.stdout.queue(style::Print(text))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(cursor::MoveToNextLine(1))?;
        Ok(())
    }

    fn vital(&mut self, name: &str, vital: &VitalView, color: Color) -> io::Result<()> {
        let text = format!("{:<7} {} {:>3}%", name, gauge(vital.percent, 40), vital.percent);
        if vital.low {
            self.line(&text, Some(Color::Red), true)
        } else {
            self.line(&text, Some(color), false)
        }
    }

    fn dashboard(&mut self, dash: &DashboardView) -> io::Result<()> {
        self.line(
            &format!("{:<24} {:^10} {:>24}", dash.hero, dash.clock, format!("K/D/A {}", dash.kda)),
            None,
            true,
        )?;
        self.stdout.queue(cursor::MoveToNextLine(1))?;

        self.vital("HEALTH", &dash.health, Color::Green)?;
        self.vital("MANA", &dash.mana, Color::Blue)?;
        self.stdout.queue(cursor::MoveToNextLine(1))?;

        let objective = format!("OBJECTIVE  {}", dash.strategy.text);
        if dash.strategy.warn {
            self.line(&objective, Some(Color::Yellow), true)?;
        } else {
            self.line(&objective, Some(Color::Cyan), false)?;
        }
        self.stdout.queue(cursor::MoveToNextLine(1))?;

        self.line(
            &format!(
                "GPM {:<6} GOLD {:<7} LH/DN {}/{}",
                dash.gpm, dash.gold, dash.last_hits, dash.denies
            ),
            None,
            false,
        )?;
        let (buyback, color) = match dash.buyback {
            BuybackView::Ready => (dash.buyback.label().to_string(), Color::Green),
            BuybackView::Cooldown => (dash.buyback.label().to_string(), Color::DarkGrey),
            BuybackView::NoGold { shortfall } => (
                format!("{} (missing {})", dash.buyback.label(), shortfall),
                Color::Red,
            ),
        };
        self.line(&format!("BUYBACK    {}", buyback), Some(color), true)?;

        let banners = dash.banners();
        if !banners.is_empty() {
            self.stdout.queue(cursor::MoveToNextLine(1))?;
            for alert in banners {
                self.line(&format!(">> {} <<", alert), Some(Color::Yellow), true)?;
            }
        }
        Ok(())
    }

    fn draw(
        &mut self,
        header: &str,
        view: &ViewModel,
        event_log: &VecDeque<LoggedEvent>,
        event_log_size: usize,
        quiet: bool,
    ) -> io::Result<()> {
        self.stdout.queue(cursor::MoveTo(0, 0))?;
        self.stdout
            .queue(terminal::Clear(terminal::ClearType::All))?;

        self.line(header, None, true)?;
        self.stdout.queue(cursor::MoveToNextLine(1))?;

        match view {
            ViewModel::Dashboard(dash) => self.dashboard(dash)?,
            waiting => {
                let headline = waiting.headline().unwrap_or_default();
                self.line(headline, Some(Color::White), true)?;
                if let ViewModel::AwaitingConnection = waiting {
                    self.line(
                        "Start Dota 2 and the coaching backend.",
                        Some(Color::DarkGrey),
                        false,
                    )?;
                }
            }
        }

        if !event_log.is_empty() {
            self.stdout.queue(cursor::MoveToNextLine(1))?;
            self.line(
                &format!("Recent Events ({} of {}):", event_log.len(), event_log_size),
                None,
                true,
            )?;
            for logged in event_log {
                let datetime: DateTime<Local> = logged.timestamp.into();
                self.line(
                    &format!("[{}] {}", datetime.format("%H:%M:%S%.3f"), logged.event),
                    Some(logged.color),
                    false,
                )?;
            }
        }

        if !quiet {
            self.stdout.queue(cursor::MoveToNextLine(1))?;
            self.stdout.queue(style::Print("q/Esc to quit"))?;
        }

        self.stdout.flush()
    }
}

fn push_event(log: &mut VecDeque<LoggedEvent>, size: usize, text: String, color: Color) {
    log.push_front(LoggedEvent {
        timestamp: SystemTime::now(),
        event: text,
        color,
    });
    while log.len() > size {
        log.pop_back();
    }
}

fn header(cli: &Cli, conn: &Connection) -> String {
    let SessionStats {
        frames_accepted,
        frames_rejected,
    } = conn.stats();
    format!(
        "coach-monitor - {}  {}  frames={}  dropped={}",
        cli.endpoint,
        conn.status().kind(),
        frames_accepted,
        frames_rejected
    )
}

fn main() -> ExitCode {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let mut tui = match Tui::setup() {
        Ok(tui) => tui,
        Err(e) => {
            eprintln!("ERROR: terminal setup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let mut t = Tui {
            stdout: io::stdout(),
        };
        t.teardown();
        original_hook(panic_info);
    }));

    let mut conn = Connection::new();
    let mut event_log = VecDeque::<LoggedEvent>::new();
    let mut last_attempt: Option<Instant> = None;

    // Keyboard handler
    let (key_tx, key_rx) = channel::unbounded();
    std::thread::spawn(move || loop {
        if let Ok(ev) = event::read() {
            if key_tx.send(ev).is_err() {
                break;
            }
        }
    });

    let frame = Duration::from_millis(1000 / cli.fps.clamp(1, 1000));
    let tick = channel::tick(frame);
    'main: loop {
        if !conn.is_open() {
            let due = match (last_attempt, cli.retry) {
                (None, _) => true,
                (Some(at), Some(retry)) => at.elapsed() >= retry,
                (Some(_), None) => false,
            };
            if due {
                last_attempt = Some(Instant::now());
                if let Err(e) = conn.open(&cli.endpoint) {
                    log::warn!("open {} failed: {}", cli.endpoint, e);
                    push_event(
                        &mut event_log,
                        cli.event_log_size,
                        format!("OPEN FAILED: {}", e),
                        Color::Red,
                    );
                }
            }
        }

        let feed_rx = conn
            .receiver()
            .cloned()
            .unwrap_or_else(channel::never::<FeedEvent>);

        crossbeam::select! {
            recv(key_rx) -> ev => {
                if let Ok(event::Event::Key(k)) = ev {
                    use event::{KeyCode, KeyModifiers};
                    let quit = k.code == KeyCode::Char('q')
                             || k.code == KeyCode::Esc
                             || (k.code == KeyCode::Char('c') && k.modifiers == KeyModifiers::CONTROL);
                    if quit { break 'main; }
                }
            }

            recv(feed_rx) -> ev => {
                let ev = ev.unwrap_or_else(|_| {
                    FeedEvent::Closed(CloseReason::Transport("feed channel disconnected".into()))
                });
                if let Some(session_event) = conn.handle(ev) {
                    let (text, severity) = format_event(&session_event);
                    // Snapshots are the dashboard itself, keep the log for the rest.
                    if !matches!(session_event, SessionEvent::Snapshot(_)) {
                        push_event(&mut event_log, cli.event_log_size, text, severity_color(severity));
                    }
                }
            }

            recv(tick) -> _ => {
                let view = conn.view();
                if tui.draw(&header(&cli, &conn), &view, &event_log, cli.event_log_size, cli.quiet).is_err() {
                    break 'main;
                }
            }
        }
    }

    conn.close();
    tui.teardown();
    ExitCode::SUCCESS
}
