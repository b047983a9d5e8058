// coach-dump
//
// Prints every session event from the feed, one timestamped line each.

use dotacoach::data::encode;
use dotacoach::session::{Connection, SessionEvent};
use dotacoach_tools::render::format_event;
use dotacoach_tools::{coach_opts, coach_parseopts, init_logging, print_usage, time_format};
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    let mut opts = coach_opts();
    opts.optflag("", "json", "Print accepted snapshots as JSON");
    opts.optopt(
        "n",
        "",
        "Exit after this many snapshots (default: run until the feed closes)",
        "count",
    );

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "coach-dump".into());
    let brief = "Dump the coaching feed as text.";

    macro_rules! die{
        ($f:expr,$($a:tt)*)=>{
        {
            die!(format!($f, $($a)*));
        }
        };
        ($msg:expr)=>{
        {
            eprintln!("ERROR: {}", $msg);
            return ExitCode::FAILURE;
        }
        };
    }

    let (matches, endpoint) = match coach_parseopts(&opts, &args) {
        Ok(m) => m,
        Err(f) => {
            print_usage(&opts, &program, brief);
            die!(f);
        }
    };
    if matches.opt_present("help") {
        print_usage(&opts, &program, brief);
        return ExitCode::SUCCESS;
    }
    init_logging(&matches, log::LevelFilter::Warn, env_logger::Target::Stderr);

    let json = matches.opt_present("json");
    let limit: Option<u64> = match matches.opt_str("n").map(|s| s.parse()) {
        Some(Ok(n)) => Some(n),
        Some(Err(_)) => die!("invalid snapshot count"),
        None => None,
    };
    let tf = time_format(&matches);

    let mut conn = Connection::new();
    if let Err(e) = conn.open(&endpoint) {
        die!("cannot open {}: {}", endpoint, e);
    }

    let mut snapshots = 0u64;
    while conn.is_open() {
        let Some(event) = conn.next_event(Duration::from_secs(1)) else {
            continue;
        };
        let line = match (&event, json) {
            (SessionEvent::Snapshot(s), true) => match encode(s) {
                Ok(text) => text,
                Err(e) => die!("encoding failed: {}", e),
            },
            _ => format_event(&event).0,
        };
        println!("{}{}", chrono::Local::now().format(&tf), line);

        if let SessionEvent::Snapshot(_) = event {
            snapshots += 1;
            if limit.map_or(false, |n| snapshots >= n) {
                break;
            }
        }
    }

    conn.close();
    ExitCode::SUCCESS
}
