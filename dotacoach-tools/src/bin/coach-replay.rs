// coach-replay
//
// Stand-in for the coaching backend: serves the lines of a JSON-lines file
// to every websocket client that connects, one frame per interval. Lines
// are sent verbatim, so a file can include broken frames on purpose.

use dotacoach_tools::{init_logging, print_usage, tool_opts, tool_parseopts};
use getopts::Matches;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tungstenite::Message;

struct Replay {
    frames: Vec<String>,
    interval: Duration,
    looped: bool,
}

fn serve_client(stream: TcpStream, replay: Arc<Replay>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "?".to_string());
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            log::warn!("{}: handshake failed: {}", peer, e);
            return;
        }
    };
    log::info!("{}: connected", peer);

    let mut sent = 0usize;
    'replay: loop {
        for frame in &replay.frames {
            if let Err(e) = ws.send(Message::Text(frame.clone())) {
                log::info!("{}: gone after {} frames ({})", peer, sent, e);
                return;
            }
            sent += 1;
            thread::sleep(replay.interval);
        }
        if !replay.looped {
            break 'replay;
        }
    }

    log::info!("{}: replay done, {} frames", peer, sent);
    let _ = ws.close(None);
    while ws.read().is_ok() {}
}

fn load_frames(matches: &Matches) -> Result<Vec<String>, String> {
    let path = match (matches.opt_str("i"), matches.free.first()) {
        (Some(path), _) => path,
        (None, Some(path)) => path.clone(),
        (None, None) => return Err("no input file".to_string()),
    };
    let text = std::fs::read_to_string(&path).map_err(|e| format!("{}: {}", path, e))?;
    let frames: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if frames.is_empty() {
        return Err(format!("{}: no frames", path));
    }
    Ok(frames)
}

fn main() -> ExitCode {
    let mut opts = tool_opts();
    opts.optopt("p", "", "TCP port to listen on (default 8080)", "port");
    opts.optopt("i", "", "JSON-lines file with one frame per line", "file");
    opts.optopt("", "interval", "Milliseconds between frames (default 500)", "ms");
    opts.optflag("", "loop", "Restart from the first frame when done");

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "coach-replay".into());
    let brief = "Serve recorded snapshots to coaching clients.";

    let matches = match tool_parseopts(&opts, &args) {
        Ok(m) => m,
        Err(f) => {
            eprintln!("ERROR: {}", f);
            print_usage(&opts, &program, brief);
            return ExitCode::FAILURE;
        }
    };
    if matches.opt_present("help") {
        print_usage(&opts, &program, brief);
        return ExitCode::SUCCESS;
    }
    init_logging(&matches, log::LevelFilter::Info, env_logger::Target::Stdout);

    let port: u16 = match matches.opt_str("p").unwrap_or_else(|| "8080".into()).parse() {
        Ok(p) => p,
        Err(_) => {
            eprintln!("ERROR: invalid port");
            return ExitCode::FAILURE;
        }
    };
    let interval = match matches
        .opt_str("interval")
        .unwrap_or_else(|| "500".into())
        .parse()
    {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            eprintln!("ERROR: invalid interval");
            return ExitCode::FAILURE;
        }
    };
    let frames = match load_frames(&matches) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            print_usage(&opts, &program, brief);
            return ExitCode::FAILURE;
        }
    };
    let replay = Arc::new(Replay {
        frames,
        interval,
        looped: matches.opt_present("loop"),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("ERROR: cannot listen on {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "serving {} frames on ws://{}/ws every {:?}",
        replay.frames.len(),
        addr,
        replay.interval
    );

    for connection in listener.incoming() {
        match connection {
            Ok(stream) => {
                let replay = replay.clone();
                thread::spawn(move || serve_client(stream, replay));
            }
            Err(e) => log::warn!("accept failed: {}", e),
        }
    }
    ExitCode::SUCCESS
}
