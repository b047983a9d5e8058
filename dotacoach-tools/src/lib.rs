pub mod config;
pub mod render;

use dotacoach::feed::util;
use getopts::{Matches, Options};
use log::LevelFilter;
use std::io::Write;

/// Default timestamp prefix for log lines.
pub static DEFAULT_TIME_FORMAT: &str = "%T%.3f ";

/// Options shared by every tool.
pub fn tool_opts() -> Options {
    let mut opts = Options::new();
    opts.optflag("v", "", "Verbose output");
    opts.optflag("d", "", "Debugging output");
    opts.optopt(
        "t",
        "",
        &format!("Timestamp format (default '{}')", DEFAULT_TIME_FORMAT),
        "fmt",
    );
    opts.optflag("h", "help", "Show help");
    opts
}

/// Options for the tools that connect to a feed.
pub fn coach_opts() -> Options {
    let mut opts = tool_opts();
    opts.optopt(
        "e",
        "endpoint",
        &format!("feed endpoint (default {})", util::default_endpoint()),
        "url",
    );
    opts
}

/// Parses `args` (including the program name) against `opts`.
pub fn tool_parseopts(opts: &Options, args: &[String]) -> Result<Matches, getopts::Fail> {
    opts.parse(args.iter().skip(1))
}

/// Like `tool_parseopts`, also returning the endpoint to use. `opts` must
/// come from `coach_opts`.
pub fn coach_parseopts(
    opts: &Options,
    args: &[String],
) -> Result<(Matches, String), getopts::Fail> {
    let matches = tool_parseopts(opts, args)?;
    let endpoint = matches
        .opt_str("e")
        .unwrap_or_else(util::default_endpoint);
    Ok((matches, endpoint))
}

pub fn time_format(matches: &Matches) -> String {
    matches
        .opt_str("t")
        .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string())
}

pub fn print_usage(opts: &Options, program: &str, brief: &str) {
    let brief = format!("Usage: {} [options]\n\n{}", program, brief);
    eprintln!("{}", opts.usage(&brief));
}

/// Installs the logger. `-d`/`-v` pick the level, `RUST_LOG` overrides it,
/// and every line is prefixed with a local timestamp.
pub fn init_logging(matches: &Matches, default: LevelFilter, target: env_logger::Target) {
    let level = if matches.opt_present("d") {
        LevelFilter::Debug
    } else if matches.opt_present("v") {
        LevelFilter::Info
    } else {
        default
    };
    let tf = time_format(matches);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(target)
        .format(move |buf, record| {
            writeln!(
                buf,
                "{}{:<5} {}",
                chrono::Local::now().format(&tf),
                record.level(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parseopts_endpoint() {
        let opts = coach_opts();
        let (matches, endpoint) =
            coach_parseopts(&opts, &args(&["coach-dump", "-e", "ws://10.0.0.2:9000/ws", "-v"]))
                .unwrap();
        assert_eq!(endpoint, "ws://10.0.0.2:9000/ws");
        assert!(matches.opt_present("v"));
        assert_eq!(time_format(&matches), DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn test_parseopts_rejects_unknown() {
        let opts = coach_opts();
        assert!(coach_parseopts(&opts, &args(&["coach-dump", "--bogus"])).is_err());
    }

    #[test]
    fn test_tool_opts_have_no_endpoint() {
        let opts = tool_opts();
        let matches = tool_parseopts(&opts, &args(&["coach-replay", "-d"])).unwrap();
        assert!(matches.opt_present("d"));
        assert!(tool_parseopts(&opts, &args(&["coach-replay", "-e", "ws://x/ws"])).is_err());
    }
}
