use atty::Stream;
use clap::Parser;
use color_eyre::Result;
use pyship_core::GlobalOptions;
use tracing_subscriber::EnvFilter;

mod cli;
mod dispatch;
mod style;

use cli::PyshipCli;
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = match PyshipCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors exit 1; --help and --version exit 0.
            let code = i32::from(err.use_stderr());
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_tracing(cli.quiet, cli.trace, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        python: cli.python.clone(),
        config: cli.config.clone(),
    };
    let style = Style::new(cli.no_color, atty::is(Stream::Stderr));

    match dispatch::dispatch_command(&global, cli.command.as_ref(), &style) {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{}", style.failure(&format!("pyship: {err:#}")));
            std::process::exit(pyship_core::exit_code_for(&err));
        }
    }
}

fn init_tracing(quiet: bool, trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_env("PYSHIP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("pyship={level},pyship_core={level}")));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
