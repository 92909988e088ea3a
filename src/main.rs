use smallsh::flags::Flags;
use smallsh::shell::Shell;
use std::env;
use tracing_subscriber::EnvFilter;

fn init_logging(flags: &Flags) {
    let filter = if flags.is_set("debug") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SMALLSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), smallsh::error::ShellError> {
    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    flags.parse(&args)?;

    if flags.is_set("help") {
        flags.print_help();
        return Ok(());
    }

    if flags.is_set("version") {
        println!("smallsh {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logging(&flags);

    let mut shell = Shell::new(&flags)?;
    shell.run()
}
