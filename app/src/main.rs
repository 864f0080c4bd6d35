mod app;
mod clipboard;
mod task;
mod tray;
mod window;

use clap::Parser;

/// Clipboard translator living in the system tray.
///
/// Run without flags to start the primary instance (tray icon + window).
/// `--activate` wakes an already-running instance instead.
#[derive(Parser)]
#[command(name = "linguatray", version)]
struct Cli {
    /// Wake the running instance, translate the current clipboard, exit.
    #[arg(long)]
    activate: bool,
}

fn main() -> anyhow::Result<()> {
    // Quiet by default; RUST_LOG opens the taps.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let cli = Cli::parse();
    if cli.activate {
        std::process::exit(activate_running_instance());
    }

    app::run()
}

/// Secondary invocation: one send, no retry, then exit with a distinct
/// code: 0 delivered, 1 no running instance, 2 transport or call failure.
fn activate_running_instance() -> i32 {
    let service = match ipc::ActivationService::new_client() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("linguatray: {e}");
            return e.exit_code();
        }
    };
    match service.request_activation() {
        Ok(()) => {
            log::info!("activation delivered via {}", service.transport_name());
            0
        }
        Err(e) => {
            eprintln!("linguatray: {e}");
            e.exit_code()
        }
    }
}
