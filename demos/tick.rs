use std::fs::File;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use signal_hook::consts::signal::*;
use signal_hook::flag;

use unidaemon::{Daemon, DaemonConfig, IoMode, Launch, Stdio, StreamSet};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root = std::env::current_dir()?;
    let lock_path = root.join("tick.lock");

    // The lock target must already exist; the library never creates it.
    if !lock_path.exists() {
        File::create(&lock_path)?;
    }

    let config = DaemonConfig::new()
        .env_dir(&root)
        .as_daemon(true)
        .lock_file(&lock_path)
        .pid_file(root.join("tick.pid"))
        .io_mode(IoMode::Daemon)
        .log_dir("log")
        .daemon_streams(StreamSet {
            stdin: Stdio::Devnull,
            stdout: Stdio::from("tick.log"),
            stderr: Stdio::from("tick.err"),
        });

    println!("launching ticker; logs under {}", root.join("log").display());

    let daemon = Daemon::new(config).on_exit(|| println!("[tick] cleanup ran"));

    let handle = match daemon.launch()? {
        Launch::Parent { .. } => {
            println!("detached; pid recorded in {}", root.join("tick.pid").display());
            return Ok(());
        }
        Launch::Daemon(handle) => handle,
    };

    // Graceful stop on SIGTERM (service stop) or SIGINT
    let term = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, Arc::clone(&term))?;
    flag::register(SIGINT, Arc::clone(&term))?;

    println!("[tick] service started, pid {}", std::process::id());

    let mut tick = 0u64;
    while !term.load(Ordering::Relaxed) {
        // println! lands in log/tick.log after redirection
        println!("[tick] ping #{}", tick);
        tick += 1;
        thread::sleep(Duration::from_secs(3));
    }

    println!("[tick] stop signal received, shutting down");
    handle.exit(0)
}
