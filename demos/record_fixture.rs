use openfam::credentials::HostCredentials;
use openfam::discovery::Reconciler;
use openfam::probe::check_access;
use openfam::session::{Session, SessionRecorder};
use std::error::Error;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!("Usage: cargo run --example record_fixture -- <output.jsonl>");
}

async fn run(output: &str) -> Result<(), Box<dyn Error>> {
    let recorder = SessionRecorder::new();
    let mut session = Session::new(HostCredentials::from_env()?).with_recorder(recorder.clone());

    let report = check_access(&mut session).await?;
    println!("System Info: {}", report.system_info);
    if let Some(uci) = report.uci_version.as_deref() {
        println!("UCI Version: {uci}");
    }

    let mut reconciler = Reconciler::new(session);
    let devices = reconciler.discover().await;
    reconciler.close().await;
    println!("Discovered {} devices", devices?.len());

    fs::write(output, recorder.to_jsonl()?)?;
    println!("Recording written to {output}");
    Ok(())
}

#[tokio::main]
async fn main() {
    let Some(output) = std::env::args().nth(1) else {
        print_usage();
        process::exit(2);
    };

    if let Err(err) = run(&output).await {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
