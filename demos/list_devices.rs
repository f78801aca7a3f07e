use openfam::credentials::HostCredentials;
use openfam::discovery::{DeviceSummary, DeviceView, Reconciler, partition_by_reachability};
use openfam::session::Session;
use std::error::Error;
use std::process;

fn print_devices(title: &str, devices: &[&DeviceView], router_ip: &str) {
    println!("{}", "-".repeat(70));
    println!("{title} ({})", devices.len());
    println!("{}", "-".repeat(70));
    for device in devices {
        let router = if device.ip == router_ip { " (router)" } else { "" };
        println!(
            "  {:<15} {:<17} {:<20} {}{router}",
            device.ip,
            device.mac,
            device.label.as_deref().unwrap_or("Unknown"),
            device.interface
        );
    }
}

async fn run(json: bool) -> Result<(), Box<dyn Error>> {
    let credentials = HostCredentials::from_env()?;
    let router_ip = credentials.host.clone();
    let mut reconciler = Reconciler::new(Session::new(credentials));

    let result = reconciler.discover().await;
    reconciler.close().await;
    let devices = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    let (connected, offline) = partition_by_reachability(&devices);
    print_devices("Connected", &connected, &router_ip);
    if !offline.is_empty() {
        print_devices("Offline", &offline, &router_ip);
    }

    let summary = DeviceSummary::from_devices(&devices);
    println!("{}", "-".repeat(70));
    println!(
        "Total: {} device{}  |  {} connected  |  {} offline",
        summary.total,
        if summary.total == 1 { "" } else { "s" },
        summary.connected,
        summary.offline
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let json = std::env::args().any(|arg| arg == "--json");
    if let Err(err) = run(json).await {
        eprintln!("Failed to fetch devices: {err}");
        let kind = err
            .downcast_ref::<openfam::error::DiscoveryError>()
            .map(|e| e.kind())
            .or_else(|| {
                err.downcast_ref::<openfam::error::ConnectError>()
                    .map(|e| e.kind())
            });
        if let Some(kind) = kind {
            for line in kind.guidance() {
                eprintln!("  - {line}");
            }
        }
        process::exit(1);
    }
}
