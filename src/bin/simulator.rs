use bustrack::config::SimulatorConfig;
use bustrack::server;
use bustrack::simulator::BusSimulator;
use clap::{App, Arg};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("bustrack-simulator")
        .version("0.1.0")
        .about("🚌 Live bus position simulator server")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON config file; command-line flags override its values")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("host")
                .long("host")
                .value_name("HOST")
                .help("Address to bind")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Port to bind")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("tick-ms")
                .short("t")
                .long("tick-ms")
                .value_name("MS")
                .help("Simulation tick period in milliseconds")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("routes")
                .short("r")
                .long("routes")
                .value_name("FILE")
                .help("Route dataset (JSON stop list or GeoJSON) to use instead of the demo routes")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("no-demo-buses")
                .long("no-demo-buses")
                .help("Start with an empty registry instead of the demo buses"),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => SimulatorConfig::load(Path::new(path))?,
        None => SimulatorConfig::default(),
    };
    if let Some(host) = matches.value_of("host") {
        config.host = host.to_string();
    }
    if let Some(port) = matches.value_of("port") {
        config.port = port.parse()?;
    }
    if let Some(tick_ms) = matches.value_of("tick-ms") {
        config.tick_period_ms = tick_ms.parse()?;
    }
    if let Some(routes) = matches.value_of("routes") {
        config.routes_file = Some(PathBuf::from(routes));
    }
    if matches.is_present("no-demo-buses") {
        config.seed_demo_buses = false;
    }

    println!("🚌 Live Bus Position Simulator");
    println!("==============================");

    let bind_address = config.bind_address();
    let mut simulator = BusSimulator::new(config)?;
    simulator.start().await;
    let simulator = Arc::new(Mutex::new(simulator));

    let listener = TcpListener::bind(&bind_address).await?;
    let tcp_simulator = Arc::clone(&simulator);
    let tcp_server = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, tcp_simulator).await {
            error!("TCP server error: {}", e);
        }
    });

    println!("📡 Ready for commands on {}", bind_address);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    tcp_server.abort();
    simulator.lock().await.stop().await;
    println!("🚏 Bus simulator stopped");

    Ok(())
}
