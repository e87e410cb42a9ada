use bustrack::bus::{CrowdLevel, LiveBus};
use bustrack::catalog::Route;
use bustrack::protocol::{current_timestamp, Command, CommandResponse, CommandType, ResponseStatus};
use bustrack::simulator::SimulatorStatus;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8080";
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let matches = App::new("bustrack")
        .version("0.1.0")
        .author("Transit Systems Team")
        .about("🚌 Live bus tracking client - drive, inspect and monitor the bus simulator")
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("host")
                .short("H")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Simulator port")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .global(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table")
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose output")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("ping").about("🏓 Test connection to the bus simulator"),
        )
        .subcommand(
            SubCommand::with_name("status")
                .about("📊 Simulator status")
                .long_about(
                    "Shows uptime, tick count, registered buses and the most recent stop arrivals",
                ),
        )
        .subcommand(
            SubCommand::with_name("routes").about("🗺️  List available routes and their stops"),
        )
        .subcommand(SubCommand::with_name("buses").about("🚌 List live buses"))
        .subcommand(
            SubCommand::with_name("bus")
                .about("🔎 Show one live bus")
                .arg(Arg::with_name("driver").help("Driver / bus id").required(true)),
        )
        .subcommand(
            SubCommand::with_name("start")
                .about("▶️  Start sharing a bus on a route")
                .arg(Arg::with_name("driver").help("Driver / bus id").required(true))
                .arg(
                    Arg::with_name("route")
                        .help("Route id (see 'bustrack routes')")
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("stop")
                .about("⏸️  Stop sharing a bus")
                .arg(Arg::with_name("driver").help("Driver / bus id").required(true)),
        )
        .subcommand(
            SubCommand::with_name("crowd")
                .about("👥 Report the crowd level on a bus")
                .arg(Arg::with_name("driver").help("Driver / bus id").required(true))
                .arg(
                    Arg::with_name("level")
                        .help("Crowd level")
                        .required(true)
                        .possible_values(&["low", "medium", "high"]),
                ),
        )
        .subcommand(
            SubCommand::with_name("monitor")
                .about("📈 Poll live bus positions")
                .long_about("Polls the live bus list on a fixed cadence, the way map views do")
                .arg(
                    Arg::with_name("duration")
                        .short("d")
                        .long("duration")
                        .value_name("SECONDS")
                        .help("Monitor duration in seconds (default: until Ctrl+C)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("refresh")
                        .short("r")
                        .long("refresh")
                        .value_name("MS")
                        .help("Polling interval in milliseconds")
                        .takes_value(true)
                        .default_value("2000"),
                ),
        )
        .subcommand(
            SubCommand::with_name("server")
                .about("🚀 Start the bus simulator server")
                .arg(
                    Arg::with_name("background")
                        .short("b")
                        .long("background")
                        .help("Run server in background"),
                ),
        )
        .get_matches();

    let host = matches.value_of("host").unwrap_or(DEFAULT_HOST);
    let port = matches.value_of("port").unwrap_or(DEFAULT_PORT).parse::<u16>()?;
    let format = matches.value_of("format").unwrap_or("table");
    let verbose = matches.is_present("verbose");

    if verbose {
        println!("{}", "🚌 bustrack - Live Bus Tracking".bright_blue().bold());
        println!("{} {}:{}", "Connecting to".dimmed(), host, port);
    }

    let client = Client { host, port, format };

    match matches.subcommand() {
        ("ping", _) => client.ping().await?,
        ("status", _) => client.status().await?,
        ("routes", _) => client.routes().await?,
        ("buses", _) => client.buses().await?,
        ("bus", Some(sub_matches)) => client.bus(required(sub_matches, "driver")?).await?,
        ("start", Some(sub_matches)) => {
            client
                .start(required(sub_matches, "driver")?, required(sub_matches, "route")?)
                .await?
        }
        ("stop", Some(sub_matches)) => client.stop(required(sub_matches, "driver")?).await?,
        ("crowd", Some(sub_matches)) => {
            let level = required(sub_matches, "level")?.parse::<CrowdLevel>()?;
            client.crowd(required(sub_matches, "driver")?, level).await?
        }
        ("monitor", Some(sub_matches)) => client.monitor(sub_matches).await?,
        ("server", Some(sub_matches)) => handle_server(sub_matches, port)?,
        _ => {
            println!("{}", "No command specified. Use --help for usage information.".yellow());
            println!("{}", "Quick start:".bright_green());
            println!("  {} Start the simulator server", "bustrack server".bright_cyan());
            println!("  {} List routes", "bustrack routes".bright_cyan());
            println!("  {} Watch live buses", "bustrack monitor".bright_cyan());
        }
    }

    Ok(())
}

struct Client<'a> {
    host: &'a str,
    port: u16,
    format: &'a str,
}

impl Client<'_> {
    async fn ping(&self) -> CliResult {
        let response = self.send(CommandType::Ping).await?;
        match self.format {
            "json" => print_json(&response)?,
            "compact" => println!("{}", "PONG".bright_green()),
            _ => {
                if response.status == ResponseStatus::Success {
                    println!("{} {}", "✅".green(), "Bus simulator is responsive".bright_green());
                } else {
                    println!("{} {}", "❌".red(), "Ping failed".bright_red());
                }
            }
        }
        Ok(())
    }

    async fn status(&self) -> CliResult {
        let response = self.send(CommandType::SimulatorStatus).await?;
        if self.format == "json" {
            return print_json(&response);
        }

        let status: SimulatorStatus = response_data(&response)?;
        if self.format == "compact" {
            println!(
                "{} | ticks {} | buses {} | routes {}",
                if status.running { "RUNNING".green() } else { "STOPPED".red() },
                status.tick_count,
                status.bus_count,
                status.route_count
            );
            return Ok(());
        }

        println!("{} {}", "📊".bright_blue(), "Simulator Status".bright_blue().bold());
        println!("{}", "════════════════════════".bright_blue());
        println!(
            "{} {}",
            "State:".bright_white(),
            if status.running { "Running".bright_green() } else { "Stopped".bright_red() }
        );
        println!("{} {}s", "Uptime:".bright_white(), status.uptime_seconds);
        println!(
            "{} {} ({} ms period)",
            "Ticks:".bright_white(),
            status.tick_count,
            status.tick_period_ms
        );
        println!("{} {}", "Live buses:".bright_white(), status.bus_count);
        println!("{} {}", "Routes:".bright_white(), status.route_count);
        println!("{} {}", "Commands handled:".bright_white(), status.command_count);
        if let Some(error) = &status.last_error {
            println!("{} {}", "Last error:".bright_white(), error.bright_red());
        }
        if !status.recent_arrivals.is_empty() {
            println!("{}", "Recent arrivals:".bright_white());
            for arrival in status.recent_arrivals.iter().rev().take(5) {
                println!(
                    "  tick {:>6}  {} → {} ({})",
                    arrival.tick,
                    arrival.bus_id.bright_cyan(),
                    arrival.stop_id,
                    arrival.route_id.dimmed()
                );
            }
        }
        Ok(())
    }

    async fn routes(&self) -> CliResult {
        let response = self.send(CommandType::GetAvailableRoutes).await?;
        if self.format == "json" {
            return print_json(&response);
        }

        let routes: Vec<Route> = response_data(&response)?;
        for route in &routes {
            if self.format == "compact" {
                println!(
                    "{} {} ({} stops)",
                    route.id.bright_cyan(),
                    route.name,
                    route.stop_count()
                );
                continue;
            }
            println!(
                "{} {} {}",
                "🗺️ ".bright_blue(),
                route.id.bright_cyan().bold(),
                route.name.bright_white()
            );
            for (index, stop) in route.stops.iter().enumerate() {
                println!(
                    "    {:>2}. {} {} {}",
                    index,
                    stop.name,
                    stop.id.dimmed(),
                    stop.location.to_string().dimmed()
                );
            }
        }
        Ok(())
    }

    async fn buses(&self) -> CliResult {
        let response = self.send(CommandType::GetLiveBuses).await?;
        if self.format == "json" {
            return print_json(&response);
        }

        let buses: Vec<LiveBus> = response_data(&response)?;
        if buses.is_empty() {
            println!("{}", "No live buses".yellow());
            return Ok(());
        }
        if self.format == "compact" {
            for bus in &buses {
                print_bus_compact(bus);
            }
        } else {
            print_bus_table(&buses);
        }
        Ok(())
    }

    async fn bus(&self, driver_id: &str) -> CliResult {
        let response = self
            .send(CommandType::GetBus {
                driver_id: driver_id.to_string(),
            })
            .await?;
        if self.format == "json" {
            return print_json(&response);
        }
        if response.status != ResponseStatus::Success {
            print_failure("Lookup", &response);
            return Ok(());
        }

        let bus: LiveBus = response_data(&response)?;
        if self.format == "compact" {
            print_bus_compact(&bus);
        } else {
            print_bus_table(std::slice::from_ref(&bus));
        }
        Ok(())
    }

    async fn start(&self, driver_id: &str, route_id: &str) -> CliResult {
        let response = self
            .send(CommandType::StartBusSimulation {
                driver_id: driver_id.to_string(),
                route_id: route_id.to_string(),
            })
            .await?;
        self.print_result("Location sharing", &format!("{} on {}", driver_id, route_id), &response)
    }

    async fn stop(&self, driver_id: &str) -> CliResult {
        let response = self
            .send(CommandType::StopBusSimulation {
                driver_id: driver_id.to_string(),
            })
            .await?;
        self.print_result("Location sharing", &format!("stopped for {}", driver_id), &response)
    }

    async fn crowd(&self, driver_id: &str, level: CrowdLevel) -> CliResult {
        let response = self
            .send(CommandType::UpdateCrowdLevel {
                driver_id: driver_id.to_string(),
                level,
            })
            .await?;
        self.print_result("Crowd level", &format!("{} for {}", level, driver_id), &response)
    }

    async fn monitor(&self, matches: &ArgMatches<'_>) -> CliResult {
        let refresh_ms = matches.value_of("refresh").unwrap_or("2000").parse::<u64>()?;
        let refresh = Duration::from_millis(refresh_ms);
        let duration = match matches.value_of("duration") {
            Some(seconds) => Some(Duration::from_secs(seconds.parse::<u64>()?)),
            None => None,
        };

        println!("{}", "📡 Monitoring live buses (Press Ctrl+C to stop)...".bright_blue().bold());
        let started = Instant::now();
        let mut interval = tokio::time::interval(refresh);

        loop {
            interval.tick().await;
            if duration.is_some_and(|limit| started.elapsed() >= limit) {
                break;
            }

            let response = self.send(CommandType::GetLiveBuses).await?;
            match self.format {
                "json" => print_json(&response)?,
                "compact" => {
                    let buses: Vec<LiveBus> = response_data(&response)?;
                    println!("{}", format!("[{}s]", started.elapsed().as_secs()).dimmed());
                    for bus in &buses {
                        print_bus_compact(bus);
                    }
                }
                _ => {
                    let buses: Vec<LiveBus> = response_data(&response)?;
                    println!();
                    println!("{}", format!("── {}s ──", started.elapsed().as_secs()).dimmed());
                    print_bus_table(&buses);
                }
            }
        }

        Ok(())
    }

    fn print_result(&self, action: &str, value: &str, response: &CommandResponse) -> CliResult {
        match self.format {
            "json" => print_json(response)?,
            "compact" => {
                if response.status == ResponseStatus::Success {
                    println!("{}", "OK".bright_green());
                } else {
                    println!("{}", "FAILED".bright_red());
                }
            }
            _ => {
                if response.status == ResponseStatus::Success {
                    println!("{} {} {}", "✅".green(), action.bright_white(), value.bright_cyan());
                } else {
                    print_failure(action, response);
                }
            }
        }
        Ok(())
    }

    async fn send(&self, command_type: CommandType) -> CliResult<CommandResponse> {
        let command = Command::new(next_command_id(), command_type);
        send_command(self.host, self.port, &command).await
    }
}

async fn send_command(host: &str, port: u16, command: &Command) -> CliResult<CommandResponse> {
    let addr = format!("{}:{}", host, port);
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!(
                "{} Failed to connect to bus simulator at {}",
                "❌".red(),
                addr.bright_white()
            );
            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                eprintln!("{} Server is not running. Start it with:", "💡".yellow());
                eprintln!("   {}", "bustrack server".bright_cyan());
                eprintln!("   or");
                eprintln!("   {}", "cargo run --bin bustrack-simulator".bright_cyan());
            } else {
                eprintln!("{} Network error: {}", "🔌".yellow(), e.to_string().bright_red());
            }
            return Err(e.into());
        }
    };

    let (reader, mut writer) = stream.into_split();
    let request = serde_json::to_string(command)?;

    let line = tokio::time::timeout(RESPONSE_TIMEOUT, async move {
        writer.write_all(request.as_bytes()).await?;
        writer.write_all(b"\n").await?;

        let mut line = String::new();
        BufReader::new(reader).read_line(&mut line).await?;
        Ok::<String, std::io::Error>(line)
    })
    .await
    .map_err(|_| {
        eprintln!("{} Timed out waiting for a response from {}", "⏰".yellow(), addr);
        std::io::Error::new(std::io::ErrorKind::TimedOut, "response timeout")
    })??;

    Ok(serde_json::from_str(line.trim())?)
}

fn handle_server(matches: &ArgMatches<'_>, port: u16) -> CliResult {
    let background = matches.is_present("background");

    println!("{}", "🚀 Starting bus simulator server...".bright_green().bold());

    let mut cmd = std::process::Command::new("cargo");
    cmd.args(["run", "--bin", "bustrack-simulator", "--", "--port"]);
    cmd.arg(port.to_string());

    if background {
        cmd.spawn()?;
        println!("{} Server started in background on port {}", "✅".green(), port);
    } else {
        println!(
            "{} Server starting on port {} (Press Ctrl+C to stop)",
            "🌐".bright_blue(),
            port
        );
        cmd.status()?;
    }

    Ok(())
}

// Helper functions

fn required<'a>(matches: &'a ArgMatches<'_>, name: &str) -> CliResult<&'a str> {
    matches
        .value_of(name)
        .ok_or_else(|| format!("missing argument <{}>", name).into())
}

fn next_command_id() -> u32 {
    (current_timestamp() as u32).max(1)
}

fn response_data<T: serde::de::DeserializeOwned>(response: &CommandResponse) -> CliResult<T> {
    if response.status != ResponseStatus::Success {
        let message = response.message.as_deref().unwrap_or("request failed");
        return Err(format!("{:?}: {}", response.status, message).into());
    }
    let data = response.data.clone().ok_or("response carried no data")?;
    Ok(serde_json::from_value(data)?)
}

fn print_json(response: &CommandResponse) -> CliResult {
    println!("{}", serde_json::to_string(response)?);
    Ok(())
}

fn print_failure(action: &str, response: &CommandResponse) {
    let message = response.message.as_deref().unwrap_or("Unknown error");
    println!("{} {} failed: {}", "❌".red(), action.bright_white(), message.bright_red());
    if message.contains("route not found") {
        println!("{} List routes with: {}", "💡".yellow(), "bustrack routes".bright_cyan());
    }
}

fn crowd_badge(level: CrowdLevel) -> ColoredString {
    match level {
        CrowdLevel::Low => "low".bright_blue(),
        CrowdLevel::Medium => "medium".yellow(),
        CrowdLevel::High => "high".bright_red(),
    }
}

fn print_bus_compact(bus: &LiveBus) {
    println!(
        "{} {} {} next={} {}",
        bus.id.bright_cyan(),
        bus.route_id,
        bus.location,
        bus.next_stop_index,
        crowd_badge(bus.crowd_level)
    );
}

fn print_bus_table(buses: &[LiveBus]) {
    println!(
        "{}",
        format!(
            "│ {:<12} │ {:<10} │ {:>11} │ {:>11} │ {:>4} │ {:<8} │ {:>6} │",
            "BUS", "ROUTE", "LON", "LAT", "NEXT", "CROWD", "KM/H"
        )
        .bright_white()
        .bold()
    );
    for bus in buses {
        println!(
            "│ {:<12} │ {:<10} │ {:>11.6} │ {:>11.6} │ {:>4} │ {:<8} │ {:>6.1} │",
            bus.id.bright_cyan(),
            bus.route_id,
            bus.location.lon,
            bus.location.lat,
            bus.next_stop_index,
            crowd_badge(bus.crowd_level),
            bus.speed
        );
    }
}
