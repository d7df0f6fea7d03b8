#[macro_use]
extern crate rouille;

use std::io;
use std::net::UdpSocket;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use serde::Serialize;

use dronelight::arbiter::{CommandArbiter, LinkStatus};
use dronelight::args::DaemonArgs;
use dronelight::codec;
use dronelight::renderer;

const STATS_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Serialize, Debug)]
struct StatusResponse {
    connected: bool,
    message_count: u32,
    last_message_ms_ago: Option<u64>,
    pattern: String,
    color: [u8; 3],
    brightness: u8,
    speed: u16,
    uptime_seconds: u64,
}

impl StatusResponse {
    fn from_status(status: &LinkStatus, now_ms: u64) -> StatusResponse {
        let command = status.command;
        return StatusResponse {
            connected: status.connected,
            message_count: status.message_count,
            last_message_ms_ago: status.last_receive_ms.map(|at| now_ms.saturating_sub(at)),
            pattern: command.pattern.name().to_string(),
            color: [command.color.r(), command.color.g(), command.color.b()],
            brightness: command.brightness,
            speed: command.speed,
            uptime_seconds: now_ms / 1000,
        };
    }
}

#[derive(Serialize, Debug)]
struct AboutResponse {
    version: String,
    instance_name: String,
}

fn millis_since(started: Instant) -> u64 {
    return started.elapsed().as_millis() as u64;
}

/// Receives datagrams from the base station and feeds decoded commands to
/// the arbiter. Rejected payloads are logged and dropped; they never touch
/// the active command or the link bookkeeping.
fn ingest_thread(socket: UdpSocket, arbiter: Arc<CommandArbiter>, started: Instant) {
    let mut buffer = [0u8; codec::MAX_MESSAGE_SIZE];
    loop {
        let (len, peer) = match socket.recv_from(&mut buffer) {
            Ok(received) => received,
            Err(err) => {
                println!("[link] receive error: {}", err);
                continue;
            }
        };
        match codec::decode(&buffer[..len]) {
            Ok(command) => {
                println!(
                    "[link] {} bytes from {}: {} rgb [{},{},{}] brightness {} speed {} ms",
                    len,
                    peer,
                    command.pattern.name(),
                    command.color.r(),
                    command.color.g(),
                    command.color.b(),
                    command.brightness,
                    command.speed,
                );
                arbiter.adopt(command, millis_since(started));
            }
            Err(err) => {
                println!("[link] rejected {} bytes from {}: {}", len, peer, err);
            }
        }
    }
}

fn print_stats(arbiter: &CommandArbiter, started: Instant) {
    let now_ms = millis_since(started);
    let status = arbiter.status(now_ms);
    let command = status.command;
    println!("========================================");
    println!("uptime:       {} s", now_ms / 1000);
    println!("messages rx:  {}", status.message_count);
    match status.last_receive_ms {
        Some(at) => println!("last message: {} ms ago", now_ms.saturating_sub(at)),
        None => println!("last message: never"),
    }
    println!(
        "link:         {}",
        if status.connected {
            "CONNECTED"
        } else {
            "DISCONNECTED"
        }
    );
    println!(
        "pattern:      {} rgb [{},{},{}] brightness {} speed {} ms",
        command.pattern.name(),
        command.color.r(),
        command.color.g(),
        command.color.b(),
        command.brightness,
        command.speed,
    );
    println!("========================================");
}

fn stats_thread(arbiter: Arc<CommandArbiter>, started: Instant) {
    loop {
        thread::sleep(STATS_INTERVAL);
        print_stats(&arbiter, started);
    }
}

fn status_server(
    bind: String,
    instance_name: String,
    arbiter: Arc<CommandArbiter>,
    started: Instant,
) {
    let version: &str = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown");
    println!("[status] listening on {}", bind);
    rouille::start_server(bind, move |request| {
        rouille::log(&request, io::stdout(), || {
            router!(request,
                (GET) (/) => {
                    rouille::Response::redirect_302("/status")
                },

                (GET) (/status) => {
                    let now_ms = millis_since(started);
                    let status = arbiter.status(now_ms);
                    rouille::Response::json(&StatusResponse::from_status(&status, now_ms))
                },

                (GET) (/about) => {
                    let about = AboutResponse {
                        version: version.to_string(),
                        instance_name: instance_name.clone(),
                    };
                    rouille::Response::json(&about)
                },

                _ => rouille::Response::empty_404()
            )
        })
    });
}

fn main() -> anyhow::Result<()> {
    let args = DaemonArgs::parse();
    let socket = UnixStream::connect(&args.pixel_socket)?;
    let udp = UdpSocket::bind(&args.listen)?;
    println!("[link] listening on {}", args.listen);

    let arbiter = Arc::new(CommandArbiter::new());
    let started = Instant::now();

    {
        let arbiter = arbiter.clone();
        thread::spawn(move || ingest_thread(udp, arbiter, started));
    }
    {
        let arbiter = arbiter.clone();
        let bind = args.status_bind.clone();
        let instance_name = args.instance_name.clone();
        thread::spawn(move || status_server(bind, instance_name, arbiter, started));
    }
    {
        let arbiter = arbiter.clone();
        thread::spawn(move || stats_thread(arbiter, started));
    }

    print_stats(&arbiter, started);

    // The render loop owns the main thread; it keeps animating the last
    // good command no matter what the link does.
    renderer::render_thread(renderer::RenderThreadData {
        arbiter,
        socket,
        num_pixels: args.leds_count,
        started,
    });
    return Ok(());
}
