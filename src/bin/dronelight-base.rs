use std::io::Write;
use std::net::UdpSocket;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::bail;
use clap::Parser;

use dronelight::args::BaseArgs;
use dronelight::codec;
use dronelight::pattern::{LedColor, Pattern};

macro_rules! skip_fail {
    ($res:expr) => {
        match $res {
            Ok(val) => val,
            Err(e) => {
                println!("Invalid value: {}", e);
                continue;
            }
        }
    };
}

struct SendStats {
    sent: u32,
    errors: u32,
}

fn wall_clock_ms() -> u64 {
    return SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0);
}

fn parse_color(value: &str) -> anyhow::Result<LedColor> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 3 {
        bail!("expected R,G,B");
    }
    return Ok(LedColor::new(
        parts[0].trim().parse()?,
        parts[1].trim().parse()?,
        parts[2].trim().parse()?,
    ));
}

fn send_payload(socket: &UdpSocket, target: &str, payload: &[u8], stats: &mut SendStats) {
    if payload.len() > codec::MAX_MESSAGE_SIZE {
        println!(
            "refusing to send {} bytes (link MTU is {})",
            payload.len(),
            codec::MAX_MESSAGE_SIZE
        );
        stats.errors += 1;
        return;
    }
    match socket.send_to(payload, target) {
        Ok(len) => {
            println!("sent {} bytes: {}", len, String::from_utf8_lossy(payload));
            stats.sent += 1;
        }
        Err(err) => {
            println!("send error: {}", err);
            stats.errors += 1;
        }
    }
}

/// Raw JSON passthrough: checked for well-formedness and the required
/// top-level fields, then re-serialized compactly before it goes out.
fn send_raw_json(socket: &UdpSocket, target: &str, line: &str, stats: &mut SendStats) {
    let doc: serde_json::Value = match serde_json::from_str(line) {
        Ok(doc) => doc,
        Err(err) => {
            println!("invalid JSON: {}", err);
            return;
        }
    };
    if doc.get("type").is_none() || doc.get("data").is_none() {
        println!("missing required fields (type, data)");
        return;
    }
    send_payload(socket, target, doc.to_string().as_bytes(), stats);
}

fn print_help() {
    println!("Commands:");
    println!("  pattern=NAME      switch pattern, loading its defaults");
    println!("  color=R,G,B       override the color of the current draft");
    println!("  brightness=NUM    override brightness (0-255)");
    println!("  speed=NUM         override ms per cycle (0-65535, 0 = static)");
    println!("  {{JSON}}            send a raw led_command payload as-is");
    println!("  status            print send counters");
    println!("  help              this text");
    println!("Patterns: IDLE, TAKING_OFF, HOVERING, FLYING,");
    println!("          LANDING, EMERGENCY, LOW_BATTERY, BRAINWAVE");
    println!("Every change is sent immediately.");
}

/// Interactive console on the base side; each accepted line becomes one
/// datagram to the drone.
fn main() -> anyhow::Result<()> {
    let args = BaseArgs::parse();
    let socket = UdpSocket::bind(&args.bind)?;
    println!("sending commands to {}", args.target);
    print_help();

    let mut command = Pattern::Idle.default_command();
    let mut stats = SendStats { sent: 0, errors: 0 };
    let mut input = String::new();
    loop {
        print!("dronelight> ");
        std::io::stdout().flush()?;
        input.clear();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('{') {
            send_raw_json(&socket, &args.target, line, &mut stats);
            continue;
        }
        if line == "help" {
            print_help();
            continue;
        }
        if line == "status" {
            println!(
                "sent: {}, errors: {}, target: {}",
                stats.sent, stats.errors, args.target
            );
            continue;
        }
        let vec: Vec<&str> = line.split('=').collect();
        if vec.len() != 2 {
            println!("expected key=value, raw {{JSON}}, \"status\" or \"help\"");
            continue;
        }
        let (key, value) = (vec[0], vec[1]);
        match key {
            "pattern" => command = Pattern::from_name(value).default_command(),
            "color" => command.color = skip_fail!(parse_color(value)),
            "brightness" => command.brightness = skip_fail!(value.parse::<u8>()),
            "speed" => command.speed = skip_fail!(value.parse::<u16>()),
            _ => {
                println!("unknown key {}", key);
                continue;
            }
        }
        let payload = codec::encode_command(&command, wall_clock_ms());
        send_payload(&socket, &args.target, &payload, &mut stats);
    }
    return Ok(());
}
