use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::thread;

use clap::Parser;

use dronelight::args::DummyArgs;
use dronelight::sink;

fn handle_client(stream: UnixStream) -> anyhow::Result<()> {
    let mut buffer: [u32; 256] = [0; 256];
    loop {
        let n = sink::read_colors(&stream, &mut buffer)?;
        if n == 0 {
            break;
        }
        println!("got {} colors, head {:06x}", n, buffer[0]);
    }
    return Ok(());
}

/// A debug version of the pixel driver that only prints the frames it
/// would display.
fn main() -> anyhow::Result<()> {
    let args = DummyArgs::parse();
    // It would be cleaner to delete this on shutdown using RAII,
    // but rust doesn't unwind after signals.
    if Path::new(&args.unix_socket).exists() {
        std::fs::remove_file(&args.unix_socket)?;
    }
    let listener = UnixListener::bind(&args.unix_socket)?;
    println!("listening on {}", args.unix_socket);
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                println!("new client");
                thread::spawn(|| handle_client(stream));
            }
            Err(err) => {
                println!("couldn't accept client: {}", err);
                continue;
            }
        }
    }
    return Ok(());
}
