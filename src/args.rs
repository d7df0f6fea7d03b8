use clap::Parser;

/// Renders drone flight status on the LED strip, driven by commands
/// received over the air.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct DaemonArgs {
    /// UDP address to listen on for led_command datagrams.
    #[clap(short, long, default_value = "0.0.0.0:3131")]
    pub listen: String,

    /// Path to the listening socket of the pixel driver.
    #[clap(short, long)]
    pub pixel_socket: String,

    /// The listen address of the HTTP status endpoint.
    #[clap(short, long, default_value = "localhost:1313")]
    pub status_bind: String,

    /// A unique identifier for this node.
    #[clap(short, long, default_value = "dronelight-drone")]
    pub instance_name: String,

    /// How many LEDs the strip contains.
    #[clap(short = 'n', long, default_value = "30")]
    pub leds_count: usize,
}

/// Operator console that sends LED commands to the drone node.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct BaseArgs {
    /// UDP address of the drone-side daemon.
    #[clap(short, long)]
    pub target: String,

    /// Local UDP address to bind for sending.
    #[clap(short, long, default_value = "0.0.0.0:0")]
    pub bind: String,
}

/// Debug stand-in for the pixel driver.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct DummyArgs {
    /// Path of the unix socket to listen on.
    #[clap(short, long)]
    pub unix_socket: String,
}
