/// A single LED color in r,g,b order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedColor {
    data: [u8; 3],
}

impl LedColor {
    pub const BLACK: LedColor = LedColor::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> LedColor {
        return LedColor { data: [r, g, b] };
    }

    pub fn r(&self) -> u8 {
        return self.data[0];
    }

    pub fn g(&self) -> u8 {
        return self.data[1];
    }

    pub fn b(&self) -> u8 {
        return self.data[2];
    }

    // Initialize from a u32 that looks like 0x00RRGGBB.
    pub fn from_u32_rgb(x: u32) -> LedColor {
        return LedColor {
            data: [
                ((x >> 16) & 0xff) as u8,
                ((x >> 8) & 0xff) as u8,
                (x & 0xff) as u8,
            ],
        };
    }

    // Render as 0x00RRGGBB.
    pub fn to_u32_rgb(&self) -> u32 {
        return ((self.data[0] as u32) << 16)
            | ((self.data[1] as u32) << 8)
            | (self.data[2] as u32);
    }

    /// Scale every channel by `(scale + 1) / 256`, so 255 is the identity.
    pub fn naive_scale(&mut self, scale: u8) {
        let scale32 = scale as u32;
        self.data[0] = (self.data[0] as u32 * (scale32 + 1) / 256) as u8;
        self.data[1] = (self.data[1] as u32 * (scale32 + 1) / 256) as u8;
        self.data[2] = (self.data[2] as u32 * (scale32 + 1) / 256) as u8;
    }
}

/// The closed set of flight states the drone can report on its strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    Idle,
    TakingOff,
    Hovering,
    Flying,
    Landing,
    Emergency,
    LowBattery,
    Brainwave,
}

pub const ALL_PATTERNS: [Pattern; 8] = [
    Pattern::Idle,
    Pattern::TakingOff,
    Pattern::Hovering,
    Pattern::Flying,
    Pattern::Landing,
    Pattern::Emergency,
    Pattern::LowBattery,
    Pattern::Brainwave,
];

const DEFAULT_BRIGHTNESS: u8 = 128;

const COLOR_BLUE: LedColor = LedColor::new(0, 0, 255);
const COLOR_GREEN: LedColor = LedColor::new(0, 255, 0);
const COLOR_WHITE: LedColor = LedColor::new(255, 255, 255);
const COLOR_YELLOW: LedColor = LedColor::new(255, 255, 0);
const COLOR_RED: LedColor = LedColor::new(255, 0, 0);
const COLOR_ORANGE: LedColor = LedColor::new(255, 165, 0);
const COLOR_CYAN_BLUE: LedColor = LedColor::new(0, 100, 255);

// Pattern speeds (ms per cycle).
const SPEED_STATIC: u16 = 0;
const SPEED_SLOW_BLINK: u16 = 1000;
const SPEED_FAST_BLINK: u16 = 200;
const SPEED_FLOW: u16 = 100;
const SPEED_BRAINWAVE: u16 = 50;

impl Pattern {
    /// Canonical wire name, as it appears in `led_command` payloads.
    pub fn name(&self) -> &'static str {
        return match self {
            Pattern::Idle => "IDLE",
            Pattern::TakingOff => "TAKING_OFF",
            Pattern::Hovering => "HOVERING",
            Pattern::Flying => "FLYING",
            Pattern::Landing => "LANDING",
            Pattern::Emergency => "EMERGENCY",
            Pattern::LowBattery => "LOW_BATTERY",
            Pattern::Brainwave => "BRAINWAVE",
        };
    }

    /// Exact, case-sensitive match against the canonical names. Anything
    /// else resolves to `Idle`; an unrecognized name is defined fallback
    /// behavior, not an error.
    pub fn from_name(name: &str) -> Pattern {
        return match name {
            "IDLE" => Pattern::Idle,
            "TAKING_OFF" => Pattern::TakingOff,
            "HOVERING" => Pattern::Hovering,
            "FLYING" => Pattern::Flying,
            "LANDING" => Pattern::Landing,
            "EMERGENCY" => Pattern::Emergency,
            "LOW_BATTERY" => Pattern::LowBattery,
            "BRAINWAVE" => Pattern::Brainwave,
            _ => Pattern::Idle,
        };
    }

    /// The default visual configuration for this pattern.
    pub fn default_command(&self) -> PatternCommand {
        let (color, brightness, speed) = match self {
            Pattern::Idle => (COLOR_BLUE, DEFAULT_BRIGHTNESS, SPEED_STATIC),
            Pattern::TakingOff => (COLOR_GREEN, DEFAULT_BRIGHTNESS, SPEED_FLOW),
            Pattern::Hovering => (COLOR_GREEN, DEFAULT_BRIGHTNESS, SPEED_SLOW_BLINK),
            Pattern::Flying => (COLOR_WHITE, DEFAULT_BRIGHTNESS, SPEED_FAST_BLINK),
            Pattern::Landing => (COLOR_YELLOW, DEFAULT_BRIGHTNESS, SPEED_FLOW),
            Pattern::Emergency => (COLOR_RED, DEFAULT_BRIGHTNESS, SPEED_FAST_BLINK),
            Pattern::LowBattery => (COLOR_ORANGE, DEFAULT_BRIGHTNESS, SPEED_SLOW_BLINK),
            // Brighter for visibility.
            Pattern::Brainwave => (COLOR_CYAN_BLUE, 180, SPEED_BRAINWAVE),
        };
        return PatternCommand {
            pattern: *self,
            color,
            brightness,
            speed,
        };
    }
}

/// A fully resolved command: the pattern plus the visual parameters to
/// render it with. Built by the codec (or from catalog defaults) and
/// replaced, never mutated, when a new command arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatternCommand {
    pub pattern: Pattern,
    pub color: LedColor,
    pub brightness: u8,
    /// Milliseconds per animation cycle; 0 means static.
    pub speed: u16,
}
