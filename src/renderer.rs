use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::arbiter::CommandArbiter;
use crate::pattern::{LedColor, Pattern, PatternCommand};
use crate::sink;

/// One rendered snapshot of the whole strip for a single tick.
pub type Frame = Vec<LedColor>;

/// Trailing pixels behind the head of a flow sweep.
const TAIL_LENGTH: u32 = 10;

/// The brainwave step counter and gradient positions live on a 0..256 wheel.
const GRADIENT_WHEEL: u32 = 256;

/// Per-animation timing state. Reset whenever the active command changes,
/// advanced only by `render`. `cycle_start` never moves backwards and
/// never runs ahead of the clock that feeds `render`.
pub struct AnimationCursor {
    cycle_start: u64,
    step: u32,
    epoch: u64,
}

impl AnimationCursor {
    pub fn new(now_ms: u64) -> AnimationCursor {
        return AnimationCursor {
            cycle_start: now_ms,
            step: 0,
            epoch: 0,
        };
    }

    pub fn reset(&mut self, now_ms: u64, epoch: u64) {
        self.cycle_start = now_ms;
        self.step = 0;
        self.epoch = epoch;
    }

    /// Epoch of the command this cursor was last reset for.
    pub fn epoch(&self) -> u64 {
        return self.epoch;
    }
}

/// Render one frame for `command` at `now_ms`. Apart from advancing the
/// cursor this is a pure function of its inputs. The command's brightness
/// is applied to the finished frame, so the per-pattern functions work in
/// full intensity.
pub fn render(
    command: &PatternCommand,
    cursor: &mut AnimationCursor,
    now_ms: u64,
    num_pixels: usize,
) -> Frame {
    let mut frame = match command.pattern {
        Pattern::Idle => render_static(command.color, num_pixels),
        Pattern::TakingOff => render_flow(command, cursor, now_ms, num_pixels, FlowDirection::Up),
        Pattern::Landing => render_flow(command, cursor, now_ms, num_pixels, FlowDirection::Down),
        Pattern::Hovering | Pattern::Flying | Pattern::Emergency | Pattern::LowBattery => {
            render_blink(command, cursor, now_ms, num_pixels)
        }
        Pattern::Brainwave => render_brainwave(command, cursor, now_ms, num_pixels),
    };
    for color in frame.iter_mut() {
        color.naive_scale(command.brightness);
    }
    return frame;
}

fn render_static(color: LedColor, num_pixels: usize) -> Frame {
    return vec![color; num_pixels];
}

fn render_blink(
    command: &PatternCommand,
    cursor: &mut AnimationCursor,
    now_ms: u64,
    num_pixels: usize,
) -> Frame {
    let speed = command.speed as u64;
    if speed == 0 {
        // Degenerate period: stay lit.
        return render_static(command.color, num_pixels);
    }
    let elapsed = now_ms.saturating_sub(cursor.cycle_start);
    let crossed = elapsed / speed;
    if crossed > 0 {
        // Advance by whole half-periods instead of snapping to `now`, so
        // uneven tick spacing cannot drift the phase.
        cursor.cycle_start += crossed * speed;
        cursor.step = (cursor.step + (crossed % 2) as u32) % 2;
    }
    if cursor.step == 0 {
        return render_static(command.color, num_pixels);
    }
    return vec![LedColor::BLACK; num_pixels];
}

#[derive(Clone, Copy)]
enum FlowDirection {
    Up,
    Down,
}

// A lit segment of TAIL_LENGTH pixels sweeps the strip once per
// `num_pixels + TAIL_LENGTH` steps, fading linearly from the head to the
// tail end. The extra steps let the tail run fully off the strip before
// the head re-enters. Advances at most one step per tick, keeping the
// motion uniform under tick jitter.
fn render_flow(
    command: &PatternCommand,
    cursor: &mut AnimationCursor,
    now_ms: u64,
    num_pixels: usize,
    direction: FlowDirection,
) -> Frame {
    let steps_per_cycle = num_pixels as u32 + TAIL_LENGTH;
    let step_duration = command.speed as u64 / steps_per_cycle as u64;
    let elapsed = now_ms.saturating_sub(cursor.cycle_start);
    if elapsed >= step_duration {
        cursor.cycle_start = now_ms;
        cursor.step = (cursor.step + 1) % steps_per_cycle;
    }

    let mut frame = vec![LedColor::BLACK; num_pixels];
    for offset in 0..TAIL_LENGTH {
        let position = cursor.step as i64 - offset as i64;
        if position < 0 || position >= num_pixels as i64 {
            continue;
        }
        let index = match direction {
            FlowDirection::Up => position as usize,
            FlowDirection::Down => num_pixels - 1 - position as usize,
        };
        let mut color = command.color;
        color.naive_scale((255 * (TAIL_LENGTH - offset) / TAIL_LENGTH) as u8);
        frame[index] = color;
    }
    return frame;
}

// Hue wheel for the brainwave sweep; the command color is not consulted,
// only its brightness and speed.
fn gradient_color(pos: u32) -> LedColor {
    if pos < 85 {
        // Blue to purple.
        let progress = (pos * 3) as u8;
        return LedColor::new(progress, progress / 2, 255);
    }
    if pos < 170 {
        // Purple to pink.
        let progress = ((pos - 85) * 3) as u8;
        return LedColor::new(255, 127 - progress / 2, 255 - progress);
    }
    // Pink back to blue.
    let progress = ((pos - 170) * 3) as u8;
    return LedColor::new(255 - progress, 0, progress);
}

fn render_brainwave(
    command: &PatternCommand,
    cursor: &mut AnimationCursor,
    now_ms: u64,
    num_pixels: usize,
) -> Frame {
    let elapsed = now_ms.saturating_sub(cursor.cycle_start);
    if elapsed >= command.speed as u64 {
        cursor.cycle_start = now_ms;
        cursor.step = (cursor.step + 1) % GRADIENT_WHEEL;
    }

    let mut frame = Vec::with_capacity(num_pixels);
    for i in 0..num_pixels {
        let gradient_pos =
            (cursor.step + i as u32 * GRADIENT_WHEEL / num_pixels as u32) % GRADIENT_WHEEL;
        let mut color = gradient_color(gradient_pos);
        // Sinusoidal pulse layered on the gradient sweep.
        let wave = ((gradient_pos + cursor.step) as f32 * 0.05).sin() * 0.3 + 0.7;
        color.naive_scale((wave * 255.0) as u8);
        frame.push(color);
    }
    return frame;
}

pub struct RenderThreadData {
    pub arbiter: Arc<CommandArbiter>,

    /// Socket of the pixel driver that displays our frames.
    pub socket: UnixStream,
    pub num_pixels: usize,

    /// Epoch of the monotonic millisecond clock shared with the
    /// ingestion thread.
    pub started: Instant,
}

/// Self-paced rendering loop. Reads the arbiter exactly once per tick and
/// never blocks on it; a command adopted mid-frame is picked up on the
/// next tick. Runs until the pixel driver goes away.
pub fn render_thread(mut data: RenderThreadData) {
    let mut cursor = AnimationCursor::new(0);
    loop {
        let now_ms = data.started.elapsed().as_millis() as u64;
        let (command, epoch) = data.arbiter.current();
        if epoch != cursor.epoch() {
            cursor.reset(now_ms, epoch);
        }
        let frame = render(&command, &mut cursor, now_ms, data.num_pixels);
        if let Err(err) = sink::write_frame(&mut data.socket, &frame) {
            println!("[led] pixel driver went away: {}", err);
            break;
        }
        thread::sleep(Duration::from_millis(1000 / 60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 30;

    fn full_brightness(pattern: Pattern) -> PatternCommand {
        let mut command = pattern.default_command();
        command.brightness = 255;
        return command;
    }

    #[test]
    fn static_fills_the_strip() {
        let command = full_brightness(Pattern::Idle);
        let mut cursor = AnimationCursor::new(0);
        let frame = render(&command, &mut cursor, 12345, N);
        assert_eq!(frame.len(), N);
        for color in frame {
            assert_eq!(color, LedColor::new(0, 0, 255));
        }
    }

    #[test]
    fn blink_alternates_every_period() {
        // HOVERING blinks at 1000 ms per half-period.
        let command = full_brightness(Pattern::Hovering);
        let mut cursor = AnimationCursor::new(0);

        // Lit for the whole first window after a reset.
        for now in [0, 500, 999] {
            let frame = render(&command, &mut cursor, now, N);
            assert_eq!(frame[0], LedColor::new(0, 255, 0), "at {} ms", now);
        }
        // Off for the second window.
        for now in [1000, 1500, 1999] {
            let frame = render(&command, &mut cursor, now, N);
            assert_eq!(frame[0], LedColor::BLACK, "at {} ms", now);
        }
        // Lit again.
        let frame = render(&command, &mut cursor, 2000, N);
        assert_eq!(frame[0], LedColor::new(0, 255, 0));
    }

    #[test]
    fn blink_phase_survives_uneven_ticks() {
        let command = full_brightness(Pattern::Hovering);
        let mut cursor = AnimationCursor::new(0);
        // A 2300 ms gap crosses two whole periods; parity is unchanged
        // and the next boundary stays at 3000 ms, not 3300 ms.
        let frame = render(&command, &mut cursor, 2300, N);
        assert_eq!(frame[0], LedColor::new(0, 255, 0));
        assert_eq!(cursor.cycle_start, 2000);
        let frame = render(&command, &mut cursor, 3100, N);
        assert_eq!(frame[0], LedColor::BLACK);
    }

    #[test]
    fn blink_with_zero_speed_stays_lit() {
        let mut command = full_brightness(Pattern::Flying);
        command.speed = 0;
        let mut cursor = AnimationCursor::new(0);
        for now in [0, 1, 100000] {
            let frame = render(&command, &mut cursor, now, N);
            assert_eq!(frame[0], LedColor::new(255, 255, 255));
        }
    }

    #[test]
    fn flow_up_sweeps_with_fading_tail() {
        let command = full_brightness(Pattern::TakingOff);
        let mut cursor = AnimationCursor::new(0);
        cursor.step = 20;

        // Keep elapsed below the step duration so the step stays put.
        // speed 100 over 40 steps = 2 ms per step.
        cursor.cycle_start = 100;
        let frame = render(&command, &mut cursor, 101, N);

        // Head at full intensity, fading toward the tail end.
        assert_eq!(frame[20], LedColor::new(0, 255, 0));
        assert!(frame[19].g() < frame[20].g());
        assert!(frame[11].g() < frame[19].g());
        assert!(frame[11].g() > 0);
        // Beyond the tail and ahead of the head: dark.
        assert_eq!(frame[10], LedColor::BLACK);
        assert_eq!(frame[21], LedColor::BLACK);
    }

    #[test]
    fn flow_down_mirrors_the_index() {
        let command = full_brightness(Pattern::Landing);
        let mut cursor = AnimationCursor::new(0);
        cursor.step = 5;
        cursor.cycle_start = 100;
        let frame = render(&command, &mut cursor, 101, N);
        // Head position 5 maps to pixel N-1-5.
        assert_eq!(frame[N - 1 - 5], LedColor::new(255, 255, 0));
        assert_eq!(frame[N - 1], scaled(LedColor::new(255, 255, 0), 127));
    }

    #[test]
    fn flow_step_advances_and_wraps() {
        let command = full_brightness(Pattern::TakingOff);
        let steps_per_cycle = N as u32 + TAIL_LENGTH;
        let mut cursor = AnimationCursor::new(0);
        cursor.step = steps_per_cycle - 1;
        // Step duration is 2 ms; 10 ms elapsed crosses it.
        render(&command, &mut cursor, 10, N);
        assert_eq!(cursor.step, 0);
        assert_eq!(cursor.cycle_start, 10);
    }

    #[test]
    fn brainwave_pulses_and_wraps_mod_256() {
        let command = Pattern::Brainwave.default_command();
        let mut cursor = AnimationCursor::new(0);
        cursor.step = 255;
        let frame = render(&command, &mut cursor, 1000, N);
        assert_eq!(cursor.step, 0);
        assert_eq!(frame.len(), N);
        // Position 0 on the wheel is pure blue, scaled by the sine floor
        // (0.7) and then the default brightness (180).
        assert_eq!(frame[0].r(), 0);
        assert_eq!(frame[0].g(), 0);
        assert!(frame[0].b() > 100 && frame[0].b() < 180);
        // Spatial phase shift: not every pixel shares a color.
        assert!(frame.iter().any(|c| *c != frame[0]));
    }

    #[test]
    fn brightness_zero_blacks_everything_out() {
        let mut command = Pattern::Idle.default_command();
        command.brightness = 0;
        let mut cursor = AnimationCursor::new(0);
        let frame = render(&command, &mut cursor, 0, N);
        for color in frame {
            assert_eq!(color, LedColor::BLACK);
        }
    }

    #[test]
    fn cursor_reset_restarts_phase() {
        let command = full_brightness(Pattern::Hovering);
        let mut cursor = AnimationCursor::new(0);
        // Run into the dark half-period.
        let frame = render(&command, &mut cursor, 1500, N);
        assert_eq!(frame[0], LedColor::BLACK);
        // A reset (new epoch) starts a fresh lit window at `now`.
        cursor.reset(1500, 1);
        assert_eq!(cursor.epoch(), 1);
        let frame = render(&command, &mut cursor, 1600, N);
        assert_eq!(frame[0], LedColor::new(0, 255, 0));
    }

    fn scaled(mut color: LedColor, scale: u8) -> LedColor {
        color.naive_scale(scale);
        return color;
    }
}
