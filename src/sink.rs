use anyhow::bail;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;

use crate::renderer::Frame;

pub fn as_bytes(v: &mut [u32]) -> &mut [u8] {
    unsafe {
        let (_prefix, result, _suffix) = v.align_to_mut::<u8>();
        return result;
    }
}

/// Write one frame to the pixel driver as 0x00RRGGBB words.
pub fn write_frame(stream: &mut UnixStream, frame: &Frame) -> anyhow::Result<()> {
    let mut words: Vec<u32> = frame.iter().map(|color| color.to_u32_rgb()).collect();
    stream.write_all(as_bytes(&mut words[..]))?;
    return Ok(());
}

/// Returns number of u32 color words that were read from the stream.
/// Zero means the peer hung up.
pub fn read_colors(mut stream: &UnixStream, buffer: &mut [u32]) -> anyhow::Result<usize> {
    let n = stream.read(&mut as_bytes(buffer)[..])?;
    if n % 4 != 0 {
        bail!("partial color word ({} bytes)", n);
    }
    return Ok(n / 4);
}
