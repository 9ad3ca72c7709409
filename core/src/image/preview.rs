//! Live preview sinks fed after every completed iteration.

#![allow(dead_code)]

use super::Image;
use byteorder::{LittleEndian, WriteBytesExt};
use log::warn;
use std::io::Write;
use std::net::TcpStream;

/// Magic marker prefixed to every preview frame.
const PREVIEW_MAGIC: u32 = 0x4752_4e44;

/// A channel that receives the running average image after each iteration.
/// Failures degrade to a warning; the render never depends on the preview.
pub enum PreviewSink {
    /// Framed name/update messages over a local TCP connection.
    Tcp {
        /// The connected stream.
        stream: TcpStream,

        /// Name under which the sink displays the image.
        name: String,
    },

    /// EXR snapshots overwritten in place.
    File {
        /// The snapshot path.
        path: String,
    },
}

impl PreviewSink {
    /// Connects to a local TCP preview sink.
    ///
    /// * `address` - Socket address, e.g. "127.0.0.1:14158".
    /// * `name`    - Display name for the image.
    pub fn connect(address: &str, name: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(address)?;
        Ok(Self::Tcp {
            stream,
            name: name.to_string(),
        })
    }

    /// Creates a file snapshot sink.
    ///
    /// * `path` - The snapshot path, overwritten on every update.
    pub fn file(path: &str) -> Self {
        Self::File {
            path: path.to_string(),
        }
    }

    /// Sends one update. Errors are logged, not propagated.
    ///
    /// * `image`     - The current running average.
    /// * `iteration` - Number of completed iterations.
    pub fn send(&mut self, image: &Image, iteration: u32) {
        match self {
            Self::Tcp { stream, name } => {
                if let Err(err) = send_update(stream, name, image, iteration) {
                    warn!("dropping preview update for '{name}': {err}");
                }
            }
            Self::File { path } => {
                if let Err(err) = image.write(path) {
                    warn!("dropping preview snapshot: {err}");
                }
            }
        }
    }
}

/// Writes one framed update message: magic, iteration, name, resolution and
/// the raw float pixels, all little endian.
///
/// * `stream`    - The connected stream.
/// * `name`      - Display name for the image.
/// * `image`     - The image payload.
/// * `iteration` - Number of completed iterations.
fn send_update(
    stream: &mut TcpStream,
    name: &str,
    image: &Image,
    iteration: u32,
) -> std::io::Result<()> {
    let mut msg = Vec::with_capacity(32 + name.len() + image.pixels.len() * 12);
    msg.write_u32::<LittleEndian>(PREVIEW_MAGIC)?;
    msg.write_u32::<LittleEndian>(iteration)?;
    msg.write_u32::<LittleEndian>(name.len() as u32)?;
    msg.extend_from_slice(name.as_bytes());
    msg.write_u32::<LittleEndian>(image.width as u32)?;
    msg.write_u32::<LittleEndian>(image.height as u32)?;
    for pixel in image.pixels.iter() {
        msg.write_f32::<LittleEndian>(pixel.r())?;
        msg.write_f32::<LittleEndian>(pixel.g())?;
        msg.write_f32::<LittleEndian>(pixel.b())?;
    }

    stream.write_u32::<LittleEndian>(msg.len() as u32)?;
    stream.write_all(&msg)?;
    stream.flush()
}
