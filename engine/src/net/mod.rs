// Wire layer: length-prefixed frames carrying JSON message bodies.
pub mod connection;
pub mod framer;
pub mod protocol;

pub use connection::Connection;
pub use framer::{ByteOrder, FrameCodec, HeaderFormat, HeaderWidth};
