//! Nodelink SAP Frame Protocol
//!
//! This crate provides types and utilities for the byte-oriented protocol a
//! host MCU uses to drive a nodelink bridge over a serial link. The protocol
//! groups function codes into service access points (SAPs) by functional
//! area, and every exchange is one of four directions:
//!
//! - **Requests** (host → node): always answered by exactly one confirmation
//! - **Confirmations** (node → host): synchronous reply to a request
//! - **Indications** (node → host): asynchronous events, signalled out of
//!   band on the indication-pending line and delivered on host poll
//! - **Responses** (host → node): acknowledgement of a delivered indication
//!
//! # Example
//!
//! ```rust,ignore
//! use nodelink_protocol::{Request, Frame, FrameCodec};
//!
//! // Build a request frame
//! let req = Request::IndicationPoll;
//! let frame = req.to_frame(0x2A);
//! let bytes = frame.encode();
//!
//! // Parse node output
//! let mut codec = FrameCodec::new();
//! codec.push(&bytes);
//! while let Some(frame) = codec.decode()? {
//!     // ...
//! }
//! ```

mod confirmations;
mod error;
mod frame;
mod function_codes;
mod indications;
mod requests;
mod types;

pub use confirmations::*;
pub use error::*;
pub use frame::*;
pub use function_codes::*;
pub use indications::*;
pub use requests::*;
pub use types::*;
