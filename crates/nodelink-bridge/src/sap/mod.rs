//! Per-SAP request handlers.
//!
//! Each submodule extends [`crate::Bridge`] with the handlers for one
//! service access point. The dispatcher routes a decoded request to
//! exactly one of them and wraps the returned confirmation into a frame.

mod csap;
mod dsap;
mod msap;
mod tsap;

pub use csap::{CSAP_ATTR_NETWORK_ADDRESS, CSAP_ATTR_NETWORK_CHANNEL, CSAP_ATTR_NODE_ADDRESS};
pub use dsap::RESERVED_ENDPOINT_START;
pub use msap::{MSAP_ATTR_AUTOSTART, MSAP_ATTR_MULTICAST_GROUPS, MSAP_ATTR_STACK_STATUS};
