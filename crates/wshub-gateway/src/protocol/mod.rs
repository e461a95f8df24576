//! Wire protocol definitions
//!
//! Defines message discriminators, frame formats, and payloads.

mod message_type;
mod messages;
mod payloads;

pub use message_type::MessageType;
pub use messages::{ClientMessage, DecodeError, InboundMessage, ServerMessage, INVALID_FORMAT};
pub use payloads::{timestamp, ChannelAckPayload, ErrorPayload, PongPayload, WelcomePayload};
