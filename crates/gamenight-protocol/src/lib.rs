//! Wire protocol and shared data model for the Gamenight engine.
//!
//! This crate defines the language the rest of the workspace speaks:
//!
//! - **Identity and data model** ([`UserId`], [`GameId`], [`Phase`],
//!   [`Participant`], [`SessionCore`]) — the session fields both games
//!   share.
//! - **Commands** ([`ClientCommand`], [`GameCommand`]) — every inbound
//!   message as a tagged union, validated at the transport boundary.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how messages become bytes.
//!
//! It sits below every other crate and knows nothing about connections,
//! timers, or game rules.

mod codec;
mod command;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use command::{ClientCommand, GameCommand, GameKind};
pub use error::ProtocolError;
pub use types::{
    Direction, GameId, Participant, Phase, PlayerInfo, Recipient, SessionCore,
    Slot, UserId,
};
