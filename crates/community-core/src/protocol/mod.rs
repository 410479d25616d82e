//! Protocol module: worker request/response unions and directory reply parsing.

pub mod messages;
pub mod replies;

pub use messages::*;
pub use replies::{
    parse_server_listing, DirectoryInfo, LoginReply, ProbeReply, ProtocolError, ServerDetails,
    INVALID_HOST,
};
