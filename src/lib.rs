pub mod canon_path;
pub mod channel;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

pub use channel::{ChannelHub, ConfirmationReply, OutboundMessage};
pub use engine::{BatchReport, FolderReport, MediaEngine};
pub use error::AppError;
