//! Route handlers.

pub mod chat;
pub mod schreiben;
pub mod status;
pub mod tts;
