pub mod detect;
pub mod message_cache;
