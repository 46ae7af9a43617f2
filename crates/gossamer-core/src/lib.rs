//! gossamer-core: wire format, hash primitive and admission proof of work.
//! All other Gossamer crates depend on this one.

pub mod admission;
pub mod config;
pub mod crypto;
pub mod text;
pub mod time;
pub mod wire;

pub use admission::{
    find_happy_announce_hash_nonce, is_hash_happy, AdmissionError, AdmissionSearch, Nonce,
};
pub use wire::{deserialize, serialize, Message, MessageType, WireError};
