//! # Player Module
//!
//! Máquina de estados de reproducción por sala.
//!
//! Tres piezas:
//!
//! - [`queue`]: cola FIFO con historial acotado y modos de repetición.
//! - [`room`]: una sala = una cola + pista actual + temporizador de
//!   inactividad, con todas las mutaciones serializadas.
//! - [`manager`]: registro perezoso de salas por identificador.

pub mod manager;
pub mod queue;
pub mod room;

pub use manager::PlayerManager;
pub use queue::{LoopMode, TrackQueue};
pub use room::{EnqueueOutcome, Room, RoomSnapshot};

use std::fmt;

/// Identificador de una sala de reproducción (un guild en Discord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RoomId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
