use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::config::Config;
use crate::player::room::Room;
use crate::player::RoomId;
use crate::transport::VoiceTransport;

/// Registro global de salas, una por servidor.
///
/// Las salas se crean bajo demanda y cada una serializa sus propias
/// operaciones, así que el registro nunca necesita un lock global.
pub struct PlayerManager {
    rooms: DashMap<RoomId, Arc<Room>>,
    config: Config,
}

impl PlayerManager {
    pub fn new(config: Config) -> Self {
        info!("🎛️ PlayerManager listo ({})", config.summary());
        Self {
            rooms: DashMap::new(),
            config,
        }
    }

    /// Devuelve la sala del id, creándola con el transporte dado si no
    /// existía. Una sala ya creada conserva su transporte original.
    pub fn room(&self, id: RoomId, transport: Arc<dyn VoiceTransport>) -> Arc<Room> {
        self.rooms
            .entry(id)
            .or_insert_with(|| {
                debug!("🏠 Sala nueva: {id}");
                Room::new(id, transport, &self.config)
            })
            .clone()
    }

    /// Sala existente, si la hay.
    pub fn get(&self, id: RoomId) -> Option<Arc<Room>> {
        self.rooms.get(&id).map(|entry| entry.value().clone())
    }

    /// Saca la sala del registro y la devuelve.
    pub fn remove(&self, id: RoomId) -> Option<Arc<Room>> {
        self.rooms.remove(&id).map(|(_, room)| room)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
