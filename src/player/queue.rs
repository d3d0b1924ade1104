use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::PlayerError;
use crate::track::Track;

/// Modo de repetición de una sala.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopMode {
    #[default]
    Off,
    One,
    All,
}

impl LoopMode {
    /// Modo siguiente en el ciclo off → one → all → off.
    pub fn cycle(self) -> Self {
        match self {
            LoopMode::Off => LoopMode::One,
            LoopMode::One => LoopMode::All,
            LoopMode::All => LoopMode::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoopMode::Off => "off",
            LoopMode::One => "one",
            LoopMode::All => "all",
        }
    }

    /// Sufijo con el que se anuncia el modo; vacío para `Off`.
    pub fn emoji(&self) -> &'static str {
        match self {
            LoopMode::Off => "",
            LoopMode::One => " 🔂",
            LoopMode::All => " 🔁",
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoopMode {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "0" | "none" => Ok(LoopMode::Off),
            "one" | "1" | "single" => Ok(LoopMode::One),
            "all" | "queue" | "2" => Ok(LoopMode::All),
            _ => Err(PlayerError::InvalidLoopMode(s.to_string())),
        }
    }
}

/// Cola FIFO de una sala, con historial de reproducción acotado.
///
/// El historial registra cada pista en el momento en que empieza a
/// sonar (las repeticiones de `LoopMode::One` no cuentan) y descarta la
/// más antigua al superar su capacidad.
#[derive(Debug)]
pub struct TrackQueue {
    items: VecDeque<Track>,
    history: VecDeque<Track>,
    loop_mode: LoopMode,
    max_size: usize,
    max_history: usize,
}

impl TrackQueue {
    pub fn new(max_size: usize, max_history: usize) -> Self {
        Self {
            items: VecDeque::new(),
            history: VecDeque::new(),
            loop_mode: LoopMode::Off,
            max_size,
            max_history,
        }
    }

    /// Agrega una pista al final de la cola; devuelve su posición 1-based.
    pub fn push(&mut self, track: Track) -> Result<usize, PlayerError> {
        if self.items.len() >= self.max_size {
            return Err(PlayerError::QueueFull { max: self.max_size });
        }

        info!("➕ Agregado a la cola: {}", track.title);
        self.items.push_back(track);

        Ok(self.items.len())
    }

    /// Devuelve una pista al frente de la cola.
    ///
    /// Se usa cuando el transporte rechazó reproducirla; no aplica el
    /// tope para no perder la pista.
    pub fn push_front(&mut self, track: Track) {
        self.items.push_front(track);
    }

    /// Decide qué pista suena a continuación según el modo de repetición.
    ///
    /// `finished` es la pista que acaba de terminar sin error, si la
    /// hay: con `LoopMode::One` se repite tal cual, sin tocar la cola
    /// ni el historial. En cualquier otro caso sale la cabeza de la
    /// cola; si la cola está vacía y el modo es `All`, primero se
    /// recarga con el historial completo (del más antiguo al más
    /// reciente). La pista elegida entra al historial aquí mismo.
    pub fn select_next(&mut self, finished: Option<Track>) -> Option<Track> {
        if self.loop_mode == LoopMode::One {
            if let Some(track) = finished {
                info!("🔂 Repitiendo pista: {}", track.title);
                return Some(track);
            }
        }

        let next = match self.items.pop_front() {
            Some(track) => Some(track),
            None if self.loop_mode == LoopMode::All && !self.history.is_empty() => {
                self.items = self.history.clone();
                info!(
                    "🔁 Cola recargada desde el historial ({} pistas)",
                    self.items.len()
                );
                self.items.pop_front()
            }
            None => None,
        };

        if let Some(track) = &next {
            debug!("➡️ Siguiente en cola: {}", track.title);
            self.record_played(track.clone());
        }

        next
    }

    /// Mueve la pista en `from` a la posición `to` (ambas 1-based).
    ///
    /// `from` debe existir; `to` se ajusta al rango `[1, len]`.
    /// Devuelve la pista movida y su posición final.
    pub fn move_track(&mut self, from: i64, to: i64) -> Result<(Track, usize), PlayerError> {
        if self.items.is_empty() {
            return Err(PlayerError::EmptyQueue);
        }

        let len = self.items.len();
        if from < 1 || from > len as i64 {
            return Err(PlayerError::InvalidIndex { index: from, len });
        }

        let target = to.clamp(1, len as i64) as usize;
        let Some(track) = self.items.remove(from as usize - 1) else {
            return Err(PlayerError::InvalidIndex { index: from, len });
        };
        self.items.insert(target - 1, track.clone());

        debug!("📍 Pista movida de posición {} a {}", from, target);
        Ok((track, target))
    }

    /// Quita la pista en la posición `index` (1-based) y la devuelve.
    pub fn remove_track(&mut self, index: i64) -> Result<Track, PlayerError> {
        if self.items.is_empty() {
            return Err(PlayerError::EmptyQueue);
        }

        let len = self.items.len();
        if index < 1 || index > len as i64 {
            return Err(PlayerError::InvalidIndex { index, len });
        }

        let Some(track) = self.items.remove(index as usize - 1) else {
            return Err(PlayerError::InvalidIndex { index, len });
        };

        debug!("❌ Pista eliminada en posición {}", index);
        Ok(track)
    }

    /// Mezcla la cola en sitio; devuelve cuántas pistas se mezclaron.
    pub fn shuffle(&mut self) -> usize {
        if self.items.is_empty() {
            return 0;
        }

        let mut items: Vec<_> = self.items.drain(..).collect();
        let mut rng = rand::thread_rng();
        items.shuffle(&mut rng);
        let count = items.len();
        self.items.extend(items);

        info!("🔀 Cola mezclada ({} pistas)", count);
        count
    }

    /// Limpia la cola (el historial se conserva).
    pub fn clear(&mut self) {
        self.items.clear();
        info!("🗑️ Cola limpiada");
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
        match mode {
            LoopMode::Off => info!("➡️ Repetición desactivada"),
            LoopMode::One => info!("🔂 Repetir pista activado"),
            LoopMode::All => info!("🔁 Repetir cola activado"),
        }
    }

    /// Avanza al siguiente modo de repetición y lo devuelve.
    pub fn cycle_loop(&mut self) -> LoopMode {
        let next = self.loop_mode.cycle();
        self.set_loop_mode(next);
        next
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn tracks(&self) -> &VecDeque<Track> {
        &self.items
    }

    pub fn history(&self) -> &VecDeque<Track> {
        &self.history
    }

    fn record_played(&mut self, track: Track) {
        self.history.push_back(track);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }
}
