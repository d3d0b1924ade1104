use thiserror::Error;

/// Errores de las operaciones sobre una sala de reproducción.
///
/// Ninguno de estos errores es fatal para la sala: la operación se
/// rechaza (o aborta) y el estado queda consistente.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("la cola está llena (máximo {max} canciones)")]
    QueueFull { max: usize },

    #[error("la cola está vacía")]
    EmptyQueue,

    #[error("posición {index} fuera de rango (la cola tiene {len} canciones)")]
    InvalidIndex { index: i64, len: usize },

    #[error("el volumen debe estar entre 0 y 100, recibido {0}")]
    InvalidVolume(i64),

    #[error("modo de repetición inválido '{0}', usa off/one/all")]
    InvalidLoopMode(String),

    #[error("no hay nada reproduciéndose")]
    NothingPlaying,

    #[error("no hay nada pausado")]
    NothingPaused,

    /// El transporte de voz rechazó una petición. En el caso de `play`
    /// la pista ya fue devuelta al frente de la cola.
    #[error("fallo del transporte de voz: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Errores de resolución de una búsqueda o enlace a pista.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("falta el término de búsqueda")]
    EmptyQuery,

    /// Se agotaron todos los candidatos; conserva la última causa.
    #[error("la extracción falló tras agotar los candidatos")]
    Exhausted(#[source] ExtractError),

    #[error("ningún resultado fue utilizable")]
    NoResults,

    #[error("la pista no expone ningún stream reproducible")]
    NoPlayableStream,
}

/// Fallo de una única consulta al backend de extracción.
///
/// Si el backend reconoce un identificador numérico de pista dentro de
/// su propio error lo deja en `recovered_track_id`; el protocolo de
/// reintentos lo usa para construir candidatos nuevos sin tener que
/// interpretar texto de error ajeno.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExtractError {
    pub message: String,
    pub recovered_track_id: Option<String>,
}

impl ExtractError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            recovered_track_id: None,
        }
    }

    pub fn with_recovered_id(mut self, id: impl Into<String>) -> Self {
        self.recovered_track_id = Some(id.into());
        self
    }
}
