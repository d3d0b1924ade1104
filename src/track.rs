use std::fmt;

/// Pista resuelta y lista para reproducir.
///
/// La crea el resolvedor y nunca se modifica después: la cola, el
/// historial y el slot de reproducción comparten clones de este valor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Título para mostrar en anuncios y listados.
    pub title: String,
    /// URL directa del stream de audio (puede ser efímera).
    pub stream_url: String,
    /// URL canónica de la página de la pista.
    pub page_url: String,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        stream_url: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            stream_url: stream_url.into(),
            page_url: page_url.into(),
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.page_url)
    }
}
