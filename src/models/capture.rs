use serde::Serialize;
use thiserror::Error;
use web_sys::File;

/// Fotos mínimas para poder cerrar un paquete. El servidor valida lo
/// mismo por su cuenta; este es el gate del cliente.
pub const MIN_PHOTOS: usize = 2;

/// Posición capturada al cierre. `None` (permiso denegado, timeout, sin
/// soporte) es una resolución válida y nunca bloquea el envío.
#[derive(Clone, Copy, PartialEq, Serialize, Debug)]
pub struct GeoFix {
    pub lat: f64,
    pub lng: f64,
}

/// Archivo elegido en el picker. La identidad es la clave compuesta
/// `(name, size, last_modified)`; `handle` es el File real del navegador
/// (ausente solo en tests).
#[derive(Clone, PartialEq, Debug)]
pub struct PickedFile {
    pub name: String,
    pub size: u64,
    pub last_modified: i64,
    pub handle: Option<File>,
}

impl PickedFile {
    pub fn from_file(file: &File) -> PickedFile {
        PickedFile {
            name: file.name(),
            size: file.size() as u64,
            last_modified: file.last_modified() as i64,
            handle: Some(file.clone()),
        }
    }

    fn key(&self) -> (&str, u64, i64) {
        (&self.name, self.size, self.last_modified)
    }
}

/// Si el cierre es entrega o reporte. El reporte exige motivo.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CloseOutcome {
    Delivered,
    NotDelivered,
}

#[derive(Error, Clone, PartialEq, Debug)]
pub enum CaptureError {
    #[error("Mínimo 2 fotos.")]
    NotEnoughPhotos,
    #[error("Selecciona un motivo.")]
    MissingReason,
    #[error("Paquete ya cerrado.")]
    PackageClosed,
    #[error("No existe la foto {0}.")]
    IndexOutOfBounds(usize),
}

/// Payload listo para el transporte: se vuelca a un FormData multipart
/// en el API client.
#[derive(Clone, PartialEq, Debug)]
pub struct SubmissionPayload {
    pub notes: String,
    pub reason: Option<String>,
    pub fix: Option<GeoFix>,
    pub files: Vec<PickedFile>,
}

/// Evidencias acumuladas para un cierre en curso.
///
/// Acumula selecciones sucesivas (el usuario elige 1 foto, luego otra)
/// sin duplicados, preservando el orden de primera aparición.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct CaptureSession {
    files: Vec<PickedFile>,
}

impl CaptureSession {
    pub fn new() -> CaptureSession {
        CaptureSession::default()
    }

    pub fn files(&self) -> &[PickedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Mezcla una nueva selección. Re-elegir un archivo ya presente es un
    /// no-op para ese archivo.
    pub fn add_files(&mut self, picked: Vec<PickedFile>) {
        for file in picked {
            let duplicate = self.files.iter().any(|f| f.key() == file.key());
            if !duplicate {
                self.files.push(file);
            }
        }
    }

    /// Quita exactamente una foto preservando el orden del resto.
    pub fn remove_at(&mut self, index: usize) -> Result<PickedFile, CaptureError> {
        if index >= self.files.len() {
            return Err(CaptureError::IndexOutOfBounds(index));
        }
        Ok(self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Única precondición del lado cliente para habilitar el cierre.
    pub fn can_submit(&self) -> bool {
        self.files.len() >= MIN_PHOTOS
    }

    /// Ensambla el payload de cierre. Revalida el mínimo de fotos aunque
    /// la UI ya lo haya comprobado, y exige motivo para "no entregado".
    pub fn build_submission(
        &self,
        notes: &str,
        reason: Option<&str>,
        fix: Option<GeoFix>,
        outcome: CloseOutcome,
    ) -> Result<SubmissionPayload, CaptureError> {
        if !self.can_submit() {
            return Err(CaptureError::NotEnoughPhotos);
        }

        let reason = match outcome {
            CloseOutcome::Delivered => None,
            CloseOutcome::NotDelivered => {
                let reason = reason.map(str::trim).filter(|r| !r.is_empty());
                match reason {
                    Some(r) => Some(r.to_string()),
                    None => return Err(CaptureError::MissingReason),
                }
            }
        };

        Ok(SubmissionPayload {
            notes: notes.to_string(),
            reason,
            fix,
            files: self.files.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foto(name: &str, size: u64, modified: i64) -> PickedFile {
        PickedFile {
            name: name.to_string(),
            size,
            last_modified: modified,
            handle: None,
        }
    }

    #[test]
    fn dedup_por_clave_compuesta() {
        let mut session = CaptureSession::new();
        session.add_files(vec![foto("a.jpg", 100, 1), foto("b.jpg", 200, 2)]);
        // re-selección de a.jpg más una nueva
        session.add_files(vec![foto("a.jpg", 100, 1), foto("c.jpg", 300, 3)]);

        let names: Vec<&str> = session.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn mismo_nombre_distinta_clave_no_es_duplicado() {
        let mut session = CaptureSession::new();
        session.add_files(vec![foto("a.jpg", 100, 1), foto("a.jpg", 100, 2)]);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn remove_preserva_orden() {
        let mut session = CaptureSession::new();
        session.add_files(vec![
            foto("a.jpg", 1, 1),
            foto("b.jpg", 2, 2),
            foto("c.jpg", 3, 3),
        ]);

        let quitada = session.remove_at(1).unwrap();
        assert_eq!(quitada.name, "b.jpg");

        let names: Vec<&str> = session.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "c.jpg"]);
    }

    #[test]
    fn remove_fuera_de_rango_no_toca_el_set() {
        let mut session = CaptureSession::new();
        session.add_files(vec![foto("a.jpg", 1, 1)]);

        assert_eq!(session.remove_at(5), Err(CaptureError::IndexOutOfBounds(5)));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn can_submit_exige_dos_fotos_distintas() {
        let mut session = CaptureSession::new();
        assert!(!session.can_submit());

        session.add_files(vec![foto("a.jpg", 1, 1)]);
        assert!(!session.can_submit());

        // duplicado: no cuenta
        session.add_files(vec![foto("a.jpg", 1, 1)]);
        assert!(!session.can_submit());

        session.add_files(vec![foto("b.jpg", 2, 2)]);
        assert!(session.can_submit());
    }

    #[test]
    fn cierre_con_una_foto_se_rechaza_antes_de_red() {
        let mut session = CaptureSession::new();
        session.add_files(vec![foto("a.jpg", 1, 1)]);

        let err = session
            .build_submission("Entregado", None, None, CloseOutcome::Delivered)
            .unwrap_err();
        assert_eq!(err, CaptureError::NotEnoughPhotos);
        assert_eq!(err.to_string(), "Mínimo 2 fotos.");
    }

    #[test]
    fn reporte_sin_motivo_se_rechaza() {
        let mut session = CaptureSession::new();
        session.add_files(vec![foto("a.jpg", 1, 1), foto("b.jpg", 2, 2)]);

        assert_eq!(
            session.build_submission("No entregado", None, None, CloseOutcome::NotDelivered),
            Err(CaptureError::MissingReason)
        );
        // motivo en blanco tampoco vale
        assert_eq!(
            session.build_submission("No entregado", Some("  "), None, CloseOutcome::NotDelivered),
            Err(CaptureError::MissingReason)
        );
    }

    #[test]
    fn entrega_ignora_motivo_y_reporte_lo_lleva() {
        let mut session = CaptureSession::new();
        session.add_files(vec![foto("a.jpg", 1, 1), foto("b.jpg", 2, 2)]);

        let entrega = session
            .build_submission("Entregado", Some("Inaccesible"), None, CloseOutcome::Delivered)
            .unwrap();
        assert_eq!(entrega.reason, None);

        let fix = GeoFix { lat: -12.0464, lng: -77.0428 };
        let reporte = session
            .build_submission("No entregado", Some("Inaccesible"), Some(fix), CloseOutcome::NotDelivered)
            .unwrap();
        assert_eq!(reporte.reason.as_deref(), Some("Inaccesible"));
        assert_eq!(reporte.fix, Some(fix));
        assert_eq!(reporte.files.len(), 2);
    }

    #[test]
    fn la_ubicacion_nunca_es_obligatoria() {
        let mut session = CaptureSession::new();
        session.add_files(vec![foto("a.jpg", 1, 1), foto("b.jpg", 2, 2)]);

        // fix = None (permiso denegado o timeout) y el cierre sale igual
        let payload = session
            .build_submission("Entregado", None, None, CloseOutcome::Delivered)
            .unwrap();
        assert_eq!(payload.fix, None);
    }
}
