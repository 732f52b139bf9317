use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, MediaDeviceInfo, MediaDeviceKind};

/// Descriptor de cámara. El label puede venir vacío si el navegador aún
/// no concedió permiso de cámara.
#[derive(Clone, PartialEq, Debug)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

/// Prioriza la cámara trasera de forma fiable:
/// 1) por label (back|rear|environment, sin distinguir mayúsculas)
/// 2) si los labels vienen vacíos y hay varias, la última enumerada
///    (suele ser la trasera en móviles)
/// 3) si no, la única disponible
pub fn pick_back_camera(cams: &[CameraDevice]) -> Option<&CameraDevice> {
    let labeled = cams.iter().find(|c| {
        let label = c.label.to_lowercase();
        label.contains("back") || label.contains("rear") || label.contains("environment")
    });
    labeled.or_else(|| cams.last())
}

/// Enumera las cámaras disponibles del dispositivo.
pub async fn enumerate_cameras() -> Result<Vec<CameraDevice>, String> {
    let devices = window()
        .ok_or("Sin window")?
        .navigator()
        .media_devices()
        .map_err(|_| "El navegador no expone mediaDevices".to_string())?;

    let promise = devices
        .enumerate_devices()
        .map_err(|_| "No se pudieron enumerar dispositivos".to_string())?;

    let list = JsFuture::from(promise)
        .await
        .map_err(|_| "Fallo enumerando dispositivos".to_string())?;

    let cams = js_sys::Array::from(&list)
        .iter()
        .filter_map(|item| {
            let info = item.dyn_into::<MediaDeviceInfo>().ok()?;
            if info.kind() != MediaDeviceKind::Videoinput {
                return None;
            }
            Some(CameraDevice {
                id: info.device_id(),
                label: info.label(),
            })
        })
        .collect();

    Ok(cams)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam(id: &str, label: &str) -> CameraDevice {
        CameraDevice {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn prefiere_label_de_camara_trasera() {
        let cams = vec![
            cam("1", "Front Camera"),
            cam("2", "Back Camera"),
            cam("3", "Telephoto"),
        ];
        assert_eq!(pick_back_camera(&cams).unwrap().id, "2");

        let cams = vec![cam("1", "camara frontal"), cam("2", "ENVIRONMENT facing")];
        assert_eq!(pick_back_camera(&cams).unwrap().id, "2");
    }

    #[test]
    fn sin_labels_elige_la_ultima() {
        let cams = vec![cam("1", ""), cam("2", ""), cam("3", "")];
        assert_eq!(pick_back_camera(&cams).unwrap().id, "3");
    }

    #[test]
    fn una_sola_camara() {
        let cams = vec![cam("1", "")];
        assert_eq!(pick_back_camera(&cams).unwrap().id, "1");
    }

    #[test]
    fn sin_camaras_no_hay_eleccion() {
        assert_eq!(pick_back_camera(&[]), None);
    }
}
