use serde::Deserialize;

use crate::models::driver::DriverPosition;

/// Aviso de cierre de paquete empujado por el servidor.
#[derive(Clone, PartialEq, Deserialize, Debug)]
pub struct ClosedNotice {
    pub package_id: i64,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub driver_id: Option<i64>,
    #[serde(default)]
    pub closed_at: Option<String>,
}

/// Evento del canal `/events`. Unión cerrada: los tipos que no conocemos
/// caen en `Other` y el dispatch los ignora en vez de enrutar mal.
#[derive(Clone, PartialEq, Debug)]
pub enum LiveEvent {
    DriverLocation(DriverPosition),
    PackageClosed(ClosedNotice),
    Other,
}

impl LiveEvent {
    /// Parsea un mensaje crudo del canal.
    ///
    /// `None` = payload malformado, se descarta en silencio (el canal es
    /// telemetría de mejor esfuerzo, ningún mensaje suelto es crítico).
    /// `Some(Other)` = JSON válido con tipo desconocido, también se ignora.
    pub fn parse(raw: &str) -> Option<LiveEvent> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let kind = value.get("type").and_then(|t| t.as_str())?;

        match kind {
            "DRIVER_LOCATION" => serde_json::from_value::<DriverPosition>(value)
                .ok()
                .map(LiveEvent::DriverLocation),
            "PACKAGE_CLOSED" => serde_json::from_value::<ClosedNotice>(value)
                .ok()
                .map(LiveEvent::PackageClosed),
            _ => Some(LiveEvent::Other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsea_ubicacion_de_driver() {
        let raw = r#"{"type":"DRIVER_LOCATION","driver_id":7,"full_name":"Repartidor 1","username":"driver1","lat":-12.05,"lng":-77.04,"at":"2025-03-01T10:00:00"}"#;
        match LiveEvent::parse(raw) {
            Some(LiveEvent::DriverLocation(pos)) => {
                assert_eq!(pos.id, 7);
                assert_eq!(pos.username, "driver1");
                assert_eq!(pos.lat, -12.05);
            }
            other => panic!("se esperaba DriverLocation, llegó {:?}", other),
        }
    }

    #[test]
    fn parsea_cierre_de_paquete() {
        let raw = r#"{"type":"PACKAGE_CLOSED","package_id":3,"code":"ZERO0003","status":"delivered","driver_id":7,"closed_at":null}"#;
        match LiveEvent::parse(raw) {
            Some(LiveEvent::PackageClosed(notice)) => {
                assert_eq!(notice.package_id, 3);
                assert_eq!(notice.code, "ZERO0003");
            }
            other => panic!("se esperaba PackageClosed, llegó {:?}", other),
        }
    }

    #[test]
    fn tipo_desconocido_cae_en_other() {
        let raw = r#"{"type":"DRIVER_ON_BREAK","driver_id":7}"#;
        assert_eq!(LiveEvent::parse(raw), Some(LiveEvent::Other));
    }

    #[test]
    fn malformado_se_descarta() {
        // JSON roto
        assert_eq!(LiveEvent::parse("{no es json"), None);
        // sin campo type
        assert_eq!(LiveEvent::parse(r#"{"driver_id":7}"#), None);
        // ubicación sin coordenadas
        assert_eq!(
            LiveEvent::parse(r#"{"type":"DRIVER_LOCATION","driver_id":7}"#),
            None
        );
    }
}
