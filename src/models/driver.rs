use serde::{Deserialize, Serialize};

/// Fila de `GET /admin/drivers_stats`. `effectiveness` viene 0..1:
/// entregados / (entregados + fallidos), los pendientes no cuentan.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct DriverStats {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub delivered: u32,
    pub failed: u32,
    pub closed: u32,
    pub effectiveness: f64,
}

/// Última posición conocida de un repartidor. Llega tanto en
/// `GET /admin/map_data` (campo `id`) como en los eventos
/// `DRIVER_LOCATION` del canal en vivo (campo `driver_id`).
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct DriverPosition {
    #[serde(alias = "driver_id")]
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub at: Option<String>,
}

/// Paquete con coordenadas capturadas al cierre (solo aparece en el mapa
/// si el repartidor dio permiso de GPS).
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct MapPackage {
    pub id: i64,
    pub code: String,
    pub status: String,
    pub recipient_name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub at: Option<String>,
}

/// Carga completa del mapa admin.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct MapData {
    #[serde(default)]
    pub drivers: Vec<DriverPosition>,
    #[serde(default)]
    pub packages: Vec<MapPackage>,
}
