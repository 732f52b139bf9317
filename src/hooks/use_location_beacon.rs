use gloo_timers::callback::Interval;
use yew::prelude::*;

use crate::services::{api_client, geolocation};

const BEACON_INTERVAL_MS: u32 = 3 * 60 * 1000; // 3 minutos

/// Mientras el dashboard del repartidor está montado, publica su posición
/// GPS cada 3 minutos para el mapa del admin. Mejor esfuerzo: sin permiso
/// o sin red no se avisa a nadie. Desmontar cancela el intervalo.
#[hook]
pub fn use_location_beacon() {
    use_effect_with((), move |_| {
        let send = || {
            wasm_bindgen_futures::spawn_local(async {
                if let Some(fix) = geolocation::current_position(geolocation::GEO_TIMEOUT_MS).await
                {
                    if let Err(e) = api_client::update_my_location(fix.lat, fix.lng).await {
                        log::info!("📍 Beacon de ubicación falló (ignorado): {}", e);
                    }
                }
            });
        };

        // primer envío inmediato, luego cada 3 minutos
        send();
        let interval = Interval::new(BEACON_INTERVAL_MS, send);

        move || drop(interval)
    });
}
