// Lectura GPS de un solo disparo. La ubicación es metadata de mejor
// esfuerzo: cualquier fallo (permiso denegado, timeout del dispositivo,
// sin soporte) resuelve a None y el flujo del caller sigue adelante.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, Position, PositionOptions};

use crate::models::GeoFix;

pub const GEO_TIMEOUT_MS: u32 = 7_000;
const GEO_MAX_AGE_MS: u32 = 60_000;

pub async fn current_position(timeout_ms: u32) -> Option<GeoFix> {
    let geolocation = window()?.navigator().geolocation().ok()?;

    // La promesa resuelve siempre (Position o null), nunca rechaza.
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let resolve_ok = resolve.clone();
        let on_ok = Closure::once_into_js(move |pos: Position| {
            let _ = resolve_ok.call1(&JsValue::NULL, &pos.into());
        });

        let resolve_err = resolve.clone();
        let on_err = Closure::once_into_js(move |_err: JsValue| {
            let _ = resolve_err.call1(&JsValue::NULL, &JsValue::NULL);
        });

        let options = PositionOptions::new();
        options.set_enable_high_accuracy(true);
        options.set_timeout(timeout_ms);
        options.set_maximum_age(GEO_MAX_AGE_MS);

        let started = geolocation.get_current_position_with_error_callback_and_options(
            on_ok.unchecked_ref(),
            Some(on_err.unchecked_ref()),
            &options,
        );
        if started.is_err() {
            let _ = resolve.call1(&JsValue::NULL, &JsValue::NULL);
        }
    });

    let result = JsFuture::from(promise).await.ok()?;
    if result.is_null() {
        log::info!("📍 Sin ubicación (permiso denegado o timeout)");
        return None;
    }

    let position: Position = result.dyn_into().ok()?;
    let coords = position.coords();
    Some(GeoFix {
        lat: coords.latitude(),
        lng: coords.longitude(),
    })
}
