// Wrappers para el lector QR del host (html5-qrcode) - sin estado, sin lógica.
// La decodificación es responsabilidad de la librería JS; Rust solo elige
// la cámara y recibe el texto decodificado.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = startQrScanner)]
    pub fn start_qr_scanner(
        container_id: &str,
        device_id: &str,
        on_decoded: &js_sys::Function,
        on_error: &js_sys::Function,
    );

    #[wasm_bindgen(js_name = stopQrScanner)]
    pub fn stop_qr_scanner();
}
