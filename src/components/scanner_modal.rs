use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use yew::prelude::*;

use crate::utils::camera;
use crate::utils::scanner_ffi;

const SCANNER_REGION_ID: &str = "qr-region";

#[derive(Properties, PartialEq)]
pub struct ScannerModalProps {
    pub open: bool,
    pub on_close: Callback<()>,
    pub on_result: Callback<String>,
}

/// Modal de escaneo. Rust elige la cámara (preferencia por la trasera) y
/// recibe el texto decodificado; la decodificación en sí corre en la
/// librería JS del host detrás del seam de scanner_ffi.
#[function_component(ScannerModal)]
pub fn scanner_modal(props: &ScannerModalProps) -> Html {
    let err = use_state(String::new);

    {
        let err = err.clone();
        let on_close = props.on_close.clone();
        let on_result = props.on_result.clone();

        use_effect_with(props.open, move |open| {
            let started = *open;
            if started {
                err.set(String::new());
                wasm_bindgen_futures::spawn_local(async move {
                    match camera::enumerate_cameras().await {
                        Ok(cams) => {
                            let Some(back) = camera::pick_back_camera(&cams).cloned() else {
                                err.set("No se detectó cámara".to_string());
                                return;
                            };
                            log::info!("📷 Escaneando con cámara: {}", if back.label.is_empty() { &back.id } else { &back.label });

                            let on_decoded = Closure::wrap(Box::new(move |text: JsValue| {
                                if let Some(text) = text.as_string() {
                                    log::info!("📱 Código escaneado: {}", text);
                                    on_result.emit(text);
                                    on_close.emit(());
                                }
                            })
                                as Box<dyn FnMut(JsValue)>);
                            let on_error = {
                                let err = err.clone();
                                Closure::wrap(Box::new(move |e: JsValue| {
                                    err.set(
                                        e.as_string()
                                            .unwrap_or_else(|| "Error del escáner".to_string()),
                                    );
                                })
                                    as Box<dyn FnMut(JsValue)>)
                            };

                            scanner_ffi::start_qr_scanner(
                                SCANNER_REGION_ID,
                                &back.id,
                                on_decoded.as_ref().unchecked_ref(),
                                on_error.as_ref().unchecked_ref(),
                            );
                            // forget() mantiene los closures vivos mientras la
                            // librería JS los tenga registrados; stopQrScanner
                            // deja de invocarlos al cerrar el modal
                            on_decoded.forget();
                            on_error.forget();
                        }
                        Err(e) => err.set(e),
                    }
                });
            }

            move || {
                if started {
                    scanner_ffi::stop_qr_scanner();
                }
            }
        });
    }

    if !props.open {
        return html! {};
    }

    html! {
        <div class="modalBackdrop" onclick={props.on_close.reform(|_| ())}>
            <div class="card modal" onclick={Callback::from(|e: MouseEvent| e.stop_propagation())}>
                <div class="row" style="justify-content:space-between;align-items:center">
                    <h3>{"Escanear"}</h3>
                    <button class="btn secondary" onclick={props.on_close.reform(|_| ())}>{"Cerrar"}</button>
                </div>
                <div class="small">{"Si falla: más luz, menos movimiento. Vida real 😅"}</div>
                { if !err.is_empty() { html! { <div class="bad">{(*err).clone()}</div> } } else { html! {} } }
                <hr />
                <div id={SCANNER_REGION_ID} />
            </div>
        </div>
    }
}
