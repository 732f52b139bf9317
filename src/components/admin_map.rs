use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::prelude::*;
use yew::prelude::*;

use crate::models::MapData;

const MAP_CONTAINER_ID: &str = "admin-map";
const MAP_POLL_MS: u32 = 3 * 60 * 1000; // 3 minutos

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = initAdminMap)]
    fn init_admin_map(container_id: &str);

    #[wasm_bindgen(js_name = updateAdminMap)]
    fn update_admin_map(drivers_json: &str, packages_json: &str);
}

#[derive(Properties, PartialEq)]
pub struct AdminMapProps {
    pub data: MapData,
    pub on_refresh: Callback<()>,
}

/// Formatea la marca de tiempo del backend (ISO sin zona) para "última
/// señal". Cualquier cosa no parseable se muestra como "—".
fn fmt_last_seen(at: &Option<String>) -> String {
    let Some(raw) = at else { return "—".to_string() };
    raw.trim_end_matches('Z')
        .parse::<chrono::NaiveDateTime>()
        .map(|dt| dt.format("%d/%m %H:%M").to_string())
        .unwrap_or_else(|_| "—".to_string())
}

/// Mapa del admin. El renderizado (tiles, markers, popups) corre en la
/// librería JS del host detrás del seam FFI; este componente solo empuja
/// los datos serializados y pide refrescos.
#[function_component(AdminMap)]
pub fn admin_map(props: &AdminMapProps) -> Html {
    // init una sola vez, con un pequeño delay para que el contenedor
    // exista en el DOM
    use_effect_with((), move |_| {
        Timeout::new(100, || init_admin_map(MAP_CONTAINER_ID)).forget();
        || ()
    });

    // cada cambio de datos se vuelca entero al mapa (reemplazo, no
    // incremento: refrescos duplicados convergen al mismo estado)
    use_effect_with(props.data.clone(), move |data| {
        let drivers = serde_json::to_string(&data.drivers).unwrap_or_default();
        let packages = serde_json::to_string(&data.packages).unwrap_or_default();
        update_admin_map(&drivers, &packages);
        || ()
    });

    // refresco periódico; desmontar cancela el intervalo
    {
        let on_refresh = props.on_refresh.clone();
        use_effect_with((), move |_| {
            let interval = Interval::new(MAP_POLL_MS, move || on_refresh.emit(()));
            move || drop(interval)
        });
    }

    let last_signals: Html = props
        .data
        .drivers
        .iter()
        .map(|d| {
            html! {
                <div class="small" key={d.id.to_string()}>
                    {"🚚 "}<b>{&d.full_name}</b>{" "}
                    <span class="tag">{format!("@{}", d.username)}</span>
                    {format!(" • Última señal: {}", fmt_last_seen(&d.at))}
                </div>
            }
        })
        .collect();

    html! {
        <div class="card" style="margin-top:16px">
            <div class="headerRow">
                <h2 style="margin:0">{"Mapa (drivers + pedidos con GPS)"}</h2>
                <button class="btn secondary" onclick={props.on_refresh.reform(|_| ())}>{"Actualizar"}</button>
            </div>
            <div class="small">
                {"Drivers se actualizan cada "}<b>{"3 minutos"}</b>
                {". Los pedidos aparecen solo si el repartidor dio permiso de GPS al cerrar."}
            </div>

            <div id={MAP_CONTAINER_ID} style="margin-top:12px;height:360px;border-radius:16px;overflow:hidden"></div>

            { last_signals }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatea_timestamps_del_backend() {
        // isoformat() de Python, sin zona
        assert_eq!(
            fmt_last_seen(&Some("2025-03-01T10:05:00.123456".to_string())),
            "01/03 10:05"
        );
        assert_eq!(
            fmt_last_seen(&Some("2025-12-31T23:59:59".to_string())),
            "31/12 23:59"
        );
    }

    #[test]
    fn sin_marca_o_basura_muestra_guion() {
        assert_eq!(fmt_last_seen(&None), "—");
        assert_eq!(fmt_last_seen(&Some("ayer".to_string())), "—");
    }
}
