use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{EventSource, MessageEvent};
use yew::prelude::*;

use crate::models::{DriverPosition, DriverStats, LiveEvent};
use crate::utils::constants::events_url;

/// Inserta o reemplaza la posición de un driver por identidad: si ya está
/// en la lista se sustituye en su sitio (mismo orden de iteración), si no
/// entra de primero.
pub fn upsert_driver_position(list: &mut Vec<DriverPosition>, pos: DriverPosition) {
    match list.iter_mut().find(|d| d.id == pos.id) {
        Some(slot) => *slot = pos,
        None => list.insert(0, pos),
    }
}

/// Tras un re-fetch, la selección sobrevive solo si la entidad sigue
/// existiendo en los datos frescos; si desapareció vuelve a "ninguna".
pub fn refresh_selection(list: &[DriverStats], selected_id: Option<i64>) -> Option<DriverStats> {
    let id = selected_id?;
    list.iter().find(|d| d.id == id).cloned()
}

/// Abre exactamente un canal `/events` por montaje del dashboard y
/// despacha los eventos en estricto orden de llegada, de uno en uno: el
/// handler del evento N termina antes de que empiece el del N+1, así dos
/// reconciliaciones nunca se entrelazan sobre la misma selección.
///
/// Los payloads malformados se descartan en silencio. En caso de error de
/// transporte no se hace nada: el propio EventSource se reconecta solo.
/// Desmontar cierra el canal y corta el drenaje pendiente.
///
/// El handler se registra una sola vez; el estado "actual" (selección,
/// pestaña, modal) debe llegarle vía celdas mutables compartidas, no por
/// valores capturados en el montaje.
#[hook]
pub fn use_live_sync<F, Fut>(handler: F)
where
    F: Fn(LiveEvent) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    use_effect_with((), move |_| {
        let queue: Rc<RefCell<VecDeque<LiveEvent>>> = Rc::new(RefCell::new(VecDeque::new()));
        let draining = Rc::new(Cell::new(false));
        let alive = Rc::new(Cell::new(true));
        let handler = Rc::new(handler);

        let source = match EventSource::new(&events_url()) {
            Ok(es) => Some(es),
            Err(e) => {
                log::error!("❌ No se pudo abrir el canal de eventos: {:?}", e);
                None
            }
        };

        let onmessage = {
            let queue = queue.clone();
            let draining = draining.clone();
            let alive = alive.clone();
            let handler = handler.clone();

            Closure::wrap(Box::new(move |event: MessageEvent| {
                let raw = event.data().as_string().unwrap_or_default();
                let parsed = match LiveEvent::parse(&raw) {
                    Some(LiveEvent::Other) | None => return, // se ignora sin avisar
                    Some(event) => event,
                };

                queue.borrow_mut().push_back(parsed);
                if draining.get() {
                    // ya hay un drenaje en curso; el evento espera su turno
                    return;
                }
                draining.set(true);

                let queue = queue.clone();
                let draining = draining.clone();
                let alive = alive.clone();
                let handler = handler.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    loop {
                        let next = queue.borrow_mut().pop_front();
                        let Some(event) = next else { break };
                        if !alive.get() {
                            break;
                        }
                        handler(event).await;
                        if !alive.get() {
                            break;
                        }
                    }
                    draining.set(false);
                });
            }) as Box<dyn FnMut(MessageEvent)>)
        };

        if let Some(es) = &source {
            es.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        }

        move || {
            alive.set(false);
            if let Some(es) = &source {
                es.close();
            }
            drop(onmessage);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(id: i64, lat: f64) -> DriverPosition {
        DriverPosition {
            id,
            full_name: format!("Repartidor {}", id),
            username: format!("driver{}", id),
            lat,
            lng: -77.0,
            at: None,
        }
    }

    fn stats(id: i64) -> DriverStats {
        DriverStats {
            id,
            username: format!("driver{}", id),
            full_name: format!("Repartidor {}", id),
            delivered: 0,
            failed: 0,
            closed: 0,
            effectiveness: 0.0,
        }
    }

    #[test]
    fn driver_nuevo_entra_de_primero() {
        let mut list = vec![pos(1, -12.0), pos(2, -12.1)];
        upsert_driver_position(&mut list, pos(7, -12.5));

        assert_eq!(list.len(), 3);
        assert_eq!(list[0].id, 7);
    }

    #[test]
    fn driver_existente_se_reemplaza_en_su_sitio() {
        let mut list = vec![pos(1, -12.0), pos(7, -12.5), pos(2, -12.1)];
        upsert_driver_position(&mut list, pos(7, -13.0));

        // misma longitud, misma posición, coordenadas nuevas
        assert_eq!(list.len(), 3);
        assert_eq!(list[1].id, 7);
        assert_eq!(list[1].lat, -13.0);
    }

    #[test]
    fn seleccion_sobrevive_si_la_entidad_sigue() {
        let list = vec![stats(1), stats(2)];
        assert_eq!(refresh_selection(&list, Some(2)).map(|d| d.id), Some(2));
    }

    #[test]
    fn seleccion_vuelve_a_ninguna_si_desaparece() {
        let list = vec![stats(1)];
        assert_eq!(refresh_selection(&list, Some(2)), None);
        assert_eq!(refresh_selection(&list, None), None);
        assert_eq!(refresh_selection(&[], Some(1)), None);
    }
}
