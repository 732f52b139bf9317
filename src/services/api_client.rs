// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// NO tiene lógica de negocio, solo hace requests HTTP contra el backend.
// Adjunta el bearer token cuando hay sesión activa.
// ============================================================================

use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use web_sys::FormData;

use crate::models::{AuthResponse, DriverStats, MapData, Package, SubmissionPayload};
use crate::services::auth_service;
use crate::utils::constants::api_url;

#[derive(Error, Clone, PartialEq, Debug)]
pub enum ApiError {
    /// Respuesta no-2xx. `message` es el mensaje del servidor si lo hay.
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("Error de red: {0}")]
    Network(String),
    #[error("Respuesta inválida: {0}")]
    Parse(String),
}

fn bearer(builder: RequestBuilder) -> RequestBuilder {
    match auth_service::get_token() {
        Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
        None => builder,
    }
}

/// Extrae el mensaje de error del cuerpo. FastAPI responde
/// `{"detail": "..."}`; si no, se usa el texto tal cual.
fn error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from));

    match detail {
        Some(msg) => msg,
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => body.to_string(),
    }
}

async fn parse_ok<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if !response.ok() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Http {
            status,
            message: error_message(status, &body),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

async fn get_json<T: DeserializeOwned>(path: &str) -> Result<T, ApiError> {
    let response = bearer(Request::get(&api_url(path)))
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    parse_ok(response).await
}

async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
    path: &str,
    body: &B,
) -> Result<T, ApiError> {
    let response = bearer(Request::post(&api_url(path)))
        .json(body)
        .map_err(|e| ApiError::Network(e.to_string()))?
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    parse_ok(response).await
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub async fn login(username: &str, password: &str) -> Result<AuthResponse, ApiError> {
    log::info!("🔐 Login de usuario: {}", username);
    post_json(
        "/auth/login",
        &serde_json::json!({ "username": username, "password": password }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

pub async fn drivers_stats() -> Result<Vec<DriverStats>, ApiError> {
    get_json("/admin/drivers_stats").await
}

pub async fn create_driver(
    username: &str,
    full_name: &str,
    password: &str,
) -> Result<serde_json::Value, ApiError> {
    post_json(
        "/admin/drivers",
        &serde_json::json!({
            "username": username,
            "full_name": full_name,
            "password": password,
        }),
    )
    .await
}

pub async fn create_package(
    recipient_name: &str,
    address: &str,
    phone: &str,
    driver_id: i64,
) -> Result<Package, ApiError> {
    post_json(
        "/admin/packages",
        &serde_json::json!({
            "recipient_name": recipient_name,
            "address": address,
            "phone": phone,
            "driver_id": driver_id,
        }),
    )
    .await
}

pub async fn assign_by_code(code: &str, driver_id: i64) -> Result<serde_json::Value, ApiError> {
    post_json(
        "/admin/packages/assign_by_code",
        &serde_json::json!({ "code": code, "driver_id": driver_id }),
    )
    .await
}

pub async fn driver_packages_admin(
    driver_id: i64,
    status: &str,
) -> Result<Vec<Package>, ApiError> {
    get_json(&format!(
        "/admin/drivers/{}/packages?status={}",
        driver_id, status
    ))
    .await
}

pub async fn admin_map_data() -> Result<MapData, ApiError> {
    get_json("/admin/map_data").await
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub async fn my_packages() -> Result<Vec<Package>, ApiError> {
    get_json("/driver/packages").await
}

pub async fn reasons() -> Result<Vec<String>, ApiError> {
    get_json("/driver/reasons").await
}

pub async fn update_my_location(lat: f64, lng: f64) -> Result<(), ApiError> {
    let _: serde_json::Value =
        post_json("/driver/location", &serde_json::json!({ "lat": lat, "lng": lng })).await?;
    Ok(())
}

pub async fn close_delivered(
    package_id: i64,
    payload: &SubmissionPayload,
) -> Result<Package, ApiError> {
    log::info!("📦 Cerrando paquete {} como entregado ({} fotos)", package_id, payload.files.len());
    post_submission(
        &format!("/driver/packages/{}/close_delivered", package_id),
        payload,
    )
    .await
}

pub async fn close_not_delivered(
    package_id: i64,
    payload: &SubmissionPayload,
) -> Result<Package, ApiError> {
    log::info!("📦 Cerrando paquete {} como NO entregado ({} fotos)", package_id, payload.files.len());
    post_submission(
        &format!("/driver/packages/{}/close_not_delivered", package_id),
        payload,
    )
    .await
}

/// Vuelca el payload de cierre a un multipart. El navegador pone el
/// Content-Type con boundary; no hay que fijarlo a mano.
fn submission_form(payload: &SubmissionPayload) -> Result<FormData, ApiError> {
    let form = FormData::new()
        .map_err(|_| ApiError::Network("No se pudo crear el formulario".to_string()))?;

    let _ = form.append_with_str("pod_notes", &payload.notes);
    if let Some(reason) = &payload.reason {
        let _ = form.append_with_str("reason", reason);
    }
    if let Some(fix) = payload.fix {
        let _ = form.append_with_str("lat", &fix.lat.to_string());
        let _ = form.append_with_str("lng", &fix.lng.to_string());
    }
    for file in &payload.files {
        if let Some(handle) = &file.handle {
            let _ = form.append_with_blob_and_filename("images", handle, &file.name);
        }
    }

    Ok(form)
}

async fn post_submission(path: &str, payload: &SubmissionPayload) -> Result<Package, ApiError> {
    let form = submission_form(payload)?;
    let response = bearer(Request::post(&api_url(path)))
        .body(form)
        .map_err(|e| ApiError::Network(e.to_string()))?
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    parse_ok(response).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mensaje_de_error_prefiere_detail() {
        assert_eq!(error_message(400, r#"{"detail":"Paquete ya cerrado"}"#), "Paquete ya cerrado");
        assert_eq!(error_message(500, "boom"), "boom");
        assert_eq!(error_message(502, ""), "HTTP 502");
        // detail no-string: se conserva el cuerpo crudo
        assert_eq!(error_message(400, r#"{"detail":[1,2]}"#), r#"{"detail":[1,2]}"#);
    }
}
