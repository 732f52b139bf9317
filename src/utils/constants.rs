/// Base del backend. En producción el frontend se sirve del mismo dominio
/// y Nginx proxyea /api y /events; para desarrollo se puede compilar con
/// BACKEND_URL=http://localhost:8000 (ver build.rs / .env).
pub const BACKEND_URL: &str = match option_env!("BACKEND_URL") {
    Some(url) => url,
    None => "",
};

pub fn api_url(path: &str) -> String {
    format!("{}/api{}", BACKEND_URL, path)
}

pub fn events_url() -> String {
    format!("{}/events", BACKEND_URL)
}
