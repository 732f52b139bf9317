// Estado de autenticación persistido (localStorage). Vive a nivel de
// proceso: se escribe en el login, se lee en cada arranque y se limpia en
// el logout manual o por inactividad.

use crate::models::{AuthResponse, Role};
use crate::utils::storage;

const KEY_TOKEN: &str = "zero_token";
const KEY_ROLE: &str = "zero_role";
const KEY_NAME: &str = "zero_name";

pub fn get_token() -> Option<String> {
    storage::read(KEY_TOKEN).filter(|t| !t.is_empty())
}

pub fn get_role() -> Option<Role> {
    Role::parse(&storage::read(KEY_ROLE)?)
}

pub fn get_name() -> Option<String> {
    storage::read(KEY_NAME).filter(|n| !n.is_empty())
}

pub fn set_auth(auth: &AuthResponse) {
    storage::write(KEY_TOKEN, &auth.access_token);
    storage::write(KEY_ROLE, &auth.role);
    storage::write(KEY_NAME, &auth.full_name);
    log::info!("✅ Sesión iniciada: {} ({})", auth.full_name, auth.role);
}

pub fn clear_auth() {
    storage::remove(KEY_TOKEN);
    storage::remove(KEY_ROLE);
    storage::remove(KEY_NAME);
}
