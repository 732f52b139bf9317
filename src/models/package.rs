use serde::{Deserialize, Serialize};

/// Estado de un paquete. `Delivered` y `NotDelivered` son terminales:
/// una vez cerrado, el paquete queda en solo lectura.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PackageStatus {
    Assigned,
    Delivered,
    NotDelivered,
}

impl PackageStatus {
    /// El backend envía el estado en minúsculas ("delivered"); el cliente
    /// compara siempre normalizando.
    pub fn parse(raw: &str) -> PackageStatus {
        match raw.to_ascii_uppercase().as_str() {
            "DELIVERED" => PackageStatus::Delivered,
            "NOT_DELIVERED" => PackageStatus::NotDelivered,
            _ => PackageStatus::Assigned,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PackageStatus::Delivered | PackageStatus::NotDelivered)
    }

    /// Valor que esperan los endpoints de admin en `?status=`.
    pub fn as_query(self) -> &'static str {
        match self {
            PackageStatus::Assigned => "ASSIGNED",
            PackageStatus::Delivered => "DELIVERED",
            PackageStatus::NotDelivered => "NOT_DELIVERED",
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct ProofImage {
    pub id: i64,
    pub proof_type: String,
    pub url: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Package {
    pub id: i64,
    pub code: String,
    pub recipient_name: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub driver_id: Option<i64>,
    pub status: String,
    #[serde(default)]
    pub pod_notes: Option<String>,
    #[serde(default)]
    pub non_delivery_reason: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub proofs: Vec<ProofImage>,
}

impl Package {
    pub fn status(&self) -> PackageStatus {
        PackageStatus::parse(&self.status)
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normaliza_mayusculas() {
        assert_eq!(PackageStatus::parse("delivered"), PackageStatus::Delivered);
        assert_eq!(PackageStatus::parse("NOT_DELIVERED"), PackageStatus::NotDelivered);
        assert_eq!(PackageStatus::parse("assigned"), PackageStatus::Assigned);
        // cualquier cosa desconocida cuenta como pendiente
        assert_eq!(PackageStatus::parse(""), PackageStatus::Assigned);
    }

    #[test]
    fn solo_cerrados_son_terminales() {
        assert!(PackageStatus::Delivered.is_terminal());
        assert!(PackageStatus::NotDelivered.is_terminal());
        assert!(!PackageStatus::Assigned.is_terminal());
    }
}
