use crate::models::PackageStatus;

pub fn status_emoji(status: &str) -> &'static str {
    match PackageStatus::parse(status) {
        PackageStatus::Delivered => "🟩",
        PackageStatus::NotDelivered => "🟥",
        PackageStatus::Assigned => "⬜",
    }
}

pub fn status_label(status: &str) -> &'static str {
    match PackageStatus::parse(status) {
        PackageStatus::Delivered => "Entregado",
        PackageStatus::NotDelivered => "Fallido",
        PackageStatus::Assigned => "Pendiente",
    }
}

/// Color del badge de efectividad (eff 0..1): verde ≥ 90%, amarillo ≥ 70%.
pub fn eff_color(eff: f64) -> &'static str {
    let pct = (eff * 100.0).round() as i64;
    if pct >= 90 {
        "green"
    } else if pct >= 70 {
        "yellow"
    } else {
        "red"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emoji_y_label_aceptan_minusculas() {
        assert_eq!(status_emoji("delivered"), "🟩");
        assert_eq!(status_emoji("not_delivered"), "🟥");
        assert_eq!(status_label("assigned"), "Pendiente");
        assert_eq!(status_label("DELIVERED"), "Entregado");
    }

    #[test]
    fn colores_de_efectividad() {
        assert_eq!(eff_color(0.95), "green");
        assert_eq!(eff_color(0.9), "green");
        assert_eq!(eff_color(0.75), "yellow");
        assert_eq!(eff_color(0.3), "red");
        // 0.895 redondea a 90
        assert_eq!(eff_color(0.895), "green");
    }
}
