use serde::{Deserialize, Serialize};

/// Lifecycle state of a physical device, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    Available,
    Assigned,
    Maintenance,
    Retired,
    Stolen,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 5] = [
        Self::Available,
        Self::Assigned,
        Self::Maintenance,
        Self::Retired,
        Self::Stolen,
    ];

    /// Backend wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "DISPONIBLE",
            Self::Assigned => "ASIGNADO",
            Self::Maintenance => "MANTENIMIENTO",
            Self::Retired => "BAJA",
            Self::Stolen => "ROBO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DISPONIBLE" => Some(Self::Available),
            "ASIGNADO" => Some(Self::Assigned),
            "MANTENIMIENTO" => Some(Self::Maintenance),
            "BAJA" => Some(Self::Retired),
            "ROBO" => Some(Self::Stolen),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Assigned => "Assigned",
            Self::Maintenance => "Maintenance",
            Self::Retired => "Retired",
            Self::Stolen => "Stolen",
        }
    }

    /// Label used in exported spreadsheets.
    pub fn sheet_label(&self) -> &'static str {
        match self {
            Self::Available => "Disponible",
            Self::Assigned => "Asignado",
            Self::Maintenance => "Mantenimiento",
            Self::Retired => "Baja",
            Self::Stolen => "Robo",
        }
    }

    /// RETIRED and STOLEN accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Retired | Self::Stolen)
    }

    /// Whether a device in this status may reference an open assignment.
    pub fn allows_active_assignment(&self) -> bool {
        matches!(self, Self::Assigned | Self::Maintenance)
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn wire_codes_round_trip_for_every_status() {
        for status in DeviceStatus::ALL {
            assert_eq!(DeviceStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn parse_rejects_unknown_and_lowercase_codes() {
        assert_eq!(DeviceStatus::parse("AVAILABLE"), None);
        assert_eq!(DeviceStatus::parse("disponible"), None);
        assert_eq!(DeviceStatus::parse(""), None);
    }

    #[test]
    fn only_retired_and_stolen_are_terminal() {
        let terminal: Vec<_> = DeviceStatus::ALL
            .into_iter()
            .filter(DeviceStatus::is_terminal)
            .collect();

        assert_eq!(terminal, vec![DeviceStatus::Retired, DeviceStatus::Stolen]);
    }

    #[test]
    fn active_assignment_only_allowed_when_assigned_or_in_maintenance() {
        assert!(DeviceStatus::Assigned.allows_active_assignment());
        assert!(DeviceStatus::Maintenance.allows_active_assignment());
        assert!(!DeviceStatus::Available.allows_active_assignment());
        assert!(!DeviceStatus::Retired.allows_active_assignment());
        assert!(!DeviceStatus::Stolen.allows_active_assignment());
    }

    #[test]
    fn sheet_labels_follow_backend_vocabulary() {
        let labels: Vec<_> = DeviceStatus::ALL.iter().map(DeviceStatus::sheet_label).collect();
        assert_eq!(
            labels,
            vec!["Disponible", "Asignado", "Mantenimiento", "Baja", "Robo"]
        );
    }
}
