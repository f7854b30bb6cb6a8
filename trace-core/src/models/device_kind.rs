use serde::{Deserialize, Serialize};

/// Hardware category of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Laptop,
    Desktop,
    Phone,
    Tablet,
    Tv,
    Sim,
    Accessory,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 7] = [
        Self::Laptop,
        Self::Desktop,
        Self::Phone,
        Self::Tablet,
        Self::Tv,
        Self::Sim,
        Self::Accessory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Laptop => "LAPTOP",
            Self::Desktop => "DESKTOP",
            Self::Phone => "TELEFONO",
            Self::Tablet => "TABLET",
            Self::Tv => "TV",
            Self::Sim => "SIM",
            Self::Accessory => "ACCESORIO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LAPTOP" => Some(Self::Laptop),
            "DESKTOP" => Some(Self::Desktop),
            "TELEFONO" => Some(Self::Phone),
            "TABLET" => Some(Self::Tablet),
            "TV" => Some(Self::Tv),
            "SIM" => Some(Self::Sim),
            "ACCESORIO" => Some(Self::Accessory),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Laptop => "Laptop",
            Self::Desktop => "Desktop",
            Self::Phone => "Phone",
            Self::Tablet => "Tablet",
            Self::Tv => "TV",
            Self::Sim => "SIM card",
            Self::Accessory => "Accessory",
        }
    }

    /// Label used in exported spreadsheets.
    pub fn sheet_label(&self) -> &'static str {
        match self {
            Self::Laptop => "Laptop",
            Self::Desktop => "Escritorio",
            Self::Phone => "Teléfono",
            Self::Tablet => "Tablet",
            Self::Tv => "TV",
            Self::Sim => "SIM Card",
            Self::Accessory => "Accesorio",
        }
    }

    /// Categories that age and lose value over time. Only these carry an
    /// initial value, a depreciated value and a device age.
    pub fn depreciates(&self) -> bool {
        matches!(
            self,
            Self::Laptop | Self::Desktop | Self::Phone | Self::Tablet
        )
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
