use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Active,
    Finalized,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVA",
            Self::Finalized => "FINALIZADA",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVA" => Some(Self::Active),
            "FINALIZADA" => Some(Self::Finalized),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryKind {
    Permanent,
    Temporary,
}

impl DeliveryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permanent => "PERMANENTE",
            Self::Temporary => "TEMPORAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PERMANENTE" => Some(Self::Permanent),
            "TEMPORAL" => Some(Self::Temporary),
            _ => None,
        }
    }
}

/// Link between one employee and one device. Owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub employee_id: i64,
    pub device_id: i64,
    pub delivery_kind: DeliveryKind,
    pub delivered_on: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
}

impl Assignment {
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}

/// Physical condition of a device when it comes back from an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnCondition {
    Optimal,
    Damaged,
    NonFunctional,
}

impl ReturnCondition {
    pub const ALL: [ReturnCondition; 3] = [Self::Optimal, Self::Damaged, Self::NonFunctional];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optimal => "OPTIMO",
            Self::Damaged => "CON_DANOS",
            Self::NonFunctional => "NO_FUNCIONAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPTIMO" => Some(Self::Optimal),
            "CON_DANOS" => Some(Self::Damaged),
            "NO_FUNCIONAL" => Some(Self::NonFunctional),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Optimal => "Optimal",
            Self::Damaged => "Damaged",
            Self::NonFunctional => "Non-functional",
        }
    }
}

/// A return record to be created on the backend (no id yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReturn {
    pub assignment_id: i64,
    pub returned_on: NaiveDate,
    pub condition: ReturnCondition,
    pub notes: Option<String>,
}
