use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The three kinds of helper a patient can be assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelperKind {
    Volunteer,
    Caregiver,
    MedicalProfessional,
}

impl HelperKind {
    pub const ALL: [HelperKind; 3] = [
        HelperKind::Volunteer,
        HelperKind::Caregiver,
        HelperKind::MedicalProfessional,
    ];

    /// Discriminator stored in `assignments.helper_type`
    pub fn as_str(self) -> &'static str {
        match self {
            HelperKind::Volunteer => "volunteer",
            HelperKind::Caregiver => "caregiver",
            HelperKind::MedicalProfessional => "medical_professional",
        }
    }

    /// Table holding helpers of this kind
    pub fn table(self) -> &'static str {
        match self {
            HelperKind::Volunteer => "volunteers",
            HelperKind::Caregiver => "caregivers",
            HelperKind::MedicalProfessional => "medical_professionals",
        }
    }
}

impl fmt::Display for HelperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHelperKind(pub String);

impl fmt::Display for UnknownHelperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown helper type '{}' (expected volunteer, caregiver or medical_professional)",
            self.0
        )
    }
}

impl FromStr for HelperKind {
    type Err = UnknownHelperKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HelperKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| UnknownHelperKind(s.to_string()))
    }
}

/// Reference to a specific helper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperRef {
    Volunteer(Uuid),
    Caregiver(Uuid),
    MedicalProfessional(Uuid),
}

impl HelperRef {
    pub fn new(kind: HelperKind, id: Uuid) -> Self {
        match kind {
            HelperKind::Volunteer => HelperRef::Volunteer(id),
            HelperKind::Caregiver => HelperRef::Caregiver(id),
            HelperKind::MedicalProfessional => HelperRef::MedicalProfessional(id),
        }
    }

    pub fn kind(&self) -> HelperKind {
        match self {
            HelperRef::Volunteer(_) => HelperKind::Volunteer,
            HelperRef::Caregiver(_) => HelperKind::Caregiver,
            HelperRef::MedicalProfessional(_) => HelperKind::MedicalProfessional,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            HelperRef::Volunteer(id)
            | HelperRef::Caregiver(id)
            | HelperRef::MedicalProfessional(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Inactive,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AssignmentStatus::Active),
            "inactive" => Ok(AssignmentStatus::Inactive),
            other => Err(format!("unknown assignment status '{other}'")),
        }
    }
}

/// An assignment with the patient's and helper's display names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub helper_id: Uuid,
    pub helper_type: HelperKind,
    pub assigned_date: NaiveDate,
    pub status: AssignmentStatus,
    pub patient_name: String,
    pub helper_name: Option<String>,
}

/// Body of `POST /api/assignments`; presence is checked by the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub patient_id: Option<Uuid>,
    pub helper_id: Option<Uuid>,
    pub helper_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAssignment {
    pub id: Uuid,
    pub assigned_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_kind_parses_discriminators() {
        for kind in HelperKind::ALL {
            assert_eq!(kind.as_str().parse::<HelperKind>(), Ok(kind));
        }
        assert!("doctor".parse::<HelperKind>().is_err());
        assert!("Volunteer".parse::<HelperKind>().is_err());
    }

    #[test]
    fn helper_ref_round_trips_kind_and_id() {
        let id = Uuid::new_v4();
        for kind in HelperKind::ALL {
            let helper = HelperRef::new(kind, id);
            assert_eq!(helper.kind(), kind);
            assert_eq!(helper.id(), id);
        }
    }

    #[test]
    fn request_uses_camel_case_keys() {
        let id = Uuid::new_v4();
        let body = serde_json::json!({
            "patientId": id,
            "helperId": id,
            "helperType": "caregiver"
        });
        let request: AssignmentRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.patient_id, Some(id));
        assert_eq!(request.helper_type.as_deref(), Some("caregiver"));
    }

    #[test]
    fn helper_kind_serializes_as_snake_case() {
        let value = serde_json::to_value(HelperKind::MedicalProfessional).unwrap();
        assert_eq!(value, "medical_professional");
    }
}
