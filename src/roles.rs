//! Roles a portrait can be transformed into, and their prompts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A medical profession the user can transform into.
///
/// Variant order is the display order; the first variant is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// General practitioner in a white coat.
    #[default]
    Doctor,
    /// Surgeon in scrubs.
    Surgeon,
    /// Nurse in hospital scrubs.
    Nurse,
    /// Dentist in a clinic.
    Dentist,
    /// Pharmacist behind the counter.
    Pharmacist,
    /// Paramedic on an ambulance crew.
    Paramedic,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Role; 6] = [
        Role::Doctor,
        Role::Surgeon,
        Role::Nurse,
        Role::Dentist,
        Role::Pharmacist,
        Role::Paramedic,
    ];

    /// Returns the display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Doctor => "Doctor",
            Self::Surgeon => "Surgeon",
            Self::Nurse => "Nurse",
            Self::Dentist => "Dentist",
            Self::Pharmacist => "Pharmacist",
            Self::Paramedic => "Paramedic",
        }
    }

    /// Returns the prompt sent upstream when this role is selected.
    pub fn default_prompt(&self) -> &'static str {
        match self {
            Self::Doctor => {
                "Transform the person in this photo into a doctor. Dress them in a crisp white \
                 lab coat over professional attire with a stethoscope around the neck, set in a \
                 bright modern clinic. Keep their face, expression and identity unchanged. \
                 Photorealistic portrait."
            }
            Self::Surgeon => {
                "Transform the person in this photo into a surgeon. Dress them in surgical scrubs, \
                 a surgical cap and a mask lowered below the chin, standing in an operating room \
                 with surgical lights behind them. Keep their face, expression and identity \
                 unchanged. Photorealistic portrait."
            }
            Self::Nurse => {
                "Transform the person in this photo into a nurse. Dress them in clean hospital \
                 scrubs with a name badge and a watch clipped to the pocket, in a hospital ward. \
                 Keep their face, expression and identity unchanged. Photorealistic portrait."
            }
            Self::Dentist => {
                "Transform the person in this photo into a dentist. Dress them in a dental tunic \
                 with protective glasses pushed up, in a dental clinic with a patient chair and \
                 overhead lamp. Keep their face, expression and identity unchanged. \
                 Photorealistic portrait."
            }
            Self::Pharmacist => {
                "Transform the person in this photo into a pharmacist. Dress them in a white \
                 pharmacy coat, standing in front of neatly organized medicine shelves. Keep \
                 their face, expression and identity unchanged. Photorealistic portrait."
            }
            Self::Paramedic => {
                "Transform the person in this photo into a paramedic. Dress them in a high \
                 visibility paramedic uniform with a radio on the shoulder, next to an \
                 ambulance. Keep their face, expression and identity unchanged. Photorealistic \
                 portrait."
            }
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownRole(wanted.to_string()))
    }
}
