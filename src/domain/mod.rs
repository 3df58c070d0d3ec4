use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boy,
    Girl,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Boy => "boy",
            Gender::Girl => "girl",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boy" => Ok(Gender::Boy),
            "girl" => Ok(Gender::Girl),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a registration; only administrators move it off `Pending`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Approved,
    Rejected,
    Waitlisted,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
            Status::Waitlisted => "waitlisted",
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "approved" => Ok(Status::Approved),
            "rejected" => Ok(Status::Rejected),
            "waitlisted" => Ok(Status::Waitlisted),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partner named for one partner-requiring sport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub sport: String,
    pub name: String,
}

impl Partner {
    pub fn new(sport: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            sport: sport.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub course: String,
    pub year: u8,
    pub gender: Gender,
    pub sports: Vec<String>,
    pub partners: Vec<Partner>,
    pub notes: Option<String>,
    pub status: Status,
    pub registration_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Registration {
    /// Partner registered for `sport`, if any
    pub fn partner_for(&self, sport: &str) -> Option<&Partner> {
        self.partners.iter().find(|p| p.sport == sport)
    }
}

/// Administrative listing filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFilter {
    pub sport: Option<String>,
    pub year: Option<u8>,
    pub gender: Option<Gender>,
    pub status: Option<Status>,
    /// Only registrations that named a partner for this sport
    pub partner: Option<String>,
}

impl RegistrationFilter {
    pub fn matches(&self, registration: &Registration) -> bool {
        if let Some(sport) = &self.sport {
            if !registration.sports.iter().any(|s| s == sport) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if registration.year != year {
                return false;
            }
        }
        if let Some(gender) = self.gender {
            if registration.gender != gender {
                return false;
            }
        }
        if let Some(status) = self.status {
            if registration.status != status {
                return false;
            }
        }
        if let Some(sport) = &self.partner {
            let named = registration
                .partner_for(sport)
                .map_or(false, |p| !p.name.trim().is_empty());
            if !named {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.sport.is_none()
            && self.year.is_none()
            && self.gender.is_none()
            && self.status.is_none()
            && self.partner.is_none()
    }
}
