//! Roster export: registrations grouped by sport, then by year.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::catalog::display_name;
use crate::domain::{Gender, Registration, RegistrationFilter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub course: String,
    pub gender: Gender,
    pub partner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearGroup {
    pub year: u8,
    pub entries: Vec<RosterEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SportGroup {
    pub sport: String,
    pub title: String,
    pub years: Vec<YearGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub filter: RegistrationFilter,
    pub total: usize,
    pub sports: Vec<SportGroup>,
}

impl Roster {
    /// Group `registrations` by sport id (sorted) and year (ascending).
    ///
    /// Within a year, registrants are listed by name. A registrant appears
    /// once under every sport they selected.
    pub fn build(registrations: &[Registration], filter: &RegistrationFilter) -> Self {
        let mut ordered: Vec<&Registration> = registrations.iter().collect();
        ordered.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.name.cmp(&b.name)));

        let mut by_sport: BTreeMap<&str, BTreeMap<u8, Vec<RosterEntry>>> = BTreeMap::new();
        for registration in ordered {
            for sport in &registration.sports {
                by_sport
                    .entry(sport.as_str())
                    .or_default()
                    .entry(registration.year)
                    .or_default()
                    .push(RosterEntry {
                        name: registration.name.clone(),
                        course: registration.course.clone(),
                        gender: registration.gender,
                        partner: registration.partner_for(sport).map(|p| p.name.clone()),
                    });
            }
        }

        let sports = by_sport
            .into_iter()
            .map(|(sport, years)| SportGroup {
                sport: sport.to_string(),
                title: display_name(sport),
                years: years
                    .into_iter()
                    .map(|(year, entries)| YearGroup { year, entries })
                    .collect(),
            })
            .collect();

        Self {
            filter: filter.clone(),
            total: registrations.len(),
            sports,
        }
    }

    /// Printable roster
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Sports Event Registrations");
        let _ = writeln!(out);

        if let Some(filters) = self.filter_line() {
            let _ = writeln!(out, "{}", filters);
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "Total Registrations: {}", self.total);

        for group in &self.sports {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", group.title);
            let _ = writeln!(out, "{}", "-".repeat(group.title.chars().count()));
            for year in &group.years {
                let _ = writeln!(out, "Year {}:", year.year);
                for (index, entry) in year.entries.iter().enumerate() {
                    let _ = write!(
                        out,
                        "    {}. {} ({}, {})",
                        index + 1,
                        entry.name,
                        entry.course,
                        entry.gender
                    );
                    if let Some(partner) = &entry.partner {
                        let _ = write!(out, " - Partner: {}", partner);
                    }
                    let _ = writeln!(out);
                }
            }
        }
        out
    }

    fn filter_line(&self) -> Option<String> {
        if self.filter.is_empty() {
            return None;
        }
        let mut parts = Vec::new();
        if let Some(sport) = &self.filter.sport {
            parts.push(format!("Sport: {}", sport.replacen('-', " ", 1)));
        }
        if let Some(year) = self.filter.year {
            parts.push(format!("Year: {}", year));
        }
        if let Some(gender) = self.filter.gender {
            parts.push(format!("Gender: {}", gender));
        }
        if let Some(status) = self.filter.status {
            parts.push(format!("Status: {}", status));
        }
        if let Some(sport) = &self.filter.partner {
            parts.push(format!("Partner: {}", sport.replacen('-', " ", 1)));
        }
        if parts.is_empty() {
            None
        } else {
            Some(format!("Filters: {}", parts.join(" ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Partner, Status};
    use chrono::Utc;

    fn registration(name: &str, year: u8, sports: &[&str], partners: &[(&str, &str)]) -> Registration {
        let now = Utc::now();
        Registration {
            id: None,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            course: "BSc".to_string(),
            year,
            gender: Gender::Boy,
            sports: sports.iter().map(|s| s.to_string()).collect(),
            partners: partners.iter().map(|(s, n)| Partner::new(*s, *n)).collect(),
            notes: None,
            status: Status::Pending,
            registration_date: now,
            last_updated: now,
        }
    }

    #[test]
    fn test_groups_by_sport_then_year() {
        let registrations = vec![
            registration("Zoya", 2, &["cricket", "badminton-doubles"], &[("badminton-doubles", "Kiran")]),
            registration("Arun", 2, &["cricket"], &[]),
            registration("Bela", 1, &["cricket"], &[]),
        ];
        let roster = Roster::build(&registrations, &RegistrationFilter::default());

        assert_eq!(roster.total, 3);
        let sports: Vec<&str> = roster.sports.iter().map(|g| g.sport.as_str()).collect();
        assert_eq!(sports, vec!["badminton-doubles", "cricket"]);

        let cricket = &roster.sports[1];
        assert_eq!(cricket.title, "Cricket");
        assert_eq!(cricket.years[0].year, 1);
        let year_two: Vec<&str> = cricket.years[1].entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(year_two, vec!["Arun", "Zoya"]);

        let badminton = &roster.sports[0];
        assert_eq!(badminton.years[0].entries[0].partner.as_deref(), Some("Kiran"));
        // Partner is only shown under the sport it was named for
        assert!(cricket.years[1].entries[1].partner.is_none());
    }

    #[test]
    fn test_render_text() {
        let registrations = vec![registration(
            "Zoya",
            2,
            &["badminton-doubles"],
            &[("badminton-doubles", "Kiran")],
        )];
        let filter = RegistrationFilter {
            sport: Some("badminton-doubles".to_string()),
            year: Some(2),
            ..Default::default()
        };
        let text = Roster::build(&registrations, &filter).render_text();

        assert!(text.starts_with("Sports Event Registrations\n"));
        assert!(text.contains("Filters: Sport: badminton doubles Year: 2"));
        assert!(text.contains("Total Registrations: 1"));
        assert!(text.contains("Badminton Doubles\n-----------------\n"));
        assert!(text.contains("Year 2:\n    1. Zoya (BSc, boy) - Partner: Kiran\n"));
    }

    #[test]
    fn test_empty_roster_has_no_filter_line() {
        let text = Roster::build(&[], &RegistrationFilter::default()).render_text();
        assert!(!text.contains("Filters:"));
        assert!(text.contains("Total Registrations: 0"));
    }

    #[test]
    fn test_filter_line_lists_status_and_partner() {
        let filter = RegistrationFilter {
            status: Some(Status::Approved),
            partner: Some("carrom-doubles".to_string()),
            ..Default::default()
        };
        let text = Roster::build(&[], &filter).render_text();
        assert!(text.contains("Filters: Status: approved Partner: carrom doubles\n"));
    }
}
