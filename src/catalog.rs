//! The sport catalog: every sport id a registration may select, and the subset
//! that requires a partner.
//!
//! The catalog is built once at startup and shared behind an `Arc`; nothing
//! mutates it afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::constants;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Partner sport '{0}' is not a sport in the catalog")]
    UnknownPartnerSport(String),
}

/// An indoor sport and the variants it is played in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndoorSport {
    pub name: String,
    pub variants: Vec<String>,
}

/// Sports grouped the way the registration form shows them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportCategories {
    pub outdoor: Vec<String>,
    pub indoor: Vec<IndoorSport>,
    pub athletics: Vec<String>,
    pub fun_activities: Vec<String>,
}

impl SportCategories {
    /// The categories offered at the event
    pub fn standard() -> Self {
        Self {
            outdoor: to_owned(constants::OUTDOOR_SPORTS),
            indoor: constants::INDOOR_SPORTS
                .iter()
                .map(|(name, variants)| IndoorSport {
                    name: name.to_string(),
                    variants: to_owned(variants),
                })
                .collect(),
            athletics: to_owned(constants::ATHLETICS),
            fun_activities: to_owned(constants::FUN_ACTIVITIES),
        }
    }
}

/// Read-only lookup over the valid sport ids
#[derive(Debug, Clone)]
pub struct SportCatalog {
    categories: SportCategories,
    ordered: Vec<String>,
    all_sports: BTreeSet<String>,
    partner_sports: BTreeSet<String>,
}

impl SportCatalog {
    /// Build a catalog, rejecting partner sports that are not in the catalog
    pub fn new(
        categories: SportCategories,
        partner_sports: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self::build(categories, partner_sports);
        if let Some(unknown) = catalog
            .partner_sports
            .iter()
            .find(|s| !catalog.all_sports.contains(*s))
        {
            return Err(CatalogError::UnknownPartnerSport(unknown.clone()));
        }
        Ok(catalog)
    }

    /// The catalog used at the event
    pub fn standard() -> Self {
        Self::build(
            SportCategories::standard(),
            constants::PARTNER_SPORTS.iter().copied(),
        )
    }

    fn build(
        categories: SportCategories,
        partner_sports: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut ordered = Vec::new();
        ordered.extend(categories.outdoor.iter().cloned());
        ordered.extend(expand(&categories.indoor));
        ordered.extend(categories.athletics.iter().cloned());
        ordered.extend(categories.fun_activities.iter().cloned());

        let all_sports = ordered.iter().cloned().collect();
        let partner_sports = partner_sports.into_iter().map(Into::into).collect();

        Self {
            categories,
            ordered,
            all_sports,
            partner_sports,
        }
    }

    pub fn is_valid_sport(&self, id: &str) -> bool {
        self.all_sports.contains(id)
    }

    pub fn requires_partner(&self, id: &str) -> bool {
        self.partner_sports.contains(id)
    }

    pub fn all_sports(&self) -> &BTreeSet<String> {
        &self.all_sports
    }

    pub fn partner_sports(&self) -> &BTreeSet<String> {
        &self.partner_sports
    }

    /// Sport ids in form order: outdoor, indoor variants, athletics, fun activities
    pub fn sports_in_form_order(&self) -> &[String] {
        &self.ordered
    }

    pub fn categories(&self) -> &SportCategories {
        &self.categories
    }
}

/// Composite ids `"<sport>-<variant>"` for every indoor sport and variant, in declaration order
pub fn expand(indoor: &[IndoorSport]) -> Vec<String> {
    indoor
        .iter()
        .flat_map(|sport| {
            sport
                .variants
                .iter()
                .map(move |variant| format!("{}-{}", sport.name, variant))
        })
        .collect()
}

/// Human-readable sport name: "badminton-doubles" becomes "Badminton Doubles".
///
/// Only the first hyphen turns into a space; every word start is upper-cased.
pub fn display_name(id: &str) -> String {
    let spaced = id.replacen('-', " ", 1);
    let mut out = String::with_capacity(spaced.len());
    let mut prev_is_word = false;
    for c in spaced.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }
    out
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
