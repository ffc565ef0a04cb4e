//! Jurisdiction resolution.
//!
//! Maps a trip destination to the rate table entry whose rates apply.
//! Unrecognized foreign destinations resolve to the table's fallback entry
//! and raise a warning rather than an error.

use tracing::warn;

use crate::config::{JurisdictionRates, RateTable};
use crate::models::{AuditStep, AuditWarning, Destination};

/// The rule reference for jurisdiction selection.
pub const JURISDICTION_RULE_REF: &str = "§ 26 Z 4 lit. d EStG 1988";

/// Warning code emitted when the fallback entry is applied.
pub const FALLBACK_WARNING_CODE: &str = "UNKNOWN_JURISDICTION_FALLBACK";

/// The result of resolving a destination against a rate table.
#[derive(Debug, Clone)]
pub struct JurisdictionLookupResult<'a> {
    /// Key of the resolved entry.
    pub key: &'a str,
    /// The resolved rates.
    pub rates: &'a JurisdictionRates,
    /// True if the destination was not recognized and the fallback applied.
    pub fallback_applied: bool,
    /// Warning to surface when the fallback applied.
    pub warning: Option<AuditWarning>,
    /// The audit step recording this lookup.
    pub audit_step: AuditStep,
}

/// Resolves the jurisdiction for a destination.
///
/// Domestic trips use the table's domestic entry. Foreign destinations match
/// a foreign entry by key, name, or alias, ignoring case; anything else uses
/// the fallback entry. Always resolves to a concrete entry.
///
/// # Examples
///
/// ```no_run
/// use travel_allowance_engine::calculation::resolve_jurisdiction;
/// use travel_allowance_engine::config::ConfigLoader;
/// use travel_allowance_engine::models::Destination;
/// use chrono::NaiveDate;
///
/// let config = ConfigLoader::load("./config/at-2025").unwrap();
/// let table = config.rate_table_for(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()).unwrap();
///
/// let destination = Destination::Foreign { country: "Narnia".to_string() };
/// let result = resolve_jurisdiction(&destination, table, 2);
/// assert!(result.fallback_applied);
/// assert_eq!(result.key, "other");
/// ```
pub fn resolve_jurisdiction<'a>(
    destination: &Destination,
    table: &'a RateTable,
    step_number: u32,
) -> JurisdictionLookupResult<'a> {
    let country = match destination {
        Destination::Domestic => {
            let key = table.domestic_key();
            let rates = table.domestic();
            let audit_step = lookup_step(
                step_number,
                destination,
                key,
                rates,
                false,
                format!("Domestic trip uses the {} rates", rates.name),
            );
            return JurisdictionLookupResult {
                key,
                rates,
                fallback_applied: false,
                warning: None,
                audit_step,
            };
        }
        Destination::Foreign { country } => country,
    };

    let candidate = country.trim();
    let matched = table
        .jurisdictions()
        .iter()
        .filter(|(key, _)| key.as_str() != table.domestic_key())
        .find(|(key, rates)| key.eq_ignore_ascii_case(candidate) || rates.matches_name(candidate));

    match matched {
        Some((key, rates)) => {
            let audit_step = lookup_step(
                step_number,
                destination,
                key,
                rates,
                false,
                format!("'{}' matches the {} rates", candidate, rates.name),
            );
            JurisdictionLookupResult {
                key,
                rates,
                fallback_applied: false,
                warning: None,
                audit_step,
            }
        }
        None => {
            let key = table.fallback_key();
            let rates = table.fallback();
            warn!(
                country = %candidate,
                fallback = %key,
                "Unrecognized destination, applying fallback rates"
            );
            let message = format!(
                "'{}' is not in the rate table; the {} rates were applied",
                candidate, rates.name
            );
            let audit_step = lookup_step(
                step_number,
                destination,
                key,
                rates,
                true,
                message.clone(),
            );
            JurisdictionLookupResult {
                key,
                rates,
                fallback_applied: true,
                warning: Some(AuditWarning {
                    code: FALLBACK_WARNING_CODE.to_string(),
                    message,
                    severity: "medium".to_string(),
                }),
                audit_step,
            }
        }
    }
}

fn lookup_step(
    step_number: u32,
    destination: &Destination,
    key: &str,
    rates: &JurisdictionRates,
    fallback_applied: bool,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "jurisdiction_lookup".to_string(),
        rule_name: "Jurisdiction Lookup".to_string(),
        rule_ref: JURISDICTION_RULE_REF.to_string(),
        input: serde_json::json!({ "destination": destination }),
        output: serde_json::json!({
            "jurisdiction": key,
            "name": rates.name,
            "full_day_rate": rates.full_day_rate.normalize().to_string(),
            "partial_day_rate": rates.partial_day_rate.normalize().to_string(),
            "fallback_applied": fallback_applied
        }),
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateConfig;

    fn table() -> RateTable {
        let config: RateConfig =
            serde_yaml::from_str(include_str!("../../config/at-2025/rates/2025-01-01.yaml"))
                .unwrap();
        RateTable::from_config(config).unwrap()
    }

    fn foreign(country: &str) -> Destination {
        Destination::Foreign {
            country: country.to_string(),
        }
    }

    #[test]
    fn test_domestic_uses_domestic_entry() {
        let table = table();
        let result = resolve_jurisdiction(&Destination::Domestic, &table, 2);

        assert_eq!(result.key, "domestic");
        assert!(!result.fallback_applied);
        assert!(result.warning.is_none());
        assert_eq!(result.audit_step.rule_id, "jurisdiction_lookup");
    }

    #[test]
    fn test_foreign_matches_name_alias_and_key() {
        let table = table();

        for entered in ["Deutschland", "germany", " DE ", "GERMANY"] {
            let result = resolve_jurisdiction(&foreign(entered), &table, 2);
            assert_eq!(result.key, "germany", "'{}' should resolve to germany", entered);
            assert!(!result.fallback_applied);
        }
    }

    #[test]
    fn test_unknown_country_falls_back_with_warning() {
        let table = table();
        let result = resolve_jurisdiction(&foreign("Narnia"), &table, 2);

        assert_eq!(result.key, "other");
        assert!(result.fallback_applied);
        let warning = result.warning.unwrap();
        assert_eq!(warning.code, FALLBACK_WARNING_CODE);
        assert!(warning.message.contains("Narnia"));
        assert_eq!(result.audit_step.output["fallback_applied"], true);
    }

    #[test]
    fn test_explicit_other_is_not_a_fallback() {
        let table = table();
        let result = resolve_jurisdiction(&foreign("Andere"), &table, 2);

        assert_eq!(result.key, "other");
        assert!(!result.fallback_applied);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_foreign_trip_never_resolves_to_domestic_entry() {
        let table = table();
        let result = resolve_jurisdiction(&foreign("Österreich"), &table, 2);

        assert_eq!(result.key, "other");
        assert!(result.fallback_applied);
    }
}
