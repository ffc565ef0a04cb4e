//! Vehicle (kilometer) allowance calculation.

use rust_decimal::Decimal;

use crate::config::VehicleRates;
use crate::error::EngineResult;
use crate::models::AuditStep;

use super::checked::{checked_product, checked_sum};

/// The rule reference for the kilometer allowance.
pub const DISTANCE_RULE_REF: &str = "§ 26 Z 4 lit. a EStG 1988; § 10 RGV";

/// The result of calculating the vehicle allowance, including the audit step.
#[derive(Debug, Clone)]
pub struct DistanceAllowanceResult {
    /// The allowance, unrounded.
    pub amount: Decimal,
    /// Passengers counted for the surcharge after clamping.
    pub eligible_passengers: u32,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the vehicle allowance for a trip.
///
/// `distance_km × rate_per_km + distance_km × passengers × surcharge`, with
/// the passenger count clamped to `max_surcharge_passengers`. The amount is
/// linear in distance and left unrounded.
///
/// # Errors
///
/// Returns [`EngineError::AmountOutOfRange`](crate::error::EngineError::AmountOutOfRange)
/// when the distance is too large for the amount to be represented.
///
/// # Examples
///
/// ```
/// use travel_allowance_engine::calculation::calculate_distance_allowance;
/// use travel_allowance_engine::config::VehicleRates;
/// use rust_decimal::Decimal;
///
/// let vehicle = VehicleRates {
///     rate_per_km: Decimal::new(50, 2),
///     passenger_surcharge_per_km: Decimal::new(15, 2),
///     max_surcharge_passengers: 4,
/// };
///
/// // 100 × 0.50 + 100 × 4 × 0.15 (6 passengers clamped to 4)
/// let result = calculate_distance_allowance(Decimal::from(100), 6, &vehicle, 6).unwrap();
/// assert_eq!(result.amount, Decimal::from(110));
/// assert_eq!(result.eligible_passengers, 4);
/// ```
pub fn calculate_distance_allowance(
    distance_km: Decimal,
    passenger_count: u32,
    vehicle: &VehicleRates,
    step_number: u32,
) -> EngineResult<DistanceAllowanceResult> {
    const FIELD: &str = "distance_allowance";
    let eligible_passengers = passenger_count.min(vehicle.max_surcharge_passengers);
    let base = checked_product(FIELD, distance_km, vehicle.rate_per_km)?;
    let surcharge = checked_product(
        FIELD,
        checked_product(FIELD, distance_km, Decimal::from(eligible_passengers))?,
        vehicle.passenger_surcharge_per_km,
    )?;
    let amount = checked_sum(FIELD, [base, surcharge])?;

    let reasoning = if eligible_passengers == 0 {
        format!(
            "{} km × €{} = €{}",
            distance_km.normalize(),
            vehicle.rate_per_km.normalize(),
            amount.normalize()
        )
    } else {
        let clamp_note = if passenger_count > eligible_passengers {
            format!(" ({} passengers, capped at {})", passenger_count, eligible_passengers)
        } else {
            String::new()
        };
        format!(
            "{} km × €{} + {} km × {} × €{}{} = €{}",
            distance_km.normalize(),
            vehicle.rate_per_km.normalize(),
            distance_km.normalize(),
            eligible_passengers,
            vehicle.passenger_surcharge_per_km.normalize(),
            clamp_note,
            amount.normalize()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "distance_allowance".to_string(),
        rule_name: "Kilometer Allowance".to_string(),
        rule_ref: DISTANCE_RULE_REF.to_string(),
        input: serde_json::json!({
            "distance_km": distance_km.normalize().to_string(),
            "passenger_count": passenger_count,
            "rate_per_km": vehicle.rate_per_km.normalize().to_string(),
            "passenger_surcharge_per_km": vehicle.passenger_surcharge_per_km.normalize().to_string()
        }),
        output: serde_json::json!({
            "eligible_passengers": eligible_passengers,
            "base_amount": base.normalize().to_string(),
            "surcharge_amount": surcharge.normalize().to_string(),
            "amount": amount.normalize().to_string()
        }),
        reasoning,
    };

    Ok(DistanceAllowanceResult {
        amount,
        eligible_passengers,
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn vehicle() -> VehicleRates {
        VehicleRates {
            rate_per_km: dec("0.50"),
            passenger_surcharge_per_km: dec("0.15"),
            max_surcharge_passengers: 4,
        }
    }

    #[test]
    fn test_driver_only() {
        let result = calculate_distance_allowance(dec("120"), 0, &vehicle(), 6).unwrap();

        assert_eq!(result.amount, dec("60.00"));
        assert_eq!(result.eligible_passengers, 0);
        assert_eq!(result.audit_step.rule_id, "distance_allowance");
    }

    #[test]
    fn test_passenger_surcharge() {
        // 120 × 0.50 + 120 × 2 × 0.15
        let result = calculate_distance_allowance(dec("120"), 2, &vehicle(), 6).unwrap();
        assert_eq!(result.amount, dec("96.00"));
    }

    #[test]
    fn test_passengers_clamped_to_maximum() {
        let capped = calculate_distance_allowance(dec("100"), 9, &vehicle(), 6).unwrap();
        let at_max = calculate_distance_allowance(dec("100"), 4, &vehicle(), 6).unwrap();

        assert_eq!(capped.amount, at_max.amount);
        assert_eq!(capped.eligible_passengers, 4);
        assert!(capped.audit_step.reasoning.contains("capped at 4"));
    }

    #[test]
    fn test_no_distance_no_allowance() {
        let result = calculate_distance_allowance(Decimal::ZERO, 3, &vehicle(), 6).unwrap();
        assert_eq!(result.amount, Decimal::ZERO);
    }

    #[test]
    fn test_amount_is_not_rounded() {
        let result = calculate_distance_allowance(dec("12.345"), 0, &vehicle(), 6).unwrap();
        assert_eq!(result.amount, dec("6.1725"));
    }

    #[test]
    fn test_distance_beyond_decimal_range_is_rejected() {
        // 3 × 10^28 km: the base fits, the passenger surcharge does not
        let distance = dec("30000000000000000000000000000");
        let result = calculate_distance_allowance(distance, 4, &vehicle(), 6);

        match result {
            Err(EngineError::AmountOutOfRange { field }) => {
                assert_eq!(field, "distance_allowance")
            }
            other => panic!("Expected AmountOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_in_distance() {
        let single = calculate_distance_allowance(dec("37.3"), 3, &vehicle(), 6).unwrap();
        let double = calculate_distance_allowance(dec("74.6"), 3, &vehicle(), 6).unwrap();
        assert_eq!(double.amount, single.amount * dec("2"));
    }
}
