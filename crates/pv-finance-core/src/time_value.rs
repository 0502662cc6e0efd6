use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PvFinanceError;
use crate::types::{Money, Rate};
use crate::PvFinanceResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.000001);
const DERIVATIVE_FLOOR: Decimal = dec!(0.0000000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Starting point for the IRR search when the caller has no better guess.
pub const DEFAULT_IRR_GUESS: Rate = dec!(0.10);

/// Outcome of the Newton-Raphson IRR search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Last rate reached by the iteration (the root when `converged`)
    pub rate: Rate,
    /// Newton steps taken before stopping
    pub iterations: u32,
    /// Whether |NPV(rate)| dropped below the convergence threshold
    pub converged: bool,
}

/// Net Present Value of a series of cash flows. Index 0 is undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PvFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(PvFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        let discount = one_plus_r
            .checked_powu(t as u64)
            .ok_or_else(|| PvFinanceError::overflow(format!("NPV discount factor at period {t}")))?;
        if discount.is_zero() {
            return Err(PvFinanceError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result = cf
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| PvFinanceError::overflow(format!("NPV at period {t}")))?;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Never fails: when the search does not converge, the last computed rate is
/// returned. Use [`solve_irr`] to find out whether it converged.
pub fn irr(cash_flows: &[Money], guess: Rate) -> Rate {
    solve_irr(cash_flows, guess).rate
}

/// Newton-Raphson IRR search reporting convergence.
///
/// Stops when |NPV| < 1e-6, after 100 iterations, or early when
/// |NPV'| < 1e-10. An iterate whose discount factors leave the decimal range
/// (or hit zero at rate = -100%) also ends the search at the last good rate.
///
/// A binary float solver would keep stepping through such iterates, so on
/// pathological flows (no sign change, several reversals) the best-effort
/// rate here can differ from a float reference. `converged` is false in
/// every such case.
pub fn solve_irr(cash_flows: &[Money], guess: Rate) -> IrrSolution {
    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_with_derivative(rate, cash_flows) else {
            return IrrSolution {
                rate,
                iterations: i,
                converged: false,
            };
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return IrrSolution {
                rate,
                iterations: i,
                converged: true,
            };
        }

        if dnpv.abs() < DERIVATIVE_FLOOR {
            return IrrSolution {
                rate,
                iterations: i,
                converged: false,
            };
        }

        match npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
        {
            Some(next) => rate = next,
            None => {
                return IrrSolution {
                    rate,
                    iterations: i,
                    converged: false,
                }
            }
        }
    }

    IrrSolution {
        rate,
        iterations: MAX_IRR_ITERATIONS,
        converged: false,
    }
}

/// NPV and dNPV/drate at `rate`, or None if a discount factor is unusable.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Money, Money)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        let discount = one_plus_r.checked_powu(t as u64)?;
        value = value.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let next_discount = discount.checked_mul(one_plus_r)?;
            let weighted = Decimal::from(t as u64).checked_mul(*cf)?;
            derivative = derivative.checked_sub(weighted.checked_div(next_discount)?)?;
        }
    }

    Some((value, derivative))
}

/// (1 + rate)^nper, failing instead of overflowing the decimal range.
fn compound_factor(rate: Rate, nper: u32, context: &str) -> PvFinanceResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| PvFinanceError::overflow(context))
}

/// Present Value
pub fn pv(rate: Rate, nper: u32, pmt: Money, fv: Money) -> PvFinanceResult<Money> {
    if rate.is_zero() {
        return pmt
            .checked_mul(Decimal::from(nper))
            .and_then(|total| total.checked_add(fv))
            .map(|total| -total)
            .ok_or_else(|| PvFinanceError::overflow("PV"));
    }

    let factor = compound_factor(rate, nper, "PV factor")?;

    if factor.is_zero() {
        return Err(PvFinanceError::DivisionByZero {
            context: "PV factor".into(),
        });
    }

    let value = (|| {
        let discount = Decimal::ONE.checked_div(factor)?;
        let annuity_factor = (Decimal::ONE - discount).checked_div(rate)?;
        pmt.checked_mul(annuity_factor)?
            .checked_add(fv.checked_div(factor)?)
    })();
    value.map(|v| -v).ok_or_else(|| PvFinanceError::overflow("PV"))
}

/// Payment (PMT) of a level annuity, spreadsheet sign convention.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> PvFinanceResult<Money> {
    if nper == 0 {
        return Err(PvFinanceError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return present_value
            .checked_add(future_value)
            .map(|total| -total / Decimal::from(nper))
            .ok_or_else(|| PvFinanceError::overflow("PMT"));
    }

    let factor = compound_factor(rate, nper, "PMT annuity factor")?;
    let annuity_factor = (factor - Decimal::ONE)
        .checked_div(rate)
        .ok_or_else(|| PvFinanceError::overflow("PMT annuity factor"))?;

    if annuity_factor.is_zero() {
        return Err(PvFinanceError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    present_value
        .checked_mul(factor)
        .and_then(|grown| grown.checked_add(future_value))
        .and_then(|total| total.checked_div(annuity_factor))
        .map(|payment| -payment)
        .ok_or_else(|| PvFinanceError::overflow("PMT"))
}
