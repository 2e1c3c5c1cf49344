//! Finance ledger entries derived from reservation payments

use crate::types::{EntryType, LedgerEntry, PaymentMethod, Reservation};

pub const CATEGORY_PAYMENT: &str = "Reservation Payment";
pub const CATEGORY_REFUND: &str = "Refund/Cancellation";
const BASE_CURRENCY: &str = "TRY";

/// Which entry kinds to derive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOptions {
    /// Recorded payments and refunds
    pub include_payments: bool,
    /// Outstanding balance booked as income on the check-in day
    pub include_planned_balance: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            include_payments: true,
            include_planned_balance: true,
        }
    }
}

/// Turn reservations into ledger rows. Keys are stable, so pushing the same
/// period twice upserts instead of duplicating.
pub fn build_entries(reservations: &[Reservation], opts: LedgerOptions) -> Vec<LedgerEntry> {
    let mut out = Vec::new();

    for r in reservations {
        if opts.include_payments {
            out.extend(payment_entries(r));
        }
        if opts.include_planned_balance {
            out.extend(planned_balance(r));
        }
    }
    out
}

fn payment_entries(r: &Reservation) -> impl Iterator<Item = LedgerEntry> + '_ {
    r.payments.iter().map(move |p| {
        let refund = p.is_refund();
        let amount = p.amount.abs();
        let date = p.date.unwrap_or(r.check_in);
        let method_label = if p.method.is_empty() { &p.kind } else { &p.method };
        let payment_key = match &p.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => date.to_string(),
        };

        LedgerEntry {
            entry_type: if refund {
                EntryType::Expense
            } else {
                EntryType::Income
            },
            method: PaymentMethod::from_label(method_label),
            category: if refund { CATEGORY_REFUND } else { CATEGORY_PAYMENT }.to_string(),
            amount,
            currency: p.currency.clone(),
            fx_rate: p.fx_rate,
            date,
            note: format!(
                "{} • {} • {}",
                if refund { "Refund" } else { "Payment" },
                r.guest_name,
                r.channel
            ),
            unique_key: format!("res:{}:pay:{}:{}", r.id, payment_key, amount),
            source: if refund { "res_refund" } else { "res_payment" }.to_string(),
            reservation: r.id.clone(),
            guest_name: r.guest_name.clone(),
            channel: r.channel.clone(),
        }
    })
}

fn planned_balance(r: &Reservation) -> Option<LedgerEntry> {
    let paid: f64 = r.payments.iter().map(|p| p.amount.max(0.0)).sum();
    let balance = (r.total_price - paid).max(0.0);
    if balance <= 0.0 {
        return None;
    }

    Some(LedgerEntry {
        entry_type: EntryType::Income,
        method: PaymentMethod::Transfer,
        category: CATEGORY_PAYMENT.to_string(),
        amount: balance,
        currency: BASE_CURRENCY.to_string(),
        fx_rate: 1.0,
        date: r.check_in,
        note: format!("Balance due at check-in • {} • {}", r.guest_name, r.channel),
        unique_key: format!("res:{}:balance:{}:{}", r.id, r.check_in, balance),
        source: "res_balance".to_string(),
        reservation: r.id.clone(),
        guest_name: r.guest_name.clone(),
        channel: r.channel.clone(),
    })
}
