//! Billing and insurance sub-agent.

use medcoord_common::AgentKind;

use crate::call::BillingArgs;
use crate::dispatch::ToolOutcome;

pub fn handle(args: &BillingArgs) -> ToolOutcome {
    ToolOutcome::new(
        AgentKind::BillingInsurance,
        format!(
            "Transaksi {} untuk {} berhasil diproses. Status keuangan diperbarui.",
            args.action, args.patient_id
        ),
        format!("[DB] Financial Transaction: {}", args.action),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_transaction() {
        let outcome = handle(&BillingArgs {
            action: "pay".into(),
            patient_id: "P12345".into(),
            financial_details: String::new(),
        });
        assert_eq!(
            outcome.output,
            "Transaksi pay untuk P12345 berhasil diproses. Status keuangan diperbarui."
        );
        assert_eq!(outcome.agent, AgentKind::BillingInsurance);
    }
}
