//! Technical support sub-agent: opens IT tickets.

use medcoord_common::AgentKind;
use rand::Rng;

use crate::call::SupportArgs;
use crate::dispatch::ToolOutcome;

pub fn handle(args: &SupportArgs) -> ToolOutcome {
    // Tickets are not stored, so the number only has to look plausible.
    let ticket = rand::thread_rng().gen_range(0..1000);
    ToolOutcome::new(
        AgentKind::TechnicalSupport,
        format!(
            "Tiket support dibuat dengan ID TKT-{ticket}. Detail masalah: \"{}\". Teknisi akan segera meninjau.",
            args.issue_details
        ),
        format!("[IT] Support Ticket: {}", args.action),
    )
}
