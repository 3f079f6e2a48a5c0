//! Line-oriented chat front end.

use medcoord_common::{Turn, TurnRole};
use medcoord_coordinator::Session;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const EXIT_COMMANDS: [&str; 3] = ["/keluar", "/exit", "/quit"];

pub fn render_turn(turn: &Turn) -> String {
    let badge = match (turn.role, turn.agent) {
        (TurnRole::User, _) => "Anda",
        (_, Some(agent)) => agent.badge(),
        (_, None) => "Sistem",
    };
    let marker = if turn.is_tool_trace { "~" } else { "" };
    turn.content
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{marker}[{badge}] {line}")
            } else {
                format!("{marker}{:width$} {line}", "", width = badge.len() + 2)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read messages line by line until EOF or an exit command.
///
/// `/dashboard` prints the active agent's panel as JSON.
pub async fn run<R, W>(session: &Session, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    for turn in &session.snapshot().await.turns {
        output
            .write_all(format!("{}\n", render_turn(turn)).as_bytes())
            .await?;
    }

    let mut lines = input.lines();
    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&line) {
            break;
        }
        if line == "/dashboard" {
            let dashboard = session.dashboard().await;
            let json = serde_json::to_string_pretty(&dashboard)?;
            output.write_all(format!("{json}\n").as_bytes()).await?;
            continue;
        }

        match session.submit(line).await {
            Ok(reply) => {
                for turn in &reply.turns {
                    output
                        .write_all(format!("{}\n", render_turn(turn)).as_bytes())
                        .await?;
                }
                if !reply.system_log.is_empty() {
                    output
                        .write_all(format!("  (log) {}\n", reply.system_log).as_bytes())
                        .await?;
                }
            }
            Err(err) => {
                output.write_all(format!("! {err}\n").as_bytes()).await?;
            }
        }
    }

    output.flush().await?;
    Ok(())
}
