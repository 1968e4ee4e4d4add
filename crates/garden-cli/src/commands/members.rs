//! Members command implementation.

use anyhow::{Context, Result};

use garden_core::GardenClient;

use crate::cli::MemberAction;
use crate::format::{FormatOptions, format_members_text};
use crate::util::write_output;

pub async fn cmd_members(
    client: &GardenClient,
    device_id: &str,
    action: MemberAction,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<()> {
    match action {
        MemberAction::List { blocked } => {
            let members = if blocked {
                client.blocked_members(device_id).await
            } else {
                client.members(device_id).await
            }
            .with_context(|| format!("Failed to fetch members of {}", device_id))?;

            let content = if opts.json {
                opts.as_json(&members)?
            } else {
                format_members_text(&members, blocked, opts)
            };
            write_output(&content)?;
        }
        MemberAction::Add { body } => {
            let body: serde_json::Value =
                serde_json::from_str(&body).context("Member body must be valid JSON")?;
            client
                .add_members(device_id, &body)
                .await
                .context("Failed to add members")?;
            if !quiet {
                println!("Added members to {}", device_id);
            }
        }
        MemberAction::Remove { member } => {
            client
                .remove_member(device_id, &member)
                .await
                .with_context(|| format!("Failed to remove member {}", member))?;
            if !quiet {
                println!("Removed member {} from {}", member, device_id);
            }
        }
        MemberAction::Promote { member } => {
            client
                .update_member_role(device_id, &member)
                .await
                .with_context(|| format!("Failed to update role of {}", member))?;
            if !quiet {
                println!("Updated role of {} on {}", member, device_id);
            }
        }
        MemberAction::Block { member } => {
            client
                .block_member(device_id, &member)
                .await
                .with_context(|| format!("Failed to block {}", member))?;
            if !quiet {
                println!("Blocked {} from {}", member, device_id);
            }
        }
        MemberAction::Unblock { member } => {
            client
                .unblock_member(device_id, &member)
                .await
                .with_context(|| format!("Failed to unblock {}", member))?;
            if !quiet {
                println!("Unblocked {} on {}", member, device_id);
            }
        }
    }

    Ok(())
}
