//! `velo rules` -- traffic rule listing.

use tabled::Tabled;

use velocache_api::models::{Rule, RuleAction, RuleCondition};

use crate::cli::{RulesArgs, RulesCommand};
use crate::error::CliError;
use crate::output;

use super::Ctx;

pub async fn handle(ctx: &Ctx, args: RulesArgs) -> Result<(), CliError> {
    match args.command {
        RulesCommand::List => list(ctx).await,
    }
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "MATCH")]
    condition: String,
    #[tabled(rename = "ACTION")]
    action: &'static str,
}

async fn list(ctx: &Ctx) -> Result<(), CliError> {
    let rules = ctx.client.list_rules().await.map_err(|e| ctx.error(e))?;

    let rendered = output::render_list(ctx.format, &rules, to_row, |r| r.name.clone());
    output::print_output(&rendered);
    Ok(())
}

fn to_row(rule: &Rule) -> RuleRow {
    let condition = match &rule.condition {
        RuleCondition::Domain(domain) => format!("domain {domain}"),
        RuleCondition::UrlPattern(pattern) => format!("url {pattern}"),
    };
    let action = match rule.action {
        RuleAction::Allow => "allow",
        RuleAction::Block => "block",
        RuleAction::BypassCache => "bypass-cache",
    };

    RuleRow {
        name: rule.name.clone(),
        condition,
        action,
    }
}
