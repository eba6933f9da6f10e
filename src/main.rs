use anyhow::Result;
use clap::Parser;

use netris::cli::commands::browse::{ListCommand, ShowCommand};
use netris::cli::commands::review::{
    QueueCommand, RequestDeletionCommand, ReviewCommand, ReviewDecision,
};
use netris::cli::commands::stats::{ReportCommand, StatsCommand};
use netris::cli::commands::submit::{EditCommand, SubmitCommand};
use netris::cli::commands::{show_how_to_get_started, Command};
use netris::cli::{Cli, Commands};
use netris::report::ReportPeriod;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = netris::config()?;
    netris::init_telemetry(&settings.observability)?;
    netris::init_config()?;

    let identity = cli.identity.identity();
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        // No subcommand: explain what the tool does
        None => runtime.block_on(show_how_to_get_started()),
        Some(Commands::Submit { file, photos }) => runtime.block_on(async {
            SubmitCommand {
                identity,
                file,
                photos,
            }
            .execute()
            .await
        }),
        Some(Commands::Edit { id, file, photos }) => runtime.block_on(async {
            EditCommand {
                identity,
                id,
                file,
                photos,
            }
            .execute()
            .await
        }),
        Some(Commands::List {
            status,
            query,
            mine,
        }) => runtime.block_on(async {
            ListCommand {
                identity,
                status,
                query,
                mine,
            }
            .execute()
            .await
        }),
        Some(Commands::Show { id }) => {
            runtime.block_on(async { ShowCommand { id }.execute().await })
        }
        Some(Commands::Queue) => runtime.block_on(async { QueueCommand.execute().await }),
        Some(Commands::Approve { id }) => runtime.block_on(review(identity, id, ReviewDecision::Approve)),
        Some(Commands::Reject { id, reason }) => {
            runtime.block_on(review(identity, id, ReviewDecision::Reject { reason }))
        }
        Some(Commands::ApproveDeletion { id }) => {
            runtime.block_on(review(identity, id, ReviewDecision::ApproveDeletion))
        }
        Some(Commands::RejectDeletion { id, reason }) => runtime.block_on(review(
            identity,
            id,
            ReviewDecision::RejectDeletion { reason },
        )),
        Some(Commands::RequestDeletion { id, reason }) => runtime.block_on(async {
            RequestDeletionCommand {
                identity,
                id,
                reason,
            }
            .execute()
            .await
        }),
        Some(Commands::Stats) => runtime.block_on(async { StatsCommand.execute().await }),
        Some(Commands::Report { period, from, to }) => {
            let period = match (from, to) {
                (Some(start), Some(end)) => ReportPeriod::custom(start, end)?,
                _ => period,
            };
            runtime.block_on(async { ReportCommand { period }.execute().await })
        }
    }
}

async fn review(
    identity: netris::StaticIdentity,
    id: String,
    decision: ReviewDecision,
) -> Result<()> {
    ReviewCommand {
        identity,
        id,
        decision,
    }
    .execute()
    .await
}
