use anyhow::Result;

use super::{with_listing_service, Command};
use crate::report::ReportPeriod;

pub struct StatsCommand;

impl Command for StatsCommand {
    async fn execute(&self) -> Result<()> {
        with_listing_service(|service| async move {
            let stats = service.approval_stats().await?;
            println!("📊 Listing status overview");
            println!("   Total:            {}", stats.total);
            println!("   Published:        {}", stats.approved);
            println!("   Pending:          {}", stats.pending);
            println!("   Rejected:         {}", stats.rejected);
            println!("   Pending deletion: {}", stats.pending_deletion);
            Ok(())
        })
        .await
    }
}

pub struct ReportCommand {
    pub period: ReportPeriod,
}

impl Command for ReportCommand {
    async fn execute(&self) -> Result<()> {
        let period = self.period;
        with_listing_service(|service| async move {
            let report = service.contributor_report(period).await?;

            println!("📈 Contributions, {}", report.period);
            if let Some((start, end)) = report.range {
                println!("   {start} .. {end}");
            }
            println!(
                "   {} listing(s) from {} contributor(s), about {} each",
                report.total_listings,
                report.total_contributors,
                report.average_per_contributor()
            );
            println!(
                "   aktif {} / pending {} / rejected {} / pending deletion {}",
                report.breakdown.aktif,
                report.breakdown.pending,
                report.breakdown.rejected,
                report.breakdown.pending_deletion
            );
            if report.contributors.is_empty() {
                println!();
                println!("   No data for this period");
                return Ok(());
            }

            println!();
            for (rank, contributor) in report.contributors.iter().enumerate() {
                let role = contributor
                    .role
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>3}. {} <{}> [{}]: {} listing(s)",
                    rank + 1,
                    contributor.name,
                    contributor.email,
                    role,
                    contributor.total
                );
            }
            Ok(())
        })
        .await
    }
}
