use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::actor::{Actor, Role};
use crate::identity::StaticIdentity;

pub mod commands;

#[derive(Parser)]
#[command(name = "netris")]
#[command(about = "Tire-repair listing submissions and admin review")]
#[command(long_about = "Netris keeps a directory of tambal ban (tire repair) vendors. Users submit \
                       listings that wait for admin review; admins publish, reject and remove them. \
                       Start with 'netris list' to see what is already published.")]
pub struct Cli {
    #[command(flatten)]
    pub identity: IdentityArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Who the command acts as. Without an id or email the caller is a guest.
#[derive(Args, Debug, Clone, Default)]
pub struct IdentityArgs {
    #[arg(long, global = true, help = "Id of the acting user")]
    pub actor_id: Option<String>,
    #[arg(long, global = true, help = "Email of the acting user")]
    pub actor_email: Option<String>,
    #[arg(long, global = true, help = "Display name stamped into audit fields")]
    pub actor_name: Option<String>,
    #[arg(long, global = true, help = "guest, user, admin or superadmin")]
    pub role: Option<Role>,
}

impl IdentityArgs {
    pub fn identity(&self) -> StaticIdentity {
        let id = self.actor_id.clone().unwrap_or_default();
        let email = self.actor_email.clone().unwrap_or_default();
        if id.is_empty() && email.is_empty() {
            return StaticIdentity::anonymous();
        }
        StaticIdentity::signed_in(Actor::new(
            id,
            email,
            self.actor_name.clone().unwrap_or_default(),
            self.role.unwrap_or(Role::User),
        ))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a new listing from a JSON draft
    Submit {
        #[arg(long, help = "Path to the listing draft (JSON)")]
        file: PathBuf,
        #[arg(long = "photo", help = "Photo to upload with the listing (repeatable, max 2)")]
        photos: Vec<PathBuf>,
    },
    /// Edit a listing; non-privileged edits of pending listings go through review
    Edit {
        id: String,
        #[arg(long, help = "Path to the updated listing draft (JSON)")]
        file: PathBuf,
        #[arg(long = "photo", help = "Replacement photo (repeatable, max 2)")]
        photos: Vec<PathBuf>,
    },
    /// List listings, optionally filtered
    List {
        #[arg(long, help = "Only this status: pending, aktif, rejected, pending_deletion")]
        status: Option<crate::listing::ListingStatus>,
        #[arg(long, short = 'q', help = "Case-insensitive text search")]
        query: Option<String>,
        #[arg(long, help = "Only listings you submitted")]
        mine: bool,
    },
    /// Show one listing in full
    Show { id: String },
    /// Show everything waiting for admin review
    Queue,
    /// Approve a pending listing or update request
    Approve { id: String },
    /// Reject a pending listing
    Reject {
        id: String,
        #[arg(long, help = "Why the listing is rejected")]
        reason: String,
    },
    /// Ask for a listing to be removed (admins remove immediately)
    RequestDeletion {
        id: String,
        #[arg(long, default_value = "", help = "Why the listing should go")]
        reason: String,
    },
    /// Confirm a deletion request and remove the listing
    ApproveDeletion { id: String },
    /// Refuse a deletion request and keep the listing published
    RejectDeletion {
        id: String,
        #[arg(long, help = "Why the listing stays")]
        reason: String,
    },
    /// Counts per status
    Stats,
    /// Listings per contributor over a period
    Report {
        #[arg(long, default_value = "all", help = "today, week, month, year or all")]
        period: crate::report::ReportPeriod,
        #[arg(long, requires = "to", help = "Custom range start (YYYY-MM-DD)")]
        from: Option<chrono::NaiveDate>,
        #[arg(long, requires = "from", help = "Custom range end (YYYY-MM-DD)")]
        to: Option<chrono::NaiveDate>,
    },
}
