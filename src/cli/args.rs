use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "skymark")]
#[command(about = "Annotate NASA's public image archive from the terminal")]
#[command(long_about = "skymark - annotate NASA's image archive from the terminal

Search NASA's public image archive, record labeled regions of interest,
vote on other people's annotations, and ask the backend for machine
region proposals. Writes made while offline are queued locally and
replayed automatically once connectivity returns.

QUICK START:
  skymark login --email you@example.org     Sign in to the backend
  skymark search \"mars crater\"              Search the archive
  skymark annotate add PIA08813 --region rect:0.1,0.2,0.3,0.3 --label crater
  skymark sync status                       Inspect the offline queue

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  skymark <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in to the annotation backend
    ///
    /// Authenticates with email and password and stores the session
    /// locally, so later commands (and offline writes) run as you.
    ///
    /// # Examples
    ///
    ///   skymark login --email you@example.org --password secret
    ///   SKYMARK_PASSWORD=secret skymark login --email you@example.org
    Login(LoginArgs),

    /// Sign out and discard the stored session
    ///
    /// Revokes the token on the backend when reachable; the local
    /// session is discarded either way.
    Logout,

    /// Show the signed-in user
    ///
    /// Prints the stored session. With connectivity the identity is
    /// refreshed from the backend first.
    Whoami,

    /// Search NASA's image archive
    ///
    /// Queries the public image-search API and lists matching items with
    /// their archive ids. Use the id with 'annotate add' to annotate an
    /// image.
    ///
    /// # Examples
    ///
    ///   skymark search "mars crater"
    ///   skymark search "apollo 11" --page 2
    ///   skymark search aurora --media-type image -o json
    #[command(alias = "s")]
    Search(SearchArgs),

    /// List downloadable asset renditions for an archive item
    ///
    /// # Examples
    ///
    ///   skymark asset PIA08813
    Asset {
        /// Archive id of the item (e.g. PIA08813)
        nasa_id: String,
    },

    /// Manage annotations (add, list, show, update, delete)
    ///
    /// Annotations are labeled regions of interest on an archive image.
    /// Writes made while offline are queued and replayed on the next
    /// sync.
    ///
    /// # Region Syntax
    ///
    ///   rect:X,Y,W,H              Rectangle in normalized [0,1] coords
    ///   poly:X1,Y1;X2,Y2;X3,Y3    Polygon with three or more vertices
    ///
    /// # Examples
    ///
    ///   skymark annotate add PIA08813 --region rect:0.1,0.2,0.3,0.3 --label crater
    ///   skymark annotate list --image PIA08813
    ///   skymark annotate update 4f0c... --label "impact crater"
    ///   skymark annotate delete 4f0c...
    #[command(alias = "a")]
    Annotate(AnnotateArgs),

    /// Vote on annotations
    ///
    /// # Examples
    ///
    ///   skymark vote cast 4f0c...          Upvote
    ///   skymark vote cast 4f0c... --down   Downvote
    ///   skymark vote list 4f0c...
    Vote(VoteArgs),

    /// Show the vote consensus for an image
    ///
    /// The consensus is aggregated backend-side from everyone's votes;
    /// this command only reads it, so scores may lag the newest votes
    /// until the backend refreshes the view.
    Consensus {
        /// Archive id of the image
        image_id: String,
    },

    /// Ask the backend for machine-generated region proposals
    ///
    /// Calls the region-suggestion function for an image. With --save,
    /// each proposal is stored as a machine-sourced annotation.
    ///
    /// # Examples
    ///
    ///   skymark suggest PIA08813
    ///   skymark suggest PIA08813 --save
    Suggest(SuggestArgs),

    /// Object storage helpers
    ///
    /// # Examples
    ///
    ///   skymark storage sign exports/report.png
    ///   skymark storage sign exports/report.png --expires 600
    Storage(StorageArgs),

    /// Manage the offline sync queue
    ///
    /// Writes made without connectivity land in a local queue. These
    /// commands inspect the queue, replay it, retry failures, and clean
    /// up synced entries.
    ///
    /// # Subcommands
    ///
    ///   status   Show queue counts and the last sync time
    ///   run      Replay pending operations now
    ///   list     List queued operations
    ///   retry    Reset failed operations and replay
    ///   clear    Remove synced operations
    ///   watch    Run the background sync service in the foreground
    ///
    /// # Examples
    ///
    ///   skymark sync status
    ///   skymark sync run
    ///   skymark sync list --status failed
    ///   skymark sync retry 12
    Sync(SyncArgs),

    /// Launch the interactive queue dashboard (TUI)
    ///
    /// Full-screen view of the sync queue with vim-style navigation.
    ///
    /// # Keybindings
    ///
    ///   j/k or arrows  Navigate up/down
    ///   gg/G           Jump to top/bottom
    ///   s              Sync now
    ///   y              Retry selected failed item
    ///   r              Refresh
    ///   q/Esc          Quit
    Queue,

    /// Generate shell completions
    ///
    /// # Examples
    ///
    ///   skymark completions bash > /etc/bash_completion.d/skymark
    ///   skymark completions zsh > ~/.zfunc/_skymark
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Email address of the account
    #[arg(long, short = 'e')]
    pub email: String,

    /// Password (falls back to the SKYMARK_PASSWORD environment variable)
    #[arg(long, short = 'p', env = "SKYMARK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Free-text query
    pub query: String,

    /// Result page (1-based)
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,

    /// Restrict to a media type (image, video, audio)
    #[arg(long, short = 'm')]
    pub media_type: Option<String>,
}

/// Arguments for annotation subcommands.
#[derive(Args)]
pub struct AnnotateArgs {
    #[command(subcommand)]
    pub command: AnnotateCommands,
}

/// Annotation subcommands.
#[derive(Subcommand)]
pub enum AnnotateCommands {
    /// Add an annotation to an image
    Add {
        /// Archive id of the image (e.g. PIA08813)
        image_id: String,

        /// Region of interest (rect:x,y,w,h or poly:x1,y1;x2,y2;...)
        #[arg(long, short = 'r')]
        region: String,

        /// Label for the region
        #[arg(long, short = 'l')]
        label: String,

        /// Optional free-text note
        #[arg(long, short = 'n')]
        note: Option<String>,
    },

    /// List annotations
    List {
        /// Annotations on this image
        #[arg(long, short = 'i', conflicts_with = "mine")]
        image: Option<String>,

        /// Your own annotations across all images
        #[arg(long)]
        mine: bool,
    },

    /// Show one annotation in full
    Show {
        /// Annotation id
        id: String,
    },

    /// Update an annotation's label, note, or region
    Update {
        /// Annotation id
        id: String,

        /// New label
        #[arg(long, short = 'l')]
        label: Option<String>,

        /// New note
        #[arg(long, short = 'n')]
        note: Option<String>,

        /// New region (rect:... or poly:...)
        #[arg(long, short = 'r')]
        region: Option<String>,
    },

    /// Delete an annotation
    Delete {
        /// Annotation id
        id: String,
    },
}

/// Arguments for vote subcommands.
#[derive(Args)]
pub struct VoteArgs {
    #[command(subcommand)]
    pub command: VoteCommands,
}

/// Vote subcommands.
#[derive(Subcommand)]
pub enum VoteCommands {
    /// Cast a vote on an annotation
    Cast {
        /// Annotation id
        annotation_id: String,

        /// Cast a downvote instead of an upvote
        #[arg(long)]
        down: bool,
    },

    /// List the votes on an annotation
    List {
        /// Annotation id
        annotation_id: String,
    },
}

/// Arguments for the suggest command.
#[derive(Args)]
pub struct SuggestArgs {
    /// Archive id of the image
    pub image_id: String,

    /// Store each proposal as a machine-sourced annotation
    #[arg(long)]
    pub save: bool,
}

/// Arguments for storage subcommands.
#[derive(Args)]
pub struct StorageArgs {
    #[command(subcommand)]
    pub command: StorageCommands,
}

/// Storage subcommands.
#[derive(Subcommand)]
pub enum StorageCommands {
    /// Issue a signed URL for an object
    Sign {
        /// Object path as bucket/key (e.g. exports/report.png)
        object: String,

        /// Seconds the URL stays valid
        #[arg(long, short = 'x', default_value = "3600")]
        expires: u64,
    },
}

/// Arguments for sync subcommands.
#[derive(Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommands,
}

/// Sync queue subcommands.
#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show sync queue status
    ///
    /// Displays pending, synced, and failed operations and the last
    /// successful sync time.
    Status,

    /// Replay pending sync operations now
    ///
    /// Requires connectivity. Items replay in the order they were
    /// recorded; failures are recorded per item and do not stop the run.
    Run,

    /// List queued operations
    List {
        /// Filter by status (pending, synced, failed)
        #[arg(long, short = 's')]
        status: Option<String>,

        /// Maximum operations to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// Retry failed operations
    ///
    /// Resets a failed operation to pending (attempts return to zero and
    /// the recorded error is cleared) and replays immediately when
    /// online.
    Retry {
        /// Queue item id to retry
        id: Option<i64>,

        /// Retry all failed operations
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },

    /// Remove synced operations from the queue
    ///
    /// Pending and failed operations are never touched.
    Clear,

    /// Run the background sync service in the foreground
    ///
    /// Probes connectivity, drains when it returns, and drains again on
    /// the configured interval. Press Enter to stop.
    Watch,
}
