use agenda::{EventForm, NotifierKind, StorageKind};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "agenda")]
#[command(author, version, about = "Keep a personal agenda of calendar events")]
pub struct Cli {
    /// Where events are kept (overrides AGENDA_STORAGE)
    #[arg(long, global = true, value_enum)]
    pub storage: Option<StorageKind>,

    /// How feedback messages are shown (overrides AGENDA_NOTIFY)
    #[arg(long, global = true, value_enum)]
    pub notify: Option<NotifierKind>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List events, optionally only those on one day
    List {
        /// Only show events on this date (DD/MM/YYYY or YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Add a new event
    Add(EventArgs),

    /// Edit an event; fields not given keep their current value
    Edit {
        /// Id of the event to edit
        id: Uuid,

        #[command(flatten)]
        changes: EditArgs,
    },

    /// Delete an event
    Delete {
        /// Id of the event to delete
        id: Uuid,
    },

    /// Import events from a CSV file (use --dry-run to preview)
    Import {
        /// Path to the CSV file containing events
        #[arg(short, long)]
        file: PathBuf,

        /// Preview events without saving them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Show how a typed date (or time, with --time) is normalized
    Normalize {
        /// Raw input, as typed
        input: String,

        /// Treat the input as a time of day instead of a date
        #[arg(long)]
        time: bool,
    },
}

#[derive(Args)]
pub struct EventArgs {
    /// Event title
    #[arg(short, long)]
    pub title: String,

    /// Date (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(short, long)]
    pub date: String,

    /// Start time (HH:MM), required unless --all-day
    #[arg(long, default_value = "")]
    pub time: String,

    /// End time (HH:MM)
    #[arg(long, default_value = "")]
    pub end_time: String,

    /// The event takes the whole day
    #[arg(short, long)]
    pub all_day: bool,

    /// Free-form notes
    #[arg(long, default_value = "")]
    pub description: String,
}

impl From<EventArgs> for EventForm {
    fn from(args: EventArgs) -> Self {
        EventForm {
            title: args.title,
            description: args.description,
            date: args.date,
            time: args.time,
            end_time: args.end_time,
            all_day: args.all_day,
        }
    }
}

#[derive(Args)]
pub struct EditArgs {
    #[arg(short, long)]
    pub title: Option<String>,

    /// Date (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Start time (HH:MM)
    #[arg(long)]
    pub time: Option<String>,

    /// End time (HH:MM); pass an empty string to clear it
    #[arg(long)]
    pub end_time: Option<String>,

    #[arg(short, long)]
    pub all_day: Option<bool>,

    #[arg(long)]
    pub description: Option<String>,
}

impl EditArgs {
    /// Overlay the given changes on a form pre-filled from the current event.
    pub fn apply(self, form: &mut EventForm) {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(date) = self.date {
            form.date = date;
        }
        if let Some(time) = self.time {
            form.time = time;
        }
        if let Some(end_time) = self.end_time {
            form.end_time = end_time;
        }
        if let Some(all_day) = self.all_day {
            form.all_day = all_day;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
    }
}
