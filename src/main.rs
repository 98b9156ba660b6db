mod cli;
mod csv_import;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agenda::datetime::{
    finalize_date_input, finalize_time_input, format_date_as_typed, format_time,
    format_time_as_typed, is_valid_time, normalize_date, parse_flexible_date, to_display,
};
use agenda::{Agenda, Backend, CalendarEvent, Config, EventForm, EventStore, Notifier};

use crate::cli::{Cli, Commands};

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn print_events<'a>(events: impl IntoIterator<Item = &'a CalendarEvent>) {
    println!(
        "\n{:<36} {:<12} {:<8} {:<8} {:<30}",
        "id", "date", "start", "end", "title"
    );
    println!("{}", "-".repeat(98));
    for event in events {
        let start = if event.is_all_day() {
            "all-day".to_string()
        } else {
            event.time.map(format_time).unwrap_or_default()
        };
        println!(
            "{:<36} {:<12} {:<8} {:<8} {:<30}",
            event.id(),
            to_display(event.date),
            start,
            event.end_time.map(format_time).unwrap_or_default(),
            truncate(&event.title, 30),
        );
        if let Some(desc) = &event.description {
            let desc_preview = truncate(desc.replace('\n', " | ").as_str(), 90);
            println!("  description: {}", desc_preview);
        }
    }
    println!();
}

fn print_normalized(input: &str, time: bool) {
    if time {
        println!("strict:    {}", if is_valid_time(input) { input } else { "(invalid)" });
        println!("as typed:  {}", format_time_as_typed(input));
        println!("finalized: {}", finalize_time_input(input));
    } else {
        println!(
            "strict:    {}",
            normalize_date(input).unwrap_or_else(|| "(invalid)".to_string())
        );
        println!("as typed:  {}", format_date_as_typed(input));
        println!("finalized: {}", finalize_date_input(input));
    }
}

async fn run<S: EventStore, N: Notifier>(agenda: &mut Agenda<S, N>, command: Commands) -> Result<()> {
    agenda.load().await.context("Failed to load events")?;

    match command {
        Commands::List { date } => match date {
            Some(raw) => {
                let day = parse_flexible_date(&raw)
                    .with_context(|| format!("Invalid date '{}'. Use DD/MM/YYYY or YYYY-MM-DD", raw))?;
                print_events(agenda.events_on(day));
            }
            None => print_events(agenda.events()),
        },
        Commands::Add(args) => {
            let event = agenda.add(&EventForm::from(args)).await?;
            tracing::info!("Event id: {}", event.id());
        }
        Commands::Edit { id, changes } => {
            let current = agenda
                .get(id)
                .with_context(|| format!("No event with id {}", id))?;
            let mut form = EventForm::from_event(current);
            changes.apply(&mut form);
            agenda.update(id, &form).await?;
        }
        Commands::Delete { id } => {
            agenda.delete(id).await?;
        }
        Commands::Import { file, dry_run } => {
            tracing::info!("Importing events from: {}", file.display());

            let forms = csv_import::parse_csv(&file)?;
            tracing::info!("Parsed {} events", forms.len());

            if dry_run {
                tracing::info!("Dry run mode - not saving events");
                for form in &forms {
                    println!("{:<12} {:<8} {}", form.date, form.time, form.title);
                }
                return Ok(());
            }

            for form in &forms {
                agenda
                    .add(form)
                    .await
                    .with_context(|| format!("Failed to import event: {}", form.title))?;
            }
            tracing::info!("Successfully imported {} events", forms.len());
        }
        Commands::Normalize { input, time } => print_normalized(&input, time),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Normalizing needs no store.
    let command = match cli.command {
        Commands::Normalize { input, time } => {
            print_normalized(&input, time);
            return Ok(());
        }
        command => command,
    };

    let mut config = Config::from_env().context("Failed to read configuration")?;
    if let Some(storage) = cli.storage {
        config.storage = storage;
    }
    if let Some(notifier) = cli.notify {
        config.notifier = notifier;
    }

    let backend = Backend::from_config(&config)?;
    let mut agenda = Agenda::new(backend, config.notifier.build());

    run(&mut agenda, command).await
}
