//! User feedback channel.
//!
//! The agenda never talks to a presentation layer directly; it is handed a
//! [`Notifier`] when constructed. Which one is decided by configuration.

use std::str::FromStr;

use clap::ValueEnum;

pub trait Notifier {
    fn notify(&self, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, message: &str) {
        (**self).notify(message)
    }
}

/// Emits each message as a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(target: "agenda::notify", "{}", message);
    }
}

/// Prints each message on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("{}", message);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NotifierKind {
    Log,
    #[default]
    Console,
    Silent,
}

impl NotifierKind {
    pub fn build(self) -> Box<dyn Notifier> {
        match self {
            NotifierKind::Log => Box::new(LogNotifier),
            NotifierKind::Console => Box::new(ConsoleNotifier),
            NotifierKind::Silent => Box::new(SilentNotifier),
        }
    }
}

impl FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "log" => Ok(NotifierKind::Log),
            "console" | "stdout" => Ok(NotifierKind::Console),
            "silent" | "none" => Ok(NotifierKind::Silent),
            other => Err(format!("Unknown notifier '{}'. Use log, console or silent", other)),
        }
    }
}
