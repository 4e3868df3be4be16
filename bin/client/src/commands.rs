//! Client commands and their terminal output.

use boxoffice_api::{Booking, Event, EventDraft, NewShow, Show};
use boxoffice_core::{EventId, ShowId};
use boxoffice_session::{RegistrationProfile, Role, navigation};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::error::ClientError;
use crate::shell::{Screen, Shell};

/// A command typed at the interactive prompt.
#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

/// Client commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in.
    Login {
        email: String,
        #[arg(long, env = "BOXOFFICE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Does not sign in.
    Register {
        name: String,
        email: String,
        phone: String,
        #[arg(long, env = "BOXOFFICE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Request the admin role.
        #[arg(long)]
        admin: bool,
    },
    /// Sign out and forget the stored token.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Open a view by path, e.g. `/admin` or `/events/3/shows`.
    Open { path: String },
    /// List events.
    Events {
        #[arg(long)]
        city: Option<String>,
    },
    /// List the shows of an event.
    Shows { event: EventId },
    /// Book seats for a show.
    Book {
        show: ShowId,
        #[arg(long, default_value_t = 1)]
        seats: u32,
    },
    /// List your bookings.
    Bookings,
    /// Create an event (admin).
    CreateEvent {
        title: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        language: String,
        #[arg(long)]
        genre: String,
        /// Running time in minutes.
        #[arg(long)]
        duration: u32,
        #[arg(long)]
        rating: String,
    },
    /// Replace an event's details (admin).
    UpdateEvent {
        event: EventId,
        title: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        language: String,
        #[arg(long)]
        genre: String,
        /// Running time in minutes.
        #[arg(long)]
        duration: u32,
        #[arg(long)]
        rating: String,
    },
    /// Delete an event with no shows (admin).
    DeleteEvent { event: EventId },
    /// Schedule a show (admin).
    CreateShow {
        event: EventId,
        #[arg(long)]
        venue: String,
        #[arg(long)]
        auditorium: String,
        /// Local start time, e.g. `2030-01-01T19:30:00`.
        #[arg(long)]
        start: NaiveDateTime,
        #[arg(long)]
        seats: u32,
    },
    /// Cancel a show (admin).
    DeleteShow { show: ShowId },
    /// Wait until the session ends.
    Watch,
    /// Read commands from standard input until `quit`.
    Interactive,
}

/// Runs one command against the shell.
///
/// # Errors
///
/// Returns the command's failure; [`ClientError::user_message`] is safe to
/// print.
pub async fn execute(shell: &mut Shell, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { email, password } => {
            let landing = shell.login(&email, &password).await?;
            if let Some(user) = shell.user() {
                println!("Welcome, {}.", user.greeting_name());
            }
            println!("Now at {landing}.");
        }
        Command::Register {
            name,
            email,
            phone,
            password,
            admin,
        } => {
            let mut profile = RegistrationProfile::new(name, email, phone, password);
            if admin {
                profile = profile.with_role(Role::Admin);
            }
            shell.register(&profile).await?;
            println!("Account created. Log in to continue.");
        }
        Command::Logout => {
            shell.logout();
            println!("Logged out.");
        }
        Command::Whoami => whoami(shell),
        Command::Open { path } => print_screen(&shell.open(&path)),
        Command::Events { city } => {
            for event in shell.events(city.as_deref()).await? {
                print_event(&event);
            }
        }
        Command::Shows { event } => {
            for show in shell.shows(event).await? {
                print_show(&show);
            }
        }
        Command::Book { show, seats } => {
            let booking = shell.book(show, seats).await?;
            println!("Booked #{}.", booking.id);
            print_booking(&booking);
        }
        Command::Bookings => {
            for booking in shell.bookings().await? {
                print_booking(&booking);
            }
        }
        Command::CreateEvent {
            title,
            city,
            language,
            genre,
            duration,
            rating,
        } => {
            let draft = EventDraft {
                title,
                city,
                language,
                genre,
                duration_minutes: duration,
                rating,
            };
            let event = shell.create_event(&draft).await?;
            println!("Created event #{}.", event.id);
        }
        Command::UpdateEvent {
            event,
            title,
            city,
            language,
            genre,
            duration,
            rating,
        } => {
            let draft = EventDraft {
                title,
                city,
                language,
                genre,
                duration_minutes: duration,
                rating,
            };
            let updated = shell.update_event(event, &draft).await?;
            println!("Updated event #{}.", updated.id);
        }
        Command::DeleteEvent { event } => {
            shell.delete_event(event).await?;
            println!("Deleted event #{event}.");
        }
        Command::CreateShow {
            event,
            venue,
            auditorium,
            start,
            seats,
        } => {
            let show = NewShow {
                event_id: event,
                venue_name: venue,
                auditorium_name: auditorium,
                start_time: start,
                total_seats: seats,
            };
            let now = chrono::Local::now().naive_local();
            let created = shell.create_show(&show, now).await?;
            println!("Scheduled show #{}.", created.id);
        }
        Command::DeleteShow { show } => {
            shell.delete_show(show).await?;
            println!("Cancelled show #{show}.");
        }
        Command::Watch => {
            println!("Watching the session; press Ctrl-C to stop.");
            tokio::select! {
                moved = shell.next_move() => {
                    if let Some(route) = moved {
                        println!("Session ended. Now at {route}.");
                    }
                }
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        Command::Interactive => {
            return Err(ClientError::InvalidRequest {
                reason: "already interactive".to_string(),
            });
        }
    }
    Ok(())
}

/// What a line typed at the prompt asks for.
#[derive(Debug)]
pub enum Prompt {
    Blank,
    Quit,
    Run(Command),
}

/// Parses a prompt line. Arguments are split the way a POSIX shell splits
/// them, so `create-event "The Play" ...` keeps the title as one argument.
///
/// # Errors
///
/// Returns the message to print for unbalanced quotes or an unknown command.
pub fn parse_prompt(line: &str) -> Result<Prompt, String> {
    let words = shlex::split(line).ok_or_else(|| "unbalanced quotes".to_string())?;
    match words.first().map(String::as_str) {
        None => Ok(Prompt::Blank),
        Some("quit" | "exit") => Ok(Prompt::Quit),
        Some(_) => Line::try_parse_from(words)
            .map(|line| Prompt::Run(line.command))
            .map_err(|error| error.to_string()),
    }
}

/// Reads commands from standard input, reporting session endings as they
/// happen.
pub async fn interactive(shell: &mut Shell) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Type a command, `help` or `quit`.");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => return,
                    Err(error) => {
                        warn!(%error, "failed to read input");
                        return;
                    }
                };
                match parse_prompt(&line) {
                    Ok(Prompt::Blank) => {}
                    Ok(Prompt::Quit) => return,
                    Ok(Prompt::Run(command)) => {
                        if let Err(error) = execute(shell, command).await {
                            println!("{}", error.user_message());
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
            moved = shell.next_move() => match moved {
                Some(route) => println!("Session ended. Now at {route}."),
                None => return,
            },
        }
    }
}

fn whoami(shell: &Shell) {
    let session = shell.session().snapshot();
    let Some(user) = session.user() else {
        println!("Not logged in.");
        return;
    };
    println!("{} ({})", user.greeting_name(), user.subject());
    println!("roles: {}", user.roles());
    if let Some(expires_at) = session.expires_at() {
        println!("expires: {expires_at}");
    }
    let links: Vec<String> = navigation(user)
        .into_iter()
        .map(|item| format!("{} {}", item.label, item.route))
        .collect();
    println!("views: {}", links.join(", "));
}

fn print_screen(screen: &Screen) {
    match screen {
        Screen::Show(route) => println!("Now at {route}."),
        Screen::Waiting => println!("Still loading the session."),
        Screen::Redirected { from, to } => println!("{from} needs a login. Now at {to}."),
        Screen::Denied { route, required } => println!("Access denied to {route}: requires {required}."),
    }
}

fn print_event(event: &Event) {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let minutes = event
        .duration_minutes
        .map_or_else(|| "-".to_string(), |minutes| format!("{minutes} min"));
    println!(
        "#{} {} | {} | {} | {} | {} | {}",
        event.id,
        event.title,
        field(&event.city),
        field(&event.language),
        field(&event.genre),
        minutes,
        field(&event.rating),
    );
}

fn print_show(show: &Show) {
    println!(
        "#{} {} / {} | {} to {} | {} of {} seats free",
        show.id,
        show.venue_name,
        show.auditorium_name,
        show.start_time,
        show.end_time,
        show.seats_available(),
        show.total_seats,
    );
}

fn print_booking(booking: &Booking) {
    let show = booking.show.as_ref().map_or_else(
        || "unknown show".to_string(),
        |show| {
            let title = show.event.as_ref().map_or("-", |event| event.title.as_str());
            format!("{title} at {} on {}", show.venue_name, show.start_time)
        },
    );
    println!("#{} {} | seats {}", booking.id, show, booking.seat_label());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, String> {
        match parse_prompt(line)? {
            Prompt::Run(command) => Ok(command),
            other => Err(format!("not a command: {other:?}")),
        }
    }

    #[test]
    fn parses_booking_with_default_seats() {
        match parse("book 7").expect("parse") {
            Command::Book { show, seats } => {
                assert_eq!(show, ShowId::new(7));
                assert_eq!(seats, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn accepts_prefixed_ids() {
        match parse("shows evt_3").expect("parse") {
            Command::Shows { event } => assert_eq!(event, EventId::new(3)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_show_start_time() {
        let command = parse(
            "create-show 3 --venue Regal --auditorium A1 --start 2030-01-01T19:30:00 --seats 40",
        )
        .expect("parse");
        match command {
            Command::CreateShow { start, seats, .. } => {
                assert_eq!(start.to_string(), "2030-01-01 19:30:00");
                assert_eq!(seats, 40);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_ids() {
        assert!(parse("delete-show abc").is_err());
    }

    #[test]
    fn register_admin_flag() {
        let command = parse("register Ada a@b.com 555-0100 --password pw --admin").expect("parse");
        assert!(matches!(command, Command::Register { admin: true, .. }));
    }

    #[test]
    fn quoted_arguments_stay_whole() {
        let command = parse(
            r#"update-event 4 "The Play That Goes Wrong" --city 'New Delhi' --language English --genre Comedy --duration 120 --rating U"#,
        )
        .expect("parse");
        match command {
            Command::UpdateEvent {
                event, title, city, ..
            } => {
                assert_eq!(event, EventId::new(4));
                assert_eq!(title, "The Play That Goes Wrong");
                assert_eq!(city, "New Delhi");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn blank_and_quit_lines() {
        assert!(matches!(parse_prompt("   "), Ok(Prompt::Blank)));
        assert!(matches!(parse_prompt("quit"), Ok(Prompt::Quit)));
        assert!(matches!(parse_prompt(" exit "), Ok(Prompt::Quit)));
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        let message = parse_prompt(r#"create-event "The Play"#).unwrap_err();
        assert!(message.contains("unbalanced"));
    }
}
