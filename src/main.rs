use std::{
    error::Error,
    io::{self, BufRead},
    sync::mpsc,
    thread,
};

use clap::{Parser, Subcommand};
use weather_alarm::{
    alarm::parse_hh_mm,
    alarm_scheduler::AlarmScheduler,
    alarm_store::AlarmStore,
    clock::{Clock, SystemClock},
    notes::{Note, NoteStore},
    App, Category, Command as AppCommand, Config, Event, EventSender,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write a default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// print the config in use, api key hidden
    ShowConfig,
    AddAlarm {
        /// 24 hour HH:MM
        time: String,
        #[clap(long, short, default_value = "")]
        label: String,
        /// seconds before the alarm dismisses itself, turns auto-dismiss on
        #[clap(long, short, conflicts_with = "no_auto_dismiss")]
        duration: Option<u32>,
        /// keep ringing until dismissed
        #[clap(long)]
        no_auto_dismiss: bool,
        #[clap(long)]
        disabled: bool,
    },
    RemoveAlarm {
        id: String,
    },
    ToggleAlarm {
        id: String,
    },
    ListAlarms,
    AddNote {
        title: String,
        #[clap(default_value = "")]
        content: String,
        #[clap(long, short)]
        category: Option<String>,
    },
    ListNotes {
        #[clap(long, short)]
        category: Option<String>,
    },
    RemoveNote {
        id: String,
    },
    /// run the scheduler in the foreground. reads `dismiss|toggle|remove <id>`,
    /// `read|clear [category]` and `quit` from stdin
    Run,
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("weather_alarm").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = Config::config_path()?;
    let config = Config::load(&config_path).with_env_overrides();
    let clock = SystemClock;

    match args.command {
        Some(Command::Init { force }) => {
            if force || !Config::is_config_present() {
                Config::new().save(&config_path)?;
                println!("wrote {}", config_path.display());
            } else {
                println!("{} already exists, use --force to overwrite", config_path.display());
            }
        }
        Some(Command::ShowConfig) => {
            println!("# {}", config_path.display());
            print!("{}", toml::to_string(&config.redacted())?);
        }
        Some(Command::AddAlarm {
            time,
            label,
            duration,
            no_auto_dismiss,
            disabled,
        }) => {
            let time = parse_hh_mm(&time)
                .ok_or_else(|| format!("invalid time {time:?}, expected HH:MM"))?;
            let (auto_dismiss, duration) = config.alarm_dismissal(duration);
            let alarm = weather_alarm::Alarm::new(time, clock.now())
                .with_label(label)
                .with_auto_dismiss(auto_dismiss && !no_auto_dismiss, duration)
                .with_enabled(!disabled);
            let id = alarm.id.clone();
            if open_alarms(&config, &clock)?.add_alarm(alarm) {
                println!("added alarm {id}");
            } else {
                return Err(format!("an alarm at {} already exists", time.format("%H:%M")).into());
            }
        }
        Some(Command::RemoveAlarm { id }) => {
            if !open_alarms(&config, &clock)?.remove_alarm(&id) {
                return Err(format!("no alarm with id {id}").into());
            }
        }
        Some(Command::ToggleAlarm { id }) => {
            let mut alarms = open_alarms(&config, &clock)?;
            if !alarms.toggle_alarm(&id) {
                return Err(format!("no alarm with id {id}").into());
            }
            if let Some(alarm) = alarms.get_alarm(&id) {
                println!("{alarm}");
            }
        }
        Some(Command::ListAlarms) => {
            for alarm in open_alarms(&config, &clock)?.get_alarms() {
                println!("{}\t{alarm}", alarm.id);
            }
        }
        Some(Command::AddNote {
            title,
            content,
            category,
        }) => {
            let mut notes = NoteStore::open(config.notes_path()?);
            let note = notes.add(Note::new(title, content, category, clock.now()));
            println!("added note {}", note.id);
        }
        Some(Command::ListNotes { category }) => {
            let notes = NoteStore::open(config.notes_path()?);
            for note in notes.notes(category.as_deref()) {
                println!(
                    "{}\t[{}] {}\t{}",
                    note.id,
                    note.category,
                    note.title,
                    note.created.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Some(Command::RemoveNote { id }) => {
            if !NoteStore::open(config.notes_path()?).remove(&id) {
                return Err(format!("no note with id {id}").into());
            }
        }
        Some(Command::Run) | None => run(config, clock)?,
    }
    Ok(())
}

fn open_alarms(config: &Config, clock: &SystemClock) -> Result<AlarmScheduler, Box<dyn Error>> {
    let store = AlarmStore::new(config.alarms_path()?);
    Ok(AlarmScheduler::new(store, EventSender::detached(), clock.now()))
}

fn run(config: Config, clock: SystemClock) -> Result<(), Box<dyn Error>> {
    let (event_tx, event_rx) = mpsc::channel();
    let (command_tx, command_rx) = mpsc::channel();
    let mut app = App::new(config, clock, event_tx.into())?;
    // keeps the loop alive after stdin closes, e.g. when started by a service manager
    let _keepalive = command_tx.clone();

    // stands in for the tray: prints whatever the core reports
    let printer = thread::spawn(move || {
        for event in event_rx {
            match event {
                Event::AlarmTriggered(alarm) => {
                    println!("ALARM {} {}", alarm.time.format("%H:%M"), alarm.label);
                }
                Event::AlarmDismissed(id) => println!("alarm {id} stopped"),
                Event::NotificationAdded(notification) => println!("{notification}"),
                Event::AlarmsChanged(alarms) => log::debug!("{} alarms", alarms.len()),
                Event::NotificationRemoved(id) => log::debug!("notification {id} removed"),
                Event::NotificationsUpdated(notifications) => {
                    log::debug!("{} notifications", notifications.len());
                }
                Event::CommandRejected(rejection) => eprintln!("{rejection}"),
            }
        }
    });

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let mut words = line.split_whitespace();
            let command = match (words.next(), words.next()) {
                (Some("dismiss"), Some(id)) => AppCommand::DismissAlarm(id.to_string()),
                (Some("toggle"), Some(id)) => AppCommand::ToggleAlarm(id.to_string()),
                (Some("remove"), Some(id)) => AppCommand::RemoveAlarm(id.to_string()),
                (Some(verb @ ("read" | "clear")), category) => {
                    let category = match category.map(str::parse::<Category>).transpose() {
                        Ok(category) => category,
                        Err(e) => {
                            eprintln!("{e}");
                            continue;
                        }
                    };
                    if verb == "read" {
                        AppCommand::MarkAllAsRead(category)
                    } else {
                        AppCommand::ClearNotifications(category)
                    }
                }
                (Some("quit"), _) => AppCommand::Shutdown,
                (None, _) => continue,
                _ => {
                    eprintln!("unknown command {line:?}");
                    continue;
                }
            };
            if command_tx.send(command).is_err() {
                break;
            }
        }
    });

    app.run(&command_rx);
    // closes the event channel so the printer finishes
    drop(app);
    printer.join().map_err(|_| "event printer panicked")?;
    Ok(())
}
