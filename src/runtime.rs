//! Line-oriented host loop.
//!
//! Reader input arrives on a channel from a stdin thread and the Ctrl+C
//! handler; timers and engine callbacks come from the shared scheduler. Every
//! page update is rendered and its effects applied before the next input.

use crate::console_speech::ConsoleSpeech;
use crate::file_store::FileStore;
use crate::scheduler::{Due, SharedScheduler};
use anyhow::Result;
use recital_core::lifecycle::{LifecycleEvent, LifecycleOutcome};
use recital_core::view::PageView;
use recital_core::{Effect, PageCommand, PageUpdate, ReaderPage};
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

pub type ConsolePage = ReaderPage<ConsoleSpeech, FileStore>;

#[derive(Debug)]
enum Input {
    Line(String),
    Interrupt,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
enum ConsoleInput {
    Page(PageCommand),
    Lifecycle(LifecycleEvent),
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  next | prev | goto <group> <section>
  play | toggle | stop | rate <0.5-2.0> | continuous on|off
  faq <n> | ask <n>
  complete | dismiss | restart
  hide | show | view | help | quit";

pub fn run(mut page: ConsolePage, scheduler: SharedScheduler) -> Result<()> {
    let inputs = spawn_inputs();
    render(&page.view());
    println!("{HELP}");

    let mut unload_armed = false;
    loop {
        let deadline = scheduler.borrow().next_deadline();
        let received = match deadline {
            Some(at) => inputs.recv_timeout(at.saturating_duration_since(Instant::now())),
            None => inputs.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(Input::Line(line)) => {
                unload_armed = false;
                match parse_input(&line) {
                    Some(ConsoleInput::Page(command)) => {
                        let update = page.apply_command(command);
                        apply_update(&scheduler, update);
                    }
                    Some(ConsoleInput::Lifecycle(event)) => {
                        let outcome = page.handle_lifecycle(event);
                        println!("[lifecycle] {event:?} -> {outcome:?}");
                    }
                    Some(ConsoleInput::Help) => println!("{HELP}"),
                    Some(ConsoleInput::Quit) => {
                        leave(&mut page);
                        break;
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("unknown command: {}", line.trim()),
                }
            }
            Ok(Input::Interrupt) => {
                if unload_armed {
                    leave(&mut page);
                    break;
                }
                match page.handle_lifecycle(LifecycleEvent::BeforeUnload) {
                    LifecycleOutcome::PromptUnload { message } => {
                        println!("{message}");
                        println!("Press Ctrl+C again to leave.");
                        unload_armed = true;
                    }
                    _ => {
                        leave(&mut page);
                        break;
                    }
                }
            }
            Ok(Input::Closed) | Err(RecvTimeoutError::Disconnected) => {
                leave(&mut page);
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
        fire_due(&mut page, &scheduler);
    }
    Ok(())
}

fn spawn_inputs() -> Receiver<Input> {
    let (tx, rx) = mpsc::channel();
    let interrupt_tx = tx.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C; treating as page unload");
        let _ = interrupt_tx.send(Input::Interrupt);
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(err) => {
                    warn!("Failed to read input: {err}");
                    break;
                }
            }
        }
        let _ = tx.send(Input::Closed);
    });
    rx
}

fn fire_due(page: &mut ConsolePage, scheduler: &SharedScheduler) {
    loop {
        let due = scheduler.borrow_mut().pop_due(Instant::now());
        let Some(due) = due else {
            break;
        };
        debug!(?due, pending = scheduler.borrow().len(), "Firing scheduled callback");
        let update = match due {
            Due::Engine(event) => page.handle_engine_event(event),
            Due::Page(timer) => page.handle_timer(timer),
        };
        apply_update(scheduler, update);
    }
}

fn leave(page: &mut ConsolePage) {
    let outcome = page.handle_lifecycle(LifecycleEvent::PageHide);
    info!(?outcome, "Leaving contract reader");
}

fn apply_update(scheduler: &SharedScheduler, update: PageUpdate) {
    let mut rerender =
        update.action != "contract_narration_event" && update.action != "contract_timer";
    for effect in update.effects {
        match effect {
            Effect::ScheduleTimer { timer, delay } => {
                scheduler.borrow_mut().schedule(delay, Due::Page(timer));
            }
            Effect::PositionChanged { from, to } => {
                info!(%from, %to, "Position changed");
                rerender = true;
            }
            Effect::NarrationChanged { status } => {
                println!("[narration] {status:?}");
            }
            Effect::ShowCompletion { completed_at } => {
                println!("*** Contract review complete ({completed_at}) ***");
            }
        }
    }
    if rerender {
        render(&update.view);
    }
}

fn render(view: &PageView) {
    println!();
    println!(
        "[{}] {} ({}%)  {}",
        view.progress.label, view.position, view.progress.percent, view.title
    );
    println!("{}", view.content);
    let mut controls = Vec::new();
    if view.can_prev {
        controls.push("prev");
    }
    if view.can_next {
        controls.push("next");
    }
    if view.show_complete {
        controls.push("complete");
    }
    if view.narration.engine_available || view.narration.clip_count > 0 {
        controls.push("play");
    }
    println!(
        "controls: {}  rate: {:.1}x  continuous: {}",
        controls.join(" "),
        view.narration.rate,
        if view.narration.continuous { "on" } else { "off" }
    );
    for message in view.chat.iter().rev().take(2).rev() {
        println!("  {:?}: {}", message.role, message.text);
    }
    if view.completion_visible {
        println!("(completion shown; `dismiss` to close)");
    }
}

fn parse_input(line: &str) -> Option<ConsoleInput> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let input = match head {
        "next" | "n" => ConsoleInput::Page(PageCommand::Next),
        "prev" | "p" => ConsoleInput::Page(PageCommand::Prev),
        "goto" | "g" => ConsoleInput::Page(PageCommand::GoTo {
            group_key: parts.next()?.to_string(),
            section_id: parts.next()?.to_string(),
        }),
        "play" => ConsoleInput::Page(PageCommand::Play),
        "toggle" | "t" => ConsoleInput::Page(PageCommand::TogglePlayPause),
        "stop" | "s" => ConsoleInput::Page(PageCommand::Stop),
        "rate" => ConsoleInput::Page(PageCommand::SetRate {
            rate: parts.next()?.parse().ok()?,
        }),
        "continuous" => ConsoleInput::Page(PageCommand::SetContinuous {
            enabled: match parts.next()? {
                "on" => true,
                "off" => false,
                _ => return None,
            },
        }),
        "faq" => ConsoleInput::Page(PageCommand::ToggleFaqAnswer {
            index: one_based(parts.next()?)?,
        }),
        "ask" => ConsoleInput::Page(PageCommand::AskFaq {
            index: one_based(parts.next()?)?,
        }),
        "complete" => ConsoleInput::Page(PageCommand::Complete),
        "dismiss" => ConsoleInput::Page(PageCommand::DismissCompletion),
        "restart" => ConsoleInput::Page(PageCommand::Restart),
        "view" | "v" => ConsoleInput::Page(PageCommand::GetView),
        "hide" => ConsoleInput::Lifecycle(LifecycleEvent::VisibilityHidden),
        "show" => ConsoleInput::Lifecycle(LifecycleEvent::VisibilityVisible),
        "help" | "?" => ConsoleInput::Help,
        "quit" | "q" | "exit" => ConsoleInput::Quit,
        _ => return None,
    };
    Some(input)
}

fn one_based(arg: &str) -> Option<usize> {
    arg.parse::<usize>().ok()?.checked_sub(1)
}
