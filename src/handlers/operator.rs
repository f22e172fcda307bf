use std::sync::Arc;

use chrono::Local;
use inquire::Text;

use crate::handlers::controls::{DisplayCommand, OperatorControls};

/// Line-oriented input for the operator menu. `None` means the input is
/// gone (closed, interrupted) and the menu should quit.
pub trait OperatorInput {
    fn prompt(&mut self, message: &str) -> Option<String>;

    fn say(&mut self, text: &str);
}

/// Terminal input through inquire.
pub struct InquireInput;

impl OperatorInput for InquireInput {
    fn prompt(&mut self, message: &str) -> Option<String> {
        Text::new(message).prompt().ok()
    }

    fn say(&mut self, text: &str) {
        println!("{}", text);
    }
}

const MAIN_MENU: &str = "Calendar indicator\n c: configure\n m: manual event input\n d: display menu\n q: quit";
const CONFIG_MENU: &str = "Configuration\n p: poll interval\n d: display frequency";
const DISPLAY_MENU: &str = "Display\n on\n off\n reset";

pub struct CommandProcessor<I: OperatorInput> {
    controls: Arc<OperatorControls>,
    input: I,
}

impl<I: OperatorInput> CommandProcessor<I> {
    pub fn new(controls: Arc<OperatorControls>, input: I) -> Self {
        Self { controls, input }
    }

    /// Runs menus until the operator quits or input ends.
    pub fn run(&mut self) {
        while self.handle_once() {}
    }

    /// Handles one top-level command. Returns false on quit.
    pub fn handle_once(&mut self) -> bool {
        self.input.say(MAIN_MENU);
        let Some(choice) = self.input.prompt(">") else {
            return false;
        };
        match choice.trim() {
            "c" => self.config_menu(),
            "m" => self.manual_menu(),
            "d" => self.display_menu(),
            "q" => return false,
            "" => {}
            other => self.input.say(&format!("Unknown command '{}'", other)),
        }
        true
    }

    fn config_menu(&mut self) {
        self.input.say(CONFIG_MENU);
        let Some(choice) = self.input.prompt(">") else {
            return;
        };
        match choice.trim() {
            "p" => {
                let current = self.controls.poll_interval().as_secs_f64();
                let Some(raw) = self.input.prompt(&format!("Poll interval in seconds ({}):", current)) else {
                    return;
                };
                if let Err(err) = self.controls.set_poll_interval(&raw) {
                    self.input.say(&format!("Keeping {}s: {}", current, err));
                }
            }
            "d" => {
                let current = self.controls.refresh_hz();
                let Some(raw) = self.input.prompt(&format!("Display update frequency in Hz ({}):", current)) else {
                    return;
                };
                if let Err(err) = self.controls.set_refresh_hz(&raw) {
                    self.input.say(&format!("Keeping {} Hz: {}", current, err));
                }
            }
            _ => {}
        }
    }

    fn manual_menu(&mut self) {
        let Some(name) = self.input.prompt("Event name (empty to clear):") else {
            return;
        };
        if name.trim().is_empty() {
            self.controls.enter_event("", "", "", Vec::new());
            return;
        }
        let Some(end) = self.input.prompt("End:") else {
            return;
        };
        self.input.say("Participants (empty line to finish):");
        let mut participants = Vec::new();
        while let Some(participant) = self.input.prompt(">") {
            let participant = participant.trim();
            if participant.is_empty() {
                break;
            }
            participants.push(participant.to_string());
        }
        self.controls.enter_event_now(&name, &end, participants, Local::now());
    }

    fn display_menu(&mut self) {
        self.input.say(DISPLAY_MENU);
        let Some(choice) = self.input.prompt(">") else {
            return;
        };
        match DisplayCommand::parse(&choice) {
            Some(command) => self.controls.display(command),
            None => self.input.say(&format!("Unknown display command '{}'", choice.trim())),
        }
    }
}
