//! `notekeep shell`: one `SessionGate` kept alive across typed commands.

use std::io::{self, Write};
use std::path::Path;

use super::handlers::{confirm_on_terminal, print_note_line, resolve_note, Connection};
use crate::auth::{CredentialForm, FormOutcome, FormStatus, SignInField, SignUpField};
use crate::entity::DraftField;
use crate::error::{NotekeepError, Result};
use crate::session::{Screen, SessionGate};
use crate::workspace::{Confirm, DeleteOutcome, SubmitOutcome};

const HELP_FORMS: &str = "\
Commands:
  signin | signup          switch form
  set <field> <value>      fill a field (email, password, first_name, ...)
  submit                   submit the form
  help | quit";

const HELP_WORKSPACE: &str = "\
Commands:
  list                     show notes matching the search
  search [text]            set the search text (empty clears it)
  edit <id>                load a note into the editor
  set title|content <text> fill the editor
  draft                    show the editor
  submit                   add or update the note
  cancel                   leave edit mode
  delete <id>              delete a note
  refresh                  refetch notes
  logout | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    gate: SessionGate,
}

impl Shell {
    pub fn new(gate: SessionGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    fn prompt(&self) -> String {
        format!("notekeep:{}> ", self.gate.screen().name())
    }

    /// Run one command line.
    pub async fn execute(&mut self, line: &str, confirm: &dyn Confirm) -> Result<Flow> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim_start()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => {
                if self.gate.is_authenticated() {
                    println!("{}", HELP_WORKSPACE);
                } else {
                    println!("{}", HELP_FORMS);
                }
            }
            _ if self.gate.is_authenticated() => {
                self.workspace_command(command, rest, confirm).await?
            }
            _ => self.form_command(command, rest).await?,
        }
        Ok(Flow::Continue)
    }

    async fn form_command(&mut self, command: &str, rest: &str) -> Result<()> {
        match command {
            "signin" => self.gate.show_sign_in(),
            "signup" => self.gate.show_sign_up(),
            "set" => {
                let (field, value) = split_field(rest)?;
                if let Some(form) = self.gate.sign_in_form_mut() {
                    let field: SignInField = field.parse().map_err(NotekeepError::Form)?;
                    form.update_field(field, value.to_string());
                } else if let Some(form) = self.gate.sign_up_form_mut() {
                    let field: SignUpField = field.parse().map_err(NotekeepError::Form)?;
                    form.update_field(field, value.to_string());
                }
            }
            "submit" => {
                let outcome = if matches!(self.gate.screen(), Screen::SignUp(_)) {
                    self.gate.submit_sign_up().await
                } else {
                    self.gate.submit_sign_in().await
                };
                self.report_form(outcome);
                if self.gate.finish_registration().await {
                    println!("Signed in.");
                }
                if self.gate.is_authenticated() {
                    self.render_notes();
                }
            }
            other => return Err(unknown(other)),
        }
        Ok(())
    }

    fn report_form(&self, outcome: Option<FormOutcome>) {
        let status: Option<&FormStatus> = match self.gate.screen() {
            Screen::SignIn(form) => Some(form.status()),
            Screen::SignUp(form) => Some(form.status()),
            Screen::Workspace(_) => None,
        };
        if let Some(message) = status.and_then(|s| s.error()) {
            println!("{}", message);
        }
        if let Some(message) = status.and_then(|s| s.success()) {
            println!("{}", message);
        }
        tracing::debug!(?outcome, "Form submitted");
    }

    async fn workspace_command(
        &mut self,
        command: &str,
        rest: &str,
        confirm: &dyn Confirm,
    ) -> Result<()> {
        if command == "logout" {
            self.gate.sign_out().await;
            println!("Signed out.");
            return Ok(());
        }

        let workspace = self
            .gate
            .workspace_mut()
            .ok_or(NotekeepError::NotSignedIn)?;

        match command {
            "list" => {}
            "search" => workspace.set_query(rest),
            "refresh" => workspace.refresh().await?,
            "edit" => {
                let note = resolve_note(workspace, rest)?;
                workspace.begin_edit(&note);
                self.render_draft();
                return Ok(());
            }
            "cancel" => {
                workspace.cancel_edit();
                self.render_draft();
                return Ok(());
            }
            "set" => {
                let (field, value) = split_field(rest)?;
                let field: DraftField = field.parse().map_err(NotekeepError::Form)?;
                workspace.update_draft(field, value.to_string());
                return Ok(());
            }
            "draft" => {
                self.render_draft();
                return Ok(());
            }
            "submit" => match workspace.submit_draft().await? {
                SubmitOutcome::Created => println!("Note added."),
                SubmitOutcome::Updated => println!("Note updated."),
            },
            "delete" => {
                let note = resolve_note(workspace, rest)?;
                match workspace.delete_note(&note.id, confirm).await? {
                    DeleteOutcome::Deleted => println!("Deleted {}.", note.title),
                    DeleteOutcome::Declined => {
                        println!("Cancelled.");
                        return Ok(());
                    }
                }
            }
            other => return Err(unknown(other)),
        }
        self.render_notes();
        Ok(())
    }

    fn render_notes(&self) {
        let Some(workspace) = self.gate.workspace() else {
            return;
        };
        let state = workspace.state();
        if let Some(message) = state.fetch_error() {
            println!("Could not load notes: {}", message);
        }
        if !state.query().is_empty() {
            println!("Search: {}", state.query());
        }
        let visible = workspace.visible_notes();
        if visible.is_empty() {
            println!("{}", state.empty_message());
        }
        for note in visible {
            print_note_line(note);
        }
    }

    fn render_draft(&self) {
        let Some(workspace) = self.gate.workspace() else {
            return;
        };
        let state = workspace.state();
        println!("{}", state.heading());
        println!("  title:   {}", state.draft().title);
        println!("  content: {}", state.draft().content);
        if state.can_cancel() {
            println!("[{}] [cancel]", state.submit_label());
        } else {
            println!("[{}]", state.submit_label());
        }
    }
}

fn split_field(rest: &str) -> Result<(&str, &str)> {
    match rest.split_once(char::is_whitespace) {
        Some((field, value)) => Ok((field, value.trim_start())),
        None if !rest.is_empty() => Ok((rest, "")),
        None => Err(NotekeepError::Form("Usage: set <field> <value>".to_string())),
    }
}

fn unknown(command: &str) -> NotekeepError {
    NotekeepError::Form(format!("Unknown command '{}'. Type 'help'.", command))
}

pub async fn handle_shell(config_path: Option<&Path>) -> Result<()> {
    let connection = Connection::open(config_path)?;
    let mut shell = Shell::new(connection.gate());

    if shell.gate.resume().await {
        match connection.backend.session_email().await {
            Some(email) => println!("Resumed session for {}.", email),
            None => println!("Resumed session."),
        }
        shell.render_notes();
    } else {
        println!("Sign in with 'set email ...', 'set password ...', 'submit'. Type 'help'.");
    }

    let confirm = |prompt: &str| confirm_on_terminal(prompt);
    loop {
        print!("{}", shell.prompt());
        io::stdout().flush()?;

        // Not holding the stdin lock: delete confirmation reads from it too
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        match shell.execute(&line, &confirm).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}
