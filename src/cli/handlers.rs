use std::env;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::auth::{CredentialForm, FormOutcome, SignInField, SignUpField, REGISTRATION_SUCCESS};
use crate::config::{ClientConfig, Project};
use crate::entity::{DraftField, Note, NoteId};
use crate::error::{NotekeepError, Result};
use crate::gateway::{GatewayFailure, RestBackend, SessionGateway};
use crate::session::SessionGate;
use crate::workspace::{DeleteOutcome, Workspace};

/// The current project's config and a backend bound to its session file.
pub(crate) struct Connection {
    pub config: ClientConfig,
    pub backend: Arc<RestBackend>,
}

impl Connection {
    /// Open the project owning `config_path`, or the one found by walking
    /// up from the working directory.
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let project = match config_path {
            Some(path) => Project::from_config_path(path)?,
            None => Project::discover(&env::current_dir()?)?,
        };
        let config = project.load_config()?;
        let backend = Arc::new(RestBackend::new(&config, Some(project.session_path()))?);
        Ok(Self { config, backend })
    }

    pub fn gate(&self) -> SessionGate {
        SessionGate::new(
            self.backend.clone(),
            self.backend.clone(),
            self.config.registration_delay(),
        )
    }
}

/// A gate already inside the workspace, or `NotSignedIn`.
async fn signed_in_gate(config_path: Option<&Path>) -> Result<SessionGate> {
    let connection = Connection::open(config_path)?;
    let mut gate = connection.gate();
    if !gate.resume().await {
        return Err(NotekeepError::NotSignedIn);
    }
    Ok(gate)
}

fn workspace_of(gate: &mut SessionGate) -> Result<&mut Workspace> {
    let workspace = gate.workspace_mut().ok_or(NotekeepError::NotSignedIn)?;
    if let Some(message) = workspace.state().fetch_error() {
        return Err(GatewayFailure::new(message).into());
    }
    Ok(workspace)
}

/// Read one line from stdin, prompting on stderr when interactive.
pub(crate) fn read_field(label: &str) -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        eprint!("{}: ", label);
        io::stderr().flush()?;
    }
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
}

fn field_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => read_field(label),
    }
}

fn read_content(content: Option<String>, stdin: bool) -> Result<Option<String>> {
    if stdin {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(Some(buf));
    }
    Ok(content)
}

/// Find a note by full id or unique id prefix.
pub(crate) fn resolve_note(workspace: &Workspace, id: &str) -> Result<Note> {
    let wanted: NoteId = id.parse().map_err(NotekeepError::Form)?;
    if let Some(note) = workspace.state().find(&wanted) {
        return Ok(note.clone());
    }

    let prefix = wanted.as_str();
    let mut matches = workspace
        .state()
        .notes()
        .iter()
        .filter(|n| n.id.as_str().starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(note), None) => Ok(note.clone()),
        (Some(_), Some(_)) => Err(NotekeepError::AmbiguousId(prefix.to_string())),
        _ => Err(NotekeepError::NoteNotFound(prefix.to_string())),
    }
}

pub(crate) fn print_note_line(note: &Note) {
    println!(
        "  {} {}  {}",
        note.short_id(),
        note.created_at.format("%Y-%m-%d %H:%M"),
        note.title
    );
}

fn print_notes(notes: &[&Note], empty_message: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(notes)?);
    } else if notes.is_empty() {
        println!("{}", empty_message);
    } else {
        println!("Notes:\n");
        for note in notes {
            print_note_line(note);
        }
    }
    Ok(())
}

/// Ask on the terminal. Read failures count as "no".
pub(crate) fn confirm_on_terminal(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = io::stderr().flush();
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(_) => input.trim().eq_ignore_ascii_case("y"),
        Err(_) => false,
    }
}

pub fn handle_init(
    url: String,
    api_key: String,
    table: String,
    registration_delay_ms: u64,
) -> Result<()> {
    let root = env::current_dir()?;

    let mut config = ClientConfig::new(url, api_key);
    config.notes_table = table;
    config.registration_delay_ms = registration_delay_ms;

    let project = Project::init(&root, &config)?;

    println!("Initialized notekeep project in {}", root.display());
    tracing::debug!(dir = %project.dir().display(), "Wrote config");
    Ok(())
}

pub async fn handle_register(
    config_path: Option<&Path>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let connection = Connection::open(config_path)?;
    let mut gate = connection.gate();
    gate.show_sign_up();

    let email = field_or_prompt(email, "Email")?;
    let first_name = field_or_prompt(first_name, "First name")?;
    let last_name = field_or_prompt(last_name, "Last name")?;
    let password = read_field("Password")?;
    let confirm = read_field("Confirm password")?;

    let form = gate
        .sign_up_form_mut()
        .ok_or_else(|| NotekeepError::Form("Sign-up is not available".to_string()))?;
    form.update_field(SignUpField::FirstName, first_name);
    form.update_field(SignUpField::LastName, last_name);
    form.update_field(SignUpField::Email, email.clone());
    form.update_field(SignUpField::Password, password);
    form.update_field(SignUpField::ConfirmPassword, confirm);

    match gate.submit_sign_up().await {
        Some(FormOutcome::Registered { session_active }) => {
            println!("{}", REGISTRATION_SUCCESS);
            if session_active {
                gate.finish_registration().await;
                println!("Signed in as {}", email.trim());
            }
            Ok(())
        }
        _ => Err(form_error(
            gate.sign_up_form().and_then(|f| f.status().error()),
        )),
    }
}

pub async fn handle_login(config_path: Option<&Path>, email: Option<String>) -> Result<()> {
    let connection = Connection::open(config_path)?;
    let mut gate = connection.gate();

    let email = field_or_prompt(email, "Email")?;
    let password = read_field("Password")?;

    let form = gate
        .sign_in_form_mut()
        .ok_or_else(|| NotekeepError::Form("Sign-in is not available".to_string()))?;
    form.update_field(SignInField::Email, email.clone());
    form.update_field(SignInField::Password, password);

    match gate.submit_sign_in().await {
        Some(FormOutcome::Authenticated) => {
            let count = gate
                .workspace()
                .map(|w| w.state().notes().len())
                .unwrap_or_default();
            println!("Signed in as {} ({} notes)", email.trim(), count);
            Ok(())
        }
        _ => Err(form_error(
            gate.sign_in_form().and_then(|f| f.status().error()),
        )),
    }
}

fn form_error(message: Option<&str>) -> NotekeepError {
    NotekeepError::Form(message.unwrap_or("Submission failed").to_string())
}

pub async fn handle_logout(config_path: Option<&Path>) -> Result<()> {
    let connection = Connection::open(config_path)?;
    if !connection.backend.has_session().await {
        println!("Not signed in.");
        return Ok(());
    }
    connection.backend.sign_out().await;
    println!("Signed out.");
    Ok(())
}

pub async fn handle_list(config_path: Option<&Path>, json: bool) -> Result<()> {
    let mut gate = signed_in_gate(config_path).await?;
    let workspace = workspace_of(&mut gate)?;
    print_notes(
        &workspace.visible_notes(),
        workspace.state().empty_message(),
        json,
    )
}

pub async fn handle_search(config_path: Option<&Path>, query: String, json: bool) -> Result<()> {
    let mut gate = signed_in_gate(config_path).await?;
    let workspace = workspace_of(&mut gate)?;
    workspace.set_query(query);
    print_notes(
        &workspace.visible_notes(),
        workspace.state().empty_message(),
        json,
    )
}

pub async fn handle_add(
    config_path: Option<&Path>,
    title: String,
    content: Option<String>,
    stdin: bool,
) -> Result<()> {
    let content = read_content(content, stdin)?.unwrap_or_default();

    let mut gate = signed_in_gate(config_path).await?;
    let workspace = gate.workspace_mut().ok_or(NotekeepError::NotSignedIn)?;

    let title = title.trim().to_string();
    workspace.update_draft(DraftField::Title, title.clone());
    workspace.update_draft(DraftField::Content, content);
    workspace.submit_draft().await?;

    match workspace.state().notes().iter().find(|n| n.title == title) {
        Some(note) => println!("Created note {} - {}", note.short_id(), note.title),
        None => println!("Created note - {}", title),
    }
    Ok(())
}

pub async fn handle_edit(
    config_path: Option<&Path>,
    id: String,
    title: Option<String>,
    content: Option<String>,
    stdin: bool,
) -> Result<()> {
    let content = read_content(content, stdin)?;
    if title.is_none() && content.is_none() {
        return Err(NotekeepError::Form(
            "Nothing to update. Pass --title, --content or --stdin.".to_string(),
        ));
    }

    let mut gate = signed_in_gate(config_path).await?;
    let workspace = workspace_of(&mut gate)?;
    let note = resolve_note(workspace, &id)?;

    workspace.begin_edit(&note);
    if let Some(title) = title {
        workspace.update_draft(DraftField::Title, title);
    }
    if let Some(content) = content {
        workspace.update_draft(DraftField::Content, content);
    }
    workspace.submit_draft().await?;

    let title = workspace
        .state()
        .find(&note.id)
        .map(|n| n.title.clone())
        .unwrap_or(note.title);
    println!("Updated note {} - {}", note.id, title);
    Ok(())
}

pub async fn handle_delete(config_path: Option<&Path>, id: String, force: bool) -> Result<()> {
    // Non-interactive mode without --force, abort before touching the network
    if !force && !atty::is(atty::Stream::Stdin) {
        return Err(NotekeepError::Form(
            "Use --force to delete in non-interactive mode".to_string(),
        ));
    }

    let mut gate = signed_in_gate(config_path).await?;
    let workspace = workspace_of(&mut gate)?;
    let note = resolve_note(workspace, &id)?;

    eprintln!("{} - {}", note.short_id(), note.title);
    let confirm = |prompt: &str| force || confirm_on_terminal(prompt);

    match workspace.delete_note(&note.id, &confirm).await? {
        DeleteOutcome::Deleted => println!("Deleted note {} - {}", note.short_id(), note.title),
        DeleteOutcome::Declined => println!("Cancelled."),
    }
    Ok(())
}
