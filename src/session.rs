//! Session gating: which screen is showing and when the workspace exists.
//!
//! The workspace is only constructed once a session is established and is
//! consumed on sign-out, so an unauthenticated gate cannot reach notes.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{FormOutcome, SignInForm, SignUpForm};
use crate::gateway::{NoteStoreGateway, SessionGateway};
use crate::workspace::Workspace;

pub enum Screen {
    SignIn(SignInForm),
    SignUp(SignUpForm),
    Workspace(Workspace),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::SignIn(_) => "sign-in",
            Screen::SignUp(_) => "sign-up",
            Screen::Workspace(_) => "workspace",
        }
    }
}

pub struct SessionGate {
    session: Arc<dyn SessionGateway>,
    store: Arc<dyn NoteStoreGateway>,
    registration_delay: Duration,
    screen: Screen,
    pending_entry: bool,
}

impl SessionGate {
    /// A gate showing an empty sign-in form.
    pub fn new(
        session: Arc<dyn SessionGateway>,
        store: Arc<dyn NoteStoreGateway>,
        registration_delay: Duration,
    ) -> Self {
        Self {
            session,
            store,
            registration_delay,
            screen: Screen::SignIn(SignInForm::new()),
            pending_entry: false,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.screen, Screen::Workspace(_))
    }

    /// True between a sign-up that opened a session and `finish_registration`.
    pub fn has_pending_entry(&self) -> bool {
        self.pending_entry
    }

    pub fn show_sign_in(&mut self) {
        match self.screen {
            Screen::SignUp(_) => {
                self.pending_entry = false;
                self.screen = Screen::SignIn(SignInForm::new());
            }
            Screen::SignIn(_) | Screen::Workspace(_) => {}
        }
    }

    pub fn show_sign_up(&mut self) {
        if let Screen::SignIn(_) = self.screen {
            self.screen = Screen::SignUp(SignUpForm::new());
        }
    }

    pub fn sign_in_form(&self) -> Option<&SignInForm> {
        match &self.screen {
            Screen::SignIn(form) => Some(form),
            _ => None,
        }
    }

    pub fn sign_in_form_mut(&mut self) -> Option<&mut SignInForm> {
        match &mut self.screen {
            Screen::SignIn(form) => Some(form),
            _ => None,
        }
    }

    pub fn sign_up_form(&self) -> Option<&SignUpForm> {
        match &self.screen {
            Screen::SignUp(form) => Some(form),
            _ => None,
        }
    }

    pub fn sign_up_form_mut(&mut self) -> Option<&mut SignUpForm> {
        match &mut self.screen {
            Screen::SignUp(form) => Some(form),
            _ => None,
        }
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        match &self.screen {
            Screen::Workspace(workspace) => Some(workspace),
            _ => None,
        }
    }

    pub fn workspace_mut(&mut self) -> Option<&mut Workspace> {
        match &mut self.screen {
            Screen::Workspace(workspace) => Some(workspace),
            _ => None,
        }
    }

    /// Submit the sign-in form. `None` when the sign-in screen is not showing.
    pub async fn submit_sign_in(&mut self) -> Option<FormOutcome> {
        let Screen::SignIn(form) = &mut self.screen else {
            return None;
        };
        let outcome = form.submit(self.session.as_ref()).await;
        if outcome == FormOutcome::Authenticated {
            self.enter().await;
        }
        Some(outcome)
    }

    /// Submit the sign-up form. `None` when the sign-up screen is not showing.
    ///
    /// A registration that opened a session leaves the success message on
    /// screen; `finish_registration` moves on to the workspace.
    pub async fn submit_sign_up(&mut self) -> Option<FormOutcome> {
        let Screen::SignUp(form) = &mut self.screen else {
            return None;
        };
        let outcome = form.submit(self.session.as_ref()).await;
        if outcome == (FormOutcome::Registered { session_active: true }) {
            self.pending_entry = true;
        }
        Some(outcome)
    }

    /// Wait out the registration message, then open the workspace.
    /// Returns false when there is no pending entry.
    pub async fn finish_registration(&mut self) -> bool {
        if !self.pending_entry {
            return false;
        }
        tokio::time::sleep(self.registration_delay).await;
        self.pending_entry = false;
        self.enter().await;
        true
    }

    /// Open the workspace straight away when the session gateway already
    /// holds a restored session.
    pub async fn resume(&mut self) -> bool {
        if self.is_authenticated() {
            return true;
        }
        if !self.session.has_session().await {
            tracing::debug!("No stored session to resume");
            return false;
        }
        self.enter().await;
        true
    }

    /// End the session and go back to an empty sign-in form.
    /// Returns false when nobody was signed in.
    pub async fn sign_out(&mut self) -> bool {
        let previous = std::mem::replace(&mut self.screen, Screen::SignIn(SignInForm::new()));
        match previous {
            Screen::Workspace(workspace) => {
                workspace.sign_out(self.session.as_ref()).await;
                true
            }
            other => {
                self.screen = other;
                false
            }
        }
    }

    async fn enter(&mut self) {
        let workspace = Workspace::open(self.store.clone()).await;
        tracing::info!(notes = workspace.state().notes().len(), "Workspace opened");
        self.screen = Screen::Workspace(workspace);
    }
}
