//! Signed-in user, shared through a yew context

use crate::components::InactivityWarningDialog;
use crate::hooks::use_inactivity_timeout;
use crate::services::Services;
use std::rc::Rc;
use unidash_core::{AuthError, AuthUser, IdentityProvider, Session, validation};
use wasm_bindgen_futures::spawn_local;
use web_sys::Storage;
use yew::prelude::*;

const SESSION_KEY: &str = "unidash.session";

/// Authentication state
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub loading: bool,
    pub error: Option<String>,
    /// Set once the stored session has been checked
    pub restored: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true, // Until the stored session has been checked
            error: None,
            restored: false,
        }
    }
}

pub enum SessionAction {
    /// Result of checking the stored session on mount
    Restore(Option<Session>),
    Login(Session),
    /// The identity provider replaced or dropped the session on its own
    Changed(Option<Session>),
    Logout,
    SetLoading(bool),
    SetError(String),
}

/// What a transition does to the copy kept in `sessionStorage`
#[derive(Debug, PartialEq)]
enum Stored {
    Untouched,
    Save(Session),
    Clear,
}

impl SessionState {
    fn signed_out() -> Self {
        Self {
            user: None,
            loading: false,
            error: None,
            restored: true,
        }
    }

    /// Next state, or `None` to keep this one
    fn transition(&self, action: SessionAction) -> (Option<Self>, Stored) {
        match action {
            SessionAction::Restore(Some(session)) | SessionAction::Login(session) => {
                let next = Self {
                    user: Some(session.user.clone()),
                    ..Self::signed_out()
                };
                (Some(next), Stored::Save(session))
            }
            // Restore and login write their own copy, so only a signed-in tab follows refreshes
            SessionAction::Changed(Some(session)) if self.user.is_some() => {
                let next = Self {
                    user: Some(session.user.clone()),
                    ..self.clone()
                };
                (Some(next), Stored::Save(session))
            }
            SessionAction::Changed(Some(_)) => (None, Stored::Untouched),
            SessionAction::Changed(None) => {
                let next = Self {
                    user: None,
                    ..self.clone()
                };
                (Some(next), Stored::Clear)
            }
            SessionAction::Restore(None) | SessionAction::Logout => {
                (Some(Self::signed_out()), Stored::Clear)
            }
            SessionAction::SetLoading(loading) => (
                Some(Self {
                    loading,
                    ..self.clone()
                }),
                Stored::Untouched,
            ),
            SessionAction::SetError(error) => (
                Some(Self {
                    loading: false,
                    error: Some(error),
                    ..self.clone()
                }),
                Stored::Untouched,
            ),
        }
    }
}

impl Reducible for SessionState {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let (next, stored) = self.transition(action);
        match stored {
            Stored::Save(session) => persist(&session),
            Stored::Clear => forget(),
            Stored::Untouched => {}
        }
        next.map_or(self, Rc::new)
    }
}

fn session_storage() -> Option<Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

fn persist(session: &Session) {
    if let (Some(storage), Ok(serialized)) = (session_storage(), serde_json::to_string(session)) {
        let _ = storage.set_item(SESSION_KEY, &serialized);
    }
}

fn forget() {
    if let Some(storage) = session_storage() {
        let _ = storage.remove_item(SESSION_KEY);
    }
}

fn stored_session() -> Option<Session> {
    let stored = session_storage()?.get_item(SESSION_KEY).ok().flatten()?;
    serde_json::from_str(&stored).ok()
}

/// Message shown under the login form
fn login_error(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials(_) => "이메일 또는 비밀번호가 올바르지 않습니다".to_string(),
        AuthError::Network(_) => "서버에 연결할 수 없습니다".to_string(),
        AuthError::Validation(invalid) => invalid.to_string(),
        _ => "로그인에 실패했습니다".to_string(),
    }
}

/// Session state plus the operations that change it
#[derive(Clone, PartialEq)]
pub struct SessionHandle {
    state: UseReducerHandle<SessionState>,
    services: Services,
}

impl SessionHandle {
    pub fn user(&self) -> Option<&AuthUser> {
        self.state.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(|user| user.role.is_admin())
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn is_restored(&self) -> bool {
        self.state.restored
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub const fn services(&self) -> &Services {
        &self.services
    }

    /// Sign in; form input is validated before anything is sent
    pub fn login(&self, email: String, password: String) {
        if let Err(invalid) = validation::validate_sign_in(&email, &password) {
            self.state.dispatch(SessionAction::SetError(invalid.to_string()));
            return;
        }

        self.state.dispatch(SessionAction::SetLoading(true));
        let state = self.state.clone();
        let identity = self.services.identity.clone();
        spawn_local(async move {
            match identity.sign_in(&email, &password).await {
                Ok(session) => state.dispatch(SessionAction::Login(session)),
                Err(err) => {
                    tracing::warn!(error = %err, "sign-in failed");
                    state.dispatch(SessionAction::SetError(login_error(&err)));
                }
            }
        });
    }

    /// Sign out locally at once, then tell the identity provider
    pub fn logout(&self) {
        self.state.dispatch(SessionAction::Logout);
        let identity = self.services.identity.clone();
        spawn_local(async move {
            if let Err(err) = identity.sign_out().await {
                tracing::warn!(error = %err, "sign-out request failed");
            }
        });
    }

    /// Re-read the user from the identity provider
    pub fn refresh_user(&self) {
        let state = self.state.clone();
        let identity = self.services.identity.clone();
        spawn_local(async move {
            match identity.current_user().await {
                Ok(Some(user)) => {
                    if let Some(mut session) = identity.session() {
                        session.user = user;
                        state.dispatch(SessionAction::Login(session));
                    }
                }
                Ok(None) => state.dispatch(SessionAction::Logout),
                Err(err) => tracing::warn!(error = %err, "could not refresh user"),
            }
        });
    }
}

#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    pub services: Services,
    pub children: Children,
}

/// Session provider component
#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let state = use_reducer(SessionState::default);
    let handle = SessionHandle {
        state: state.clone(),
        services: props.services.clone(),
    };

    // Adopt the session saved in this tab, if the provider still accepts it
    {
        let state = state.clone();
        let identity = props.services.identity.clone();
        use_effect_with((), move |_| {
            match stored_session() {
                Some(session) => {
                    identity.restore(session);
                    spawn_local(async move {
                        let restored = match identity.current_user().await {
                            Ok(Some(user)) => identity.session().map(|mut session| {
                                session.user = user;
                                session
                            }),
                            Ok(None) => None,
                            Err(err) => {
                                tracing::warn!(error = %err, "could not load current user");
                                None
                            }
                        };
                        state.dispatch(SessionAction::Restore(restored));
                    });
                }
                None => state.dispatch(SessionAction::Restore(None)),
            }
        });
    }

    // Keep sessionStorage on the newest tokens and sign out when the provider drops the session
    {
        let state = state.clone();
        let identity = props.services.identity.clone();
        use_effect_with((), move |_| {
            let mut changes = identity.subscribe();
            spawn_local(async move {
                while changes.changed().await.is_ok() {
                    let session = changes.borrow_and_update().clone();
                    state.dispatch(SessionAction::Changed(session));
                }
            });
        });
    }

    let session_config = &props.services.config.session;
    let inactivity = {
        let handle = handle.clone();
        use_inactivity_timeout(
            handle.is_authenticated(),
            session_config.inactivity_timeout(),
            session_config.warning_lead(),
            Callback::from(move |()| handle.logout()),
        )
    };

    html! {
        <ContextProvider<SessionHandle> context={handle}>
            <InactivityWarningDialog
                open={inactivity.warning_visible}
                on_continue={inactivity.dismiss_warning.clone()}
            />
            {props.children.clone()}
        </ContextProvider<SessionHandle>>
    }
}

/// Hook to use the session context
#[hook]
pub fn use_session() -> SessionHandle {
    use_context::<SessionHandle>()
        .expect("SessionHandle not found. Make sure to wrap your component with SessionProvider")
}
