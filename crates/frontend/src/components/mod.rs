//! UI components

pub mod dashboard;
pub mod inactivity_warning;
pub mod login_form;

pub use dashboard::DashboardView;
pub use inactivity_warning::InactivityWarningDialog;
pub use login_form::LoginForm;
