//! Services wired from settings with a SQLite database file

#![cfg(feature = "database")]

use rstest::rstest;
use std::sync::Arc;
use tofu_conf::TofuSettings;
use tofu_core::{
	FormAction, FormRegistry, FormServices, FormSession, FormSubmission, SessionState,
};
use tofu_sessions::SessionId;

const FORMS: &str = r#"
[[forms]]
key = "survey"
save_to_database = true

[forms.templates]
input = "/survey/"
result = "/survey/done/"

[forms.mail]
from_email = "noreply@example.com"

[[forms.mail.recipients]]
to = "office@example.com"
subject = "Survey answer"
body = "{answer}"
"#;

#[rstest]
#[tokio::test]
async fn test_submission_is_recorded_and_state_survives_reload() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let mut settings = TofuSettings::default();
	settings.secret_key = "database-test-secret-key-0123456789".to_string().into();
	settings.uploads.temp_dir = dir.path().join("uploads");
	settings.database.url = Some(format!(
		"sqlite://{}?mode=rwc",
		dir.path().join("tofu.db").display()
	));
	let services = Arc::new(FormServices::from_settings(&settings).await.unwrap());
	let registry = FormRegistry::from_toml_str(FORMS).unwrap();
	let form = registry.get("survey").unwrap();
	let id = SessionId::generate();

	// Act
	let mut session = FormSession::load(Arc::clone(&form), Arc::clone(&services), id.clone())
		.await
		.unwrap();
	let (nonce_field, nonce) = session.anti_forgery_field(FormAction::Input);
	session
		.action_input(
			&FormSubmission::new()
				.field(nonce_field, nonce)
				.field("answer", "yes"),
		)
		.await
		.unwrap();

	// Assert
	let records = services.records().unwrap();
	assert_eq!(records.count("survey").await.unwrap(), 1);
	let reloaded = FormSession::load(form, Arc::clone(&services), id).await.unwrap();
	assert_eq!(reloaded.state(), SessionState::Confirmed);
	assert!(dir.path().join("uploads").join(".htaccess").exists());
}
