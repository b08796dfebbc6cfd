//! Request handling through the single form endpoint

use http::StatusCode;
use http::header::{LOCATION, SET_COOKIE};
use rstest::{fixture, rstest};
use std::sync::Arc;
use tempfile::TempDir;
use tofu_conf::TofuSettings;
use tofu_core::{ActionToken, FormAction, FormEndpoint, FormRegistry, FormRequest, FormServices, FormSubmission};
use tofu_mail::MemoryTransport;

const FORMS: &str = r#"
[[forms]]
key = "contact"
name = "Contact"

[forms.templates]
input = "/contact/"
confirm = "/contact/confirm/"
result = "/contact/thanks/"

[forms.mail]
from_email = "noreply@example.com"

[[forms.mail.recipients]]
to = "office@example.com"
subject = "New contact"
body = "{name}: {message}"

[forms.validation.rules]
name = "required"
"#;

struct Site {
	_dir: TempDir,
	endpoint: FormEndpoint,
	transport: MemoryTransport,
}

#[fixture]
fn site() -> Site {
	let dir = tempfile::tempdir().unwrap();
	let mut settings = TofuSettings::default();
	settings.secret_key = "endpoint-test-secret-key-0123456789".to_string().into();
	settings.uploads.temp_dir = dir.path().join("uploads");
	settings.session.gc_probability = 0.0;
	let transport = MemoryTransport::new();
	let services = FormServices::builder(&settings)
		.transport(Arc::new(transport.clone()))
		.build();
	let registry = FormRegistry::from_toml_str(FORMS).unwrap();
	Site {
		_dir: dir,
		endpoint: FormEndpoint::new(Arc::new(registry), Arc::new(services)),
		transport,
	}
}

#[rstest]
#[case::missing(None, StatusCode::BAD_REQUEST)]
#[case::not_base64(Some("%%%".to_string()), StatusCode::BAD_REQUEST)]
#[case::unknown_form(Some(ActionToken::new("survey", FormAction::Input).encode()), StatusCode::NOT_FOUND)]
#[case::unknown_action(
	Some(ActionToken { key: "contact".into(), action: "delete".into() }.encode()),
	StatusCode::BAD_REQUEST
)]
#[case::missing_nonce(Some(ActionToken::new("contact", FormAction::Input).encode()), StatusCode::FORBIDDEN)]
#[tokio::test]
async fn test_rejected_requests(site: Site, #[case] token: Option<String>, #[case] status: StatusCode) {
	// Arrange
	let request = FormRequest {
		action_token: token,
		..Default::default()
	};

	// Act
	let response = site.endpoint.handle(&request).await;

	// Assert
	assert_eq!(response.status(), status);
	assert!(response.headers().get(LOCATION).is_none());
	assert!(site.transport.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_input_and_confirm_through_endpoint(site: Site) {
	// Arrange
	let (session, identity) = site.endpoint.open("contact", None).await.unwrap();
	let cookie = format!("_tofu_session_key={}", identity.id);
	let (nonce_field, nonce) = session.anti_forgery_field(FormAction::Input);
	let input = FormRequest::new(ActionToken::new("contact", FormAction::Input).encode())
		.with_cookie_header(cookie.clone())
		.with_submission(
			FormSubmission::new()
				.field(nonce_field, nonce)
				.field("name", "Alice")
				.field("message", "Hello"),
		);

	// Act
	let input_response = site.endpoint.handle(&input).await;
	let (confirm_page, _) = site.endpoint.open("contact", Some(&cookie)).await.unwrap();
	let (nonce_field, nonce) = confirm_page.anti_forgery_field(FormAction::Confirm);
	let confirm = FormRequest::new(ActionToken::new("contact", FormAction::Confirm).encode())
		.with_cookie_header(cookie.clone())
		.with_submission(FormSubmission::new().field(nonce_field, nonce));
	let confirm_response = site.endpoint.handle(&confirm).await;

	// Assert
	assert!(identity.issued);
	assert_eq!(input_response.status(), StatusCode::SEE_OTHER);
	assert_eq!(input_response.headers()[LOCATION], "/contact/confirm/");
	assert!(input_response.headers().get(SET_COOKIE).is_none());
	assert_eq!(confirm_page.value_display("name"), "Alice");
	assert_eq!(confirm_response.headers()[LOCATION], "/contact/thanks/");
	assert_eq!(site.transport.sent()[0].body(), "Alice: Hello");

	let (mut result_page, _) = site.endpoint.open("contact", Some(&cookie)).await.unwrap();
	assert!(result_page.verify_submit().await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_new_browser_gets_a_session_cookie(site: Site) {
	// Arrange
	let request = FormRequest::new(ActionToken::new("contact", FormAction::Input).encode());

	// Act
	let response = site.endpoint.handle(&request).await;

	// Assert
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
	assert!(cookie.starts_with("_tofu_session_key="));
	assert!(cookie.contains("HttpOnly"));
}

#[rstest]
#[tokio::test]
async fn test_action_url_round_trips_through_resolve(site: Site) {
	// Arrange
	let (session, _) = site.endpoint.open("contact", None).await.unwrap();
	let url = session.action_url("/tofu?lang=en", FormAction::Confirm);

	// Act
	let token = url.split("_tofu_key=").nth(1).unwrap();
	let (form, action) = site.endpoint.resolve(Some(token)).unwrap();

	// Assert
	assert!(url.starts_with("/tofu?lang=en&_tofu_key="));
	assert_eq!(form.key(), "contact");
	assert_eq!(action, FormAction::Confirm);
}
