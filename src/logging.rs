//! Log output for hosts that do not install their own subscriber

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Build the filter: `TOFU_LOG`, then `RUST_LOG`, then `default_directive`
pub fn env_filter(default_directive: &str) -> EnvFilter {
	if let Ok(directives) = std::env::var("TOFU_LOG")
		&& let Ok(filter) = EnvFilter::try_new(&directives)
	{
		return filter;
	}
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return filter;
	}
	EnvFilter::try_new(default_directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a formatting subscriber.
///
/// Returns `false` when a global subscriber was already set; the existing
/// one is kept.
pub fn init(default_directive: &str) -> bool {
	tracing_subscriber::registry()
		.with(fmt::layer().with_target(true))
		.with(env_filter(default_directive))
		.try_init()
		.is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_second_init_keeps_first_subscriber() {
		// Act
		init("tofu=debug");
		let second = init("tofu=debug");

		// Assert
		assert!(!second);
	}

	#[rstest]
	fn test_invalid_default_falls_back() {
		let filter = env_filter("tofu=[");
		assert!(!filter.to_string().is_empty());
	}
}
