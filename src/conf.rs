//! Deployment settings
//!
//! ```rust,no_run
//! use tofu::conf::TofuSettings;
//!
//! let settings = TofuSettings::load("tofu.toml").unwrap();
//! assert!(settings.session.ttl_secs > 0);
//! ```

pub use tofu_conf::*;
