//! Launch-time overrides layered from files, environment and command line.

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_HOMEPAGE;

/// Values the operator may override when launching the desktop shell.
///
/// Loading follows the usual precedence: command line over `KESTREL_*`
/// environment variables over configuration files over the field defaults
/// declared here. A launch with no layers at all yields [`Default::default`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "KESTREL")]
pub struct LaunchOverrides {
    /// Resource loaded by the shell window, useful with a local dev web build.
    #[ortho_config(default = DEFAULT_HOMEPAGE.to_owned(), cli_short = 'p')]
    #[serde(default = "default_homepage")]
    pub homepage: String,
    /// Initialise the daemon, shut it down again and exit without a window.
    #[ortho_config(default = false)]
    #[serde(default)]
    pub init_only: bool,
}

fn default_homepage() -> String {
    DEFAULT_HOMEPAGE.to_owned()
}

impl Default for LaunchOverrides {
    fn default() -> Self {
        Self {
            homepage: default_homepage(),
            init_only: false,
        }
    }
}
