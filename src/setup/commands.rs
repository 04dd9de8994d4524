//! Commands that prepare the checkout before analysis: git checkout, the PHP
//! runtime from the sury.org apt repository, and Composer dependencies.

use super::Invocation;

const SURY_KEY_URL: &str = "https://packages.sury.org/php/apt.gpg";
const SURY_REPO_URL: &str = "https://packages.sury.org/php/";
const SOURCES_LIST: &str = "/etc/apt/sources.list.d/php.list";

pub fn checkout(git_ref: &str) -> Invocation {
    Invocation::new("git", ["checkout", git_ref])
}

/// Add the sury.org package source and install `php<version>` plus one
/// `php<version>-<ext>` package per extension, as a single `sh -c` script.
///
/// `version` must already be validated; it is interpolated verbatim.
pub fn install_runtime(version: &str, extensions: &[String]) -> Invocation {
    let mut packages = vec![format!("php{}", version)];
    packages.extend(extensions.iter().map(|ext| format!("php{}-{}", version, ext)));

    let script = format!(
        "curl -sSL {key} | sudo apt-key add - \
         && echo \"deb {repo} $(lsb_release -sc) main\" | sudo tee {list} \
         && sudo apt-get update \
         && sudo apt-get install -y {packages}",
        key = SURY_KEY_URL,
        repo = SURY_REPO_URL,
        list = SOURCES_LIST,
        packages = packages.join(" "),
    );
    Invocation::new("sh", ["-c".to_string(), script])
}

/// `composer update` in non-interactive, script-free, reproducible mode.
pub fn install_dependencies() -> Invocation {
    Invocation::new(
        "composer",
        [
            "update",
            "--quiet",
            "--no-ansi",
            "--no-interaction",
            "--no-scripts",
            "--no-suggest",
            "--no-progress",
            "--prefer-dist",
        ],
    )
}
