//! Remote shell commands for credential delivery and app installation.
//!
//! Pure string builders; nothing here touches the network.

use std::path::Path;

use crate::domain::config::AppConfig;

/// Quote `s` for a POSIX shell as a single word.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@%+,".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Create the parent directory of a remote key path with owner-only access.
///
/// Returns `None` when the destination has no parent (lands in `$HOME`).
#[must_use]
pub fn prepare_key_dir_command(destination: &str) -> Option<String> {
    let parent = Path::new(destination).parent()?.to_str()?;
    if parent.is_empty() {
        return None;
    }
    let dir = shell_quote(parent);
    Some(format!("mkdir -p {dir} && chmod 700 {dir}"))
}

/// Restrict the delivered key to its owner.
#[must_use]
pub fn secure_key_command(destination: &str) -> String {
    format!("chmod 600 {}", shell_quote(destination))
}

/// Print the byte size of a remote file.
#[must_use]
pub fn file_size_command(destination: &str) -> String {
    format!("wc -c < {}", shell_quote(destination))
}

/// Remote key path as a shell word; relative paths resolve against `$HOME`.
fn remote_key_word(key_destination: &str) -> String {
    if Path::new(key_destination).is_absolute() {
        shell_quote(key_destination)
    } else {
        format!("\"$HOME\"/{}", shell_quote(key_destination))
    }
}

/// Clone the app using the delivered key.
///
/// Host key checking is off: `accept-new` needs OpenSSH 7.6, newer than
/// the client on older images.
#[must_use]
pub fn clone_command(app: &AppConfig, key_destination: &str) -> String {
    // git hands GIT_SSH_COMMAND to `sh`, so the key word is expanded there.
    let ssh = format!(
        "ssh -i {key} -o IdentitiesOnly=yes -o StrictHostKeyChecking=no",
        key = remote_key_word(key_destination)
    );
    format!(
        "GIT_SSH_COMMAND={ssh} git clone {repo} {dir}",
        ssh = shell_quote(&ssh),
        repo = shell_quote(&app.repository),
        dir = shell_quote(&app.install_dir),
    )
}

/// Run the app's install procedure from its checkout.
#[must_use]
pub fn install_command(app: &AppConfig) -> String {
    format!(
        "cd {dir} && {cmd}",
        dir = shell_quote(&app.install_dir),
        cmd = app.install_command
    )
}

/// Externally reachable URL of the installed app.
#[must_use]
pub fn app_url(address: &str, port: u16) -> String {
    format!("http://{address}:{port}/")
}
