//! Shell detection for wrapping the CLI invocation on POSIX, generalized
//! from the host-facing shell detection a terminal-emulator product needs:
//! here there is no user-configured override, only a fallback chain, since
//! the shell is purely a launch vehicle for the CLI's own argv.

use std::path::{Path, PathBuf};

use crate::error::AdapterError;

/// The shell binary and the flag that introduces an inline command string
/// (`-c` for every POSIX shell we fall back through).
#[derive(Debug, Clone)]
pub struct ShellInvocation {
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub name: String,
}

/// `$SHELL` if it exists on disk, else `bash` via `PATH`, else `zsh` via
/// `PATH`, else the POSIX-guaranteed `/bin/sh`. Unlike a user-facing
/// terminal, this chain has no config override: the CLI's own argv is
/// always the thing actually run, the shell only gets it there.
#[cfg(not(windows))]
#[must_use]
pub fn detect_shell() -> ShellInvocation {
    if let Ok(shell) = std::env::var("SHELL") {
        let path = Path::new(&shell);
        if path.exists() {
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("user-shell")
                .to_string();
            return ShellInvocation {
                binary: PathBuf::from(&shell),
                args: vec!["-c".to_string()],
                name,
            };
        }
    }

    if let Ok(path) = which::which("bash") {
        return ShellInvocation {
            binary: path,
            args: vec!["-c".to_string()],
            name: "bash".into(),
        };
    }

    if let Ok(path) = which::which("zsh") {
        return ShellInvocation {
            binary: path,
            args: vec!["-c".to_string()],
            name: "zsh".into(),
        };
    }

    ShellInvocation {
        binary: PathBuf::from("/bin/sh"),
        args: vec!["-c".to_string()],
        name: "sh".into(),
    }
}

/// Single-quote a POSIX shell word: wrap in `'...'`, escaping any embedded
/// `'` as `'\''`.
#[must_use]
pub fn quote_shell_word(word: &str) -> String {
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('\'');
    for ch in word.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

/// Build the single inline command string a POSIX shell's `-c` expects,
/// from the CLI's own executable and argv.
#[must_use]
pub fn build_posix_command_line(cli_command: &Path, cli_args: &[String]) -> String {
    let mut parts = vec![quote_shell_word(&cli_command.to_string_lossy())];
    parts.extend(cli_args.iter().map(|a| quote_shell_word(a)));
    parts.join(" ")
}

/// On Windows, the CLI is spawned directly with no shell wrapper: reject
/// anything that doesn't resolve to an `.exe`, since a `.bat`/`.cmd`
/// script would silently require `cmd.exe` to interpret it.
#[cfg(windows)]
pub fn validate_windows_command(cli_command: &Path) -> Result<(), AdapterError> {
    let is_exe = cli_command
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"));
    if is_exe {
        Ok(())
    } else {
        Err(AdapterError::WindowsCmdWrapperForbidden)
    }
}

#[cfg(not(windows))]
pub fn validate_windows_command(_cli_command: &Path) -> Result<(), AdapterError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_simple_word() {
        assert_eq!(quote_shell_word("hello"), "'hello'");
    }

    #[test]
    fn escapes_embedded_single_quote() {
        assert_eq!(quote_shell_word("it's"), "'it'\\''s'");
    }

    #[test]
    fn builds_command_line_from_argv() {
        let line = build_posix_command_line(
            Path::new("/usr/local/bin/ai-cli"),
            &["--prompt".to_string(), "do the thing".to_string()],
        );
        assert_eq!(line, "'/usr/local/bin/ai-cli' '--prompt' 'do the thing'");
    }

    #[cfg(not(windows))]
    #[test]
    fn windows_validation_is_a_no_op_elsewhere() {
        assert!(validate_windows_command(Path::new("/usr/bin/ai-cli")).is_ok());
    }

    #[cfg(not(windows))]
    #[test]
    fn detect_shell_returns_something_usable() {
        let shell = detect_shell();
        assert!(!shell.binary.as_os_str().is_empty());
        assert_eq!(shell.args, vec!["-c".to_string()]);
        assert!(!shell.name.is_empty());
    }
}
