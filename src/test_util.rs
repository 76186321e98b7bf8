use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::settings::user_settings_dir;

static HOME_LOCK: Mutex<()> = Mutex::new(());

/// Runs `func` with HOME pointed at a fresh directory, optionally holding a
/// user settings file with `user_settings` as its contents.
pub(crate) fn with_user_settings<F, R>(user_settings: Option<&str>, func: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let _guard = HOME_LOCK.lock().unwrap_or_else(|err| err.into_inner());
    let home = tempfile::tempdir().expect("tempdir");
    let previous = std::env::var("HOME").ok();
    // SAFETY: HOME is only touched while HOME_LOCK is held.
    unsafe { std::env::set_var("HOME", home.path()) };

    if let Some(content) = user_settings {
        let dir = user_settings_dir().expect("settings dir");
        fs::create_dir_all(&dir).expect("create settings dir");
        fs::write(dir.join("settings.toml"), content).expect("write settings");
    }
    let result = func(home.path());

    match previous {
        Some(old) => unsafe { std::env::set_var("HOME", old) },
        None => unsafe { std::env::remove_var("HOME") },
    }
    result
}
