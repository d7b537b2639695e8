use crate::storage::{KeyValueStore, StorageError, THEME_KEY};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Light/dark preference read from durable storage at startup
pub struct ThemeController {
    durable: Arc<dyn KeyValueStore>,
    current: Mutex<Theme>,
}

impl ThemeController {
    pub fn new(durable: Arc<dyn KeyValueStore>) -> Self {
        let current = durable
            .get(THEME_KEY)
            .and_then(|s| Theme::parse(&s))
            .unwrap_or_default();
        Self {
            durable,
            current: Mutex::new(current),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Theme> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> Theme {
        *self.lock()
    }

    /// Mirrors the document-level dark flag
    pub fn is_dark(&self) -> bool {
        self.current() == Theme::Dark
    }

    pub fn set(&self, theme: Theme) -> Result<(), StorageError> {
        let mut current = self.lock();
        self.durable.set(THEME_KEY, theme.as_str())?;
        *current = theme;
        Ok(())
    }

    pub fn toggle(&self) -> Result<Theme, StorageError> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_defaults_to_light() {
        let controller = ThemeController::new(Arc::new(MemoryStore::new()));
        assert_eq!(controller.current(), Theme::Light);
        assert!(!controller.is_dark());
    }

    #[test]
    fn test_reads_and_persists_preference() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_KEY, "dark").unwrap();

        let controller = ThemeController::new(store.clone());
        assert!(controller.is_dark());

        assert_eq!(controller.toggle().unwrap(), Theme::Light);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_unknown_value_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(ThemeController::new(store).current(), Theme::Light);
    }
}
