//! Screen back stack.

use flash_core::{CategoryKey, Screen};
use tokio::sync::watch;

/// Back stack of signed-in screens plus the selected category.
///
/// The stack always starts with [`Screen::Start`] and never drops below it.
#[derive(Debug)]
pub struct Navigator {
    stack: Vec<Screen>,
    category: Option<CategoryKey>,
    current: watch::Sender<Screen>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    #[must_use]
    pub fn new() -> Self {
        let (current, _) = watch::channel(Screen::Start);
        Self {
            stack: vec![Screen::Start],
            category: None,
            current,
        }
    }

    /// Select a category and open its item list.
    pub fn select_category(&mut self, category: CategoryKey) {
        tracing::debug!(category = %category.as_str(), "Category selected");
        self.category = Some(category);
        self.push(Screen::Items);
    }

    /// Open the cart unless it is already showing.
    pub fn open_cart(&mut self) {
        if self.current() != Screen::Cart {
            self.push(Screen::Cart);
        }
    }

    /// Back to the start screen with nothing to go back to.
    pub fn go_home(&mut self) {
        self.stack.clear();
        self.stack.push(Screen::Start);
        self.publish();
    }

    /// Pop one screen. Returns `false` when already at the start screen.
    pub fn navigate_up(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        self.publish();
        true
    }

    #[must_use]
    pub fn can_navigate_back(&self) -> bool {
        self.stack.len() > 1
    }

    #[must_use]
    pub fn current(&self) -> Screen {
        self.stack.last().copied().unwrap_or_default()
    }

    #[must_use]
    pub const fn category(&self) -> Option<&CategoryKey> {
        self.category.as_ref()
    }

    /// Title for the top bar.
    #[must_use]
    pub fn title(&self) -> &'static str {
        self.current().title()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Screen> {
        self.current.subscribe()
    }

    fn push(&mut self, screen: Screen) {
        self.stack.push(screen);
        self.publish();
    }

    fn publish(&self) {
        let screen = self.current();
        self.current.send_if_modified(|current| {
            let changed = *current != screen;
            *current = screen;
            changed
        });
    }
}
