#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Every screen the app can navigate to.
pub enum Destination {
    PhotoEditor,
    Contrast,
    Enhancer,
    Saturation,
    Warmth,
    SplashScreen,
}

impl Destination {
    pub const ALL: [Destination; 6] = [
        Destination::PhotoEditor,
        Destination::Contrast,
        Destination::Enhancer,
        Destination::Saturation,
        Destination::Warmth,
        Destination::SplashScreen,
    ];

    /// Shown when the navigation stack is empty.
    pub const ROOT: Destination = Destination::SplashScreen;
}

#[derive(Debug, Default)]
/// Ordered navigation stack. The root screen is implicit and never stored.
pub struct Router {
    path: Vec<Destination>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &[Destination] {
        &self.path
    }

    pub fn current(&self) -> Destination {
        self.path.last().copied().unwrap_or(Destination::ROOT)
    }

    pub fn push(&mut self, destination: Destination) {
        tracing::info!(?destination, "navigate");
        self.path.push(destination);
    }

    pub fn pop(&mut self) -> Option<Destination> {
        self.path.pop()
    }

    pub fn pop_to_root(&mut self) {
        self.path.clear();
    }

    /// Truncates everything after the first occurrence of `destination`.
    /// Leaves the stack untouched if it is not present.
    pub fn pop_to_page(&mut self, destination: Destination) {
        match self.path.iter().position(|d| *d == destination) {
            Some(index) => self.path.truncate(index + 1),
            None => {
                tracing::warn!(?destination, path = ?self.path, "pop_to_page: destination not on stack");
            }
        }
    }

    /// Whether `destination` is visible or somewhere below the top.
    pub fn contains(&self, destination: Destination) -> bool {
        destination == Destination::ROOT || self.path.contains(&destination)
    }
}
