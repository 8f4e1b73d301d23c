use std::num::NonZeroUsize;

/// Discrete commands that move the view selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    Advance,
    Retreat,
}

/// Cyclic selection over a fixed number of views.
///
/// Starts at view 0 and has no terminal state; both transitions are total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    current: usize,
    count: NonZeroUsize,
}

impl ViewState {
    pub fn new(count: NonZeroUsize) -> Self {
        Self { current: 0, count }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.count.get();
    }

    pub fn retreat(&mut self) {
        let count = self.count.get();
        self.current = (self.current + count - 1) % count;
    }

    pub fn apply(&mut self, command: ViewCommand) {
        let previous = self.current;
        match command {
            ViewCommand::Advance => self.advance(),
            ViewCommand::Retreat => self.retreat(),
        }
        tracing::debug!(?command, from = previous, to = self.current, "view changed");
    }
}
