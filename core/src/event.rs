use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::*;

/// A state change a [`Game`] reports to its listeners.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A cell's visible state changed.
    CellChanged { coords: Coord2, tile: Tile },
    /// The remaining-mine counter changed.
    FlagsChanged { remaining: isize },
    /// The clock advanced.
    Ticked { elapsed: u16 },
    Won,
    Lost,
}

/// Receives game events synchronously, in the order they happen.
///
/// Listeners only observe; they get no access to the game that emits the event.
pub trait GameListener {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F> GameListener for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Handle returned by [`Game::subscribe`], used to unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u32,
    entries: Vec<(ListenerId, Box<dyn GameListener>)>,
}

impl Listeners {
    pub(crate) fn subscribe(&mut self, listener: Box<dyn GameListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        for (_, listener) in self.entries.iter_mut() {
            listener.on_event(&event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
