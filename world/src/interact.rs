//! Capability shared by level objects the player can use.

use glam::Vec2;
use horde_core::{BarricadeId, DoorId, Event};

/// Level object that reacts to a nearby actor.
pub trait Interactable {
    /// Reports whether an actor standing at `actor` may use the object now.
    fn can_interact(&self, actor: Vec2) -> bool;

    /// Short text shown while the object is usable.
    fn prompt(&self) -> String;

    /// Uses the object, reporting every resulting change through `out`.
    fn interact(&mut self, out: &mut Vec<Event>);
}

/// Addresses an interactable object owned by the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractTarget {
    /// A barricade, repaired one panel per use.
    Barricade(BarricadeId),
    /// A door, opened once.
    Door(DoorId),
}
