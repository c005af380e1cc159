//! Doors that seal off spawn zones until opened.

use glam::Vec2;
use horde_core::{CellCoord, DoorId, Event, ZoneId};

use crate::interact::Interactable;

/// Door blocking one or more cells and unlocking a zone once opened.
#[derive(Clone, Debug, PartialEq)]
pub struct Door {
    id: DoorId,
    zone: ZoneId,
    cells: Vec<CellCoord>,
    positions: Vec<Vec2>,
    open: bool,
    reach: f32,
}

impl Door {
    pub(crate) fn new(
        id: DoorId,
        zone: ZoneId,
        cells: Vec<CellCoord>,
        positions: Vec<Vec2>,
        reach: f32,
    ) -> Self {
        Self {
            id,
            zone,
            cells,
            positions,
            open: false,
            reach,
        }
    }

    /// Identifier of the door.
    #[must_use]
    pub const fn id(&self) -> DoorId {
        self.id
    }

    /// Zone unlocked by opening the door.
    #[must_use]
    pub const fn zone(&self) -> ZoneId {
        self.zone
    }

    /// Cells blocked while the door is closed.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// World-space centres of the door cells.
    #[must_use]
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// Reports whether the door has been opened.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }
}

impl Interactable for Door {
    fn can_interact(&self, actor: Vec2) -> bool {
        !self.open
            && self
                .positions
                .iter()
                .any(|position| actor.distance(*position) <= self.reach)
    }

    fn prompt(&self) -> String {
        format!("Open door to zone {}", self.zone.get())
    }

    fn interact(&mut self, out: &mut Vec<Event>) {
        if self.open {
            return;
        }
        self.open = true;
        out.push(Event::DoorOpened {
            door: self.id,
            zone: self.zone,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_opens_once() {
        let mut door = Door::new(
            DoorId::new(4),
            ZoneId::new(2),
            vec![CellCoord::new(1, 0), CellCoord::new(2, 0)],
            vec![Vec2::new(15.0, 5.0), Vec2::new(25.0, 5.0)],
            12.0,
        );
        assert!(door.can_interact(Vec2::new(25.0, 15.0)));
        assert!(!door.can_interact(Vec2::new(60.0, 60.0)));

        let mut events = Vec::new();
        door.interact(&mut events);
        door.interact(&mut events);

        assert!(door.is_open());
        assert!(!door.can_interact(Vec2::new(25.0, 15.0)));
        assert_eq!(
            events,
            vec![Event::DoorOpened {
                door: DoorId::new(4),
                zone: ZoneId::new(2),
            }]
        );
    }
}
