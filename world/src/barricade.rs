//! Destructible barricades guarding the perimeter.

use glam::Vec2;
use horde_core::{BarricadeId, CellCoord, Event};

use crate::interact::Interactable;

/// Panelled obstacle that blocks its cell until every panel is torn off.
#[derive(Clone, Debug, PartialEq)]
pub struct Barricade {
    id: BarricadeId,
    cell: CellCoord,
    position: Vec2,
    panels: u32,
    max_panels: u32,
    reach: f32,
}

impl Barricade {
    pub(crate) fn new(
        id: BarricadeId,
        cell: CellCoord,
        position: Vec2,
        max_panels: u32,
        reach: f32,
    ) -> Self {
        Self {
            id,
            cell,
            position,
            panels: max_panels,
            max_panels,
            reach,
        }
    }

    /// Identifier of the barricade.
    #[must_use]
    pub const fn id(&self) -> BarricadeId {
        self.id
    }

    /// Grid cell the barricade occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// World position of the barricade centre.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Panels currently nailed to the barricade.
    #[must_use]
    pub const fn panels(&self) -> u32 {
        self.panels
    }

    /// Panels the barricade holds when fully repaired.
    #[must_use]
    pub const fn max_panels(&self) -> u32 {
        self.max_panels
    }

    /// Reports whether every panel has been torn off.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.panels == 0
    }

    /// Tears one panel off and returns the panels left.
    pub(crate) fn remove_panel(&mut self) -> u32 {
        self.panels = self.panels.saturating_sub(1);
        self.panels
    }

    /// Nails one panel back on and returns the panels present.
    pub(crate) fn add_panel(&mut self) -> u32 {
        self.panels = (self.panels + 1).min(self.max_panels);
        self.panels
    }
}

impl Interactable for Barricade {
    fn can_interact(&self, actor: Vec2) -> bool {
        self.panels < self.max_panels && actor.distance(self.position) <= self.reach
    }

    fn prompt(&self) -> String {
        format!("Repair barricade ({}/{})", self.panels, self.max_panels)
    }

    fn interact(&mut self, out: &mut Vec<Event>) {
        if self.panels >= self.max_panels {
            return;
        }
        let panels = self.add_panel();
        out.push(Event::BarricadeRepaired {
            barricade: self.id,
            position: self.position,
            panels,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn barricade() -> Barricade {
        Barricade::new(
            BarricadeId::new(0),
            CellCoord::new(2, 2),
            Vec2::new(40.0, 40.0),
            3,
            24.0,
        )
    }

    #[test]
    fn panels_saturate_at_both_ends() {
        let mut barricade = barricade();
        assert_eq!(barricade.add_panel(), 3);

        for expected in [2, 1, 0, 0] {
            assert_eq!(barricade.remove_panel(), expected);
        }
        assert!(barricade.is_open());
    }

    #[test]
    fn repair_requires_reach_and_missing_panels() {
        let mut barricade = barricade();
        let near = Vec2::new(50.0, 40.0);
        assert!(!barricade.can_interact(near));

        let _ = barricade.remove_panel();
        assert!(barricade.can_interact(near));
        assert!(!barricade.can_interact(Vec2::new(100.0, 40.0)));

        let mut events = Vec::new();
        barricade.interact(&mut events);
        assert_eq!(
            events,
            vec![Event::BarricadeRepaired {
                barricade: BarricadeId::new(0),
                position: Vec2::new(40.0, 40.0),
                panels: 3,
            }]
        );

        barricade.interact(&mut events);
        assert_eq!(events.len(), 1, "a full barricade ignores repairs");
    }
}
