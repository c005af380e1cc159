#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for the Horde AI engine.
//!
//! A [`Level`] owns the static geometry, the dense [`OccupancyGrid`] and every
//! barricade and door placed on the map. Obstacles never touch the grid
//! directly: they report their transitions as events and the level folds
//! those events back into walkability through [`OccupancyGrid::set_walkable`].

mod barricade;
mod door;
mod error;
mod geometry;
mod grid;
mod interact;
mod sight;

use glam::Vec2;
use horde_core::{AgentId, BarricadeId, CellCoord, DoorId, Event};

pub use barricade::Barricade;
pub use door::Door;
pub use error::LevelError;
pub use geometry::{DoorMarker, LevelGeometry, LevelLayout, SpawnMarker};
pub use grid::OccupancyGrid;
pub use interact::{InteractTarget, Interactable};
pub use sight::{line_of_sight, SightLine};

use geometry::to_u32;
use grid::cell_center;

/// Distance, in tiles, from which an actor may use a barricade or door.
const INTERACT_REACH_TILES: f32 = 1.5;

/// Loaded level: geometry, live walkability and the obstacles placed on it.
#[derive(Clone, Debug)]
pub struct Level {
    geometry: LevelGeometry,
    grid: OccupancyGrid,
    barricades: Vec<Barricade>,
    doors: Vec<Door>,
    spawns: Vec<SpawnMarker>,
    player: Option<CellCoord>,
    torn_down: bool,
}

impl Level {
    /// Builds the level and its occupancy grid.
    ///
    /// Every barricade starts with `panels` panels. Standing obstacles, closed
    /// barricades and door cells are blocked in the initial grid.
    pub fn load(
        geometry: LevelGeometry,
        layout: &LevelLayout,
        panels: u32,
    ) -> Result<Self, LevelError> {
        geometry.validate()?;
        let tile_size = geometry.tile_size();
        let reach = tile_size * INTERACT_REACH_TILES;

        let barricades: Vec<Barricade> = layout
            .barricades
            .iter()
            .enumerate()
            .map(|(index, &cell)| {
                Barricade::new(
                    BarricadeId::new(to_u32(index)),
                    cell,
                    cell_center(cell, tile_size),
                    panels,
                    reach,
                )
            })
            .collect();

        let doors: Vec<Door> = layout
            .doors
            .iter()
            .enumerate()
            .map(|(index, marker)| {
                let positions = marker
                    .cells
                    .iter()
                    .map(|&cell| cell_center(cell, tile_size))
                    .collect();
                Door::new(
                    DoorId::new(to_u32(index)),
                    marker.zone,
                    marker.cells.clone(),
                    positions,
                    reach,
                )
            })
            .collect();

        let mut obstacles: Vec<Vec2> = layout
            .obstacles
            .iter()
            .map(|&cell| cell_center(cell, tile_size))
            .collect();
        obstacles.extend(
            barricades
                .iter()
                .filter(|barricade| !barricade.is_open())
                .map(Barricade::position),
        );
        obstacles.extend(doors.iter().flat_map(|door| door.positions().iter().copied()));

        let grid = OccupancyGrid::build(&geometry, &obstacles)?;
        tracing::debug!(
            columns = grid.columns(),
            rows = grid.rows(),
            walkable = grid.walkable_count(),
            barricades = barricades.len(),
            doors = doors.len(),
            "level loaded"
        );

        Ok(Self {
            geometry,
            grid,
            barricades,
            doors,
            spawns: layout.spawns.clone(),
            player: layout.player,
            torn_down: false,
        })
    }

    /// Parses a text map and loads it in one step.
    pub fn from_ascii<I, S>(rows: I, tile_size: f32, panels: u32) -> Result<Self, LevelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (geometry, layout) = LevelGeometry::from_ascii(rows, tile_size)?;
        Self::load(geometry, &layout, panels)
    }

    /// Static geometry the level was built from.
    #[must_use]
    pub const fn geometry(&self) -> &LevelGeometry {
        &self.geometry
    }

    /// Live walkability of the level.
    #[must_use]
    pub const fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Side length of a single tile expressed in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.geometry.tile_size()
    }

    /// Barricades still present in the level, in id order.
    #[must_use]
    pub fn barricades(&self) -> &[Barricade] {
        &self.barricades
    }

    /// Looks up a barricade that has not been removed.
    #[must_use]
    pub fn barricade(&self, id: BarricadeId) -> Option<&Barricade> {
        self.barricades.iter().find(|barricade| barricade.id() == id)
    }

    /// Doors placed in the level, in id order.
    #[must_use]
    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    /// Looks up a door.
    #[must_use]
    pub fn door(&self, id: DoorId) -> Option<&Door> {
        self.doors.iter().find(|door| door.id() == id)
    }

    /// Spawn points read from the map.
    #[must_use]
    pub fn spawn_markers(&self) -> &[SpawnMarker] {
        &self.spawns
    }

    /// World position of the player start, if the map defines one.
    #[must_use]
    pub fn player_start(&self) -> Option<Vec2> {
        self.player
            .map(|cell| cell_center(cell, self.geometry.tile_size()))
    }

    /// Reports whether the level is being unloaded.
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Marks the level as unloading. Spawners stop producing agents.
    pub fn tear_down(&mut self) {
        self.torn_down = true;
    }

    /// Tests whether the wall layer leaves a clear ray between two positions.
    #[must_use]
    pub fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        line_of_sight(&self.geometry, from, to)
    }

    /// Barricades ordered by straight-line distance from `from`, nearest first.
    ///
    /// Equidistant barricades keep id order.
    #[must_use]
    pub fn barricades_by_distance(&self, from: Vec2) -> Vec<BarricadeId> {
        let mut ranked: Vec<(f32, BarricadeId)> = self
            .barricades
            .iter()
            .map(|barricade| (from.distance_squared(barricade.position()), barricade.id()))
            .collect();
        ranked.sort_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));
        ranked.into_iter().map(|(_, id)| id).collect()
    }

    /// Tears one panel off a barricade on behalf of an agent.
    ///
    /// Returns the panels left, or `None` when the barricade no longer exists.
    /// Striking an open barricade changes nothing.
    pub fn strike_barricade(
        &mut self,
        id: BarricadeId,
        agent: AgentId,
        out: &mut Vec<Event>,
    ) -> Option<u32> {
        let start = out.len();
        let barricade = self
            .barricades
            .iter_mut()
            .find(|barricade| barricade.id() == id)?;
        if barricade.is_open() {
            return Some(0);
        }

        let panels_left = barricade.remove_panel();
        let position = barricade.position();
        out.push(Event::BarricadeStruck {
            barricade: id,
            agent,
            panels_left,
        });
        if panels_left == 0 {
            out.push(Event::BarricadeBreached {
                barricade: id,
                position,
            });
        }

        self.absorb(&out[start..]);
        Some(panels_left)
    }

    /// Removes a barricade from the level entirely, freeing its cell.
    pub fn remove_barricade(&mut self, id: BarricadeId, out: &mut Vec<Event>) -> bool {
        let Some(index) = self
            .barricades
            .iter()
            .position(|barricade| barricade.id() == id)
        else {
            return false;
        };

        let removed = self.barricades.remove(index);
        let start = out.len();
        out.push(Event::BarricadeRemoved {
            barricade: id,
            position: removed.position(),
        });
        self.absorb(&out[start..]);
        true
    }

    /// Uses an interactable object on behalf of an actor at `actor`.
    ///
    /// Returns `false` when the object does not exist or refuses the actor.
    pub fn interact(&mut self, target: InteractTarget, actor: Vec2, out: &mut Vec<Event>) -> bool {
        let object: Option<&mut dyn Interactable> = match target {
            InteractTarget::Barricade(id) => self
                .barricades
                .iter_mut()
                .find(|barricade| barricade.id() == id)
                .map(|barricade| barricade as &mut dyn Interactable),
            InteractTarget::Door(id) => self
                .doors
                .iter_mut()
                .find(|door| door.id() == id)
                .map(|door| door as &mut dyn Interactable),
        };
        let Some(object) = object.filter(|object| object.can_interact(actor)) else {
            return false;
        };

        let start = out.len();
        object.interact(out);
        self.absorb(&out[start..]);
        true
    }

    /// Interactables usable from `actor` together with their prompts.
    #[must_use]
    pub fn available_interactions(&self, actor: Vec2) -> Vec<(InteractTarget, String)> {
        let barricades = self
            .barricades
            .iter()
            .filter(|barricade| barricade.can_interact(actor))
            .map(|barricade| (InteractTarget::Barricade(barricade.id()), barricade.prompt()));
        let doors = self
            .doors
            .iter()
            .filter(|door| door.can_interact(actor))
            .map(|door| (InteractTarget::Door(door.id()), door.prompt()));
        barricades.chain(doors).collect()
    }

    fn absorb(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::BarricadeBreached { position, .. }
                | Event::BarricadeRemoved { position, .. } => {
                    self.grid.set_walkable(*position, true);
                }
                Event::BarricadeRepaired { position, .. } => {
                    self.grid.set_walkable(*position, false);
                }
                Event::DoorOpened { door, .. } => {
                    if let Some(door) = self.doors.iter().find(|candidate| candidate.id() == *door) {
                        for &position in door.positions() {
                            self.grid.set_walkable(position, true);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
