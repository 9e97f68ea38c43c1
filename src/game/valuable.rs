use crate::game::grid::GridMap;
use crate::game::player::{Player, PlayerId};
use cgmath::Vector2;
use log::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValuableId(pub u32);

/// Small loot (vases, jewelry) or large loot (statues, paintings).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValuableKind {
    Small,
    Large,
}

impl TryFrom<u8> for ValuableKind {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ValuableKind::Small),
            2 => Ok(ValuableKind::Large),
            other => Err(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValuableStatus {
    /// At its spawn point or dropped on the floor.
    Free,
    Carried,
    /// Banked. Nothing moves a valuable here yet.
    Stored,
}

#[derive(Clone, Debug)]
pub struct Valuable {
    pub id: ValuableId,
    pub position: Vector2<f32>,
    pub kind: ValuableKind,
    status: ValuableStatus,
    carrier: Option<PlayerId>,
}

impl Valuable {
    pub fn new(id: ValuableId, position: Vector2<f32>, kind: ValuableKind) -> Self {
        Self {
            id,
            position,
            kind,
            status: ValuableStatus::Free,
            carrier: None,
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> ValuableStatus {
        self.status
    }

    #[cfg(test)]
    pub fn carrier(&self) -> Option<PlayerId> {
        self.carrier
    }

    /// Only a carried valuable has a carrier.
    pub fn set_status(&mut self, status: ValuableStatus, carrier: Option<PlayerId>) {
        debug_assert_eq!(
            status == ValuableStatus::Carried,
            carrier.is_some(),
            "carrier must be set exactly when carried"
        );
        self.status = status;
        self.carrier = carrier;
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValuableSet {
    items: Vec<Valuable>,
}

impl ValuableSet {
    pub fn from_spawns(spawns: impl IntoIterator<Item = (Vector2<f32>, ValuableKind)>) -> Self {
        let items = spawns
            .into_iter()
            .enumerate()
            .map(|(i, (pos, kind))| Valuable::new(ValuableId(i as u32), pos, kind))
            .collect();
        Self { items }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn get(&self, id: ValuableId) -> Option<&Valuable> {
        self.items.iter().find(|v| v.id == id)
    }

    fn get_mut(&mut self, id: ValuableId) -> Option<&mut Valuable> {
        self.items.iter_mut().find(|v| v.id == id)
    }

    /// Picks up the first free valuable sharing the player's cell. A player
    /// already carrying something never picks up a second item.
    pub fn try_pickup(&mut self, player: &mut Player, grid: &GridMap) -> Option<ValuableId> {
        if player.is_carrying() {
            return None;
        }
        let player_cell = grid.cell_at(player.position);
        let valuable = self.items.iter_mut().find(|v| {
            v.status == ValuableStatus::Free && grid.cell_at(v.position) == player_cell
        })?;

        valuable.set_status(ValuableStatus::Carried, Some(player.id));
        player.carried = Some(valuable.id);
        info!(
            "Player {} picked up valuable {} ({:?}) at {:?}",
            player.id.0, valuable.id.0, valuable.kind, player_cell
        );
        Some(valuable.id)
    }

    /// Drops whatever the player carries where they stand.
    pub fn drop_carried(&mut self, player: &mut Player) -> Option<ValuableId> {
        let id = player.carried.take()?;
        if let Some(valuable) = self.get_mut(id) {
            debug_assert_eq!(valuable.carrier, Some(player.id));
            valuable.set_status(ValuableStatus::Free, None);
            valuable.position = player.position;
            info!("Player {} dropped valuable {}", player.id.0, id.0);
        }
        Some(id)
    }

    /// Carried valuables ride along with their carrier.
    pub fn follow_carrier(&mut self, player: &Player) {
        for valuable in &mut self.items {
            if valuable.status == ValuableStatus::Carried && valuable.carrier == Some(player.id) {
                valuable.position = player.position;
            }
        }
    }
}
