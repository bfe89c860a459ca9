//! Extension points for game modes.

use codec::EntityRef;
use wire::ClientMessage;

use crate::client::ClientId;
use crate::error::WorldResult;
use crate::world::World;

/// Per-entity logic, run once per tick in the entity phase.
///
/// Children are ticked right after their parent. Errors abort the tick.
pub trait EntityBehavior {
    fn tick(&mut self, entity: EntityRef, world: &mut World) -> WorldResult<()>;
}

impl<F> EntityBehavior for F
where
    F: FnMut(EntityRef, &mut World) -> WorldResult<()>,
{
    fn tick(&mut self, entity: EntityRef, world: &mut World) -> WorldResult<()> {
        self(entity, world)
    }
}

/// An autonomous controller bound to an owner entity. Dropped once the
/// owner is gone.
pub trait AiController {
    fn owner(&self) -> EntityRef;

    fn tick(&mut self, world: &mut World) -> WorldResult<()>;
}

/// Game mode callbacks.
pub trait GameHooks {
    /// A message from an accepted client, delivered at the start of the
    /// tick after it arrived.
    fn on_message(
        &mut self,
        _world: &mut World,
        _client: ClientId,
        _message: ClientMessage,
    ) -> WorldResult<()> {
        Ok(())
    }

    /// A [`crate::Event::Hook`] came due.
    fn on_event(&mut self, _world: &mut World, _hook: u32) -> WorldResult<()> {
        Ok(())
    }
}
