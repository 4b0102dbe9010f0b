//! Typed handles to entities.

use crate::traits::{Capability, Entity};
use std::fmt;
use tempo_types::EntityId;

/// Resolves a registered entity to the interface a proxy addresses.
type View<C> = fn(&mut dyn Entity) -> Option<&mut C>;

/// The only way to address an entity from outside itself.
///
/// A proxy is a cheap, copyable pair of the target's [`EntityId`] and a
/// view function that narrows the stored entity to `C`. `C` is either the
/// concrete entity type or a capability trait object (`dyn NetHandler`).
/// Calls made through a proxy are never executed directly; the event loop
/// turns them into events and resolves the view when the event fires.
pub struct Proxy<C: ?Sized + 'static> {
    id: EntityId,
    view: View<C>,
}

fn downcast<T: Entity>(entity: &mut dyn Entity) -> Option<&mut T> {
    entity.as_any_mut().downcast_mut::<T>()
}

fn downcast_capability<T, C>(entity: &mut dyn Entity) -> Option<&mut C>
where
    T: Entity + Capability<C>,
    C: ?Sized + 'static,
{
    downcast::<T>(entity).map(|t| t.view())
}

impl<T: Entity> Proxy<T> {
    /// Proxy addressing entity `id` as its concrete type `T`.
    ///
    /// Normally obtained from registration rather than built by hand; a
    /// proxy whose id does not hold a `T` fails at dispatch time.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            view: downcast::<T>,
        }
    }

    /// The same entity addressed under capability `C`.
    pub fn capability<C>(&self) -> Proxy<C>
    where
        T: Capability<C>,
        C: ?Sized + 'static,
    {
        Proxy {
            id: self.id,
            view: downcast_capability::<T, C>,
        }
    }
}

impl<C: ?Sized + 'static> Proxy<C> {
    /// Id of the addressed entity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Narrow a stored entity to this proxy's interface.
    ///
    /// Returns `None` if the entity is not of the type the proxy was
    /// created for.
    pub fn resolve<'a>(&self, entity: &'a mut dyn Entity) -> Option<&'a mut C> {
        (self.view)(entity)
    }
}

impl<C: ?Sized + 'static> Clone for Proxy<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized + 'static> Copy for Proxy<C> {}

impl<C: ?Sized + 'static> PartialEq for Proxy<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C: ?Sized + 'static> Eq for Proxy<C> {}

impl<C: ?Sized + 'static> fmt::Debug for Proxy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("id", &self.id)
            .field("as", &std::any::type_name::<C>())
            .finish()
    }
}
