//! Core traits for simulated entities.

use std::any::Any;

/// Downcast support for entity trait objects.
///
/// Blanket-implemented for every `'static` type; entities never implement
/// it by hand.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A simulated component.
///
/// Entities are the only things events are delivered to. They are
/// registered with a run during setup and live until it ends. An entity
/// never calls another entity directly: it schedules an event through a
/// [`Proxy`](crate::Proxy), and the event loop later invokes the target
/// with exclusive access to its state.
///
/// - **Synchronous**: a handler runs to completion and never blocks
/// - **Deterministic**: the same state and call produce the same effects
/// - **Isolated**: all side effects on other entities go through events
///
/// The trait itself has no required methods; behaviour lives in the
/// entity's own methods and in the capability traits it implements.
pub trait Entity: AsAny {
    /// Human-readable name used in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Exposes an entity under a capability interface `C`.
///
/// One concrete entity can implement several capability traits (for
/// example both a network handler and an application role). Implementing
/// `Capability<dyn Role>` lets a [`Proxy`](crate::Proxy) to the concrete
/// type be narrowed to a `Proxy<dyn Role>`.
///
/// ```ignore
/// impl Capability<dyn NetHandler> for Node {
///     fn view(&mut self) -> &mut (dyn NetHandler + 'static) {
///         self
///     }
/// }
/// ```
///
/// The [`capabilities!`](crate::capabilities) macro writes these impls.
pub trait Capability<C: ?Sized> {
    /// Borrow `self` as the capability.
    fn view(&mut self) -> &mut C;
}

/// Implement [`Capability`] for each listed trait object type.
///
/// ```ignore
/// capabilities!(Node: dyn NetHandler, dyn AppInterface);
/// ```
#[macro_export]
macro_rules! capabilities {
    ($ty:ty: $(dyn $cap:path),+ $(,)?) => {
        $(
            impl $crate::Capability<dyn $cap> for $ty {
                fn view(&mut self) -> &mut (dyn $cap + 'static) {
                    self
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter {
        fn bump(&mut self) -> u32;
    }

    #[derive(Default)]
    struct Tally {
        hits: u32,
    }

    impl Entity for Tally {}

    impl Counter for Tally {
        fn bump(&mut self) -> u32 {
            self.hits += 1;
            self.hits
        }
    }

    trait Label {
        fn label(&self) -> String;
    }

    impl Label for Tally {
        fn label(&self) -> String {
            format!("tally:{}", self.hits)
        }
    }

    capabilities!(Tally: dyn Counter, dyn Label,);

    #[test]
    fn test_downcast_through_trait_object() {
        let mut boxed: Box<dyn Entity> = Box::new(Tally::default());
        let entity: &mut dyn Entity = &mut *boxed;
        let tally = entity.as_any_mut().downcast_mut::<Tally>().unwrap();
        tally.hits = 3;
        let entity: &dyn Entity = &*boxed;
        assert_eq!(entity.as_any().downcast_ref::<Tally>().unwrap().hits, 3);
        assert!(entity.as_any().downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_default_name_is_type_name() {
        let tally = Tally::default();
        assert!(tally.name().ends_with("Tally"));
    }

    #[test]
    fn test_capability_view() {
        let mut tally = Tally::default();
        let counter: &mut dyn Counter = Capability::<dyn Counter>::view(&mut tally);
        assert_eq!(counter.bump(), 1);
        assert_eq!(tally.hits, 1);
    }

    #[test]
    fn test_macro_implements_every_listed_capability() {
        let mut tally = Tally::default();
        Capability::<dyn Counter>::view(&mut tally).bump();
        Capability::<dyn Counter>::view(&mut tally).bump();
        let label: &mut (dyn Label + 'static) = Capability::<dyn Label>::view(&mut tally);
        assert_eq!(label.label(), "tally:2");

        // Both views work through the erased entity too.
        let mut boxed: Box<dyn Entity> = Box::new(tally);
        let entity: &mut dyn Entity = &mut *boxed;
        let tally = entity.as_any_mut().downcast_mut::<Tally>().unwrap();
        assert_eq!(Capability::<dyn Counter>::view(tally).bump(), 3);
    }
}
