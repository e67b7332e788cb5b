//! Mapping from engine collider handles to the bodies that own them

use crate::body::BodyId;
use rapier2d::prelude as rapier;
use std::collections::HashMap;

/// Collider handle → owning body.
///
/// A handle is present exactly while its body is attached: all of a body's
/// handles are inserted together on attach and removed together on detach.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    owners: HashMap<rapier::ColliderHandle, BodyId>,
}

impl ShapeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every shape handle of a freshly attached body
    pub fn register(&mut self, body: BodyId, shapes: &[rapier::ColliderHandle]) {
        for &shape in shapes {
            let previous = self.owners.insert(shape, body);
            debug_assert!(
                previous.is_none(),
                "shape {shape:?} registered twice (was {previous:?})"
            );
        }
    }

    /// Drop every shape handle of a body being detached
    pub fn deregister(&mut self, shapes: &[rapier::ColliderHandle]) {
        for shape in shapes {
            self.owners.remove(shape);
        }
    }

    /// Owning body of a shape handle
    pub fn resolve(&self, shape: rapier::ColliderHandle) -> Option<BodyId> {
        self.owners.get(&shape).copied()
    }

    /// Number of registered shape handles
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier2d::data::Index;

    #[test]
    fn test_register_and_resolve() {
        let body = BodyId::from_raw(Index::from_raw_parts(4, 1));
        let shapes = [
            rapier::ColliderHandle::from_raw_parts(0, 0),
            rapier::ColliderHandle::from_raw_parts(1, 0),
        ];

        let mut registry = ShapeRegistry::new();
        registry.register(body, &shapes);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve(shapes[1]), Some(body));

        registry.deregister(&shapes);
        assert!(registry.is_empty());
        assert_eq!(registry.resolve(shapes[0]), None);
    }
}
