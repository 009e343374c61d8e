//! Reflector connectivity.
//!
//! A structure receives light when at least one reflector can see a light and
//! also has a clear path to the structure. Reflectors and structures do not
//! block their own rays.

use serde::{Deserialize, Serialize};
use sol_ecs::entity::EntityId;

use crate::geometry::Vec2;
use crate::query::OcclusionQuery;

/// A mirror that redirects light toward a structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reflector {
    pub entity: Option<EntityId>,
    pub position: Vec2,
}

/// A light-consuming structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub entity: Option<EntityId>,
    pub position: Vec2,
}

/// Run `f` with the entities whose footprints a sight line between `a` and
/// `b` should ignore.
fn with_endpoints<R>(
    a: Option<EntityId>,
    b: Option<EntityId>,
    f: impl FnOnce(&[EntityId]) -> R,
) -> R {
    match (a, b) {
        (Some(a), Some(b)) => f(&[a, b]),
        (Some(id), None) | (None, Some(id)) => f(&[id]),
        (None, None) => f(&[]),
    }
}

/// Whether `reflector` has an unobstructed view of any light.
///
/// Split lights have no geometry and are always in view.
pub fn reflector_sees_light(query: &OcclusionQuery<'_>, reflector: &Reflector) -> bool {
    with_endpoints(reflector.entity, None, |ignore| {
        query.lights().iter().any(|light| {
            !light.casts_rays()
                || query.has_line_of_sight_ignoring(reflector.position, light.position, ignore)
        })
    })
}

/// Whether `reflector` has a clear path to `structure`.
pub fn reflector_reaches_structure(
    query: &OcclusionQuery<'_>,
    reflector: &Reflector,
    structure: &Structure,
) -> bool {
    with_endpoints(reflector.entity, structure.entity, |ignore| {
        query.has_line_of_sight_ignoring(reflector.position, structure.position, ignore)
    })
}

/// Reflectors that both see a light and reach `structure`.
pub fn feeding_reflectors<'r>(
    query: OcclusionQuery<'r>,
    reflectors: &'r [Reflector],
    structure: &'r Structure,
) -> impl Iterator<Item = &'r Reflector> + 'r {
    reflectors.iter().filter(move |r| {
        reflector_sees_light(&query, r) && reflector_reaches_structure(&query, r, structure)
    })
}

/// Whether any reflector feeds light to `structure`.
pub fn structure_receives_light(
    query: &OcclusionQuery<'_>,
    reflectors: &[Reflector],
    structure: &Structure,
) -> bool {
    feeding_reflectors(*query, reflectors, structure)
        .next()
        .is_some()
}
