//! Built-in object kinds.
//!
//! | Kind tag | Type |
//! |----------|------|
//! | `Generic` (and unknown tags) | [`BaseObject`] |
//! | `Actor`, `Vehicle`, `Player` | [`Actor`] |
//! | `Leader` | [`Leader`] |
//! | `Dummy` | [`DummyObject`] |

mod actor;
mod base;
mod dummy;
mod leader;

pub use actor::Actor;
pub use base::BaseObject;
pub use dummy::DummyObject;
pub use leader::Leader;

use vigil_core::{GroupId, ObjectKind};
use vigil_registry::{AiObject, ObjectCore};
use vigil_stream::{Serializer, StreamError};

vigil_registry::impl_object_type!(Actor, BaseObject, DummyObject, Leader);

/// A blank object of the type that handles `kind`.
pub fn construct(kind: ObjectKind, name: &str) -> Box<dyn AiObject> {
    match kind {
        ObjectKind::Generic => Box::new(BaseObject::new(name)),
        ObjectKind::Actor | ObjectKind::Vehicle | ObjectKind::Player => {
            Box::new(Actor::new(kind, name))
        }
        ObjectKind::Leader => Box::new(Leader::new(name)),
        ObjectKind::Dummy => Box::new(DummyObject::new(name)),
    }
}

/// Give an unnamed object a name built from its kind and id.
pub(crate) fn name_if_unnamed(core: &mut ObjectCore) {
    if core.name.is_empty() {
        core.name = format!("{}{}", core.kind.name(), core.id());
    }
}

/// Group of an actor or leader.
pub(crate) fn group_of(object: &dyn AiObject) -> Option<GroupId> {
    if let Some(actor) = object.as_any().downcast_ref::<Actor>() {
        return actor.group();
    }
    object.as_any().downcast_ref::<Leader>()?.group()
}

/// Set the group of an actor or leader. Returns `false` for other kinds.
pub(crate) fn assign_group(object: &mut dyn AiObject, group: Option<GroupId>) -> bool {
    if let Some(actor) = object.as_any_mut().downcast_mut::<Actor>() {
        actor.set_group(group);
        return true;
    }
    if let Some(leader) = object.as_any_mut().downcast_mut::<Leader>() {
        leader.set_group(group);
        return true;
    }
    false
}

fn serialize_group(ser: &mut Serializer<'_>, group: &mut Option<GroupId>) -> Result<(), StreamError> {
    let mut in_group = group.is_some();
    ser.value("inGroup", &mut in_group)?;
    if in_group {
        let mut id = group.unwrap_or_default();
        ser.value("group", &mut id)?;
        *group = Some(id);
    } else {
        *group = None;
    }
    Ok(())
}
