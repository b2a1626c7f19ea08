use std::any::Any;

use vigil_core::{GroupId, ObjectId, ObjectKind};
use vigil_registry::{AiObject, ObjectCore, StrongRef, WeakRef};
use vigil_stream::{Serializer, StreamError};

use super::DummyObject;

/// Leads a group and owns the formation points its members follow.
///
/// The formation points are owned through [`StrongRef`]s, so destroying
/// the leader deregisters them in the same flush.
#[derive(Debug)]
pub struct Leader {
    core: ObjectCore,
    group: Option<GroupId>,
    formation: Vec<StrongRef<DummyObject>>,
    /// Formation size to rebuild after a load.
    formation_size: u32,
}

impl Leader {
    /// An unregistered leader with no group and no formation.
    pub fn new(name: &str) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Leader, name),
            group: None,
            formation: Vec::new(),
            formation_size: 0,
        }
    }

    /// Group this leader leads.
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub(crate) fn set_group(&mut self, group: Option<GroupId>) {
        self.group = group;
    }

    /// Ids of the formation points, in slot order.
    pub fn formation(&self) -> Vec<ObjectId> {
        self.formation.iter().map(|p| p.id()).collect()
    }

    /// Weak references to the formation points.
    pub fn formation_points(&self) -> Vec<WeakRef<DummyObject>> {
        self.formation.iter().map(|p| p.weak()).collect()
    }

    /// Recorded formation size, when the points on hand no longer match
    /// it (after a load, or after a bookmark was read over a live leader).
    pub(crate) fn formation_to_rebuild(&self) -> Option<u32> {
        (self.formation.len() as u32 != self.formation_size).then_some(self.formation_size)
    }

    /// Replace the formation, releasing the old points.
    pub(crate) fn set_formation(&mut self, points: Vec<StrongRef<DummyObject>>) {
        self.formation_size = points.len() as u32;
        self.formation = points;
    }
}

impl AiObject for Leader {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), StreamError> {
        self.core.serialize(ser)?;
        ser.begin_group("Leader")?;
        super::serialize_group(ser, &mut self.group)?;
        ser.value("formationSize", &mut self.formation_size)?;
        ser.end_group()
    }

    fn on_registered(&mut self) {
        super::name_if_unnamed(&mut self.core);
    }
}
