//! Benchmark profiles for the Vigil object lifetime layer.
//!
//! - [`reference_world`]: 1K objects spread over groups and factions
//! - [`stress_world`]: 10K objects with the same mix
//! - [`populate`]: fill an existing manager with the benchmark mix

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use vigil_core::{FactionId, GroupId, ObjectId, ObjectKind};
use vigil_manager::{CreateParams, ManagerConfig, ManagerError, ObjectManager};

/// Groups the benchmark mix spreads actors over.
pub const GROUPS: u32 = 16;

/// Factions the benchmark mix spreads objects over.
pub const FACTIONS: u32 = 4;

/// Build a manager with 1K objects and headroom for churn.
pub fn reference_world() -> Result<ObjectManager, ManagerError> {
    world(1_000)
}

/// Build a manager with 10K objects and headroom for churn.
pub fn stress_world() -> Result<ObjectManager, ManagerError> {
    world(10_000)
}

fn world(count: u32) -> Result<ObjectManager, ManagerError> {
    let mut mgr = ObjectManager::new(&ManagerConfig::new(count * 2))?;
    populate(&mut mgr, count)?;
    Ok(mgr)
}

/// Create `count` objects: one leader per group, the rest mostly grouped
/// actors with a few dummies and generic objects. Every fourth actor watches its
/// group's leader. Returns the ids in creation order.
///
/// Deterministic: the same `count` always yields the same layout.
pub fn populate(mgr: &mut ObjectManager, count: u32) -> Result<Vec<ObjectId>, ManagerError> {
    let mut ids = Vec::with_capacity(count as usize);
    let mut leaders = Vec::new();
    for i in 0..count {
        let group = GroupId(i % GROUPS);
        let faction = FactionId((i % FACTIONS) as u8);
        let kind = if i < GROUPS {
            ObjectKind::Leader
        } else {
            match i % 10 {
                0 => ObjectKind::Dummy,
                1 => ObjectKind::Generic,
                2 => ObjectKind::Vehicle,
                _ => ObjectKind::Actor,
            }
        };
        let mut params = CreateParams::new(kind)
            .in_faction(faction)
            .at([i as f32, 0.0, 0.0]);
        if matches!(kind, ObjectKind::Leader | ObjectKind::Actor | ObjectKind::Vehicle) {
            params = params.in_group(group);
        }
        let id = mgr.create_object(params, &())?.id();
        if kind == ObjectKind::Leader {
            leaders.push(id);
        } else if kind == ObjectKind::Actor && i % 4 == 0 {
            mgr.track_target(id, Some(leaders[(i % GROUPS) as usize]))?;
        }
        ids.push(id);
    }
    Ok(ids)
}
