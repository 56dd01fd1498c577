//! Strongly-typed identifiers for export slots, physics objects and
//! observable entity kinds.

use std::fmt;

// ── ExportId ────────────────────────────────────────────────────

/// Identifies one exported per-world buffer.
///
/// The discriminant is the buffer's slot number in the export registry.
/// Slot order is fixed and mirrored by the device kernel's binding
/// table, so variants must never be reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ExportId {
    /// Per-world reset request flag.
    Reset = 0,
    /// Per-agent discrete action.
    Action,
    /// Per-agent scalar reward.
    Reward,
    /// Per-agent episode-finished flag.
    Done,
    /// Per-agent self observation.
    SelfObservation,
    /// Per-agent identifier.
    AgentId,
    /// Per-agent observations of the other agents.
    PartnerObservations,
    /// Per-agent observations of entities in the current room.
    RoomEntityObservations,
    /// Per-agent observation of the current room's exit door.
    DoorObservation,
    /// Per-agent lidar sweep.
    Lidar,
    /// Per-agent steps remaining in the episode.
    StepsRemaining,
    /// Per-world checkpoint blob.
    Checkpoint,
    /// Per-world load-checkpoint request flag.
    CheckpointReset,
    /// Per-world save-checkpoint request flag.
    CheckpointSave,
}

impl ExportId {
    /// Number of export slots.
    pub const COUNT: usize = 14;

    /// Every export slot in slot order.
    pub const ALL: [ExportId; Self::COUNT] = [
        ExportId::Reset,
        ExportId::Action,
        ExportId::Reward,
        ExportId::Done,
        ExportId::SelfObservation,
        ExportId::AgentId,
        ExportId::PartnerObservations,
        ExportId::RoomEntityObservations,
        ExportId::DoorObservation,
        ExportId::Lidar,
        ExportId::StepsRemaining,
        ExportId::Checkpoint,
        ExportId::CheckpointReset,
        ExportId::CheckpointSave,
    ];

    /// Slot number of this export.
    pub fn slot(self) -> u32 {
        self as u32
    }

    /// Look up an export by slot number.
    pub fn from_slot(slot: u32) -> Option<Self> {
        Self::ALL.get(slot as usize).copied()
    }

    /// Stable tensor name used by training interfaces.
    pub fn name(self) -> &'static str {
        match self {
            ExportId::Reset => "reset",
            ExportId::Action => "action",
            ExportId::Reward => "reward",
            ExportId::Done => "done",
            ExportId::SelfObservation => "self",
            ExportId::AgentId => "agentID",
            ExportId::PartnerObservations => "partners",
            ExportId::RoomEntityObservations => "roomEntities",
            ExportId::DoorObservation => "door",
            ExportId::Lidar => "lidar",
            ExportId::StepsRemaining => "stepsRemaining",
            ExportId::Checkpoint => "checkpoint",
            ExportId::CheckpointReset => "checkpointReset",
            ExportId::CheckpointSave => "checkpointSave",
        }
    }
}

impl fmt::Display for ExportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── SimObject ───────────────────────────────────────────────────

/// Physics object kinds registered with the asset loader.
///
/// The discriminant is the object's index in the object catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum SimObject {
    /// Pushable cube.
    Cube = 0,
    /// Static wall segment.
    Wall,
    /// Room exit door.
    Door,
    /// Controllable agent.
    Agent,
    /// Floor button.
    Button,
    /// Door key.
    Key,
    /// Infinite ground plane.
    Plane,
}

impl SimObject {
    /// Number of registered object kinds.
    pub const COUNT: usize = 7;

    /// Every object kind in catalog order.
    pub const ALL: [SimObject; Self::COUNT] = [
        SimObject::Cube,
        SimObject::Wall,
        SimObject::Door,
        SimObject::Agent,
        SimObject::Button,
        SimObject::Key,
        SimObject::Plane,
    ];

    /// Catalog index of this object kind.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SimObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── EntityType ──────────────────────────────────────────────────

/// Entity kinds as they appear in observations and lidar hits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum EntityType {
    /// Empty slot or no hit.
    #[default]
    None = 0,
    /// Floor button.
    Button,
    /// Pushable cube.
    Cube,
    /// Wall segment.
    Wall,
    /// Agent.
    Agent,
    /// Closed door.
    Door,
    /// Door key.
    Key,
}

impl EntityType {
    /// Number of entity kinds, including `None`.
    pub const COUNT: usize = 7;

    /// Decode a raw discriminant, mapping unknown values to `None`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => EntityType::Button,
            2 => EntityType::Cube,
            3 => EntityType::Wall,
            4 => EntityType::Agent,
            5 => EntityType::Door,
            6 => EntityType::Key,
            _ => EntityType::None,
        }
    }

    /// Raw discriminant as stored in state records.
    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Observation encoding: the discriminant scaled into `[0, 1)`.
    pub fn encode(self) -> f32 {
        self as i32 as f32 / Self::COUNT as f32
    }
}
