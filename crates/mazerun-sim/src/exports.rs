//! The export table: one typed buffer per slot, world-major.

use mazerun_core::consts::NUM_AGENTS;
use mazerun_core::layout::{
    Action, AgentId, CheckpointReset, CheckpointSave, DoorObservation, Done, Lidar,
    PartnerObservations, Reward, RoomEntityObservations, SelfObservation, StepsRemaining,
    WorldReset,
};
use mazerun_core::{Checkpoint, ExportId};
use mazerun_exec::ExportTable;
use std::mem::size_of;

/// Every exported buffer for a batch of worlds.
///
/// Per-world slots hold one record per world; per-agent slots hold
/// `NUM_AGENTS` consecutive records per world.
#[derive(Clone, Debug, Default)]
pub struct SimExports {
    /// [`ExportId::Reset`].
    pub reset: Vec<WorldReset>,
    /// [`ExportId::Action`].
    pub action: Vec<Action>,
    /// [`ExportId::Reward`].
    pub reward: Vec<Reward>,
    /// [`ExportId::Done`].
    pub done: Vec<Done>,
    /// [`ExportId::SelfObservation`].
    pub self_obs: Vec<SelfObservation>,
    /// [`ExportId::AgentId`].
    pub agent_id: Vec<AgentId>,
    /// [`ExportId::PartnerObservations`].
    pub partners: Vec<PartnerObservations>,
    /// [`ExportId::RoomEntityObservations`].
    pub room_entities: Vec<RoomEntityObservations>,
    /// [`ExportId::DoorObservation`].
    pub door: Vec<DoorObservation>,
    /// [`ExportId::Lidar`].
    pub lidar: Vec<Lidar>,
    /// [`ExportId::StepsRemaining`].
    pub steps_remaining: Vec<StepsRemaining>,
    /// [`ExportId::Checkpoint`].
    pub checkpoint: Vec<Checkpoint>,
    /// [`ExportId::CheckpointReset`].
    pub checkpoint_reset: Vec<CheckpointReset>,
    /// [`ExportId::CheckpointSave`].
    pub checkpoint_save: Vec<CheckpointSave>,
}

/// One world's disjoint view of every slot.
#[derive(Debug)]
pub struct WorldExports<'a> {
    /// Reset request.
    pub reset: &'a mut WorldReset,
    /// Actions, one per agent.
    pub actions: &'a mut [Action],
    /// Rewards, one per agent.
    pub rewards: &'a mut [Reward],
    /// Done flags, one per agent.
    pub dones: &'a mut [Done],
    /// Self observations, one per agent.
    pub self_obs: &'a mut [SelfObservation],
    /// Agent ids, one per agent.
    pub agent_ids: &'a mut [AgentId],
    /// Partner observations, one per agent.
    pub partners: &'a mut [PartnerObservations],
    /// Room entity observations, one per agent.
    pub room_entities: &'a mut [RoomEntityObservations],
    /// Door observations, one per agent.
    pub doors: &'a mut [DoorObservation],
    /// Lidar sweeps, one per agent.
    pub lidar: &'a mut [Lidar],
    /// Steps remaining, one per agent.
    pub steps_remaining: &'a mut [StepsRemaining],
    /// Checkpoint blob.
    pub checkpoint: &'a mut Checkpoint,
    /// Load-checkpoint request.
    pub checkpoint_reset: &'a mut CheckpointReset,
    /// Save-checkpoint request.
    pub checkpoint_save: &'a mut CheckpointSave,
}

impl SimExports {
    /// Bytes per world of each slot, in slot order.
    pub fn bytes_per_world() -> [u64; ExportId::COUNT] {
        let agents = NUM_AGENTS;
        ExportId::ALL.map(|id| {
            let bytes = match id {
                ExportId::Reset => size_of::<WorldReset>(),
                ExportId::Action => agents * size_of::<Action>(),
                ExportId::Reward => agents * size_of::<Reward>(),
                ExportId::Done => agents * size_of::<Done>(),
                ExportId::SelfObservation => agents * size_of::<SelfObservation>(),
                ExportId::AgentId => agents * size_of::<AgentId>(),
                ExportId::PartnerObservations => agents * size_of::<PartnerObservations>(),
                ExportId::RoomEntityObservations => {
                    agents * size_of::<RoomEntityObservations>()
                }
                ExportId::DoorObservation => agents * size_of::<DoorObservation>(),
                ExportId::Lidar => agents * size_of::<Lidar>(),
                ExportId::StepsRemaining => agents * size_of::<StepsRemaining>(),
                ExportId::Checkpoint => size_of::<Checkpoint>(),
                ExportId::CheckpointReset => size_of::<CheckpointReset>(),
                ExportId::CheckpointSave => size_of::<CheckpointSave>(),
            };
            bytes as u64
        })
    }
}

impl ExportTable for SimExports {
    type World<'a> = WorldExports<'a>;

    fn with_worlds(num_worlds: usize) -> Self {
        let per_agent = num_worlds * NUM_AGENTS;
        Self {
            reset: vec![WorldReset::default(); num_worlds],
            action: vec![Action::IDLE; per_agent],
            reward: vec![Reward::default(); per_agent],
            done: vec![Done::default(); per_agent],
            self_obs: vec![SelfObservation::default(); per_agent],
            agent_id: vec![AgentId::default(); per_agent],
            partners: vec![PartnerObservations::default(); per_agent],
            room_entities: vec![RoomEntityObservations::default(); per_agent],
            door: vec![DoorObservation::default(); per_agent],
            lidar: vec![Lidar::default(); per_agent],
            steps_remaining: vec![StepsRemaining::default(); per_agent],
            checkpoint: vec![Checkpoint::default(); num_worlds],
            checkpoint_reset: vec![CheckpointReset::default(); num_worlds],
            checkpoint_save: vec![CheckpointSave::default(); num_worlds],
        }
    }

    fn num_exports(&self) -> usize {
        ExportId::COUNT
    }

    fn exported(&self, slot: u32) -> &[u8] {
        use bytemuck::cast_slice as bytes;
        match ExportId::from_slot(slot) {
            Some(ExportId::Reset) => bytes(&self.reset),
            Some(ExportId::Action) => bytes(&self.action),
            Some(ExportId::Reward) => bytes(&self.reward),
            Some(ExportId::Done) => bytes(&self.done),
            Some(ExportId::SelfObservation) => bytes(&self.self_obs),
            Some(ExportId::AgentId) => bytes(&self.agent_id),
            Some(ExportId::PartnerObservations) => bytes(&self.partners),
            Some(ExportId::RoomEntityObservations) => bytes(&self.room_entities),
            Some(ExportId::DoorObservation) => bytes(&self.door),
            Some(ExportId::Lidar) => bytes(&self.lidar),
            Some(ExportId::StepsRemaining) => bytes(&self.steps_remaining),
            Some(ExportId::Checkpoint) => bytes(&self.checkpoint),
            Some(ExportId::CheckpointReset) => bytes(&self.checkpoint_reset),
            Some(ExportId::CheckpointSave) => bytes(&self.checkpoint_save),
            None => panic!("export slot {slot} is not registered"),
        }
    }

    fn exported_mut(&mut self, slot: u32) -> &mut [u8] {
        use bytemuck::cast_slice_mut as bytes;
        match ExportId::from_slot(slot) {
            Some(ExportId::Reset) => bytes(&mut self.reset),
            Some(ExportId::Action) => bytes(&mut self.action),
            Some(ExportId::Reward) => bytes(&mut self.reward),
            Some(ExportId::Done) => bytes(&mut self.done),
            Some(ExportId::SelfObservation) => bytes(&mut self.self_obs),
            Some(ExportId::AgentId) => bytes(&mut self.agent_id),
            Some(ExportId::PartnerObservations) => bytes(&mut self.partners),
            Some(ExportId::RoomEntityObservations) => bytes(&mut self.room_entities),
            Some(ExportId::DoorObservation) => bytes(&mut self.door),
            Some(ExportId::Lidar) => bytes(&mut self.lidar),
            Some(ExportId::StepsRemaining) => bytes(&mut self.steps_remaining),
            Some(ExportId::Checkpoint) => bytes(&mut self.checkpoint),
            Some(ExportId::CheckpointReset) => bytes(&mut self.checkpoint_reset),
            Some(ExportId::CheckpointSave) => bytes(&mut self.checkpoint_save),
            None => panic!("export slot {slot} is not registered"),
        }
    }

    fn split_worlds(&mut self) -> Vec<WorldExports<'_>> {
        let mut reset = self.reset.iter_mut();
        let mut actions = self.action.chunks_exact_mut(NUM_AGENTS);
        let mut rewards = self.reward.chunks_exact_mut(NUM_AGENTS);
        let mut dones = self.done.chunks_exact_mut(NUM_AGENTS);
        let mut self_obs = self.self_obs.chunks_exact_mut(NUM_AGENTS);
        let mut agent_ids = self.agent_id.chunks_exact_mut(NUM_AGENTS);
        let mut partners = self.partners.chunks_exact_mut(NUM_AGENTS);
        let mut room_entities = self.room_entities.chunks_exact_mut(NUM_AGENTS);
        let mut doors = self.door.chunks_exact_mut(NUM_AGENTS);
        let mut lidar = self.lidar.chunks_exact_mut(NUM_AGENTS);
        let mut steps_remaining = self.steps_remaining.chunks_exact_mut(NUM_AGENTS);
        let mut checkpoint = self.checkpoint.iter_mut();
        let mut checkpoint_reset = self.checkpoint_reset.iter_mut();
        let mut checkpoint_save = self.checkpoint_save.iter_mut();

        std::iter::from_fn(|| {
            Some(WorldExports {
                reset: reset.next()?,
                actions: actions.next()?,
                rewards: rewards.next()?,
                dones: dones.next()?,
                self_obs: self_obs.next()?,
                agent_ids: agent_ids.next()?,
                partners: partners.next()?,
                room_entities: room_entities.next()?,
                doors: doors.next()?,
                lidar: lidar.next()?,
                steps_remaining: steps_remaining.next()?,
                checkpoint: checkpoint.next()?,
                checkpoint_reset: checkpoint_reset.next()?,
                checkpoint_save: checkpoint_save.next()?,
            })
        })
        .collect()
    }
}
