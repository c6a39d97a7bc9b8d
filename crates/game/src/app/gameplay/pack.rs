use engine::{Combatant, EntityCategory, EntityId, EntitySpec, SceneWorld, Vec2};
use tracing::info;

use super::events::{GameplayEvent, GameplayEventBus};
use crate::app::tuning::PackTuning;

pub(crate) const PACK_SIZE: usize = 4;

/// Four wolves anchored to a den. Once any member drops below its baseline the
/// whole pack stays enraged until the player dies.
#[derive(Debug, Clone)]
pub(crate) struct WolfPack {
    den_id: EntityId,
    members: [EntityId; PACK_SIZE],
    baselines: [u32; PACK_SIZE],
    protect_mode: bool,
}

impl WolfPack {
    pub(crate) fn spawn(world: &mut SceneWorld, den_position: Vec2, tuning: &PackTuning) -> Self {
        let den_id = world.spawn(
            EntitySpec::new(
                EntityCategory::Decoration,
                den_position,
                tuning.den_size,
                "wolf_den",
            )
            .with_collider(None),
        );
        let members = tuning.member_offsets.map(|offset| {
            world.spawn(
                EntitySpec::new(
                    EntityCategory::Enemy,
                    den_position + offset,
                    tuning.wolf_size,
                    "wolf",
                )
                .with_collider(Some(tuning.wolf_padding))
                .with_combatant(Combatant::new(
                    tuning.wolf_max_hit_points,
                    tuning.wolf_contact_damage,
                )),
            )
        });
        info!(den_id = den_id.0, "wolf_pack_spawned");
        Self {
            den_id,
            members,
            baselines: [tuning.wolf_max_hit_points; PACK_SIZE],
            protect_mode: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn den_id(&self) -> EntityId {
        self.den_id
    }

    #[cfg(test)]
    pub(crate) fn members(&self) -> &[EntityId; PACK_SIZE] {
        &self.members
    }

    #[cfg(test)]
    pub(crate) fn baselines(&self) -> &[u32; PACK_SIZE] {
        &self.baselines
    }

    pub(crate) fn protect_mode(&self) -> bool {
        self.protect_mode
    }

    pub(crate) fn update(
        &mut self,
        world: &mut SceneWorld,
        player_is_dead: bool,
        events: &mut GameplayEventBus,
    ) {
        if world.is_removed(self.den_id) {
            for member in self.members {
                world.mark_removed(member);
            }
            return;
        }

        if !self.protect_mode {
            let provoked = self
                .members
                .iter()
                .zip(self.baselines.iter())
                .any(|(member, baseline)| {
                    member_hit_points(world, *member).is_some_and(|current| current < *baseline)
                });
            if provoked {
                self.protect_mode = true;
                events.emit(GameplayEvent::PackProtectEngaged);
                info!(den_id = self.den_id.0, "pack_protect_engaged");
            }
        }

        if player_is_dead {
            let was_protecting = self.protect_mode;
            self.protect_mode = false;
            for (member, baseline) in self.members.iter().zip(self.baselines.iter_mut()) {
                let Some(combatant) = live_combatant_mut(world, *member) else {
                    continue;
                };
                combatant.enraged = false;
                *baseline = combatant.health.current;
            }
            if was_protecting {
                events.emit(GameplayEvent::PackReset);
                info!(den_id = self.den_id.0, "pack_reset");
            }
        } else if self.protect_mode {
            for member in self.members {
                if let Some(combatant) = live_combatant_mut(world, member) {
                    combatant.enraged = true;
                }
            }
        }
    }
}

/// Read-only: a member killed earlier this frame stays visible until compaction.
fn member_hit_points(world: &SceneWorld, id: EntityId) -> Option<u32> {
    world
        .find_entity(id)
        .and_then(|entity| entity.combatant)
        .map(|combatant| combatant.health.current)
}

fn live_combatant_mut(world: &mut SceneWorld, id: EntityId) -> Option<&mut Combatant> {
    world
        .find_entity_mut(id)
        .filter(|entity| entity.is_alive())
        .and_then(|entity| entity.combatant.as_mut())
}

#[cfg(test)]
mod tests {
    use super::super::actions::damage_enemy;
    use super::*;

    fn spawned_pack() -> (SceneWorld, WolfPack) {
        let mut world = SceneWorld::default();
        let pack = WolfPack::spawn(&mut world, Vec2::new(300.0, 300.0), &PackTuning::default());
        world.apply_pending();
        (world, pack)
    }

    fn damage(world: &mut SceneWorld, id: EntityId, amount: u32) {
        let combatant = world
            .find_entity_mut(id)
            .and_then(|entity| entity.combatant.as_mut())
            .expect("member");
        combatant.health.apply_damage(amount);
    }

    fn enraged(world: &SceneWorld, id: EntityId) -> bool {
        world
            .find_entity(id)
            .and_then(|entity| entity.combatant)
            .is_some_and(|combatant| combatant.enraged)
    }

    #[test]
    fn members_spawn_at_den_offsets() {
        let (world, pack) = spawned_pack();
        let positions: Vec<Vec2> = pack
            .members()
            .iter()
            .map(|id| world.find_entity(*id).expect("member").transform.position)
            .collect();
        assert_eq!(
            positions,
            vec![
                Vec2::new(300.0, 300.0),
                Vec2::new(428.0, 300.0),
                Vec2::new(300.0, 428.0),
                Vec2::new(428.0, 428.0),
            ]
        );
        assert_eq!(pack.baselines(), &[90; PACK_SIZE]);
    }

    #[test]
    fn protect_mode_is_sticky_until_player_death() {
        let (mut world, mut pack) = spawned_pack();
        let mut events = GameplayEventBus::default();
        let members = *pack.members();

        pack.update(&mut world, false, &mut events);
        assert!(!pack.protect_mode());

        damage(&mut world, members[1], 20);
        pack.update(&mut world, false, &mut events);
        assert!(pack.protect_mode());
        assert!(members.iter().all(|id| enraged(&world, *id)));

        let healed = world
            .find_entity_mut(members[1])
            .and_then(|entity| entity.combatant.as_mut())
            .expect("member");
        healed.health.heal(20);
        pack.update(&mut world, false, &mut events);
        assert!(pack.protect_mode());

        damage(&mut world, members[2], 30);
        pack.update(&mut world, true, &mut events);
        assert!(!pack.protect_mode());
        assert!(members.iter().all(|id| !enraged(&world, *id)));
        assert_eq!(pack.baselines(), &[90, 90, 60, 90]);

        pack.update(&mut world, false, &mut events);
        assert!(!pack.protect_mode());

        events.finish_tick_rollover();
        let counts = events.last_tick_counts();
        assert_eq!(counts.pack_protect_engaged, 1);
        assert_eq!(counts.pack_reset, 1);
    }

    #[test]
    fn missing_members_are_skipped() {
        let (mut world, mut pack) = spawned_pack();
        let mut events = GameplayEventBus::default();
        let members = *pack.members();
        world.mark_removed(members[0]);
        world.apply_pending();

        damage(&mut world, members[3], 5);
        pack.update(&mut world, false, &mut events);
        assert!(pack.protect_mode());
        assert!(enraged(&world, members[3]));

        pack.update(&mut world, true, &mut events);
        assert_eq!(pack.baselines(), &[90, 90, 90, 85]);
    }

    #[test]
    fn killing_blow_below_baseline_engages_protect_mode() {
        let (mut world, mut pack) = spawned_pack();
        let mut events = GameplayEventBus::default();
        let members = *pack.members();
        damage(&mut world, members[0], 80);
        pack.update(&mut world, false, &mut events);
        pack.update(&mut world, true, &mut events);
        assert!(!pack.protect_mode());
        assert_eq!(pack.baselines(), &[10, 90, 90, 90]);

        assert!(damage_enemy(&mut world, members[0], 14, &mut events));
        assert!(world.is_removed(members[0]));
        pack.update(&mut world, false, &mut events);

        assert!(pack.protect_mode());
        assert!(members[1..].iter().all(|id| enraged(&world, *id)));
        world.apply_pending();
        assert!(world.find_entity(members[0]).is_none());
        assert!(members[1..].iter().all(|id| enraged(&world, *id)));
    }

    #[test]
    fn removing_the_den_removes_every_member() {
        let (mut world, mut pack) = spawned_pack();
        let mut events = GameplayEventBus::default();
        world.mark_removed(pack.den_id());

        pack.update(&mut world, false, &mut events);
        world.apply_pending();

        assert_eq!(world.entity_count(), 0);
    }
}
