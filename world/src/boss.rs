use shmup_core::{BossId, BossKind, BossSnapshot, BossState, BossView, Reward, Vec2};

use crate::config::BossRosterConfig;

/// Result of applying one hit to a boss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HitOutcome {
    /// The boss was already dead; nothing changed.
    Ignored,
    /// The boss survived with the remaining hp.
    Wounded(i32),
    /// The hit was lethal.
    Died,
}

#[derive(Clone, Debug)]
pub(crate) struct Boss {
    pub(crate) id: BossId,
    pub(crate) kind: BossKind,
    pub(crate) position: Vec2,
    hp: i32,
    max_hp: i32,
    rage_hp: i32,
    is_dead: bool,
    pub(crate) is_clone: bool,
    pub(crate) state: Option<BossState>,
    pub(crate) reward: Reward,
}

impl Boss {
    pub(crate) const fn hp(&self) -> i32 {
        self.hp
    }

    pub(crate) const fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Applies one hit. Death is latched: later hits are ignored.
    pub(crate) fn hit(&mut self, lethal_hp: i32) -> HitOutcome {
        if self.is_dead {
            return HitOutcome::Ignored;
        }
        self.hp -= 1;
        if self.hp <= lethal_hp {
            self.is_dead = true;
            HitOutcome::Died
        } else {
            HitOutcome::Wounded(self.hp)
        }
    }

    fn snapshot(&self) -> BossSnapshot {
        BossSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            hp: self.hp,
            max_hp: self.max_hp,
            rage_hp: self.rage_hp,
            is_dead: self.is_dead,
            is_clone: self.is_clone,
            state: self.state,
        }
    }
}

/// Bosses currently in play, clones included.
#[derive(Clone, Debug, Default)]
pub(crate) struct BossRoster {
    bosses: Vec<Boss>,
    next_id: u32,
}

impl BossRoster {
    pub(crate) fn spawn(
        &mut self,
        kind: BossKind,
        position: Vec2,
        config: &BossRosterConfig,
    ) -> &Boss {
        let stats = config.stats(kind);
        self.insert(kind, position, stats.hp, stats.reward(), false)
    }

    /// Spawns a weakened copy of the source. Clones never exceed the source's
    /// current hp and always survive at least one hit.
    pub(crate) fn spawn_clone(&mut self, source: BossId, config: &BossRosterConfig) -> Option<&Boss> {
        let source = self.get(source).filter(|boss| boss.is_alive() && !boss.is_clone)?;
        let kind = source.kind;
        let position = source.position;
        let scaled = (source.max_hp as f32 * config.clone_ratio).ceil() as i32;
        let hp = scaled.min(source.hp).max(config.lethal_hp + 1);
        let reward = Reward {
            score: (source.reward.score as f32 * config.clone_ratio) as u32,
            money: (source.reward.money as f32 * config.clone_ratio) as u32,
        };
        Some(self.insert(kind, position, hp, reward, true))
    }

    fn insert(
        &mut self,
        kind: BossKind,
        position: Vec2,
        hp: i32,
        reward: Reward,
        is_clone: bool,
    ) -> &Boss {
        let id = BossId::new(self.next_id);
        self.next_id += 1;
        self.bosses.push(Boss {
            id,
            kind,
            position,
            hp,
            max_hp: hp,
            rage_hp: hp / 2,
            is_dead: false,
            is_clone,
            state: None,
            reward,
        });
        &self.bosses[self.bosses.len() - 1]
    }

    pub(crate) fn get(&self, id: BossId) -> Option<&Boss> {
        self.bosses.iter().find(|boss| boss.id == id)
    }

    /// Living boss with the identifier; dead bosses accept no mutation.
    pub(crate) fn living_mut(&mut self, id: BossId) -> Option<&mut Boss> {
        self.bosses
            .iter_mut()
            .find(|boss| boss.id == id && boss.is_alive())
    }

    pub(crate) fn get_mut(&mut self, id: BossId) -> Option<&mut Boss> {
        self.bosses.iter_mut().find(|boss| boss.id == id)
    }

    pub(crate) fn living_count(&self) -> usize {
        self.bosses.iter().filter(|boss| boss.is_alive()).count()
    }

    /// Removes bosses whose death was confirmed on an earlier tick.
    pub(crate) fn prune_dead(&mut self) -> usize {
        let before = self.bosses.len();
        self.bosses.retain(Boss::is_alive);
        before - self.bosses.len()
    }

    pub(crate) fn view(&self) -> BossView {
        BossView::from_snapshots(self.bosses.iter().map(Boss::snapshot).collect())
    }
}
