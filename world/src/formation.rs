use std::time::Duration;

use shmup_core::{
    Bounds, EnemyId, FormationView, GridEnemySnapshot, HorizontalDirection, Reward, Vec2,
};

use crate::config::FormationLayout;

#[derive(Clone, Debug)]
pub(crate) struct GridEnemy {
    pub(crate) id: EnemyId,
    pub(crate) position: Vec2,
    animation: String,
    pub(crate) reward: Reward,
    min_x: f32,
    max_x: f32,
    max_y: f32,
}

impl GridEnemy {
    fn snapshot(&self) -> GridEnemySnapshot {
        GridEnemySnapshot {
            id: self.id,
            position: self.position,
            animation: self.animation.clone(),
            reward: self.reward,
            min_x: self.min_x,
            max_x: self.max_x,
            max_y: self.max_y,
        }
    }
}

/// Grid of enemies sharing one direction and one pair of cadence clocks.
#[derive(Clone, Debug)]
pub(crate) struct Formation {
    members: Vec<GridEnemy>,
    direction: HorizontalDirection,
    initial_count: usize,
    level: u32,
    layout: FormationLayout,
}

impl Formation {
    pub(crate) fn empty(layout: &FormationLayout) -> Self {
        Self {
            members: Vec::new(),
            direction: HorizontalDirection::Right,
            initial_count: 0,
            level: 1,
            layout: layout.clone(),
        }
    }

    pub(crate) fn build(layout: &FormationLayout, bounds: &Bounds, level: u32) -> Self {
        let min_x = bounds.min().x + layout.side_margin;
        let max_x = bounds.max().x - layout.side_margin;
        let max_y = bounds.max().y - layout.breach_margin;
        let origin = bounds.min() + layout.origin;

        let mut members = Vec::new();
        let mut next_id = 0;
        for (row, tier) in layout.rows.iter().enumerate() {
            for column in 0..layout.columns {
                members.push(GridEnemy {
                    id: EnemyId::new(next_id),
                    position: origin
                        + Vec2::new(column as f32 * layout.gap.x, row as f32 * layout.gap.y),
                    animation: tier.animation.clone(),
                    reward: tier.reward(),
                    min_x,
                    max_x,
                    max_y,
                });
                next_id += 1;
            }
        }

        Self {
            initial_count: members.len(),
            members,
            direction: HorizontalDirection::Right,
            level: level.max(1),
            layout: layout.clone(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&GridEnemy> {
        self.members.iter().find(|member| member.id == id)
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<GridEnemy> {
        let index = self.members.iter().position(|member| member.id == id)?;
        Some(self.members.remove(index))
    }

    /// Flips direction, drops one row and pulls the grid back inside its
    /// horizontal bounds. Returns the new direction.
    pub(crate) fn descend(&mut self) -> HorizontalDirection {
        self.direction = self.direction.flipped();
        let drop = self.layout.gap.y;
        for member in &mut self.members {
            member.position.y += drop;
        }

        let mut nudge = 0.0_f32;
        for member in &self.members {
            if member.position.x < member.min_x {
                nudge = nudge.max(member.min_x - member.position.x);
            } else if member.position.x > member.max_x {
                nudge = nudge.min(member.max_x - member.position.x);
            }
        }
        if nudge != 0.0 {
            for member in &mut self.members {
                member.position.x += nudge;
            }
        }
        self.direction
    }

    /// Moves every member one step in the current direction.
    pub(crate) fn shift(&mut self) -> HorizontalDirection {
        let dx = self.layout.step * self.direction.sign();
        for member in &mut self.members {
            member.position.x += dx;
        }
        self.direction
    }

    pub(crate) fn breached(&self) -> bool {
        self.members
            .iter()
            .any(|member| member.position.y > member.max_y)
    }

    pub(crate) fn move_cadence(&self) -> Duration {
        self.cadence(self.layout.base_move_ms, self.layout.min_move_ms)
    }

    pub(crate) fn shoot_cadence(&self) -> Duration {
        self.cadence(self.layout.base_shoot_ms, self.layout.min_shoot_ms)
    }

    fn cadence(&self, base_ms: u64, floor_ms: u64) -> Duration {
        let killed = self.initial_count.saturating_sub(self.members.len()) as u64;
        let levels_past_first = u64::from(self.level.saturating_sub(1));
        let speedup = killed
            .saturating_mul(self.layout.per_kill_speedup_ms)
            .saturating_add(levels_past_first.saturating_mul(self.layout.level_speedup_ms));
        Duration::from_millis(base_ms.saturating_sub(speedup).max(floor_ms))
    }

    pub(crate) fn view(&self) -> FormationView {
        FormationView::new(
            self.direction,
            self.members.iter().map(GridEnemy::snapshot).collect(),
            self.move_cadence(),
            self.shoot_cadence(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RowTier;

    fn layout(rows: usize, columns: u32) -> FormationLayout {
        FormationLayout {
            rows: vec![
                RowTier {
                    animation: "grunt".to_owned(),
                    score: 10,
                    money: 1,
                };
                rows
            ],
            columns,
            origin: Vec2::new(20.0, 20.0),
            gap: Vec2::new(30.0, 25.0),
            step: 10.0,
            side_margin: 10.0,
            breach_margin: 50.0,
            ..FormationLayout::default()
        }
    }

    #[test]
    fn build_lays_members_out_in_row_major_order() {
        let formation = Formation::build(&layout(2, 3), &Bounds::from_size(200.0, 200.0), 1);
        let view = formation.view();
        assert_eq!(view.len(), 6);
        let fourth = view.nth(3).expect("member");
        assert_eq!(fourth.id, EnemyId::new(3));
        assert_eq!(fourth.position, Vec2::new(20.0, 45.0));
        assert_eq!(fourth.min_x, 10.0);
        assert_eq!(fourth.max_x, 190.0);
        assert_eq!(fourth.max_y, 150.0);
    }

    #[test]
    fn descent_drops_every_member_once_and_nudges_back_inside() {
        let mut formation = Formation::build(&layout(1, 2), &Bounds::from_size(100.0, 200.0), 1);
        // 20 and 50, step 10: the right member passes 90 after five shifts.
        for _ in 0..5 {
            let _ = formation.shift();
        }
        assert!(formation.view().any_out_of_horizontal_bounds());

        assert_eq!(formation.descend(), HorizontalDirection::Left);
        let view = formation.view();
        assert!(!view.any_out_of_horizontal_bounds());
        let positions: Vec<Vec2> = view.iter().map(|member| member.position).collect();
        assert_eq!(positions, vec![Vec2::new(60.0, 45.0), Vec2::new(90.0, 45.0)]);
    }

    #[test]
    fn cadence_tightens_with_kills_and_levels_but_respects_floor() {
        let mut layout = layout(1, 4);
        layout.base_move_ms = 500;
        layout.per_kill_speedup_ms = 100;
        layout.level_speedup_ms = 50;
        layout.min_move_ms = 150;
        let bounds = Bounds::from_size(400.0, 400.0);

        let mut formation = Formation::build(&layout, &bounds, 1);
        assert_eq!(formation.move_cadence(), Duration::from_millis(500));
        let _ = formation.remove(EnemyId::new(0));
        assert_eq!(formation.move_cadence(), Duration::from_millis(400));
        for id in 1..4 {
            let _ = formation.remove(EnemyId::new(id));
        }
        assert_eq!(formation.move_cadence(), Duration::from_millis(150));

        let third_level = Formation::build(&layout, &bounds, 3);
        assert_eq!(third_level.move_cadence(), Duration::from_millis(400));
    }

    #[test]
    fn breach_requires_passing_the_bottom_bound() {
        let mut formation = Formation::build(&layout(1, 1), &Bounds::from_size(100.0, 100.0), 1);
        // y starts at 20 with max_y 50: 45 is safe, 70 breaches.
        let _ = formation.descend();
        assert!(!formation.breached());
        let _ = formation.descend();
        assert!(formation.breached());
    }
}
