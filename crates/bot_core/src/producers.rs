//! Ready producers and the claims made on them during one tick.

use crate::dispatch::SkipReason;
use crate::math::Vec2Fixed;
use crate::snapshot::GameStateSnapshot;
use crate::types::{UnitTag, UnitTypeId};

/// A ready unit or structure able to take orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerSlot {
    /// Producer tag.
    pub tag: UnitTag,
    /// Producer type.
    pub unit_type: UnitTypeId,
    /// Producer position.
    pub position: Vec2Fixed,
    /// Orders already queued.
    pub queue_len: u32,
    claimed: bool,
}

/// Producers built from a snapshot.
///
/// A producer is handed out at most once per tick. Workers building
/// structures are exempt from the queue depth limit since harvesting keeps
/// them permanently busy.
#[derive(Debug, Clone)]
pub struct ProducerPool {
    slots: Vec<ProducerSlot>,
    queue_depth_limit: u32,
}

impl ProducerPool {
    /// Collect every ready owned unit as a potential producer.
    #[must_use]
    pub fn from_snapshot(snapshot: &GameStateSnapshot, queue_depth_limit: u32) -> Self {
        let mut slots: Vec<ProducerSlot> = snapshot
            .units
            .iter()
            .filter(|u| u.is_ready())
            .map(|u| ProducerSlot {
                tag: u.tag,
                unit_type: u.unit_type,
                position: u.position,
                queue_len: u.queue_len,
                claimed: false,
            })
            .collect();
        slots.sort_by_key(|s| s.tag);
        Self {
            slots,
            queue_depth_limit,
        }
    }

    fn best_unclaimed(&self, types: &[UnitTypeId]) -> Option<&ProducerSlot> {
        self.slots
            .iter()
            .filter(|s| !s.claimed && types.contains(&s.unit_type))
            .min_by_key(|s| (s.queue_len, s.tag))
    }

    /// Pick the producer an order for `types` would use, without claiming.
    ///
    /// Prefers the shortest queue, then the lowest tag.
    pub fn select(&self, types: &[UnitTypeId]) -> Result<ProducerSlot, SkipReason> {
        let slot = self.best_unclaimed(types).ok_or(SkipReason::NoProducerAvailable)?;
        let exempt = slot.unit_type.is_worker();
        if !exempt && slot.queue_len >= self.queue_depth_limit {
            return Err(SkipReason::QueueFull);
        }
        Ok(*slot)
    }

    /// Whether an order for `types` would currently find a producer.
    #[must_use]
    pub fn has_free(&self, types: &[UnitTypeId]) -> bool {
        self.select(types).is_ok()
    }

    /// Reserve `tag` for the rest of the tick.
    pub fn claim(&mut self, tag: UnitTag) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.tag == tag) {
            slot.claimed = true;
            slot.queue_len += 1;
        }
    }

    /// Whether `tag` has been claimed this tick.
    #[must_use]
    pub fn is_claimed(&self, tag: UnitTag) -> bool {
        self.slots.iter().any(|s| s.tag == tag && s.claimed)
    }

    /// Iterate unclaimed producers of `unit_type`.
    pub fn unclaimed(&self, unit_type: UnitTypeId) -> impl Iterator<Item = &ProducerSlot> {
        self.slots
            .iter()
            .filter(move |s| !s.claimed && s.unit_type == unit_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::OwnedUnit;

    fn pool(units: Vec<OwnedUnit>, limit: u32) -> ProducerPool {
        let snapshot = GameStateSnapshot {
            units,
            ..GameStateSnapshot::default()
        };
        ProducerPool::from_snapshot(&snapshot, limit)
    }

    #[test]
    fn test_shortest_queue_then_lowest_tag() {
        let pool = pool(
            vec![
                OwnedUnit::new(UnitTag(5), UnitTypeId::Gateway, Vec2Fixed::ZERO).with_queue(1),
                OwnedUnit::new(UnitTag(9), UnitTypeId::Gateway, Vec2Fixed::ZERO),
                OwnedUnit::new(UnitTag(7), UnitTypeId::WarpGate, Vec2Fixed::ZERO),
            ],
            5,
        );

        let slot = pool.select(&[UnitTypeId::Gateway, UnitTypeId::WarpGate]).unwrap();
        assert_eq!(slot.tag, UnitTag(7));
    }

    #[test]
    fn test_claimed_producer_not_reused() {
        let mut pool = pool(vec![OwnedUnit::new(UnitTag(1), UnitTypeId::Nexus, Vec2Fixed::ZERO)], 1);

        let slot = pool.select(&[UnitTypeId::Nexus]).unwrap();
        pool.claim(slot.tag);
        assert!(pool.is_claimed(slot.tag));
        assert_eq!(pool.select(&[UnitTypeId::Nexus]), Err(SkipReason::NoProducerAvailable));
    }

    #[test]
    fn test_busy_producer_reports_queue_full() {
        let pool = pool(
            vec![OwnedUnit::new(UnitTag(1), UnitTypeId::RoboticsFacility, Vec2Fixed::ZERO).with_queue(1)],
            1,
        );
        assert_eq!(pool.select(&[UnitTypeId::RoboticsFacility]), Err(SkipReason::QueueFull));
    }

    #[test]
    fn test_unfinished_structures_do_not_produce() {
        let pool = pool(
            vec![OwnedUnit::new(UnitTag(1), UnitTypeId::Gateway, Vec2Fixed::ZERO).with_progress(50)],
            1,
        );
        assert_eq!(pool.select(&[UnitTypeId::Gateway]), Err(SkipReason::NoProducerAvailable));
    }

    #[test]
    fn test_workers_ignore_queue_limit() {
        let pool = pool(vec![OwnedUnit::new(UnitTag(3), UnitTypeId::Probe, Vec2Fixed::ZERO).with_queue(2)], 1);
        assert_eq!(pool.select(&[UnitTypeId::Probe]).unwrap().tag, UnitTag(3));
    }
}
