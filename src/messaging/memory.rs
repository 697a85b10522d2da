//! In-process bus adapter.
//!
//! Topics are split into a fixed number of partitions; the partition is chosen
//! by hashing the record key. Within a group, each partition is served by a
//! single member, so per-key order is preserved.
//!
//! Records are not retained once handed to a member. Acks commit offsets
//! (see [`InMemoryBus::committed_offset`]) but nothing is replayed: records
//! still queued for a member that goes away are lost to its group, so this
//! adapter is at-most-once per group. Groups with no live member are pruned
//! on the next publish to their topic.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::messaging::bus::{Ack, BusError, Delivery, MessageBus, Subscription};

#[derive(Default)]
struct TopicState {
    next_offsets: Vec<u64>,
    groups: HashMap<String, Vec<mpsc::UnboundedSender<Delivery>>>,
}

struct BusInner {
    partitions: u32,
    topics: Mutex<HashMap<String, TopicState>>,
    /// (topic, group, partition) → next offset to consume.
    committed: DashMap<(String, String, u32), u64>,
    available: AtomicBool,
}

#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<BusInner>,
}

impl InMemoryBus {
    pub fn new(partitions: u32) -> Self {
        Self {
            inner: Arc::new(BusInner {
                partitions: partitions.max(1),
                topics: Mutex::new(HashMap::new()),
                committed: DashMap::new(),
                available: AtomicBool::new(true),
            }),
        }
    }

    /// Simulate a broker outage; publishes and subscribes fail while unavailable.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    pub fn partition_for(&self, key: &str) -> u32 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.inner.partitions as u64) as u32
    }

    /// Next offset the group will consume on a partition, if it committed any.
    pub fn committed_offset(&self, topic: &str, group: &str, partition: u32) -> Option<u64> {
        self.inner
            .committed
            .get(&(topic.to_string(), group.to_string(), partition))
            .map(|r| *r.value())
    }

    /// Total records committed by a group across partitions.
    pub fn committed_count(&self, topic: &str, group: &str) -> u64 {
        (0..self.inner.partitions)
            .filter_map(|p| self.committed_offset(topic, group, p))
            .sum()
    }

    fn check_available(&self) -> Result<(), BusError> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BusError::Unavailable("in-memory broker offline".to_string()))
        }
    }

    fn topics(&self) -> std::sync::MutexGuard<'_, HashMap<String, TopicState>> {
        self.inner.topics.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<Ack, BusError> {
        self.check_available()?;
        let partition = self.partition_for(key);

        let mut topics = self.topics();
        let state = topics.entry(topic.to_string()).or_default();
        if state.next_offsets.is_empty() {
            state.next_offsets = vec![0; self.inner.partitions as usize];
        }
        let offset = state.next_offsets[partition as usize];
        state.next_offsets[partition as usize] += 1;

        let delivery = Delivery {
            topic: topic.to_string(),
            partition,
            offset,
            key: key.to_string(),
            payload,
        };
        state.groups.retain(|group, members| {
            members.retain(|tx| !tx.is_closed());
            if members.is_empty() {
                tracing::debug!(%group, topic, "Pruning consumer group with no live members");
            }
            !members.is_empty()
        });
        for (group, members) in state.groups.iter() {
            let member = &members[partition as usize % members.len()];
            if member.send(delivery.clone()).is_err() {
                tracing::debug!(%group, topic, "Group member went away during publish");
            }
        }

        Ok(Ack {
            topic: topic.to_string(),
            partition,
            offset,
        })
    }

    async fn subscribe(&self, topic: &str, group: &str) -> Result<Box<dyn Subscription>, BusError> {
        self.check_available()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics()
            .entry(topic.to_string())
            .or_default()
            .groups
            .entry(group.to_string())
            .or_default()
            .push(tx);

        tracing::info!(topic, group, "Subscriber joined group");
        Ok(Box::new(InMemorySubscription {
            topic: topic.to_string(),
            group: group.to_string(),
            rx,
            bus: self.inner.clone(),
        }))
    }
}

struct InMemorySubscription {
    topic: String,
    group: String,
    rx: mpsc::UnboundedReceiver<Delivery>,
    bus: Arc<BusInner>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    async fn ack(&mut self, delivery: &Delivery) -> Result<(), BusError> {
        if delivery.topic != self.topic {
            return Err(BusError::Closed(delivery.topic.clone()));
        }
        self.bus
            .committed
            .entry((self.topic.clone(), self.group.clone(), delivery.partition))
            .and_modify(|next| *next = (*next).max(delivery.offset + 1))
            .or_insert(delivery.offset + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_each_group_gets_every_record() {
        let bus = InMemoryBus::new(2);
        let mut a = bus.subscribe("t", "group-a").await.unwrap();
        let mut b = bus.subscribe("t", "group-b").await.unwrap();

        bus.publish("t", "k", b"one".to_vec()).await.unwrap();

        assert_eq!(a.recv().await.unwrap().payload, b"one");
        assert_eq!(b.recv().await.unwrap().payload, b"one");
    }

    #[tokio::test]
    async fn test_group_members_share_records() {
        let bus = InMemoryBus::new(4);
        let mut first = bus.subscribe("t", "g").await.unwrap();
        let mut second = bus.subscribe("t", "g").await.unwrap();

        for i in 0..20 {
            bus.publish("t", &format!("key-{}", i), vec![i]).await.unwrap();
        }

        let mut seen = Vec::new();
        while let Ok(Some(d)) =
            tokio::time::timeout(std::time::Duration::from_millis(20), first.recv()).await
        {
            seen.push(d.payload[0]);
        }
        while let Ok(Some(d)) =
            tokio::time::timeout(std::time::Duration::from_millis(20), second.recv()).await
        {
            seen.push(d.payload[0]);
        }
        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<u8>>());
    }

    #[tokio::test]
    async fn test_same_key_preserves_order() {
        let bus = InMemoryBus::new(3);
        let mut sub = bus.subscribe("t", "g").await.unwrap();

        let mut acks = Vec::new();
        for i in 0..5u8 {
            acks.push(bus.publish("t", "acc-1", vec![i]).await.unwrap());
        }
        assert!(acks.iter().all(|a| a.partition == acks[0].partition));

        for i in 0..5u8 {
            let d = sub.recv().await.unwrap();
            assert_eq!(d.payload, vec![i]);
            assert_eq!(d.offset, i as u64);
        }
    }

    #[tokio::test]
    async fn test_ack_commits_offset() {
        let bus = InMemoryBus::new(1);
        let mut sub = bus.subscribe("t", "g").await.unwrap();
        bus.publish("t", "k", vec![1]).await.unwrap();
        bus.publish("t", "k", vec![2]).await.unwrap();

        let first = sub.recv().await.unwrap();
        sub.ack(&first).await.unwrap();
        assert_eq!(bus.committed_offset("t", "g", 0), Some(1));
        assert_eq!(bus.committed_count("t", "g"), 1);
    }

    #[tokio::test]
    async fn test_abandoned_groups_are_pruned() {
        let bus = InMemoryBus::new(1);
        let stale = bus.subscribe("t", "instance-1").await.unwrap();
        let mut live = bus.subscribe("t", "instance-2").await.unwrap();
        drop(stale);

        bus.publish("t", "k", vec![1]).await.unwrap();
        assert_eq!(live.recv().await.unwrap().payload, vec![1]);

        let topics = bus.topics();
        let groups: Vec<_> = topics["t"].groups.keys().cloned().collect();
        assert_eq!(groups, vec!["instance-2".to_string()]);
    }

    #[tokio::test]
    async fn test_unacked_records_are_not_replayed() {
        let bus = InMemoryBus::new(1);
        let mut first = bus.subscribe("t", "g").await.unwrap();
        bus.publish("t", "k", vec![0]).await.unwrap();
        bus.publish("t", "k", vec![1]).await.unwrap();

        let d = first.recv().await.unwrap();
        first.ack(&d).await.unwrap();
        drop(first);

        let mut second = bus.subscribe("t", "g").await.unwrap();
        bus.publish("t", "k", vec![2]).await.unwrap();

        // Offset 1 was queued for the departed member; the committed offset shows the gap.
        let d = second.recv().await.unwrap();
        assert_eq!(d.offset, 2);
        assert_eq!(bus.committed_offset("t", "g", 0), Some(1));
    }

    #[tokio::test]
    async fn test_unavailable_broker() {
        let bus = InMemoryBus::new(1);
        bus.set_available(false);
        assert!(matches!(
            bus.publish("t", "k", vec![]).await,
            Err(BusError::Unavailable(_))
        ));
        bus.set_available(true);
        assert!(bus.publish("t", "k", vec![]).await.is_ok());
    }
}
