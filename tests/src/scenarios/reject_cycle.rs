//! The reject cycle: the round-1 proposer never shows up, the remaining
//! witnesses record an oppose-majority in a virtual placeholder, and the
//! next proposer carries the chain forward citing it.

use crate::harness::{spawn_ring, wait_for_head, RingOptions};
use cinder_consensus::DposEngine;
use cinder_types::AckKind;
use std::time::Duration;

#[tokio::test]
async fn missed_proposer_triggers_virtual_block_and_repropose() {
    // Seat 0 (the round-1 proposer) is absent; seats 1 and 2 run.
    let ring = spawn_ring(RingOptions {
        seats: vec![1, 2],
        delay_seal: Duration::from_millis(200),
        seal_deadline: Duration::from_secs(1),
        ..Default::default()
    })
    .await;
    let mut sub = ring.bus.subscribe();

    // Two tickets banked for round 1: one for the placeholder, and range
    // cover for the successor the reject will demand.
    ring.publish_answer(ring.answer_for(1, [0x99u8; 20])).await;
    ring.publish_answer(ring.answer_for(1, [0x88u8; 20])).await;

    // Seats 1 and 2 arm their proposer deadlines on the simple majority,
    // fire after a second, and oppose round 1. Seat 1 proposes next and
    // records the oppose-majority in a virtual block at height 1.
    let placeholder = wait_for_head(&mut sub, 1).await;
    assert!(placeholder.is_virtual());
    assert!(placeholder.transactions.is_empty());
    assert_eq!(placeholder.header.producer_addr, ring.address(1));
    assert_eq!(placeholder.acks.len(), 2);
    assert!(placeholder.acks.iter().all(|a| a.kind == AckKind::Oppose));
    DposEngine::observer()
        .verify_ack_quorum(&placeholder, &ring.committee, false)
        .unwrap();

    // Mid-cycle bookkeeping: the reject is acknowledged but nothing
    // effective happened yet.
    tokio::time::sleep(Duration::from_millis(50)).await;
    for seat in [1usize, 2] {
        let status = *ring.statuses[&seat].read();
        assert_eq!(status.virtual_h, 1, "seat {seat} virtual height");
        assert_eq!(status.effective_h, 0, "seat {seat} effective height");
    }

    // A ticket mined on the placeholder lets seat 1 produce the effective
    // successor, citing the same oppose-majority.
    ring.publish_answer(ring.answer_for(2, [0x77u8; 20])).await;
    let successor = wait_for_head(&mut sub, 2).await;
    assert!(!successor.is_virtual());
    assert_eq!(successor.header.producer_addr, ring.address(1));
    assert_eq!(successor.header.parent_hash, placeholder.hash());
    assert!(successor.acks.iter().all(|a| a.kind == AckKind::Oppose));
    assert!(successor.acks.len() >= ring.committee.least_quorum());
    DposEngine::observer()
        .verify_ack_quorum(&successor, &ring.committee, true)
        .unwrap();

    // Both survivors converge on the effective head.
    tokio::time::sleep(Duration::from_millis(100)).await;
    for seat in [1usize, 2] {
        let status = *ring.statuses[&seat].read();
        assert_eq!(status.effective_h, 2, "seat {seat} effective height");
        assert_eq!(status.virtual_h, 2, "seat {seat} virtual height");
    }
}

#[tokio::test]
async fn deadline_is_cancelled_when_the_proposer_delivers() {
    // Full ring with a generous deadline: the proposer commits first and
    // nobody opposes.
    let ring = spawn_ring(RingOptions {
        seats: vec![0, 1, 2],
        delay_seal: Duration::from_millis(200),
        seal_deadline: Duration::from_secs(2),
        ..Default::default()
    })
    .await;
    let mut sub = ring.bus.subscribe();

    ring.publish_answer(ring.answer_for(1, [0x99u8; 20])).await;
    let block = wait_for_head(&mut sub, 1).await;
    assert!(!block.is_virtual());

    // Outlive the deadline window; no oppose round must have fired.
    tokio::time::sleep(Duration::from_millis(2_300)).await;
    for seat in [1usize, 2] {
        let status = *ring.statuses[&seat].read();
        assert_eq!(status.effective_h, 1, "seat {seat} effective height");
        assert_eq!(
            status.reject_h, None,
            "seat {seat} must have cancelled its deadline"
        );
    }
    assert_eq!(ring.chain.head().number(), 1);
    assert!(!ring.chain.head().is_virtual());
}
