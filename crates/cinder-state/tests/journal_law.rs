//! Property suite for the journal law: snapshotting before any suffix of
//! mutations and reverting restores the pre-snapshot state byte for byte.

use cinder_state::StateDb;
use primitive_types::{H256, U256};
use proptest::prelude::*;

/// A single state mutation drawn by proptest.
#[derive(Clone, Debug)]
enum Mutation {
    AddBalance(u8, u64),
    SubBalance(u8, u64),
    SetNonce(u8, u64),
    SetCode(u8, Vec<u8>),
    SetStorage(u8, u8, u8),
    CreateAccount(u8),
    Suicide(u8),
    AccessAccount(u8),
    AccessSlot(u8, u8),
}

impl Mutation {
    fn apply(&self, db: &mut StateDb) {
        match self {
            Self::AddBalance(a, amount) => db.add_balance(&addr(*a), U256::from(*amount)),
            Self::SubBalance(a, amount) => {
                // Insufficient funds leave the state untouched; either
                // outcome is fine for the law.
                let _ = db.sub_balance(&addr(*a), U256::from(*amount));
            }
            Self::SetNonce(a, nonce) => db.set_nonce(&addr(*a), *nonce),
            Self::SetCode(a, code) => db.set_code(&addr(*a), code.clone()),
            Self::SetStorage(a, key, value) => db.set_storage(
                &addr(*a),
                H256::repeat_byte(*key),
                H256::repeat_byte(*value),
            ),
            Self::CreateAccount(a) => db.create_account(addr(*a)),
            Self::Suicide(a) => {
                let _ = db.suicide(&addr(*a));
            }
            Self::AccessAccount(a) => db.access_list_add_account(addr(*a)),
            Self::AccessSlot(a, key) => {
                db.access_list_add_slot(addr(*a), H256::repeat_byte(*key))
            }
        }
    }
}

fn addr(byte: u8) -> [u8; 20] {
    // Narrow address space so mutations collide on the same accounts.
    [byte % 5; 20]
}

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (any::<u8>(), 0u64..1000).prop_map(|(a, v)| Mutation::AddBalance(a, v)),
        (any::<u8>(), 0u64..1000).prop_map(|(a, v)| Mutation::SubBalance(a, v)),
        (any::<u8>(), any::<u64>()).prop_map(|(a, n)| Mutation::SetNonce(a, n)),
        (any::<u8>(), proptest::collection::vec(any::<u8>(), 0..16))
            .prop_map(|(a, c)| Mutation::SetCode(a, c)),
        (any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(a, k, v)| Mutation::SetStorage(a, k, v)),
        any::<u8>().prop_map(Mutation::CreateAccount),
        any::<u8>().prop_map(Mutation::Suicide),
        any::<u8>().prop_map(Mutation::AccessAccount),
        (any::<u8>(), any::<u8>()).prop_map(|(a, k)| Mutation::AccessSlot(a, k)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// For any prefix/suffix split of a mutation sequence, applying the
    /// prefix, snapshotting, applying the suffix, and reverting yields a
    /// state fingerprint equal to the post-prefix fingerprint.
    #[test]
    fn revert_restores_pre_snapshot_state(
        mutations in proptest::collection::vec(mutation_strategy(), 1..40),
        split in 0usize..40,
    ) {
        let split = split.min(mutations.len());
        let mut db = StateDb::new();

        for mutation in &mutations[..split] {
            mutation.apply(&mut db);
        }
        let before = db.fingerprint();

        let snapshot = db.snapshot();
        for mutation in &mutations[split..] {
            mutation.apply(&mut db);
        }
        db.revert_to_snapshot(snapshot);

        prop_assert_eq!(db.fingerprint(), before);
    }

    /// Nested snapshots unwind independently: reverting the inner one
    /// restores the mid-state, reverting the outer one the initial state.
    #[test]
    fn nested_reverts_unwind_lifo(
        first in proptest::collection::vec(mutation_strategy(), 1..15),
        second in proptest::collection::vec(mutation_strategy(), 1..15),
    ) {
        let mut db = StateDb::new();
        let initial = db.fingerprint();

        let outer = db.snapshot();
        for mutation in &first {
            mutation.apply(&mut db);
        }
        let mid = db.fingerprint();

        let inner = db.snapshot();
        for mutation in &second {
            mutation.apply(&mut db);
        }

        db.revert_to_snapshot(inner);
        prop_assert_eq!(db.fingerprint(), mid);

        db.revert_to_snapshot(outer);
        prop_assert_eq!(db.fingerprint(), initial);
    }
}
