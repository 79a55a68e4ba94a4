//! Concurrent transfer tests
//!
//! Many threads share one store and fire crossing transfers at the same
//! accounts. Money must be conserved and no balance may go negative.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use rust_decimal::Decimal;
use tempfile::TempDir;

use minibank_core::adapters::{DuckDbRepository, MemoryRepository};
use minibank_core::domain::result::Error;
use minibank_core::ports::{AccountStore, LedgerStore};
use minibank_core::services::{CreditService, LedgerService, TransferService};
use minibank_core::{AccountId, NewAccount};

/// Threads per transfer direction
const THREADS_PER_ROUTE: usize = 4;

/// Transfers each thread attempts
const ITERATIONS_PER_THREAD: usize = 10;

fn open(store: &impl LedgerStore, name: &str, balance: i64) -> AccountId {
    store
        .create_account(
            &NewAccount::new(name, "Test", format!("{}@example.com", name)).with_balance(Decimal::new(balance, 0)),
        )
        .unwrap()
        .id
}

fn total<S: LedgerStore>(store: &S, ids: &[AccountId]) -> Decimal {
    ids.iter().map(|id| store.get_account(*id).unwrap().balance).sum()
}

/// Run A->B, B->A and A->C concurrently and check the invariants
///
/// Amounts are chosen so that some transfers must fail for lack of funds.
fn check_crossing_transfers<S: LedgerStore + 'static>(store: Arc<S>) {
    let a = open(store.as_ref(), "alice", 100);
    let b = open(store.as_ref(), "bob", 50);
    let c = open(store.as_ref(), "carol", 0);
    let accounts = [a, b, c];
    let before = total(store.as_ref(), &accounts);

    let routes = [(a, b, 7), (b, a, 5), (a, c, 11)];
    let service = Arc::new(TransferService::new(Arc::clone(&store)));
    let barrier = Arc::new(Barrier::new(routes.len() * THREADS_PER_ROUTE));
    let committed = Arc::new(AtomicUsize::new(0));
    let refused = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for &(from, to, amount) in &routes {
        for _ in 0..THREADS_PER_ROUTE {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let committed = Arc::clone(&committed);
            let refused = Arc::clone(&refused);

            handles.push(thread::spawn(move || {
                barrier.wait();
                for _ in 0..ITERATIONS_PER_THREAD {
                    match service.transfer(from, to, Decimal::new(amount, 0)) {
                        Ok(_) => {
                            committed.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(Error::InsufficientFunds { .. }) => {
                            refused.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => panic!("unexpected transfer error: {}", e),
                    }
                }
            }));
        }
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let committed = committed.load(Ordering::SeqCst);
    let refused = refused.load(Ordering::SeqCst);
    println!("committed: {}, refused: {}", committed, refused);
    assert_eq!(
        committed + refused,
        routes.len() * THREADS_PER_ROUTE * ITERATIONS_PER_THREAD
    );

    for id in accounts {
        let balance = store.get_account(id).unwrap().balance;
        assert!(balance >= Decimal::ZERO, "account {} went negative: {}", id, balance);
    }
    assert_eq!(total(store.as_ref(), &accounts), before);

    // Every committed transfer is exactly one ledger entry
    assert_eq!(store.list_recent(10_000).unwrap().len(), committed);

    let ledger = LedgerService::new(Arc::clone(&store));
    for id in accounts {
        let history = ledger.list_for_account(id).unwrap();
        assert!(history.windows(2).all(|w| w[0].id < w[1].id));
    }
}

#[test]
fn test_crossing_transfers_duckdb() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DuckDbRepository::new(&temp_dir.path().join("concurrent.duckdb")).unwrap();
    repo.ensure_schema().unwrap();
    check_crossing_transfers(Arc::new(repo));
}

#[test]
fn test_crossing_transfers_memory() {
    check_crossing_transfers(Arc::new(MemoryRepository::new()));
}

/// Drain one account from many threads at once; exactly the affordable
/// number of transfers may succeed
#[test]
fn test_no_overdraft_under_contention() {
    let temp_dir = TempDir::new().unwrap();
    let repo = DuckDbRepository::new(&temp_dir.path().join("drain.duckdb")).unwrap();
    repo.ensure_schema().unwrap();
    let repo = Arc::new(repo);

    let source = open(repo.as_ref(), "source", 100);
    let sink = open(repo.as_ref(), "sink", 0);
    let service = Arc::new(TransferService::new(Arc::clone(&repo)));

    const THREADS: usize = 8;
    let barrier = Arc::new(Barrier::new(THREADS));
    let successes = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let successes = Arc::clone(&successes);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..5 {
                    if service.transfer(source, sink, Decimal::new(30, 0)).is_ok() {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // 100 affords three transfers of 30
    assert_eq!(successes.load(Ordering::SeqCst), 3);
    assert_eq!(repo.get_account(source).unwrap().balance, Decimal::new(10, 0));
    assert_eq!(repo.get_account(sink).unwrap().balance, Decimal::new(90, 0));
}

/// Credits racing transfers: every minted unit shows up exactly once
#[test]
fn test_credits_and_transfers_interleave() {
    let repo = Arc::new(MemoryRepository::new());
    let a = open(repo.as_ref(), "alice", 0);
    let b = open(repo.as_ref(), "bob", 0);

    let credits = Arc::new(CreditService::new(Arc::clone(&repo)));
    let transfers = Arc::new(TransferService::new(Arc::clone(&repo)));
    let barrier = Arc::new(Barrier::new(2));

    let minting = {
        let credits = Arc::clone(&credits);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..50 {
                credits.credit(a, Decimal::new(2, 0)).unwrap();
            }
        })
    };
    let moving = {
        let transfers = Arc::clone(&transfers);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let mut moved = 0;
            for _ in 0..50 {
                if transfers.transfer(a, b, Decimal::ONE).is_ok() {
                    moved += 1;
                }
            }
            moved
        })
    };

    minting.join().expect("Thread panicked");
    let moved: i64 = moving.join().expect("Thread panicked");

    assert_eq!(repo.get_account(b).unwrap().balance, Decimal::new(moved, 0));
    assert_eq!(
        repo.get_account(a).unwrap().balance + repo.get_account(b).unwrap().balance,
        Decimal::new(100, 0)
    );
}
